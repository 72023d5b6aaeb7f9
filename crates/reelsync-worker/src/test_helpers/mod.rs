//! Test helpers for worker unit tests
//!
//! In-memory stand-ins for the remote service, the task queue and the
//! notification channel, with failure injection.

pub mod mock_queue;
pub mod mock_storage;
pub mod recording_notifier;

pub use mock_queue::MemoryTaskQueue;
pub use mock_storage::{MockRemoteStorage, RemoteCall};
pub use recording_notifier::RecordingNotifier;

use std::path::{Path, PathBuf};

/// Create `<root>/<name>/` holding the given files.
pub fn make_source_dir(root: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for (file, content) in files {
        std::fs::write(dir.join(file), content).unwrap();
    }
    dir
}
