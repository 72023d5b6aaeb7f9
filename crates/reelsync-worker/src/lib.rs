//! Upload orchestration for reelsync.
//!
//! A batch run walks the pending tasks in order. Each task gets a remote
//! container, every file of its source directory is uploaded into it, and its
//! recipients are granted read access in one batched request. The local
//! directory is deleted only after all of that succeeded. A failing task is
//! marked failed for the next run and the batch moves on. Once all tasks are
//! processed, the live log is snapshotted and uploaded.

pub mod log_rotator;
pub mod orchestrator;
pub mod report;
pub mod sharer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use log_rotator::{LogRotation, LogRotator};
pub use orchestrator::{BatchAborted, BatchSummary, TaskOutcome, UploadOrchestrator};
pub use report::Report;
pub use sharer::{share, ShareFailure, ShareSummary};
