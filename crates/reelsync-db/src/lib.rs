//! Reelsync task persistence.
//!
//! The task queue is the single source of truth for retry state: a task stays
//! in the retry set (`pending`, `uploading` or `failed`) until it is marked
//! succeeded, so a crash mid-batch leaves unfinished tasks to the next run.

pub mod queue;
pub mod task;

pub use queue::TaskQueue;
pub use task::SqliteTaskQueue;
