pub mod remote;
pub mod task;

pub use remote::{PermissionGrant, RemoteBlob, RemoteContainer, Role};
pub use task::{TaskStatus, UploadTask};
