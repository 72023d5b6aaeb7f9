use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A named grouping object in the remote service, analogous to a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteContainer {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

/// An uploaded file stored under a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBlob {
    pub id: String,
    pub name: String,
    pub parent_container_id: String,
    pub media_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Reader,
    Commenter,
    Writer,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Reader => write!(f, "reader"),
            Role::Commenter => write!(f, "commenter"),
            Role::Writer => write!(f, "writer"),
        }
    }
}

/// Read access granted on a container to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub target_container_id: String,
    pub grantee_identity: String,
    pub role: Role,
}

impl PermissionGrant {
    pub fn reader(container_id: impl Into<String>, grantee: impl Into<String>) -> Self {
        Self {
            target_container_id: container_id.into(),
            grantee_identity: grantee.into(),
            role: Role::Reader,
        }
    }
}
