use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-assigned identifier of a comment the server has not accepted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(Uuid);

impl LocalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Comment identity: a local placeholder before commit, the server id after.
///
/// Committed ids travel as JSON integers and pending ids as strings, so the
/// two spaces never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentId {
    Committed(i64),
    Pending(LocalId),
}

impl CommentId {
    pub fn placeholder() -> Self {
        CommentId::Pending(LocalId::generate())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CommentId::Pending(_))
    }

    /// Server id, if the comment has been committed.
    pub fn server_id(&self) -> Option<i64> {
        match self {
            CommentId::Committed(id) => Some(*id),
            CommentId::Pending(_) => None,
        }
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentId::Committed(id) => write!(f, "{id}"),
            CommentId::Pending(local) => write!(f, "pending:{local}"),
        }
    }
}
