use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a stored connection (opening, duct) in the room graph.
    pub struct ConnectionId;
}

/// Caller-assigned room identifier. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room {}", self.0)
    }
}

impl From<u32> for RoomId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
