//! Connection identity.
//!
//! A `UserId` is attached to a WebSocket connection once, at handshake
//! time, after the API key has been verified. Everything downstream
//! (session registry, monitor, animation routing) keys off it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The pre-validated identity attached to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display_matches_uuid() {
        let uuid = Uuid::now_v7();
        let user = UserId(uuid);
        assert_eq!(user.to_string(), uuid.to_string());
    }

    #[test]
    fn test_user_id_serde_transparent() {
        let user = UserId::new();
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, format!("\"{}\"", user.0));
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }
}
