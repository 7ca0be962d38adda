//! Session identifiers and the session store key scheme.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque token identifying one user-initiated migration flow
///
/// The same value doubles as the job identifier in the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}

/// Keys owned by a session in the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Design,
    Tags,
    Status,
    Logs,
}

impl SessionKey {
    /// Render the concrete store key for a session
    pub fn for_session(&self, session: &SessionId) -> String {
        match self {
            SessionKey::Design => format!("{}_design", session),
            SessionKey::Tags => format!("{}_tags", session),
            SessionKey::Status => format!("{}_status", session),
            SessionKey::Logs => format!("session_logs:{}", session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scheme() {
        let id: SessionId = "6f1c1f52-5b1e-4c8e-9d43-2f5d0a0b7e11".parse().unwrap();
        assert_eq!(
            SessionKey::Design.for_session(&id),
            "6f1c1f52-5b1e-4c8e-9d43-2f5d0a0b7e11_design"
        );
        assert_eq!(
            SessionKey::Tags.for_session(&id),
            "6f1c1f52-5b1e-4c8e-9d43-2f5d0a0b7e11_tags"
        );
        assert_eq!(
            SessionKey::Status.for_session(&id),
            "6f1c1f52-5b1e-4c8e-9d43-2f5d0a0b7e11_status"
        );
        assert_eq!(
            SessionKey::Logs.for_session(&id),
            "session_logs:6f1c1f52-5b1e-4c8e-9d43-2f5d0a0b7e11"
        );
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_rejects_malformed_id() {
        assert!("not-a-session".parse::<SessionId>().is_err());
    }
}
