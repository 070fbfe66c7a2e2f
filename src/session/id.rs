//! Session identifier type.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Unique identifier for a chat session.
///
/// Session IDs are random v4 UUIDs: the ID is the only thing standing
/// between one browser's session and another's stored credential, so it
/// must not be guessable. Displayed in hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
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
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = crate::error::SiteChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(SessionId)
            .map_err(|_| crate::error::SiteChatError::InvalidSessionId(s.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let id = SessionId::new();
            assert!(ids.insert(id), "Duplicate ID generated: {}", id);
        }
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_display_format() {
        let id: SessionId = "67E55044-10B1-426F-9247-BB680E5FE0C8".parse().unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<SessionId>().is_err());
        assert!("sess-000000ff".parse::<SessionId>().is_err());
        assert!("67e55044-10b1-426f-9247".parse::<SessionId>().is_err());

        let err = "nope".parse::<SessionId>().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_roundtrip() {
        let original = SessionId::new();
        let parsed: SessionId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }
}
