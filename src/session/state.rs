//! Session readiness.

use std::fmt;

/// Whether a session can take URLs and chat messages.
///
/// Transitions:
/// - AwaitingCredential -> Ready (first credential set)
/// - Ready -> Ready (credential replaced, transcript reset)
///
/// There is no way back to `AwaitingCredential`: empty credentials are
/// ignored rather than clearing the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No credential yet; URL and message inputs are disabled.
    #[default]
    AwaitingCredential,
    /// An engine exists and inputs are accepted.
    Ready,
}

impl SessionState {
    /// Stable name used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::AwaitingCredential => "awaiting_credential",
            SessionState::Ready => "ready",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
