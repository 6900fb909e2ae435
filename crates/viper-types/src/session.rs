//! Builder session phase and generation ticket types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// Phases of one builder session.
///
/// `Idle -> Generating -> AwaitingCredentials -> Finalizing -> Complete`,
/// with `Generating -> Idle` on a failed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Generating,
    AwaitingCredentials,
    Finalizing,
    Complete,
}

impl SessionPhase {
    /// Whether the session can still be abandoned without side effects.
    pub fn is_abandonable(&self) -> bool {
        matches!(
            self,
            SessionPhase::Idle | SessionPhase::Generating | SessionPhase::AwaitingCredentials
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Generating => write!(f, "generating"),
            SessionPhase::AwaitingCredentials => write!(f, "awaiting credentials"),
            SessionPhase::Finalizing => write!(f, "finalizing"),
            SessionPhase::Complete => write!(f, "complete"),
        }
    }
}

/// Handle for one in-flight generation.
///
/// The result of a generation is only applied to the session (and attempt)
/// that issued the ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub session_id: Uuid,
    pub sequence: u32,
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abandonable_phases() {
        assert!(SessionPhase::Idle.is_abandonable());
        assert!(SessionPhase::Generating.is_abandonable());
        assert!(SessionPhase::AwaitingCredentials.is_abandonable());
        assert!(!SessionPhase::Finalizing.is_abandonable());
        assert!(!SessionPhase::Complete.is_abandonable());
    }

    #[test]
    fn test_phase_serde() {
        let json = serde_json::to_string(&SessionPhase::AwaitingCredentials).unwrap();
        assert_eq!(json, "\"awaiting_credentials\"");
    }
}
