use thiserror::Error;

use crate::llm::LlmError;
use crate::session::SessionPhase;

/// A generated specification is missing something a bot record needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("generated specification is missing required field '{0}'")]
    MissingRequiredField(&'static str),
}

/// Problems with the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from turning a prompt into a [`BotSpecification`](crate::spec::BotSpecification).
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("could not parse generated specification: {0}")]
    ParseFailure(String),

    #[error("generation service failed: {0}")]
    ServiceFailure(#[source] LlmError),

    #[error("generation timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error(transparent)]
    InvalidSpecification(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl GenerationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Timeout { .. } => true,
            GenerationError::ServiceFailure(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Errors from the durable fleet slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to persist fleet: {0}")]
    PersistFailure(String),

    #[error("failed to read fleet: {0}")]
    ReadFailure(String),

    #[error("fleet exceeds storage quota ({size} > {limit} bytes)")]
    QuotaExceeded { size: usize, limit: usize },
}

/// Rejected builder session actions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("a generation is already in progress")]
    AlreadyGenerating,

    #[error("bot token is required")]
    MissingToken,

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },

    #[error("no builder session is active")]
    NoActiveSession,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MissingRequiredField("botName");
        assert_eq!(
            err.to_string(),
            "generated specification is missing required field 'botName'"
        );
    }

    #[test]
    fn test_missing_credential_names_variable() {
        let err = ConfigurationError::MissingCredential("API_KEY".to_string());
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn test_generation_error_retryable() {
        assert!(GenerationError::Timeout { after_secs: 5 }.is_retryable());
        assert!(
            GenerationError::ServiceFailure(LlmError::RateLimited { retry_after_ms: None })
                .is_retryable()
        );
        assert!(!GenerationError::ServiceFailure(LlmError::AuthenticationFailed).is_retryable());
        assert!(!GenerationError::ParseFailure("eof".to_string()).is_retryable());
        assert!(!GenerationError::EmptyPrompt.is_retryable());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = SessionError::InvalidTransition {
            phase: SessionPhase::Finalizing,
            action: "abandon",
        };
        assert_eq!(err.to_string(), "cannot abandon while finalizing");
    }

    #[test]
    fn test_quota_error_display() {
        let err = StoreError::QuotaExceeded { size: 10, limit: 5 };
        assert_eq!(err.to_string(), "fleet exceeds storage quota (10 > 5 bytes)");
    }
}
