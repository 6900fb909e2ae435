//! SpecificationGenerator trait -- the port between a builder session and
//! whatever produces bot specifications.
//!
//! Uses RPITIT (no async_trait) consistent with all project traits. The
//! LLM-backed implementation lives in viper-infra.

use std::future::Future;

use viper_types::error::GenerationError;
use viper_types::spec::BotSpecification;

/// Turns a free-text description into a validated [`BotSpecification`].
pub trait SpecificationGenerator: Send + Sync {
    /// Generate a specification for `prompt`.
    ///
    /// Fails with [`GenerationError::EmptyPrompt`] for blank input, and with
    /// the other variants for service, parse, validation, timeout or
    /// configuration problems. Never panics on malformed service output.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<BotSpecification, GenerationError>> + Send;
}
