//! LLM provider implementations.
//!
//! Contains the Gemini implementation of the [`LlmProvider`](viper_core::llm::provider::LlmProvider)
//! trait and a factory ([`create_provider`]) that builds it from configuration.

pub mod gemini;

use secrecy::SecretString;

use viper_core::llm::box_provider::BoxLlmProvider;
use viper_types::config::ViperConfig;
use viper_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] for the configured model.
///
/// `config.base_url` overrides the Gemini API origin when set.
pub fn create_provider(
    config: &ViperConfig,
    api_key: SecretString,
) -> Result<BoxLlmProvider, LlmError> {
    let mut provider = GeminiProvider::new(api_key, config.model.clone())?;
    if let Some(base_url) = config.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
        provider = provider.with_base_url(base_url.to_string());
    }
    tracing::debug!(model = %config.model, "created gemini provider");
    Ok(BoxLlmProvider::new(provider))
}
