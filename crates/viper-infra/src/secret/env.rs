//! Environment variable API key resolution.
//!
//! The key is read from the variable named in configuration (`API_KEY` by
//! default), then from `GEMINI_API_KEY`. Empty values count as unset.

use secrecy::SecretString;

use viper_types::error::ConfigurationError;

/// Variable checked when the configured one is unset.
pub const FALLBACK_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Resolve the generation API key from the process environment.
pub fn resolve_api_key(var_name: &str) -> Result<SecretString, ConfigurationError> {
    resolve_api_key_with(var_name, |key| match std::env::var(key) {
        Ok(val) => Some(val),
        // Missing or not valid Unicode: not usable as a key either way.
        Err(_) => None,
    })
}

/// Resolve the API key through `lookup` instead of the real environment.
pub fn resolve_api_key_with<F>(var_name: &str, lookup: F) -> Result<SecretString, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut candidates = vec![var_name];
    if var_name != FALLBACK_API_KEY_ENV {
        candidates.push(FALLBACK_API_KEY_ENV);
    }

    for name in candidates {
        if let Some(value) = lookup(name) {
            let value = value.trim();
            if !value.is_empty() {
                tracing::debug!(var = name, "resolved API key from environment");
                return Ok(SecretString::from(value.to_string()));
            }
        }
    }

    Err(ConfigurationError::MissingCredential(var_name.to_string()))
}
