//! LLM-powered specification generator.
//!
//! `LlmSpecGenerator` implements `SpecificationGenerator` with a single
//! schema-constrained completion: the user's description goes out with the
//! Viper system instruction and the `BotSpecification` JSON schema, and the
//! reply is parsed and validated into a [`BotSpecification`].
//!
//! The provider is created on first use, so a missing API key surfaces as a
//! configuration error from `generate` rather than at startup.

use tokio::sync::OnceCell;

use viper_core::builder::generator::SpecificationGenerator;
use viper_core::builder::policy::run_with_policy;
use viper_core::builder::prompt::{SYSTEM_INSTRUCTION, build_generation_prompt};
use viper_core::llm::box_provider::BoxLlmProvider;
use viper_types::config::{GenerationPolicy, ViperConfig};
use viper_types::error::{ConfigurationError, GenerationError};
use viper_types::llm::{CompletionRequest, LlmError, Message, MessageRole, OutputSchema};
use viper_types::spec::{BotSpecification, GeneratedSpecification, specification_schema};

use crate::llm::create_provider;
use crate::secret::env::resolve_api_key;

/// Builds the provider on first use.
pub type ProviderFactory = Box<dyn Fn() -> Result<BoxLlmProvider, GenerationError> + Send + Sync>;

/// Specification generator backed by an LLM provider.
pub struct LlmSpecGenerator {
    provider: OnceCell<BoxLlmProvider>,
    factory: Option<ProviderFactory>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    policy: GenerationPolicy,
}

impl LlmSpecGenerator {
    /// Generator over an already constructed provider.
    pub fn new(provider: BoxLlmProvider, config: &ViperConfig) -> Self {
        Self::build(OnceCell::new_with(Some(provider)), None, config)
    }

    /// Generator whose provider is built by `factory` on the first `generate`.
    pub fn with_factory(factory: ProviderFactory, config: &ViperConfig) -> Self {
        Self::build(OnceCell::new(), Some(factory), config)
    }

    /// Generator that resolves the API key from the environment and creates
    /// the Gemini provider on first use.
    pub fn from_config(config: &ViperConfig) -> Self {
        let provider_config = config.clone();
        let factory: ProviderFactory = Box::new(move || -> Result<BoxLlmProvider, GenerationError> {
            let api_key = resolve_api_key(&provider_config.api_key_env)?;
            create_provider(&provider_config, api_key).map_err(GenerationError::ServiceFailure)
        });
        Self::with_factory(factory, config)
    }

    fn build(
        provider: OnceCell<BoxLlmProvider>,
        factory: Option<ProviderFactory>,
        config: &ViperConfig,
    ) -> Self {
        Self {
            provider,
            factory,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
            policy: config.generation.clone(),
        }
    }

    async fn provider(&self) -> Result<&BoxLlmProvider, GenerationError> {
        self.provider
            .get_or_try_init(|| async {
                match &self.factory {
                    Some(factory) => factory(),
                    None => Err(ConfigurationError::Invalid(
                        "no LLM provider configured".to_string(),
                    )
                    .into()),
                }
            })
            .await
    }

    /// Build the structured-output request for a description.
    fn specification_request(&self, description: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: MessageRole::User,
                content: build_generation_prompt(description),
            }],
            system: Some(SYSTEM_INSTRUCTION.to_string()),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            output_schema: Some(OutputSchema {
                name: "BotSpecification".to_string(),
                schema: specification_schema(),
            }),
        }
    }
}

/// Parse and validate the model's JSON reply.
///
/// Tolerates a surrounding markdown code fence.
pub(crate) fn parse_specification(content: &str) -> Result<BotSpecification, GenerationError> {
    let body = strip_code_fence(content);
    let generated: GeneratedSpecification = serde_json::from_str(body).map_err(|e| {
        GenerationError::ParseFailure(format!("{e}; raw content: {}", truncate(content, 200)))
    })?;
    Ok(generated.validate()?)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

impl SpecificationGenerator for LlmSpecGenerator {
    async fn generate(&self, prompt: &str) -> Result<BotSpecification, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let provider = self.provider().await?;
        let request = self.specification_request(prompt);
        let request = &request;

        let spec = run_with_policy(&self.policy, move |attempt| async move {
            tracing::debug!(attempt, model = %request.model, "requesting bot specification");
            let response = provider.complete(request).await.map_err(|e| match e {
                LlmError::EmptyResponse => {
                    GenerationError::ParseFailure("empty response body".to_string())
                }
                other => GenerationError::ServiceFailure(other),
            })?;
            parse_specification(&response.content)
        })
        .await?;

        tracing::info!(
            bot_name = %spec.name,
            commands = spec.commands.len(),
            "bot specification generated"
        );
        Ok(spec)
    }
}
