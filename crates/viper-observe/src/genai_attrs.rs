//! OpenTelemetry GenAI semantic convention attribute names.
//!
//! Used as field names on the span wrapping each outbound generation call.
//! Span naming follows `"{operation} {model}"`, e.g.
//! `"generate_content gemini-3-flash-preview"`.

pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// Output type requested from the model ("json" for schema-constrained output).
pub const GEN_AI_OUTPUT_TYPE: &str = "gen_ai.output.type";

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

// Operation name values

/// Single-shot content generation.
pub const OP_GENERATE_CONTENT: &str = "generate_content";

// Provider name values

/// Google Gemini API.
pub const PROVIDER_GEMINI: &str = "gcp.gemini";
