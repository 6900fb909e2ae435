//! Builder system infrastructure: the LLM-backed specification generator.

pub mod llm_generator;

pub use llm_generator::LlmSpecGenerator;
