//! Infrastructure adapters for Viper.
//!
//! Concrete implementations of the ports defined in `viper-core`: the Gemini
//! LLM provider, the LLM-backed specification generator, the SQLite slot
//! store, plus configuration and API key resolution.

pub mod builder;
pub mod config;
pub mod llm;
pub mod secret;
pub mod sqlite;
