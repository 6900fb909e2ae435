//! Shared domain types for Viper.
//!
//! This crate contains the core domain types used across the Viper workspace:
//! bot records, generated specifications, conversation messages, LLM request
//! shapes, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, schemars.

pub mod bot;
pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod session;
pub mod spec;
pub mod view;
