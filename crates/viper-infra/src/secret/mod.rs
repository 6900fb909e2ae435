//! Credential resolution.

pub mod env;
