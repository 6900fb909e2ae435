//! Builder system for turning a description into a fleet record.
//!
//! Defines the surface-agnostic `SpecificationGenerator` port, the
//! timeout/retry policy wrapped around it, the fixed prompt text, and the
//! `BuilderSession` state machine that drives one conversation.

pub mod generator;
pub mod policy;
pub mod prompt;
pub mod session;
