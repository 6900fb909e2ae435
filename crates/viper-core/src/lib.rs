//! Builder logic and port definitions for Viper.
//!
//! This crate defines the "ports" (provider, generator and slot-store traits)
//! that the infrastructure layer implements, plus the pure state machines
//! that drive a builder session, the fleet, and view routing. It depends only
//! on `viper-types` -- never on `viper-infra` or any network/database crate.

pub mod builder;
pub mod fleet;
pub mod llm;
pub mod router;
