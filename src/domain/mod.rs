//! Domain layer containing the relay's core types and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, session names)
//! - `relay` - Sessions, the session registry, and message application

pub mod foundation;
pub mod relay;
