//! Core types and configuration for the delivery statistics pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Canonical and aggregate record types
//! - Time granularities and their bucketing rules
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
