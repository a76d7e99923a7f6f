//! Configuration module for discovery runs
//!
//! This module provides the `CrawlConfig` struct and its type-safe builder
//! with validation and the command-line defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{CrawlConfigBuilder, WithOutputPath, WithStartUrl};
pub use types::{CrawlConfig, LoginConfig, LoginSteps, ScrollConfig, WaitUntil};
