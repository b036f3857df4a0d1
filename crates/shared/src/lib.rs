//! Shared errors, configuration and deployment environment for Madani.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error classification for HTTP responses
//! - Configuration management (`config` + `.env` layering)
//! - Deployment environment detection (serverless vs. persistent filesystem)

pub mod config;
pub mod environment;
pub mod error;

mod environment_tests;

pub use config::{AppConfig, load_section};
pub use environment::{DeploymentEnvironment, Platform};
pub use error::{AppError, AppResult};
