//! Deployment environment detection.
//!
//! Serverless platforms give each request an ephemeral filesystem, so anything
//! written under the uploads directory is gone by the next invocation. The
//! resolvers consult one [`DeploymentEnvironment`] instead of probing
//! environment variables on every request.

use std::path::PathBuf;

/// Environment variables whose presence marks a serverless platform.
pub const SERVERLESS_MARKERS: &[&str] = &[
    "VERCEL",
    "VERCEL_ENV",
    "NOW_REGION",
    "AWS_LAMBDA_FUNCTION_NAME",
    "NETLIFY",
];

/// Explicit override: `serverless` or `persistent`.
pub const PLATFORM_OVERRIDE: &str = "MADANI_PLATFORM";

/// Where the process runs, as far as filesystem durability is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Ephemeral filesystem; `marker` names the variable that gave it away.
    Serverless {
        /// Detected marker variable (or the override name).
        marker: String,
    },
    /// Writable filesystem that survives across requests.
    Persistent,
}

/// Deployment environment consulted by the upload and serve resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEnvironment {
    platform: Platform,
    production: bool,
}

impl DeploymentEnvironment {
    /// Persistent-filesystem environment (local development, VMs, containers with volumes).
    #[must_use]
    pub fn persistent() -> Self {
        Self {
            platform: Platform::Persistent,
            production: false,
        }
    }

    /// Serverless environment detected through `marker`.
    #[must_use]
    pub fn serverless(marker: impl Into<String>) -> Self {
        Self {
            platform: Platform::Serverless {
                marker: marker.into(),
            },
            production: false,
        }
    }

    /// Mark the environment as production.
    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Detects the environment from process environment variables.
    pub fn detect() -> Self {
        let env = Self::from_lookup(|key| std::env::var(key).ok());
        tracing::info!(
            platform = env.platform_name(),
            production = env.production,
            "Deployment environment detected"
        );
        env
    }

    /// Detects the environment through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).is_some_and(|v| !v.trim().is_empty());

        let platform = match lookup(PLATFORM_OVERRIDE).as_deref().map(str::trim) {
            Some("serverless") => Platform::Serverless {
                marker: PLATFORM_OVERRIDE.to_string(),
            },
            Some("persistent") => Platform::Persistent,
            _ => SERVERLESS_MARKERS
                .iter()
                .find(|key| present(key))
                .map_or(Platform::Persistent, |key| Platform::Serverless {
                    marker: (*key).to_string(),
                }),
        };

        let production = lookup("RUN_MODE").is_some_and(|mode| mode.trim() == "production");

        Self {
            platform,
            production,
        }
    }

    /// The detected platform.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// True on platforms with an ephemeral filesystem.
    #[must_use]
    pub fn is_serverless(&self) -> bool {
        matches!(self.platform, Platform::Serverless { .. })
    }

    /// True when files written under the uploads directory survive the request.
    #[must_use]
    pub fn has_persistent_filesystem(&self) -> bool {
        !self.is_serverless()
    }

    /// True when running in production mode.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.production
    }

    /// `serverless` or `persistent`.
    #[must_use]
    pub fn platform_name(&self) -> &'static str {
        match self.platform {
            Platform::Serverless { .. } => "serverless",
            Platform::Persistent => "persistent",
        }
    }

    /// `production` or `development`.
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        if self.production {
            "production"
        } else {
            "development"
        }
    }

    /// Directory for request-scoped temporary files.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

impl Default for DeploymentEnvironment {
    fn default() -> Self {
        Self::persistent()
    }
}
