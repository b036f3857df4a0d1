//! Storage tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where an attachment's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTier {
    /// File under the uploads directory. Durable only on persistent hosts.
    LocalFile,
    /// Base64 text embedded in the descriptor.
    InlineContent,
    /// Base64 text in a separate overflow document.
    OverflowDocument,
    /// Object held by an external provider.
    ExternalObject,
    /// Nothing retained; only the metadata survives.
    MetadataOnly,
}

impl StorageTier {
    /// Wire name of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalFile => "local_file",
            Self::InlineContent => "inline_content",
            Self::OverflowDocument => "overflow_document",
            Self::ExternalObject => "external_object",
            Self::MetadataOnly => "metadata_only",
        }
    }

    /// True for every tier except `metadata_only`.
    #[must_use]
    pub const fn holds_content(self) -> bool {
        !matches!(self, Self::MetadataOnly)
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local_file" => Ok(Self::LocalFile),
            "inline_content" => Ok(Self::InlineContent),
            "overflow_document" => Ok(Self::OverflowDocument),
            "external_object" => Ok(Self::ExternalObject),
            "metadata_only" => Ok(Self::MetadataOnly),
            other => Err(format!("unknown storage tier: {other}")),
        }
    }
}
