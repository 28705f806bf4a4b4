//! VSP-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, VesperError>;

/// Top-level error type for the Vesper portal.
#[derive(Debug, Error)]
pub enum VesperError {
    #[error("[VSP-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[VSP-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[VSP-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[VSP-2001] cannot open alert store at {path}: {details}")]
    Connection { path: PathBuf, details: String },

    #[error("[VSP-2002] query failure in {context}: {details}")]
    Query {
        context: &'static str,
        details: String,
    },

    #[error("[VSP-2003] storage write failure in {context}: {details}")]
    Storage {
        context: &'static str,
        details: String,
    },

    #[error("[VSP-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[VSP-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[VSP-3002] terminal failure: {source}")]
    Terminal {
        #[source]
        source: std::io::Error,
    },
}

impl VesperError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "VSP-1001",
            Self::MissingConfig { .. } => "VSP-1002",
            Self::ConfigParse { .. } => "VSP-1003",
            Self::Connection { .. } => "VSP-2001",
            Self::Query { .. } => "VSP-2002",
            Self::Storage { .. } => "VSP-2003",
            Self::Serialization { .. } => "VSP-2101",
            Self::Io { .. } => "VSP-3001",
            Self::Terminal { .. } => "VSP-3002",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Query { .. } | Self::Storage { .. } | Self::Io { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap a read failure with the operation that produced it.
    #[must_use]
    pub fn query(context: &'static str, details: impl ToString) -> Self {
        Self::Query {
            context,
            details: details.to_string(),
        }
    }

    /// Wrap a write failure with the operation that produced it.
    #[must_use]
    pub fn storage(context: &'static str, details: impl ToString) -> Self {
        Self::Storage {
            context,
            details: details.to_string(),
        }
    }
}

impl From<serde_json::Error> for VesperError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for VesperError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
