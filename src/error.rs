//! Error kinds surfaced by the digest core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    /// A weight, threshold or limit is missing or outside its valid range.
    /// Fatal: the run stops before any scoring.
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    /// No headlines were fetched for any topic. Callers map this to an
    /// empty digest.
    #[error("no headlines fetched for any topic")]
    EmptyInput,

    /// History file exists but cannot be read or parsed.
    #[error("history at {} is unreadable: {reason}", path.display())]
    CorruptHistory { path: PathBuf, reason: String },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DigestError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for kinds the pipeline recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::CorruptHistory { .. })
    }
}
