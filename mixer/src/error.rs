//! Error types for loading fragments and running mix jobs.
//!
//! Fragment failures ([`LoadError`]) are reported and skipped by the mixer.
//! Job failures ([`MixError`]) abort one job; configuration failures
//! ([`ConfigError`]) abort the run.

use std::path::PathBuf;

use prismix_core::RenderError;
use thiserror::Error;

/// Boxed error of the underlying [`SchemaParser`](prismix_core::SchemaParser).
pub type ParserError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading one schema fragment.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The fragment could not be read.
    #[error("failed to read schema at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parser rejected the fragment.
    #[error("failed to parse schema at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },
}

impl LoadError {
    /// Path of the fragment that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Errors that fail a single mix job.
#[derive(Debug, Error)]
pub enum MixError {
    /// An input pattern is not a valid glob.
    #[error("invalid input pattern \"{pattern}\": {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The merged schema could not be rendered; nothing was written.
    #[error("failed to render {}: {source}", output.display())]
    Render {
        output: PathBuf,
        #[source]
        source: RenderError,
    },

    /// The output file could not be written.
    #[error("failed to write {}: {source}", output.display())]
    Write {
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading `prismix.config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failure.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`MixError`].
pub type Result<T> = std::result::Result<T, MixError>;
