//! Mix job configuration.
//!
//! Loaded from a JSON file, `prismix.config.json` by default.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "mixers": [
//!     {
//!       "input": ["base.prisma", "modules/**/*.prisma"],
//!       "output": "prisma/schema.prisma"
//!     }
//!   ]
//! }
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name looked up when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "prismix.config.json";

/// Output path used when a job does not name one.
pub const DEFAULT_OUTPUT: &str = "prisma/schema.prisma";

/// One merge operation: many fragments into one output file.
///
/// # Examples
///
/// ```
/// # use prismix::MixJob;
/// let job: MixJob = serde_json::from_str(r#"{ "input": ["a.prisma"] }"#).unwrap();
/// assert_eq!(job.output.to_str(), Some("prisma/schema.prisma"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixJob {
    /// Glob patterns, resolved in order. Later matches take precedence.
    pub input: Vec<String>,
    /// Path of the merged schema.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

/// Top-level configuration document.
///
/// # Examples
///
/// ```no_run
/// use prismix::PrismixConfig;
///
/// let config = PrismixConfig::load("prismix.config.json").unwrap();
/// for job in &config.mixers {
///     println!("{} <- {:?}", job.output.display(), job.input);
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrismixConfig {
    /// Jobs, executed in order.
    pub mixers: Vec<MixJob>,
}

impl PrismixConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if parsing fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"
{
  "mixers": [
    {
      "input": ["base.prisma", "modules/*.prisma"],
      "output": "out/schema.prisma"
    },
    {
      "input": ["other/*.prisma"]
    }
  ]
}
"#
    }

    #[test]
    fn test_parse_config() {
        let config = PrismixConfig::from_json(sample_json()).unwrap();
        assert_eq!(config.mixers.len(), 2);
        assert_eq!(config.mixers[0].input, vec!["base.prisma", "modules/*.prisma"]);
        assert_eq!(config.mixers[0].output, PathBuf::from("out/schema.prisma"));
    }

    #[test]
    fn test_output_defaults() {
        let config = PrismixConfig::from_json(sample_json()).unwrap();
        assert_eq!(config.mixers[1].output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = PrismixConfig::from_json(r#"{ "mixers": [{ "output": "x" }] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PrismixConfig::load("/nonexistent/prismix.config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/prismix.config.json"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = PrismixConfig::from_json(sample_json()).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back = PrismixConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }
}
