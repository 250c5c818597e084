//! Merge Prisma schema fragments into one schema file.
//!
//! A schema can be authored as several partial files that declare and extend
//! the same models. This crate loads each fragment, recovers the attributes
//! the structural parser does not report, merges the fragments and writes the
//! rendered result:
//!
//! - [`scan_schema`]: attribute recovery from raw text (`@map`, `@db.*`,
//!   `onUpdate`, `@@index`).
//! - [`SchemaLoader`]: structural parse plus recovered-attribute overlay.
//! - [`mix_schemas`]: precedence rules across fragments.
//! - [`Mixer`]: glob resolution, loading, rendering and writing per job.
//! - [`PrismixConfig`]: the `prismix.config.json` document.
//!
//! # Example
//!
//! ```
//! use prismix::{SchemaLoader, PslParser, mix_schemas};
//! use prismix_core::render_schema;
//!
//! let loader = SchemaLoader::new(PslParser::new());
//! let alias = loader.load_source("model User {\n  id Int @id\n}\n").unwrap();
//! let full = loader
//!     .load_source("model User {\n  id Int @id\n  name String @map(\"user_name\")\n}\n")
//!     .unwrap();
//!
//! let text = render_schema(&mix_schemas(vec![alias, full])).unwrap();
//! assert!(text.contains("\tname String @map(\"user_name\")\n"));
//! ```

mod config;
mod error;
mod loader;
mod mix;
mod scan;

pub use config::{DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT, MixJob, PrismixConfig};
pub use error::{ConfigError, LoadError, MixError, ParserError, Result};
pub use loader::{SchemaLoader, overlay};
pub use mix::{JobOutcome, MixReport, Mixer, SkippedFragment, mix_schemas};
pub use prismix_parser::PslParser;
pub use scan::{RecoveredAttributes, RecoveredModel, scan_schema};
