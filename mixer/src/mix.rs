//! Mix job execution.
//!
//! A job resolves its input globs, loads every fragment, folds the fragments
//! into one [`Schema`] with [`mix_schemas`], renders it and writes the output
//! file. Fragments that fail to load are logged and skipped; a job that fails
//! does not stop the jobs after it.

use std::path::{Path, PathBuf};

use prismix_core::{Schema, SchemaParser, merge_models, render_schema};
use tracing::{debug, info, warn};

use crate::config::{MixJob, PrismixConfig};
use crate::error::{LoadError, MixError, Result};
use crate::loader::SchemaLoader;

/// Folds per-fragment schemas into one, in fragment order.
///
/// - Models are merged by name with [`merge_models`].
/// - Enums are concatenated.
/// - Datasources come from the last fragment that has a datasource with a
///   concrete url.
/// - Generators come from the last fragment that declares any generator.
///
/// # Examples
///
/// ```
/// use prismix::mix_schemas;
/// use prismix_core::{Generator, Schema};
///
/// let a = Schema { generators: vec![Generator::new("a", "prisma-client-js")], ..Schema::default() };
/// let b = Schema::default();
/// let c = Schema { generators: vec![Generator::new("c", "prisma-client-go")], ..Schema::default() };
///
/// let mixed = mix_schemas(vec![a, b, c]);
/// assert_eq!(mixed.generators.len(), 1);
/// assert_eq!(mixed.generators[0].name, "c");
/// ```
pub fn mix_schemas(schemas: Vec<Schema>) -> Schema {
    let mut models = Vec::new();
    let mut mixed = Schema::default();

    for schema in schemas {
        if schema.has_concrete_datasource() {
            mixed.datasources = schema.datasources;
        }
        if !schema.generators.is_empty() {
            mixed.generators = schema.generators;
        }
        mixed.enums.extend(schema.enums);
        models.extend(schema.models);
    }

    mixed.models = merge_models(models);
    mixed
}

/// A fragment left out of a job because it failed to load.
#[derive(Debug)]
pub struct SkippedFragment {
    pub path: PathBuf,
    pub error: LoadError,
}

/// Result of a successful job.
#[derive(Debug)]
pub struct JobOutcome {
    /// Path the merged schema was written to.
    pub output: PathBuf,
    /// Number of fragments that loaded and took part in the merge.
    pub fragments: usize,
    /// Number of models in the merged schema.
    pub models: usize,
    /// Number of enums in the merged schema.
    pub enums: usize,
    pub skipped: Vec<SkippedFragment>,
}

/// Per-job results of [`Mixer::run`], in job order.
#[derive(Debug, Default)]
pub struct MixReport {
    pub jobs: Vec<std::result::Result<JobOutcome, MixError>>,
}

impl MixReport {
    /// Returns `true` if every job wrote its output.
    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(|job| job.is_ok())
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &JobOutcome> {
        self.jobs.iter().filter_map(|job| job.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &MixError> {
        self.jobs.iter().filter_map(|job| job.as_ref().err())
    }
}

/// Runs mix jobs against a base directory.
///
/// Relative input patterns and output paths resolve against the base
/// directory, which defaults to the current directory.
///
/// # Examples
///
/// ```no_run
/// use prismix::{Mixer, PrismixConfig};
/// use prismix_parser::PslParser;
///
/// let config = PrismixConfig::load("prismix.config.json").unwrap();
/// let report = Mixer::new(PslParser::new()).run(&config);
/// for outcome in report.outcomes() {
///     println!("wrote {}", outcome.output.display());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Mixer<P> {
    loader: SchemaLoader<P>,
    base_dir: PathBuf,
}

impl<P: SchemaParser> Mixer<P> {
    pub fn new(parser: P) -> Self {
        Self {
            loader: SchemaLoader::new(parser),
            base_dir: PathBuf::from("."),
        }
    }

    /// Sets the directory relative paths resolve against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Executes every job of `config` in order.
    pub fn run(&self, config: &PrismixConfig) -> MixReport {
        let mut report = MixReport::default();
        for job in &config.mixers {
            let result = self.run_job(job);
            if let Err(err) = &result {
                warn!(output = %job.output.display(), error = %err, "Mix job failed");
            }
            report.jobs.push(result);
        }
        report
    }

    /// Executes one job: resolve inputs, load, mix, render, write.
    ///
    /// # Errors
    ///
    /// Returns [`MixError::Glob`] for a malformed input pattern,
    /// [`MixError::Render`] if the merged schema cannot be rendered (nothing
    /// is written), or [`MixError::Write`] if the output cannot be written.
    pub fn run_job(&self, job: &MixJob) -> Result<JobOutcome> {
        let output = self.base_dir.join(&job.output);
        info!(output = %output.display(), patterns = job.input.len(), "Mixing schemas");

        let mut schemas = Vec::new();
        let mut skipped = Vec::new();
        for path in self.resolve_inputs(job)? {
            match self.loader.load(&path) {
                Ok(schema) => schemas.push(schema),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Skipping schema fragment");
                    skipped.push(SkippedFragment { path, error });
                }
            }
        }

        let fragments = schemas.len();
        let mixed = mix_schemas(schemas);
        let text = render_schema(&mixed).map_err(|source| MixError::Render {
            output: output.clone(),
            source,
        })?;
        write_output(&output, &text)?;

        info!(
            output = %output.display(),
            fragments,
            skipped = skipped.len(),
            models = mixed.models.len(),
            "Wrote merged schema"
        );
        Ok(JobOutcome {
            output,
            fragments,
            models: mixed.models.len(),
            enums: mixed.enums.len(),
            skipped,
        })
    }

    /// Expands the job's patterns in order; matches of one pattern are
    /// sorted.
    fn resolve_inputs(&self, job: &MixJob) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for pattern in &job.input {
            // the base directory is literal text, only the user pattern globs
            let base = glob::Pattern::escape(&self.base_dir.to_string_lossy());
            let full = Path::new(&base).join(pattern);
            let full = full.to_string_lossy();
            let entries = glob::glob(&full).map_err(|source| MixError::Glob {
                pattern: pattern.clone(),
                source,
            })?;

            let mut matched: Vec<PathBuf> = entries
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(err) => {
                        warn!(pattern = %pattern, error = %err, "Unreadable input path");
                        None
                    }
                })
                .filter(|path| path.is_file())
                .collect();
            matched.sort();

            if matched.is_empty() {
                warn!(pattern = %pattern, "Input pattern matched no files");
            }
            debug!(pattern = %pattern, matches = matched.len(), "Resolved input pattern");
            paths.extend(matched);
        }
        Ok(paths)
    }
}

fn write_output(output: &Path, text: &str) -> Result<()> {
    let write_error = |source| MixError::Write {
        output: output.to_path_buf(),
        source,
    };
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
    }
    std::fs::write(output, text).map_err(write_error)
}
