use std::path::PathBuf;

use clap::Parser;
use prismix::{DEFAULT_CONFIG_FILE, Mixer, PrismixConfig, PslParser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "prismix", version)]
#[command(about = "Merge Prisma schema fragments into a single schema file")]
struct Cli {
    /// Mix configuration file. Relative paths resolve against --base-dir.
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Directory that input patterns and output paths resolve against.
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config_path = cli.base_dir.join(&cli.config);
    debug!(path = %config_path.display(), "Loading mix configuration");
    let config = PrismixConfig::load(&config_path).map_err(|err| err.to_string())?;

    let report = Mixer::new(PslParser::new())
        .with_base_dir(&cli.base_dir)
        .run(&config);

    for outcome in report.outcomes() {
        println!(
            "Wrote {} ({} fragments, {} skipped)",
            outcome.output.display(),
            outcome.fragments,
            outcome.skipped.len()
        );
    }

    let failures: Vec<String> = report.failures().map(|err| err.to_string()).collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} mix jobs failed: {}",
            failures.len(),
            report.jobs.len(),
            failures.join("; ")
        ))
    }
}
