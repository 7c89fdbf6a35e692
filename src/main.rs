//! Send images to a hosted inference endpoint, print the predictions and count a label.
//! Settings come from a TOML config (see `assets/configs/`) and can be overridden on the
//! command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use hosted_inference::{Source, init_logger, parse_toml, run_count};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, short, default_value = "assets/configs/detr-bike.toml")]
    config: PathBuf,

    /// API token (overrides `[inference].token`)
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Model endpoint URL
    #[arg(long, env = "HF_API_URL")]
    endpoint: Option<String>,

    /// Image file or directory
    #[arg(long)]
    source: Option<PathBuf>,

    /// Label to count
    #[arg(long)]
    label: Option<String>,
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    let project_root = std::env::current_dir().context("Failed to read working directory")?;
    let mut args = parse_toml(&cli.config, &project_root)
        .with_context(|| format!("Failed to parse TOML config {:?}", cli.config))?;

    if let Some(token) = cli.token {
        args.inference.token = token;
    }
    if let Some(endpoint) = cli.endpoint {
        args.inference.endpoint = endpoint;
    }
    if let Some(source) = cli.source {
        args.source = Source::from(source);
    }
    if let Some(label) = cli.label {
        args.label = label;
    }

    let report = run_count(&args).context("Failed to count labels")?;
    tracing::info!(
        "'{}' found {} times across {} frames",
        report.label,
        report.total(),
        report.frames.len()
    );

    Ok(())
}
