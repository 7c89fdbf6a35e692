use indicatif::{ProgressFinish, ProgressIterator};
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;
use std::str::FromStr;
use std::time::Instant;
use strum::{Display, EnumString, VariantNames};

use crate::client::{InferenceArgs, InferenceClient};
use crate::error::{AppError, Result};
use crate::prediction::count_matching;
use crate::progress_bar::progress_bar_style;
use crate::source::{Source, SourceLoader, SourceMeta, deserialize_source};

// -- enums

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, VariantNames)]
/// How raw responses are written to stdout
pub enum PrintFormat {
    /// Single-line JSON
    #[default]
    #[strum(serialize = "Compact")]
    Compact,

    /// Indented JSON
    #[strum(serialize = "Pretty")]
    Pretty,
}

impl PrintFormat {
    pub fn render(&self, value: &Value) -> Result<String> {
        let rendered = match self {
            PrintFormat::Compact => serde_json::to_string(value)?,
            PrintFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        Ok(rendered)
    }
}

/// Custom deserializer with helpful error message
pub fn deserialize_print_format<'de, D>(deserializer: D) -> Result<PrintFormat, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    PrintFormat::from_str(&value).map_err(|_| {
        let variants = PrintFormat::VARIANTS;
        serde::de::Error::invalid_value(
            serde::de::Unexpected::Str(&value),
            &format!("one of {}", variants.join(", ")).as_str(),
        )
    })
}

// -- config

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CountArgs {
    /// Input source (image, directory or list of images)
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Source,

    /// Label to count, compared exactly
    pub label: String,

    /// Count on the response already printed instead of asking the service again
    pub reuse_predictions: bool,

    /// Output format for raw responses
    #[serde(default, deserialize_with = "deserialize_print_format")]
    pub print_format: PrintFormat,

    /// Show verbose output
    pub verbose: bool,

    /// Connection settings, filled from the `[inference]` table
    #[serde(skip)]
    pub inference: InferenceArgs,
}

impl Default for CountArgs {
    fn default() -> Self {
        Self {
            source: Default::default(),
            label: "bicycle".to_string(),
            reuse_predictions: false,
            print_format: Default::default(),
            verbose: false,
            inference: Default::default(),
        }
    }
}

// -- report

/// Label count for one frame
#[derive(Debug, Clone)]
pub struct FrameCount {
    pub meta: SourceMeta,
    pub count: usize,
}

/// Outcome of a counting run
#[derive(Debug, Clone, Default)]
pub struct CountReport {
    pub label: String,
    pub frames: Vec<FrameCount>,
    /// Frames that failed and were left out of `frames`
    pub skipped: usize,
}

impl CountReport {
    pub fn total(&self) -> usize {
        self.frames.iter().map(|f| f.count).sum()
    }
}

// -- public API

/// Run inference and label counting over `args.source`, writing to stdout.
pub fn run_count(args: &CountArgs) -> Result<CountReport> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_count_to(args, &mut out)
}

/// Run inference and label counting, writing raw responses and counts to `out`.
///
/// A single-image source propagates its first error. In a batch, a failing frame is
/// logged and skipped.
pub fn run_count_to<W: Write>(args: &CountArgs, out: &mut W) -> Result<CountReport> {
    let start_time = Instant::now();

    if args.source.is_none() {
        return Err(AppError::Config("no source configured".to_string()));
    }
    let client = InferenceClient::new(args.inference.clone())?;

    tracing::info!("Counting '{}' via {}", args.label, args.inference.endpoint);
    tracing::info!("[Source]: {:?}", args.source);

    let loader = SourceLoader::new(&args.source)?;
    let total_frames = loader.len();
    let batch = args.source.is_batch();
    tracing::info!("Total frames to process: {}", total_frames);

    let mut report = CountReport {
        label: args.label.clone(),
        frames: Vec::with_capacity(total_frames),
        skipped: 0,
    };

    for (payload, meta) in loader
        .progress_with_style(progress_bar_style())
        .with_message("Running inference")
        .with_finish(ProgressFinish::WithMessage("Finished".into()))
    {
        if args.verbose {
            tracing::debug!("Processing: {}", meta.frame_name());
        }

        match count_frame(&client, args, payload, &meta, batch, out) {
            Ok(count) => report.frames.push(FrameCount { meta, count }),
            Err(e) if batch => {
                tracing::error!(
                    "Counting failed for frame: {}, skipping. Error: {}",
                    meta.frame_name(),
                    e
                );
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if batch {
        writeln!(out, "total {}: {}", report.label, report.total())?;
        if report.skipped > 0 {
            tracing::warn!("{} of {} frames skipped", report.skipped, total_frames);
        }
    }

    let duration = start_time.elapsed();
    tracing::info!("Total counting time: {:.3?}", duration);

    Ok(report)
}

fn count_frame<W: Write>(
    client: &InferenceClient,
    args: &CountArgs,
    payload: Result<Vec<u8>>,
    meta: &SourceMeta,
    batch: bool,
    out: &mut W,
) -> Result<usize> {
    let payload = payload?;

    let value = client.infer_bytes(payload.clone())?;

    if batch {
        writeln!(out, "== {}", meta.frame_name())?;
    }
    writeln!(out, "{}", args.print_format.render(&value)?)?;

    // without reuse the image goes to the service a second time
    let count = if args.reuse_predictions {
        count_matching(&value, &args.label)?
    } else {
        count_matching(&client.infer_bytes(payload)?, &args.label)?
    };
    writeln!(out, "{}", count)?;

    Ok(count)
}

// -- tests
