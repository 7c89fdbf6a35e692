mod client;
mod count;
mod error;
mod logging;
mod prediction;
mod progress_bar;
mod source;
mod toml_utils;

pub use error::{AppError, Result};
pub use logging::init_logger;
pub use prediction::{BoundingBox, Prediction, count_matching, count_predictions, parse_predictions};
pub use progress_bar::progress_bar_style;
pub use source::{Source, SourceLoader, SourceMeta, encode_png};
pub use toml_utils::parse_toml;

// Core inference API
pub use client::{DEFAULT_ENDPOINT, InferenceArgs, InferenceClient, count_label, infer};

// Batch counting
pub use count::{CountArgs, CountReport, FrameCount, PrintFormat, run_count, run_count_to};
