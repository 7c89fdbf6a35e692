//! Query the inference API directly, without a config file.
//!
//! HF_API_TOKEN=hf_... cargo run --example direct_run -- data/bike/1/ride.jpg
use anyhow::{Context, Result};

use hosted_inference::{DEFAULT_ENDPOINT, count_label, infer, init_logger};

fn main() -> Result<()> {
    init_logger();

    let token = std::env::var("HF_API_TOKEN").context("HF_API_TOKEN is not set")?;
    let image = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/000000039769.jpeg".to_string());

    let data = infer(&image, DEFAULT_ENDPOINT, &token)?;
    println!("{}", data);

    // a second request, counting is independent of the call above
    let count = count_label(&image, DEFAULT_ENDPOINT, &token, "bicycle")?;
    println!("{}", count);

    Ok(())
}
