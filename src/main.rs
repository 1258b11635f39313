use std::path::PathBuf;

use anyhow::{Context, Result};

use holdmap_rs::entity::load_entities;
use holdmap_rs::{layout, LayoutConfig, Metric};

/// Lay out an entity list and print the result as JSON.
///
/// Usage: holdmap <entities.json> [metric] [width] [height]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("holdmap_rs=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .context("usage: holdmap <entities.json> [metric] [width] [height]")?;
    let metric: Metric = match args.next() {
        Some(arg) => arg.parse()?,
        None => Metric::default(),
    };
    // Narrower containers are measured as 320 px by the dashboard.
    let width = parse_dimension(args.next(), 1200.0)
        .context("Invalid width")?
        .max(320.0);
    let height = parse_dimension(args.next(), 700.0).context("Invalid height")?;

    let entities = load_entities(&path)?;
    let config = LayoutConfig::default();
    let result = layout(&entities, metric, width, height, &config);

    if result.is_empty() {
        tracing::warn!("No entity has a positive {} value; layout is empty", metric);
    } else {
        tracing::info!(
            "{} items in {} sections ({:?} viewport, {}x{})",
            result.item_count(),
            result.sections.len(),
            result.viewport,
            width,
            height
        );
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn parse_dimension(arg: Option<String>, default: f64) -> Result<f64> {
    let value = match arg {
        Some(s) => s.parse::<f64>().with_context(|| format!("'{}' is not a number", s))?,
        None => default,
    };
    if !value.is_finite() || value <= 0.0 {
        anyhow::bail!("dimension must be a positive number, got {}", value);
    }
    Ok(value)
}
