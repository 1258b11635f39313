pub mod category;
pub mod normalize;

use std::path::Path;

use anyhow::{Context, Result};
use compact_str::CompactString;
use serde::Deserialize;

/// Raw entity record as delivered by the upstream data source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    /// Organization name
    pub name: CompactString,
    /// Upstream category tag (see `category::categorize_tag`)
    pub category: CompactString,
    /// BTC held
    #[serde(default)]
    pub holdings: f64,
    /// Share of the total BTC supply in percent. Derived from holdings when absent.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// USD value of the holdings. Derived from holdings × BTC price when absent.
    #[serde(default)]
    pub usd_value: Option<f64>,
    #[serde(default)]
    pub ticker: Option<CompactString>,
    #[serde(default)]
    pub identifier: Option<CompactString>,
    /// Country flag or emoji shown next to the name
    #[serde(default)]
    pub flag: Option<CompactString>,
}

impl RawEntity {
    pub fn new(name: &str, category: &str, holdings: f64) -> Self {
        Self {
            name: CompactString::new(name),
            category: CompactString::new(category),
            holdings,
            ..Default::default()
        }
    }
}

/// Parse a JSON array of entities.
pub fn parse_entities(json: &str) -> Result<Vec<RawEntity>> {
    let entities: Vec<RawEntity> =
        serde_json::from_str(json).context("Entity list is not a JSON array of entities")?;
    tracing::debug!("Parsed {} entities", entities.len());
    Ok(entities)
}

/// Load a JSON array of entities from disk.
pub fn load_entities(path: &Path) -> Result<Vec<RawEntity>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entities =
        parse_entities(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded {} entities from {}", entities.len(), path.display());
    Ok(entities)
}
