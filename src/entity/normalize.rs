use std::fmt;
use std::str::FromStr;

use compact_str::{format_compact, CompactString};
use serde::{Deserialize, Serialize};

use super::category::{categorize_tag, Category};
use super::RawEntity;
use crate::layout::viewport::ViewportClass;
use crate::layout::{LayoutConfig, Rect};

/// Total BTC supply cap, used to derive supply percentages.
pub const BTC_SUPPLY: f64 = 21_000_000.0;

/// Which entity field drives rectangle weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Holdings,
    Percentage,
    Value,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Holdings, Metric::Percentage, Metric::Value];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Holdings => "holdings",
            Metric::Percentage => "percentage",
            Metric::Value => "value",
        }
    }

    /// Raw metric value for an entity, before filtering.
    pub fn value_of(self, entity: &RawEntity, btc_price_usd: f64) -> f64 {
        match self {
            Metric::Holdings => entity.holdings,
            Metric::Percentage => entity
                .percentage
                .unwrap_or(entity.holdings / BTC_SUPPLY * 100.0),
            Metric::Value => entity.usd_value.unwrap_or(entity.holdings * btc_price_usd),
        }
    }

    /// Pre-formatted label for a metric value.
    pub fn format(self, value: f64) -> CompactString {
        match self {
            Metric::Holdings => format_btc(value),
            Metric::Percentage => format_compact!("{:.4}%", value),
            Metric::Value => format_usd(value),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "holdings" | "btc" => Ok(Metric::Holdings),
            "percentage" | "percent" | "supply" => Ok(Metric::Percentage),
            "value" | "usd" => Ok(Metric::Value),
            other => anyhow::bail!(
                "Unknown metric '{}' (expected holdings, percentage or value)",
                other
            ),
        }
    }
}

/// One visualized entity. `rect` is zero until the packer places it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutItem {
    pub name: CompactString,
    /// Strictly positive
    pub weight: f64,
    pub category: Category,
    pub display_value: CompactString,
    pub ticker: Option<CompactString>,
    pub identifier: Option<CompactString>,
    pub flag: Option<CompactString>,
    #[serde(flatten)]
    pub rect: Rect,
}

impl LayoutItem {
    pub fn new(name: &str, weight: f64, category: Category) -> Self {
        Self {
            name: CompactString::new(name),
            weight,
            category,
            display_value: CompactString::default(),
            ticker: None,
            identifier: None,
            flag: None,
            rect: Rect::default(),
        }
    }

    /// Whether the placed rectangle is large enough to carry a text label.
    pub fn label_fits(&self, viewport: ViewportClass) -> bool {
        let (min_w, min_h) = viewport.label_min_size();
        self.rect.w >= min_w && self.rect.h >= min_h
    }
}

/// Convert raw entities into weighted layout items for `metric`.
///
/// Entities with a non-finite or non-positive metric value, or an unknown
/// category tag, are dropped. The result is sorted by weight, descending;
/// equal weights keep their input order.
pub fn normalize(entities: &[RawEntity], metric: Metric, config: &LayoutConfig) -> Vec<LayoutItem> {
    let mut items = Vec::with_capacity(entities.len());
    let mut dropped = 0usize;

    for entity in entities {
        let value = metric.value_of(entity, config.btc_price_usd);
        if !value.is_finite() || value <= 0.0 {
            dropped += 1;
            continue;
        }

        let Some(category) = categorize_tag(&entity.category) else {
            tracing::warn!(
                "Skipping '{}': unknown category tag '{}'",
                entity.name,
                entity.category
            );
            dropped += 1;
            continue;
        };

        items.push(LayoutItem {
            name: entity.name.clone(),
            weight: value.max(f64::MIN_POSITIVE),
            category,
            display_value: metric.format(value),
            ticker: entity.ticker.clone(),
            identifier: entity.identifier.clone(),
            flag: entity.flag.clone(),
            rect: Rect::default(),
        });
    }

    items.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    tracing::debug!(
        "Normalized {} entities by {}: {} items kept, {} dropped",
        entities.len(),
        metric,
        items.len(),
        dropped
    );

    items
}

/// Integer BTC count with thousands separators, e.g. `12,345 BTC`.
pub fn format_btc(btc: f64) -> CompactString {
    let whole = btc.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = CompactString::default();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push_str(" BTC");
    out
}

/// USD amount with a K/M/B suffix and two decimals.
pub fn format_usd(usd: f64) -> CompactString {
    const K: f64 = 1_000.0;
    const M: f64 = 1_000.0 * K;
    const B: f64 = 1_000.0 * M;

    if usd >= B {
        format_compact!("${:.2}B", usd / B)
    } else if usd >= M {
        format_compact!("${:.2}M", usd / M)
    } else if usd >= K {
        format_compact!("${:.2}K", usd / K)
    } else {
        format_compact!("${:.2}", usd)
    }
}
