use serde::{Deserialize, Serialize};

/// Organization categories tracked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Publicly traded companies
    Public,
    /// Private companies
    Private,
    /// Nation states and public treasuries
    Government,
    /// DeFi protocols and wrapped-BTC custodians
    Defi,
    /// Exchanges and custodians
    Exchange,
    /// Exchange-traded funds and trusts
    Etf,
}

/// Placement tier for the multi-category grid. Lower tiers get the larger,
/// dedicated regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Left column
    Anchor,
    /// Top of the right column
    Feature,
    /// Cells of the bottom-right grid
    Grid,
}

/// Category → tier table. Categories not listed fall into `Tier::Grid`.
const TIERS: &[(Category, Tier)] = &[
    (Category::Public, Tier::Anchor),
    (Category::Etf, Tier::Feature),
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Public,
        Category::Private,
        Category::Government,
        Category::Defi,
        Category::Exchange,
        Category::Etf,
    ];

    pub fn tier(self) -> Tier {
        TIERS
            .iter()
            .find(|(c, _)| *c == self)
            .map(|&(_, t)| t)
            .unwrap_or(Tier::Grid)
    }

    /// Section header text.
    pub fn label(self) -> &'static str {
        match self {
            Category::Public => "Public Companies",
            Category::Private => "Private Companies",
            Category::Government => "Governments",
            Category::Defi => "DeFi",
            Category::Exchange => "Exchanges",
            Category::Etf => "ETFs",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Public => "public",
            Category::Private => "private",
            Category::Government => "government",
            Category::Defi => "defi",
            Category::Exchange => "exchange",
            Category::Etf => "etf",
        }
    }
}

/// Classify an upstream category tag. Returns `None` for tags outside the
/// tracked set.
pub fn categorize_tag(tag: &str) -> Option<Category> {
    let norm = tag.trim().to_ascii_lowercase().replace(['-', '_'], " ");
    let category = match norm.as_str() {
        "public" | "public company" | "public companies" | "listed" => Category::Public,

        "private" | "private company" | "private companies" => Category::Private,

        "government" | "governments" | "country" | "countries" | "nation" | "state" => {
            Category::Government
        }

        "defi" | "dex" | "protocol" | "wrapped" | "bridge" => Category::Defi,

        "exchange" | "exchanges" | "custodian" | "cex" => Category::Exchange,

        "etf" | "etfs" | "fund" | "funds" | "etp" | "trust" => Category::Etf,

        _ => return None,
    };
    Some(category)
}
