use serde::{Deserialize, Serialize};

/// Raw extraction output as the generation service returns it. Every field is
/// optional and untrusted; `validate` is the only way to turn this into a
/// filter the query layer will accept.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawFilter {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub influencer_name: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_destructive: Option<bool>,
}

/// Validated search parameters. All clauses optional; an all-`None` filter
/// matches every row up to the page cap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub max_price_cents: Option<i64>,
    pub name: Option<String>,
    pub tier: Option<String>,
    pub genre: Option<String>,
    pub location: Option<String>,
    pub destructive: bool,
}

impl SearchFilter {
    /// The unfiltered fallback used whenever extraction fails.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.max_price_cents.is_none()
            && self.name.is_none()
            && self.tier.is_none()
            && self.genre.is_none()
            && self.location.is_none()
    }

    /// The same filter with the destructive flag stripped. Target resolution
    /// for the approval gate must not let the flag influence the predicate.
    pub fn without_destructive(&self) -> Self {
        Self { destructive: false, ..self.clone() }
    }
}

impl RawFilter {
    /// Strict post-parse validation. Blank strings and non-positive or
    /// non-finite prices are dropped rather than rejected; the price ceiling
    /// is converted to minor units by truncating multiplication by 100.
    pub fn validate(self) -> SearchFilter {
        SearchFilter {
            max_price_cents: self
                .price
                .filter(|price| price.is_finite() && *price > 0.0)
                .map(|price| (price * 100.0).trunc() as i64),
            name: normalize(self.influencer_name),
            tier: normalize(self.tier),
            genre: normalize(self.genre),
            location: normalize(self.location),
            destructive: self.is_destructive.unwrap_or(false),
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Bounded samples of known vocabulary used to ground extraction prompts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabulary {
    pub genres: Vec<String>,
    pub tiers: Vec<String>,
    pub locations: Vec<String>,
    pub locations_truncated: bool,
}

/// Distinct-location sample cap for extraction prompts.
pub const LOCATION_SAMPLE_CAP: usize = 20;

impl Vocabulary {
    pub fn genre_list(&self) -> String {
        self.genres.join(", ")
    }

    pub fn tier_list(&self) -> String {
        self.tiers.join(", ")
    }

    pub fn location_list(&self) -> String {
        let list = self.locations.join(", ");
        if self.locations_truncated {
            format!("{list}...")
        } else {
            list
        }
    }
}
