use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfluencerId(pub String);

impl InfluencerId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// The five canonical reach tiers, smallest to largest.
pub const TIER_NAMES: [&str; 5] = ["nano", "micro", "mid", "macro", "mega"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub location: Option<String>,
    pub tier: Option<String>,
    pub genre: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price_cents: i64,
    pub currency: String,
    pub booking_type: String,
}

/// A marketing contact as loaded from the entity store: the base row plus its
/// one-to-one profile and all price points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Influencer {
    pub id: InfluencerId,
    pub name: String,
    pub gender: Option<String>,
    pub profile: Profile,
    pub price_points: Vec<PricePoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Influencer {
    /// Minimum price across all price points, in minor units. Zero when the
    /// influencer has no price points at all.
    pub fn min_price_cents(&self) -> i64 {
        self.price_points.iter().map(|p| p.price_cents).min().unwrap_or(0)
    }
}
