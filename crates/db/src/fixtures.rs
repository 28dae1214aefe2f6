//! Deterministic seed dataset for local development and end-to-end runs.
//!
//! The distribution mirrors real roster shapes: five audience tiers with
//! tier-correlated price ranges, ten content genres, and one to three price
//! points per influencer.

use chrono::{TimeZone, Utc};

use roster_core::domain::influencer::{
    Influencer, InfluencerId, PricePoint, Profile, TIER_NAMES,
};

use crate::repositories::{InfluencerRepository, RepositoryError, SqlInfluencerRepository};
use crate::DbPool;

const SEED_GENRES: &[&str] = &[
    "pop", "hiphop", "rock", "electronic", "country", "gaming", "beauty", "fitness", "comedy",
    "tech",
];

const SEED_LOCATIONS: &[&str] = &[
    "Los Angeles, USA",
    "New York, USA",
    "London, UK",
    "Tokyo, Japan",
    "Seoul, South Korea",
    "Berlin, Germany",
    "Sao Paulo, Brazil",
    "Sydney, Australia",
];

const SEED_FIRST_NAMES: &[&str] =
    &["Aiko", "Bruno", "Carla", "Dmitri", "Elena", "Farid", "Grace", "Hana"];

const SEED_LAST_NAMES: &[&str] = &["Sato", "Silva", "Mendes", "Volkov", "Park"];

const SEED_BOOKING_TYPES: &[&str] = &["post", "story", "video"];

/// Inclusive price range per tier, in minor currency units.
const TIER_PRICE_RANGES_CENTS: &[(i64, i64)] = &[
    (5_000, 20_000),         // nano
    (20_000, 100_000),       // micro
    (100_000, 500_000),      // mid
    (500_000, 2_000_000),    // macro
    (2_000_000, 10_000_000), // mega
];

const INFLUENCERS_PER_TIER: usize = 8;

/// Deterministic roster seed: 40 influencers, 8 per tier.
pub struct SeedDataset;

#[derive(Debug)]
pub struct SeedResult {
    pub influencers_seeded: usize,
    pub tiers_seeded: usize,
    pub genres_seeded: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl SeedDataset {
    pub fn influencers() -> Vec<Influencer> {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).single().unwrap_or_default();

        let mut influencers = Vec::with_capacity(TIER_NAMES.len() * INFLUENCERS_PER_TIER);
        for (tier_index, tier) in TIER_NAMES.iter().enumerate() {
            let (min_cents, max_cents) = TIER_PRICE_RANGES_CENTS[tier_index];
            for slot in 0..INFLUENCERS_PER_TIER {
                let ordinal = tier_index * INFLUENCERS_PER_TIER + slot;
                let first = SEED_FIRST_NAMES[ordinal % SEED_FIRST_NAMES.len()];
                let last = SEED_LAST_NAMES[ordinal % SEED_LAST_NAMES.len()];
                let genre = SEED_GENRES[ordinal % SEED_GENRES.len()];
                let location = SEED_LOCATIONS[ordinal % SEED_LOCATIONS.len()];

                let price_point_count = 1 + ordinal % 3;
                let span = max_cents - min_cents;
                let price_points = (0..price_point_count)
                    .map(|point_index| PricePoint {
                        price_cents: min_cents
                            + span * (point_index as i64 + 1) / (price_point_count as i64 + 1),
                        currency: "USD".to_string(),
                        booking_type: SEED_BOOKING_TYPES[point_index % SEED_BOOKING_TYPES.len()]
                            .to_string(),
                    })
                    .collect();

                influencers.push(Influencer {
                    id: InfluencerId(format!("seed-{tier}-{slot:02}")),
                    name: format!("{first} {last} {:02}", ordinal),
                    gender: None,
                    profile: Profile {
                        location: Some(location.to_string()),
                        tier: Some(tier.to_string()),
                        genre: Some(genre.to_string()),
                    },
                    price_points,
                    created_at,
                    updated_at: created_at,
                });
            }
        }
        influencers
    }

    /// Load the seed dataset. Idempotent: previously seeded rows are replaced.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let repository = SqlInfluencerRepository::new(pool.clone());
        let influencers = Self::influencers();

        for influencer in &influencers {
            repository.delete(&influencer.id).await?;
        }
        for influencer in influencers.iter().cloned() {
            repository.insert(influencer).await?;
        }

        Ok(SeedResult {
            influencers_seeded: influencers.len(),
            tiers_seeded: TIER_NAMES.len(),
            genres_seeded: SEED_GENRES.len(),
        })
    }

    /// Verify the seeded rows against the dataset contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let influencer_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM influencer WHERE id LIKE 'seed-%'")
                .fetch_one(pool)
                .await?;
        checks.push((
            "influencer-count",
            influencer_count == (TIER_NAMES.len() * INFLUENCERS_PER_TIER) as i64,
        ));

        let tier_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM tier").fetch_one(pool).await?;
        checks.push(("tier-count", tier_count == TIER_NAMES.len() as i64));

        let genre_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM genre").fetch_one(pool).await?;
        checks.push(("genre-count", genre_count == SEED_GENRES.len() as i64));

        for (tier_index, tier) in TIER_NAMES.iter().enumerate() {
            let (min_cents, max_cents) = TIER_PRICE_RANGES_CENTS[tier_index];
            let out_of_range: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM price_point pp \
                 JOIN profile p ON p.influencer_id = pp.influencer_id \
                 JOIN tier t ON t.id = p.tier_id \
                 WHERE t.name = ?1 AND pp.influencer_id LIKE 'seed-%' \
                 AND (pp.price_cents < ?2 OR pp.price_cents > ?3)",
            )
            .bind(tier)
            .bind(min_cents)
            .bind(max_cents)
            .fetch_one(pool)
            .await?;
            checks.push((*tier, out_of_range == 0));
        }

        let orphan_profiles: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM profile p \
             LEFT JOIN influencer i ON i.id = p.influencer_id WHERE i.id IS NULL",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("no-orphan-profiles", orphan_profiles == 0));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}
