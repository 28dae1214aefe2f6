use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};

use roster_core::domain::filter::SearchFilter;
use roster_core::domain::influencer::{Influencer, InfluencerId, PricePoint, Profile, TIER_NAMES};

use super::{InfluencerRepository, RepositoryError, SEARCH_PAGE_SIZE};
use crate::DbPool;

pub struct SqlInfluencerRepository {
    pool: DbPool,
}

impl SqlInfluencerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_INFLUENCER: &str = "SELECT i.id, i.name, i.gender, i.created_at, i.updated_at, \
     p.location, t.name AS tier_name, g.name AS genre_name \
     FROM influencer i \
     LEFT JOIN profile p ON p.influencer_id = i.id \
     LEFT JOIN tier t ON t.id = p.tier_id \
     LEFT JOIN genre g ON g.id = p.genre_id";

/// Escape LIKE wildcards so user-supplied fragments match literally. The
/// pattern itself is always passed as a bound parameter, never spliced into
/// the statement text.
fn like_pattern(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{value}`: {e}")))
}

fn row_to_influencer(row: &sqlx::sqlite::SqliteRow) -> Result<Influencer, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let gender: Option<String> =
        row.try_get("gender").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let location: Option<String> =
        row.try_get("location").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tier: Option<String> =
        row.try_get("tier_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let genre: Option<String> =
        row.try_get("genre_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Influencer {
        id: InfluencerId(id),
        name,
        gender,
        profile: Profile { location, tier, genre },
        price_points: Vec::new(),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

impl SqlInfluencerRepository {
    async fn attach_price_points(
        &self,
        influencers: &mut [Influencer],
    ) -> Result<(), RepositoryError> {
        if influencers.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT influencer_id, price_cents, currency, booking_type \
             FROM price_point WHERE influencer_id IN (",
        );
        let mut separated = builder.separated(", ");
        for influencer in influencers.iter() {
            separated.push_bind(influencer.id.0.clone());
        }
        builder.push(") ORDER BY price_cents ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut by_influencer: HashMap<String, Vec<PricePoint>> = HashMap::new();
        for row in rows {
            let influencer_id: String =
                row.try_get("influencer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let price_cents: i64 =
                row.try_get("price_cents").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let currency: String =
                row.try_get("currency").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let booking_type: String =
                row.try_get("booking_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;

            by_influencer
                .entry(influencer_id)
                .or_default()
                .push(PricePoint { price_cents, currency, booking_type });
        }

        for influencer in influencers.iter_mut() {
            if let Some(points) = by_influencer.remove(&influencer.id.0) {
                influencer.price_points = points;
            }
        }

        Ok(())
    }

    async fn ensure_tier(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        name: &str,
    ) -> Result<String, RepositoryError> {
        if let Some(row) = sqlx::query("SELECT id FROM tier WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?
        {
            return row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let rank = TIER_NAMES.iter().position(|t| *t == name).map(|p| p + 1).unwrap_or(0) as i64;
        sqlx::query("INSERT INTO tier (id, name, rank) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(rank)
            .execute(&mut **tx)
            .await?;
        Ok(id)
    }

    async fn ensure_genre(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        name: &str,
    ) -> Result<String, RepositoryError> {
        if let Some(row) = sqlx::query("SELECT id FROM genre WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?
        {
            return row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO genre (id, name) VALUES (?, ?)")
            .bind(&id)
            .bind(name)
            .execute(&mut **tx)
            .await?;
        Ok(id)
    }
}

#[async_trait::async_trait]
impl InfluencerRepository for SqlInfluencerRepository {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Influencer>, RepositoryError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_INFLUENCER);
        builder.push(" WHERE 1 = 1");

        if let Some(genre) = &filter.genre {
            builder.push(" AND g.name = ");
            builder.push_bind(genre.clone());
        }
        if let Some(tier) = &filter.tier {
            builder.push(" AND t.name = ");
            builder.push_bind(tier.clone());
        }
        if let Some(location) = &filter.location {
            builder.push(" AND LOWER(p.location) LIKE ");
            builder.push_bind(like_pattern(location));
            builder.push(" ESCAPE '\\'");
        }
        if let Some(name) = &filter.name {
            builder.push(" AND LOWER(i.name) LIKE ");
            builder.push_bind(like_pattern(name));
            builder.push(" ESCAPE '\\'");
        }
        if let Some(max_price_cents) = filter.max_price_cents {
            builder.push(
                " AND EXISTS (SELECT 1 FROM price_point pp \
                 WHERE pp.influencer_id = i.id AND pp.price_cents <= ",
            );
            builder.push_bind(max_price_cents);
            builder.push(")");
        }

        builder.push(" ORDER BY i.name ASC LIMIT ");
        builder.push_bind(SEARCH_PAGE_SIZE);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut influencers =
            rows.iter().map(row_to_influencer).collect::<Result<Vec<_>, _>>()?;
        self.attach_price_points(&mut influencers).await?;
        Ok(influencers)
    }

    async fn find_by_id(&self, id: &InfluencerId) -> Result<Option<Influencer>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_INFLUENCER} WHERE i.id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => {
                let mut influencers = vec![row_to_influencer(r)?];
                self.attach_price_points(&mut influencers).await?;
                Ok(influencers.pop())
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, influencer: Influencer) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO influencer (id, name, gender, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&influencer.id.0)
        .bind(&influencer.name)
        .bind(&influencer.gender)
        .bind(influencer.created_at.to_rfc3339())
        .bind(influencer.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let tier_id = match &influencer.profile.tier {
            Some(tier) => Some(Self::ensure_tier(&mut tx, tier).await?),
            None => None,
        };
        let genre_id = match &influencer.profile.genre {
            Some(genre) => Some(Self::ensure_genre(&mut tx, genre).await?),
            None => None,
        };

        sqlx::query(
            "INSERT INTO profile (influencer_id, location, tier_id, genre_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&influencer.id.0)
        .bind(&influencer.profile.location)
        .bind(&tier_id)
        .bind(&genre_id)
        .execute(&mut *tx)
        .await?;

        for point in &influencer.price_points {
            sqlx::query(
                "INSERT INTO price_point (id, influencer_id, price_cents, currency, booking_type) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&influencer.id.0)
            .bind(point.price_cents)
            .bind(&point.currency)
            .bind(&point.booking_type)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &InfluencerId) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM influencer WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn list_genre_names(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT name FROM genre ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string())))
            .collect()
    }

    async fn list_tier_names(&self) -> Result<Vec<String>, RepositoryError> {
        let rows =
            sqlx::query("SELECT name FROM tier ORDER BY rank ASC").fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string())))
            .collect()
    }

    async fn sample_locations(
        &self,
        cap: usize,
    ) -> Result<(Vec<String>, bool), RepositoryError> {
        // Fetch one past the cap to learn whether more values exist.
        let rows = sqlx::query(
            "SELECT DISTINCT location FROM profile \
             WHERE location IS NOT NULL AND location != '' \
             ORDER BY location ASC LIMIT ?",
        )
        .bind((cap + 1) as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut locations = rows
            .iter()
            .map(|row| {
                row.try_get::<String, _>("location")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let truncated = locations.len() > cap;
        locations.truncate(cap);
        Ok((locations, truncated))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use roster_core::domain::filter::SearchFilter;
    use roster_core::domain::influencer::{Influencer, InfluencerId, PricePoint, Profile};

    use super::SqlInfluencerRepository;
    use crate::connection::memory_config;
    use crate::repositories::{InfluencerRepository, RepositoryError, SEARCH_PAGE_SIZE};
    use crate::{connect, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect(&memory_config()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn influencer(
        id: &str,
        name: &str,
        tier: &str,
        genre: &str,
        location: &str,
        prices: &[i64],
    ) -> Influencer {
        let now = Utc::now();
        Influencer {
            id: InfluencerId(id.to_string()),
            name: name.to_string(),
            gender: None,
            profile: Profile {
                location: Some(location.to_string()),
                tier: Some(tier.to_string()),
                genre: Some(genre.to_string()),
            },
            price_points: prices
                .iter()
                .map(|cents| PricePoint {
                    price_cents: *cents,
                    currency: "USD".to_string(),
                    booking_type: "post".to_string(),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_trio(repo: &SqlInfluencerRepository) {
        repo.insert(influencer("a", "Aiko Sato", "mega", "beauty", "Tokyo, Japan", &[1_000_000]))
            .await
            .expect("insert a");
        repo.insert(influencer("b", "Bruno Silva", "nano", "gaming", "Lisbon, Portugal", &[8_000]))
            .await
            .expect("insert b");
        repo.insert(influencer(
            "c",
            "Carla Mendes",
            "mega",
            "beauty",
            "Osaka, Japan",
            &[2_500_000],
        ))
        .await
        .expect("insert c");
    }

    #[tokio::test]
    async fn unfiltered_search_matches_all_rows() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        seed_trio(&repo).await;

        let results = repo.search(&SearchFilter::none()).await.expect("search");
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn search_applies_conjunction_of_present_clauses() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        seed_trio(&repo).await;

        let filter = SearchFilter {
            tier: Some("mega".to_string()),
            genre: Some("beauty".to_string()),
            location: Some("tokyo".to_string()),
            ..SearchFilter::default()
        };
        let results = repo.search(&filter).await.expect("search");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Aiko Sato");
    }

    #[tokio::test]
    async fn location_match_is_case_insensitive_substring() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        seed_trio(&repo).await;

        let filter =
            SearchFilter { location: Some("JAPAN".to_string()), ..SearchFilter::default() };
        let results = repo.search(&filter).await.expect("search");
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn name_substring_matches_partial_names() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        seed_trio(&repo).await;

        let filter = SearchFilter { name: Some("silva".to_string()), ..SearchFilter::default() };
        let results = repo.search(&filter).await.expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Bruno Silva");
    }

    #[tokio::test]
    async fn price_ceiling_boundary_is_inclusive() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        repo.insert(influencer("x", "Exact Match", "mid", "tech", "Oslo, Norway", &[1_000_000]))
            .await
            .expect("insert x");
        repo.insert(influencer("y", "One Over", "mid", "tech", "Oslo, Norway", &[1_000_001]))
            .await
            .expect("insert y");

        // Ceiling of $10,000 => 1_000_000 minor units.
        let filter =
            SearchFilter { max_price_cents: Some(1_000_000), ..SearchFilter::default() };
        let results = repo.search(&filter).await.expect("search");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Exact Match");
    }

    #[tokio::test]
    async fn price_ceiling_uses_cheapest_price_point() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        repo.insert(influencer(
            "m",
            "Mixed Prices",
            "mid",
            "tech",
            "Oslo, Norway",
            &[50_000, 5_000_000],
        ))
        .await
        .expect("insert");

        let filter = SearchFilter { max_price_cents: Some(60_000), ..SearchFilter::default() };
        let results = repo.search(&filter).await.expect("search");
        assert_eq!(results.len(), 1, "an entity qualifies when any price point is under the cap");
    }

    #[tokio::test]
    async fn result_set_is_capped_at_page_size() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        for index in 0..15 {
            repo.insert(influencer(
                &format!("inf-{index:02}"),
                &format!("Creator {index:02}"),
                "micro",
                "pop",
                "Berlin, Germany",
                &[30_000],
            ))
            .await
            .expect("insert");
        }

        let results = repo.search(&SearchFilter::none()).await.expect("search");
        assert_eq!(results.len(), SEARCH_PAGE_SIZE as usize);
    }

    #[tokio::test]
    async fn like_wildcards_in_input_match_literally() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        seed_trio(&repo).await;

        let filter = SearchFilter { name: Some("%".to_string()), ..SearchFilter::default() };
        let results = repo.search(&filter).await.expect("search");
        assert!(results.is_empty(), "a literal percent sign should not match every row");
    }

    #[tokio::test]
    async fn delete_removes_row_and_cascades() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool.clone());
        seed_trio(&repo).await;

        let removed = repo.delete(&InfluencerId("a".to_string())).await.expect("delete");
        assert_eq!(removed, 1);

        let found = repo.find_by_id(&InfluencerId("a".to_string())).await.expect("find");
        assert!(found.is_none());

        let orphan_prices: i64 = sqlx::Row::get(
            &sqlx::query("SELECT COUNT(*) AS count FROM price_point WHERE influencer_id = 'a'")
                .fetch_one(&pool)
                .await
                .expect("count"),
            "count",
        );
        assert_eq!(orphan_prices, 0);
    }

    #[tokio::test]
    async fn corrupt_stored_timestamp_is_a_decode_error() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO influencer (id, name, created_at, updated_at) \
             VALUES ('bad', 'Bad Row', 'not-a-timestamp', 'not-a-timestamp')",
        )
        .execute(&pool)
        .await
        .expect("insert raw row");

        let repo = SqlInfluencerRepository::new(pool);
        let error = repo
            .find_by_id(&InfluencerId("bad".to_string()))
            .await
            .expect_err("timestamps must decode strictly");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }

    #[tokio::test]
    async fn vocabulary_samples_are_bounded() {
        let pool = setup().await;
        let repo = SqlInfluencerRepository::new(pool);
        for index in 0..25 {
            repo.insert(influencer(
                &format!("inf-{index:02}"),
                &format!("Creator {index:02}"),
                "nano",
                "pop",
                &format!("City {index:02}"),
                &[10_000],
            ))
            .await
            .expect("insert");
        }

        let (locations, truncated) = repo.sample_locations(20).await.expect("sample");
        assert_eq!(locations.len(), 20);
        assert!(truncated);

        let genres = repo.list_genre_names().await.expect("genres");
        assert_eq!(genres, vec!["pop".to_string()]);

        let tiers = repo.list_tier_names().await.expect("tiers");
        assert_eq!(tiers, vec!["nano".to_string()]);
    }
}
