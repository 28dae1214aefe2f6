use std::sync::Arc;

use serde_json::Value;

use roster_core::domain::filter::{RawFilter, SearchFilter, Vocabulary, LOCATION_SAMPLE_CAP};
use roster_db::repositories::InfluencerRepository;

use crate::llm::{LlmClient, LlmError};

/// Extraction result. Quota exhaustion is the one provider failure that gets
/// its own user-facing outcome; everything else degrades to the null filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Filter(SearchFilter),
    QuotaAdvisory(String),
}

fn filter_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "price": { "type": ["number", "null"] },
            "influencer_name": { "type": ["string", "null"] },
            "tier": { "type": ["string", "null"] },
            "genre": { "type": ["string", "null"] },
            "location": { "type": ["string", "null"] },
            "is_destructive": {
                "type": ["boolean", "null"],
                "description": "true if the query is about deleting, removing, or cleaning up influencers",
            },
        },
    })
}

/// Bounded vocabulary samples for grounding the extraction prompt. Each read
/// degrades independently to empty so one unavailable table never aborts
/// extraction.
pub async fn sample_vocabulary(repository: &dyn InfluencerRepository) -> Vocabulary {
    let genres = match repository.list_genre_names().await {
        Ok(genres) => genres,
        Err(error) => {
            tracing::warn!(event_name = "vocabulary.genres_unavailable", %error);
            Vec::new()
        }
    };
    let tiers = match repository.list_tier_names().await {
        Ok(tiers) => tiers,
        Err(error) => {
            tracing::warn!(event_name = "vocabulary.tiers_unavailable", %error);
            Vec::new()
        }
    };
    let (locations, locations_truncated) =
        match repository.sample_locations(LOCATION_SAMPLE_CAP).await {
            Ok(sample) => sample,
            Err(error) => {
                tracing::warn!(event_name = "vocabulary.locations_unavailable", %error);
                (Vec::new(), false)
            }
        };

    Vocabulary { genres, tiers, locations, locations_truncated }
}

pub struct ParameterExtractor {
    llm: Arc<dyn LlmClient>,
}

impl ParameterExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Extract a search filter from a refined query. Never fails: parse,
    /// validation, transport, and timeout problems all fall back to the
    /// unfiltered search; only quota exhaustion takes the advisory path.
    pub async fn extract(&self, query: &str, vocabulary: &Vocabulary) -> ExtractionOutcome {
        let prompt = format!(
            "Extract search parameters from: \"{query}\"\n\n\
             Genres: {}\n\
             Tiers: {}\n\
             Locations: {}\n\n\
             Extract: price (number), influencer_name, tier, genre, location, \
             is_destructive (true if deleting/removing).",
            vocabulary.genre_list(),
            vocabulary.tier_list(),
            vocabulary.location_list(),
        );

        match self.llm.complete_with_schema(&prompt, &filter_schema()).await {
            Ok(response) => {
                let filter = match serde_json::from_str::<RawFilter>(&response) {
                    Ok(raw) => raw.validate(),
                    Err(error) => {
                        tracing::warn!(
                            event_name = "extraction.unparsable",
                            %error,
                            "falling back to unfiltered search"
                        );
                        SearchFilter::none()
                    }
                };
                ExtractionOutcome::Filter(filter)
            }
            Err(error) if error.is_quota() => {
                tracing::warn!(event_name = "extraction.quota_exceeded", %error);
                ExtractionOutcome::QuotaAdvisory(quota_advisory(vocabulary))
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "extraction.failed",
                    %error,
                    "falling back to unfiltered search"
                );
                ExtractionOutcome::Filter(SearchFilter::none())
            }
        }
    }
}

fn quota_advisory(vocabulary: &Vocabulary) -> String {
    format!(
        "Generation quota exceeded. Please wait a moment and try again, or retry \
         with exact terms.\n\n\
         Available data:\n\
         Genres: {}\n\
         Tiers: {}\n\
         Locations: {}",
        vocabulary.genre_list(),
        vocabulary.tier_list(),
        vocabulary.location_list(),
    )
}
