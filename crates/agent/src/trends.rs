use std::sync::Arc;

use crate::llm::{LlmClient, LlmError};
use crate::search::{OrganicResult, SearchClient};

pub const NO_RESULTS_MESSAGE: &str = "No trend research results found for your query.";
pub const NO_SUMMARY_MESSAGE: &str = "Unable to generate summary.";

const TOPIC_PREFIX: &str = "TikTok";
const TOP_RESULT_COUNT: usize = 5;

pub struct TrendSummarizer {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
}

impl TrendSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>) -> Self {
        Self { llm, search }
    }

    /// Research trends for a refined query. Zero organic results (or a
    /// provider error, treated the same) short-circuits to the fixed
    /// no-results message without a generation call.
    pub async fn research(&self, query: &str) -> Result<String, LlmError> {
        let provider_query = format!("{TOPIC_PREFIX} {query}");

        let results = match self.search.search(&provider_query).await {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!(event_name = "trends.search_unavailable", %error);
                Vec::new()
            }
        };

        if results.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let prompt = summarization_prompt(query, &results);
        match self.llm.complete(&prompt).await {
            Ok(summary) if !summary.trim().is_empty() => Ok(summary),
            Ok(_) | Err(LlmError::EmptyResponse) => Ok(NO_SUMMARY_MESSAGE.to_string()),
            Err(error) => Err(error),
        }
    }
}

fn summarization_prompt(query: &str, results: &[OrganicResult]) -> String {
    let listing = results
        .iter()
        .take(TOP_RESULT_COUNT)
        .enumerate()
        .map(|(index, result)| {
            format!(
                "{}. {}\n   {}\n   Source: {}",
                index + 1,
                result.title.as_deref().unwrap_or("No title"),
                result.snippet.as_deref().unwrap_or("No description"),
                result.link.as_deref().unwrap_or("N/A"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following search results about TikTok trends for \"{query}\", provide a \
         comprehensive summary focused on social media trends and content ideas.\n\n\
         Search results:\n{listing}\n\n\
         Please provide a summary that:\n\
         1. Identifies current TikTok trends related to the query\n\
         2. Suggests content ideas or campaign strategies\n\
         3. Mentions popular hashtags or themes\n\
         4. Includes relevant links for further reading\n\n\
         Format your response in a readable way with paragraphs and bullet points where \
         appropriate."
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{summarization_prompt, TrendSummarizer, NO_RESULTS_MESSAGE, NO_SUMMARY_MESSAGE};
    use crate::llm::LlmError;
    use crate::search::{OrganicResult, SearchError};
    use crate::testing::{organic, ScriptedLlm, ScriptedSearch};

    #[tokio::test]
    async fn zero_results_short_circuits_without_generation_call() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("should never be used".to_string())]));
        let search = Arc::new(ScriptedSearch::new(vec![Ok(Vec::new())]));
        let summarizer = TrendSummarizer::new(llm.clone(), search.clone());

        let summary = summarizer.research("fitness content").await.expect("research");

        assert_eq!(summary, NO_RESULTS_MESSAGE);
        assert_eq!(llm.call_count(), 0);
        assert_eq!(search.queries(), vec!["TikTok fitness content".to_string()]);
    }

    #[tokio::test]
    async fn provider_error_is_treated_as_zero_results() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("should never be used".to_string())]));
        let search = Arc::new(ScriptedSearch::new(vec![Err(SearchError::Transport(
            "down".to_string(),
        ))]));
        let summarizer = TrendSummarizer::new(llm.clone(), search);

        let summary = summarizer.research("fitness content").await.expect("research");
        assert_eq!(summary, NO_RESULTS_MESSAGE);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn results_are_summarized_via_generation() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Trend summary text".to_string())]));
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![organic(
            "Top sounds this week",
            "A roundup of viral sounds",
            "https://trends.example/sounds",
        )])]));
        let summarizer = TrendSummarizer::new(llm.clone(), search);

        let summary = summarizer.research("viral sounds").await.expect("research");
        assert_eq!(summary, "Trend summary text");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_summary_uses_fixed_fallback() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(LlmError::EmptyResponse)]));
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![organic(
            "t", "s", "https://x.example",
        )])]));
        let summarizer = TrendSummarizer::new(llm, search);

        let summary = summarizer.research("anything").await.expect("research");
        assert_eq!(summary, NO_SUMMARY_MESSAGE);
    }

    #[test]
    fn prompt_caps_at_five_results_and_applies_placeholders() {
        let mut results = vec![OrganicResult::default(); 6];
        results[5] = organic("Sixth", "should not appear", "https://six.example");

        let prompt = summarization_prompt("q", &results);
        assert!(prompt.contains("No title"));
        assert!(prompt.contains("No description"));
        assert!(prompt.contains("Source: N/A"));
        assert!(!prompt.contains("Sixth"));
        assert!(prompt.contains("5. "));
    }
}
