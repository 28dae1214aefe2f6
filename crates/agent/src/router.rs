use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::llm::{LlmClient, LlmError};

/// The two dispatchable pipelines behind the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentTask {
    DatabaseSearch,
    TrendResearch,
}

/// Three-way routing result. `Clarify` is a legitimate terminal response,
/// not a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouterOutcome {
    Dispatch { task: AgentTask, refined_query: String },
    Clarify(String),
}

const CLARIFY_MESSAGE: &str = "I couldn't tell what you're looking for. Ask about influencers \
     in the roster (for example \"mega tier beauty influencers in Tokyo\") or about content \
     trends (for example \"what's trending for fitness creators\").";

#[derive(Debug, Default, Deserialize)]
struct RouteDecision {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    refined_query: Option<String>,
}

fn route_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "action": {
                "type": ["string", "null"],
                "enum": ["database-search", "trend-research"],
            },
            "refined_query": { "type": "string" },
        },
        "required": ["refined_query"],
    })
}

pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Classify a raw query. A service failure propagates; an unparsable or
    /// actionless response resolves to `Clarify`.
    pub async fn route(&self, query: &str) -> Result<RouterOutcome, LlmError> {
        let prompt = format!(
            "Classify this request: \"{query}\"\n\n\
             Pick \"database-search\" when the user asks about influencers we already track \
             (filtering by name, tier, genre, location, or price, including delete requests). \
             Pick \"trend-research\" when the user asks about social media trends, content \
             ideas, or what is popular. Set action to null when neither fits.\n\
             Also return refined_query: the request rephrased as a concise search query."
        );

        let response = self.llm.complete_with_schema(&prompt, &route_schema()).await?;

        let decision: RouteDecision = match serde_json::from_str(&response) {
            Ok(decision) => decision,
            Err(error) => {
                tracing::warn!(event_name = "router.unparsable", %error, "routing fell back to clarify");
                return Ok(RouterOutcome::Clarify(CLARIFY_MESSAGE.to_string()));
            }
        };

        let refined_query = decision
            .refined_query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| query.to_string());

        let outcome = match decision.action.as_deref() {
            Some("database-search") => {
                RouterOutcome::Dispatch { task: AgentTask::DatabaseSearch, refined_query }
            }
            Some("trend-research") => {
                RouterOutcome::Dispatch { task: AgentTask::TrendResearch, refined_query }
            }
            _ => RouterOutcome::Clarify(CLARIFY_MESSAGE.to_string()),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{AgentTask, IntentRouter, RouterOutcome};
    use crate::llm::LlmError;
    use crate::testing::ScriptedLlm;

    #[tokio::test]
    async fn known_action_dispatches_with_refined_query() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(
            r#"{"action":"database-search","refined_query":"mega beauty Tokyo"}"#.to_string(),
        )]));
        let router = IntentRouter::new(llm);

        let outcome = router.route("find mega beauty people in tokyo").await.expect("route");
        assert_eq!(
            outcome,
            RouterOutcome::Dispatch {
                task: AgentTask::DatabaseSearch,
                refined_query: "mega beauty Tokyo".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_action_resolves_to_clarify() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(
            r#"{"action":null,"refined_query":"hello"}"#.to_string(),
        )]));
        let router = IntentRouter::new(llm);

        let outcome = router.route("hello").await.expect("route");
        assert!(matches!(outcome, RouterOutcome::Clarify(_)));
    }

    #[tokio::test]
    async fn unparsable_response_resolves_to_clarify() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("not json at all".to_string())]));
        let router = IntentRouter::new(llm);

        let outcome = router.route("anything").await.expect("route");
        assert!(matches!(outcome, RouterOutcome::Clarify(_)));
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        let llm =
            Arc::new(ScriptedLlm::new(vec![Err(LlmError::Transport("boom".to_string()))]));
        let router = IntentRouter::new(llm);

        let error = router.route("anything").await.expect_err("transport error");
        assert!(matches!(error, LlmError::Transport(_)));
    }

    #[tokio::test]
    async fn blank_refined_query_falls_back_to_original_text() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(
            r#"{"action":"trend-research","refined_query":"  "}"#.to_string(),
        )]));
        let router = IntentRouter::new(llm);

        let outcome = router.route("fitness trends").await.expect("route");
        assert_eq!(
            outcome,
            RouterOutcome::Dispatch {
                task: AgentTask::TrendResearch,
                refined_query: "fitness trends".to_string()
            }
        );
    }
}
