use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use roster_core::domain::influencer::Influencer;
use roster_core::format::format_results;
use roster_db::repositories::{
    InfluencerRepository, PendingActionRepository, RepositoryError,
};

use crate::extractor::{sample_vocabulary, ExtractionOutcome, ParameterExtractor};
use crate::gate::{ApprovalGate, GateError};
use crate::llm::{LlmClient, LlmError};
use crate::router::{AgentTask, IntentRouter, RouterOutcome};
use crate::search::SearchClient;
use crate::trends::TrendSummarizer;

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    DatabaseSearch,
    TrendResearch,
    Clarify,
    Error,
}

/// The single external contract of the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentResponse {
    pub agent: AgentKind,
    pub message: String,
    pub destructive: bool,
    pub influencers: Vec<Influencer>,
}

#[derive(Debug, Error)]
enum OrchestratorError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Gate(#[from] GateError),
}

pub struct Orchestrator {
    router: IntentRouter,
    extractor: ParameterExtractor,
    trends: TrendSummarizer,
    gate: ApprovalGate,
    influencers: Arc<dyn InfluencerRepository>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchClient>,
        influencers: Arc<dyn InfluencerRepository>,
        actions: Arc<dyn PendingActionRepository>,
    ) -> Self {
        Self {
            router: IntentRouter::new(llm.clone()),
            extractor: ParameterExtractor::new(llm.clone()),
            trends: TrendSummarizer::new(llm, search),
            gate: ApprovalGate::new(influencers.clone(), actions),
            influencers,
        }
    }

    /// Handle one query end to end. Every unhandled downstream failure is
    /// collapsed into the fixed generic message; internal detail never
    /// reaches the caller.
    pub async fn handle(&self, query: &str) -> AgentResponse {
        match self.dispatch(query).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(event_name = "orchestrator.unhandled_failure", %error);
                AgentResponse {
                    agent: AgentKind::Error,
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                    destructive: false,
                    influencers: Vec::new(),
                }
            }
        }
    }

    async fn dispatch(&self, query: &str) -> Result<AgentResponse, OrchestratorError> {
        match self.router.route(query).await? {
            RouterOutcome::Clarify(message) => Ok(AgentResponse {
                agent: AgentKind::Clarify,
                message,
                destructive: false,
                influencers: Vec::new(),
            }),
            RouterOutcome::Dispatch { task: AgentTask::TrendResearch, refined_query } => {
                let message = self.trends.research(&refined_query).await?;
                Ok(AgentResponse {
                    agent: AgentKind::TrendResearch,
                    message,
                    destructive: false,
                    influencers: Vec::new(),
                })
            }
            RouterOutcome::Dispatch { task: AgentTask::DatabaseSearch, refined_query } => {
                self.database_search(&refined_query).await
            }
        }
    }

    async fn database_search(&self, query: &str) -> Result<AgentResponse, OrchestratorError> {
        let vocabulary = sample_vocabulary(self.influencers.as_ref()).await;

        let filter = match self.extractor.extract(query, &vocabulary).await {
            ExtractionOutcome::Filter(filter) => filter,
            ExtractionOutcome::QuotaAdvisory(message) => {
                return Ok(AgentResponse {
                    agent: AgentKind::DatabaseSearch,
                    message,
                    destructive: false,
                    influencers: Vec::new(),
                });
            }
        };

        let influencers = self.influencers.search(&filter).await?;
        let mut message = format_results(&influencers);

        if filter.destructive {
            let created = self.gate.intercept(query, &filter).await?;
            message.push_str(&format!(
                "\n\nNo influencers were deleted. Created {} pending deletion request(s) \
                 awaiting review.",
                created.len()
            ));
        }

        Ok(AgentResponse {
            agent: AgentKind::DatabaseSearch,
            message,
            destructive: filter.destructive,
            influencers,
        })
    }
}
