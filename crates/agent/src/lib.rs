//! Agent pipeline - natural-language front end to the influencer roster
//!
//! This crate turns free-text queries into safe, structured operations:
//! - Routes raw queries into {database-search, trend-research, clarify}
//! - Extracts schema-constrained search parameters grounded in sampled
//!   vocabulary, with silent fallback when the model misbehaves
//! - Intercepts destructive intents behind an audited approval gate
//! - Summarizes trend research from web search results
//!
//! # Architecture
//!
//! One query flows through a constrained pipeline:
//! 1. **Routing** (`router`) - classify NL into a dispatchable task
//! 2. **Extraction** (`extractor`) - NL + vocabulary → validated `SearchFilter`
//! 3. **Execution** - repository search, or `trends` for research queries
//! 4. **Gating** (`gate`) - destructive intents become pending approvals
//!
//! # Safety Principle
//!
//! The model is strictly a translator. It never deletes data and never shapes
//! SQL text: queries are parameter-bound, and deletion happens only through
//! the gate's execute step after explicit human approval.

pub mod extractor;
pub mod gate;
pub mod llm;
pub mod orchestrator;
pub mod router;
pub mod search;
pub mod trends;

#[cfg(test)]
pub(crate) mod testing;

pub use gate::ApprovalGate;
pub use llm::{GeminiClient, LlmClient, LlmError};
pub use orchestrator::{AgentKind, AgentResponse, Orchestrator, GENERIC_ERROR_MESSAGE};
pub use search::{SearchClient, SerpApiClient};
