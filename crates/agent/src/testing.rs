//! Hand-written stub clients shared by the agent test modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{LlmClient, LlmError};
use crate::search::{OrganicResult, SearchClient, SearchError};

/// Replays a fixed sequence of generation responses and counts calls.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.next()
    }

    async fn complete_with_schema(
        &self,
        _prompt: &str,
        _schema: &Value,
    ) -> Result<String, LlmError> {
        self.next()
    }
}

/// Replays a fixed sequence of search responses.
pub struct ScriptedSearch {
    responses: Mutex<VecDeque<Result<Vec<OrganicResult>, SearchError>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new(responses: Vec<Result<Vec<OrganicResult>, SearchError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), queries: Mutex::new(Vec::new()) }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl SearchClient for ScriptedSearch {
    async fn search(&self, query: &str) -> Result<Vec<OrganicResult>, SearchError> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.to_string());
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn organic(title: &str, snippet: &str, link: &str) -> OrganicResult {
    OrganicResult {
        title: Some(title.to_string()),
        snippet: Some(snippet.to_string()),
        link: Some(link.to_string()),
    }
}
