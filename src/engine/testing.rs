//! Scripted completion provider for tests and offline runs.
//!
//! Replays queued responses in order and records every request it sees.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::llm_client::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderError,
};
use crate::model::message::ToolCall;

pub struct MockProvider {
    responses: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    model_id: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            model_id: "mock-narrator".to_string(),
        }
    }

    pub fn queue_response(&self, response: CompletionResponse) {
        lock(&self.responses).push_back(Ok(response));
    }

    pub fn queue_text(&self, content: impl Into<String>) {
        self.queue_response(CompletionResponse::text(content));
    }

    /// Assistant message with no text and a single tool call.
    pub fn queue_call(&self, call: ToolCall) {
        self.queue_response(CompletionResponse::with_calls("", vec![call]));
    }

    pub fn queue_error(&self, error: ProviderError) {
        lock(&self.responses).push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn pending(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl CompletionProvider for MockProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        lock(&self.requests).push(request.clone());
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::network("no mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
