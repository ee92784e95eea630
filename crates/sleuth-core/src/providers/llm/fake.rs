//! Deterministic client for tests and dry runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionRequest, LlmClient, LlmResponse};
use crate::error::SleuthResult;

type Responder = Box<dyn Fn(&CompletionRequest) -> String + Send + Sync>;

/// Answers from a queue of canned responses first, then from the responder
/// closure, then with a fixed fallback.
pub struct FakeClient {
    model: String,
    queue: Mutex<VecDeque<String>>,
    responder: Option<Responder>,
    fixed_response: String,
    calls: AtomicU32,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            fixed_response: "ok".to_string(),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = response.into();
        self
    }

    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queue
            .lock()
            .expect("fake client queue poisoned")
            .extend(responses.into_iter().map(Into::into));
        self
    }

    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .expect("fake client log poisoned")
            .clone()
    }
}

impl std::fmt::Debug for FakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeClient")
            .field("model", &self.model)
            .field("calls", &self.calls())
            .finish()
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, request: &CompletionRequest) -> SleuthResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("fake client log poisoned")
            .push(request.clone());

        let queued = self
            .queue
            .lock()
            .expect("fake client queue poisoned")
            .pop_front();
        let text = match (queued, &self.responder) {
            (Some(text), _) => text,
            (None, Some(responder)) => responder(request),
            (None, None) => self.fixed_response.clone(),
        };

        Ok(LlmResponse {
            text,
            provider: self.provider_name().to_string(),
            model: self.model.clone(),
            attempts: 1,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
