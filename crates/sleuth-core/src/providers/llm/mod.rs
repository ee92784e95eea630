//! Completion clients.
//!
//! Every client answers one [`CompletionRequest`] with one text completion.
//! Retrying on transport or status failures is the client's business; callers
//! see either the text or a fatal error.

pub mod anthropic;
pub mod exchange;
pub mod fake;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SleuthConfig;
use crate::error::SleuthResult;
use crate::transcript::Turn;

pub use anthropic::AnthropicClient;
pub use exchange::FileExchangeClient;
pub use fake::FakeClient;

/// Role-tagged turns plus the system context string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub turns: Vec<Turn>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            system: system.into(),
            turns,
        }
    }

    /// Content of the final user turn, the prompt actually being asked.
    pub fn prompt(&self) -> &str {
        self.turns.last().map(|t| t.content.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    /// Calls made to obtain this response, including failed ones.
    pub attempts: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> SleuthResult<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}

/// Pick the client for this run: file exchange when a directory is
/// configured, the live endpoint otherwise.
pub fn client_from_config(config: &SleuthConfig) -> SleuthResult<Arc<dyn LlmClient>> {
    if let Some(dir) = &config.exchange_dir {
        tracing::info!(dir = %dir.display(), "using file exchange instead of the network");
        return Ok(Arc::new(FileExchangeClient::new(dir.clone())?));
    }
    Ok(Arc::new(AnthropicClient::new(config)?))
}
