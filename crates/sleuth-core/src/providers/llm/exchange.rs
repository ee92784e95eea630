//! File-exchange debug mode.
//!
//! Swaps the network call for a manual drop-off: every request is written to
//! `request-NNNN.json` in the exchange directory and the client waits until
//! someone places the matching `response-NNNN.txt` next to it. There is no
//! timeout; the run blocks until the file shows up.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{CompletionRequest, LlmClient, LlmResponse};
use crate::error::{SleuthError, SleuthResult};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct FileExchangeClient {
    dir: PathBuf,
    poll_interval: Duration,
    sequence: AtomicU32,
}

impl FileExchangeClient {
    pub fn new(dir: PathBuf) -> SleuthResult<Self> {
        std::fs::create_dir_all(&dir).map_err(|e| SleuthError::Exchange {
            message: format!("cannot create {}: {}", dir.display(), e),
        })?;
        Ok(Self {
            dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sequence: AtomicU32::new(0),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn request_path(&self, seq: u32) -> PathBuf {
        self.dir.join(format!("request-{:04}.json", seq))
    }

    pub fn response_path(&self, seq: u32) -> PathBuf {
        self.dir.join(format!("response-{:04}.txt", seq))
    }
}

#[async_trait]
impl LlmClient for FileExchangeClient {
    async fn complete(&self, request: &CompletionRequest) -> SleuthResult<LlmResponse> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let request_path = self.request_path(seq);
        let response_path = self.response_path(seq);

        let content = serde_json::to_string_pretty(request)?;
        tokio::fs::write(&request_path, content)
            .await
            .map_err(|e| SleuthError::Exchange {
                message: format!("cannot write {}: {}", request_path.display(), e),
            })?;
        info!(
            request = %request_path.display(),
            response = %response_path.display(),
            "waiting for manual response"
        );

        loop {
            match tokio::fs::read_to_string(&response_path).await {
                Ok(text) => {
                    return Ok(LlmResponse {
                        text: text.trim_end().to_string(),
                        provider: self.provider_name().to_string(),
                        model: "manual".to_string(),
                        attempts: 1,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    return Err(SleuthError::Exchange {
                        message: format!("cannot read {}: {}", response_path.display(), e),
                    })
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "exchange"
    }
}
