//! Completion endpoint client.
//!
//! Talks to an Ollama-compatible server: one non-streaming `/api/chat`
//! request per prompt, no retries.

use std::future::Future;
use std::time::Duration;

use pdfsorter_shared::{ModelConfig, PdfSorterError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("pdfsorter/", env!("CARGO_PKG_VERSION"));

/// Timeout for the health probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Sends a single user prompt to a model and returns the completion text.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, model: &str, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// OllamaClient
// ---------------------------------------------------------------------------

/// HTTP client for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
}

impl OllamaClient {
    /// Create a client for the server at `host` with the given request timeout.
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PdfSorterError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the `[model]` config section.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::new(&config.host, Duration::from_secs(config.request_timeout_secs))
    }

    /// Base URL of the server.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the server answers `GET /api/tags`.
    pub async fn is_running(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(%url, error = %e, "model server probe failed");
                false
            }
        }
    }
}

impl CompletionClient for OllamaClient {
    #[instrument(skip_all, fields(model = %model))]
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PdfSorterError::Completion(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(PdfSorterError::Completion(format!(
                "{url}: HTTP {status}: {excerpt}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PdfSorterError::Completion(format!("{url}: invalid response body: {e}")))?;

        debug!(chars = parsed.message.content.len(), "completion received");
        Ok(parsed.message.content)
    }
}
