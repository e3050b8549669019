//! Chat-completion client for the agents.
//!
//! The driver only sees [`CompletionProvider`]. [`LlmClient`] is the HTTP
//! implementation and speaks two wire formats: Azure OpenAI chat completions
//! and the Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::AgentDefinition;
use crate::transcript::Transcript;

const ANTHROPIC_DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Produces an agent's next message from the transcript so far.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        agent: &AgentDefinition,
        transcript: &Transcript,
    ) -> Result<String, ProviderError>;
}

/// Which HTTP API the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ApiFlavor {
    /// Azure OpenAI deployment (chat completions).
    Azure,
    /// Anthropic Messages API.
    Anthropic,
}

/// Everything the client needs, read once at startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub flavor: ApiFlavor,
    /// Base URL. Required for Azure; Anthropic falls back to the public API.
    pub endpoint: Option<String>,
    pub api_key: String,
    /// Azure deployment name, or Anthropic model id.
    pub model: String,
    /// Azure `api-version` query parameter.
    pub api_version: String,
    pub max_tokens: u32,
}

/// One turn as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Render the transcript from one agent's point of view.
///
/// The agent's own earlier replies are `assistant` turns. Everything else,
/// the operator's request and the other agents' replies, becomes a `user`
/// turn tagged with its author. Adjacent turns with the same role are merged
/// so the result strictly alternates.
pub fn render_history(agent_name: &str, transcript: &Transcript) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = Vec::new();
    for msg in transcript.messages() {
        let (role, content) = if msg.author() == agent_name {
            ("assistant", msg.content().to_string())
        } else {
            ("user", format!("[{}]: {}", msg.author(), msg.content()))
        };
        match turns.last_mut() {
            Some(prev) if prev.role == role => {
                prev.content.push_str("\n\n");
                prev.content.push_str(&content);
            }
            _ => turns.push(ChatTurn {
                role: role.to_string(),
                content,
            }),
        }
    }
    turns
}

// Azure OpenAI wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatTurn>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// Anthropic wire types

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// HTTP completion client.
pub struct LlmClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration("API key is empty".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "model / deployment name is empty".to_string(),
            ));
        }
        if config.flavor == ApiFlavor::Azure && config.endpoint.is_none() {
            return Err(ProviderError::Configuration(
                "Azure endpoint is required".to_string(),
            ));
        }
        Ok(Self {
            config,
            http: reqwest::Client::new(),
        })
    }

    /// Full request URL for the configured flavor.
    pub fn url(&self) -> String {
        match self.config.flavor {
            ApiFlavor::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.config.endpoint.as_deref().unwrap_or_default().trim_end_matches('/'),
                self.config.model,
                self.config.api_version,
            ),
            ApiFlavor::Anthropic => format!(
                "{}/v1/messages",
                self.config
                    .endpoint
                    .as_deref()
                    .unwrap_or(ANTHROPIC_DEFAULT_ENDPOINT)
                    .trim_end_matches('/'),
            ),
        }
    }

    /// Send a system prompt plus conversation and return the reply text.
    pub async fn chat(&self, system: &str, turns: Vec<ChatTurn>) -> Result<String, ProviderError> {
        match self.config.flavor {
            ApiFlavor::Azure => self.chat_azure(system, turns).await,
            ApiFlavor::Anthropic => self.chat_anthropic(system, turns).await,
        }
    }

    async fn chat_azure(&self, system: &str, turns: Vec<ChatTurn>) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatTurn {
            role: "system".to_string(),
            content: system.to_string(),
        });
        messages.extend(turns);

        let body = ChatCompletionRequest {
            messages,
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .http
            .post(self.url())
            .header("api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("no message content in choices".to_string()))
    }

    async fn chat_anthropic(&self, system: &str, turns: Vec<ChatTurn>) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": &self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system,
            "messages": turns,
        });

        let resp = self
            .http
            .post(self.url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(ProviderError::InvalidResponse("no text blocks in response".to_string()));
        }
        Ok(text)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => ProviderError::Authentication(body),
        429 => ProviderError::RateLimited(body),
        code => ProviderError::Api { status: code, body },
    })
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        agent: &AgentDefinition,
        transcript: &Transcript,
    ) -> Result<String, ProviderError> {
        let turns = render_history(&agent.name, transcript);
        tracing::debug!(agent = %agent.name, turns = turns.len(), "Requesting completion");
        self.chat(&agent.instructions, turns).await
    }
}
