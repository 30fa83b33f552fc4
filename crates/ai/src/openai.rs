//! OpenAI-compatible chat-completions narrator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use tenantpulse_core::CanonicalRecord;

use crate::narrator::Narrator;
use crate::prompt::{SYSTEM_PROMPT, user_message};
use crate::result::{Narrative, NarrativeError};

/// Narrative service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    /// Service root; `/v1/chat/completions` is appended.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Whole-request timeout. A timed-out call fails the tenant; there is no retry.
    pub timeout_seconds: u64,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout_seconds: 120,
        }
    }
}

impl NarratorConfig {
    pub fn validate(&self) -> Result<(), NarrativeError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(NarrativeError::InvalidConfig(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(NarrativeError::InvalidConfig("max_tokens must be positive".into()));
        }
        if self.model.trim().is_empty() {
            return Err(NarrativeError::InvalidConfig("model is empty".into()));
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}

/// Narrator backed by an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiNarrator {
    client: Client,
    config: NarratorConfig,
}

impl OpenAiNarrator {
    pub fn new(config: NarratorConfig) -> Result<Self, NarrativeError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NarrativeError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn narrate(&self, record: &CanonicalRecord) -> Result<Narrative, NarrativeError> {
        let payload = record
            .to_narrative_payload()
            .map_err(|e| NarrativeError::Encode(e.to_string()))?;
        let user = user_message(&payload).map_err(|e| NarrativeError::Encode(e.to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            tenant_id = %record.tenant_id,
            customer = %record.customer,
            model = %self.config.model,
            "requesting narrative"
        );

        let mut builder = self.client.post(self.config.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            error!(tenant_id = %record.tenant_id, customer = %record.customer, error = %e, "narrative request failed");
            NarrativeError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Status { status, body });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| NarrativeError::Malformed("no choices returned".into()))?;

        let mut narrative = Narrative::new(text);
        if let Some(usage) = parsed.usage {
            narrative = narrative.with_usage(usage.total_tokens);
        }
        debug!(
            tenant_id = %record.tenant_id,
            usage_tokens = ?narrative.usage_tokens,
            "narrative received"
        );
        Ok(narrative)
    }
}
