//! Chat model implementations.
//!
//! - **[`DisabledChatModel`]**: always errors; used when `agent.provider = "disabled"`.
//! - **[`OpenAiChatModel`]**: posts to any OpenAI-compatible
//!   `/chat/completions` endpoint.
//!
//! Use [`create_chat_model`] to pick one from configuration.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::traits::ChatModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

// ============ Disabled model ============

pub struct DisabledChatModel;

#[async_trait]
impl ChatModel for DisabledChatModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        bail!("Chat model is disabled")
    }
}

// ============ OpenAI-compatible model ============

pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    temperature: Option<f32>,
}

impl OpenAiChatModel {
    /// Build a client from configuration. The API key is read from the
    /// environment variable named by `api_key_env`. A missing key for the
    /// public OpenAI endpoint fails each [`ChatModel::complete`] call, not
    /// construction, so the rest of the server still starts.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());

        if api_key.is_none() && is_public_endpoint(&config.base_url) {
            warn!(
                env = %config.api_key_env,
                "API key not set; agent turns will fail until it is"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            temperature: config.temperature,
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if self.api_key.is_none() && is_public_endpoint(&self.base_url) {
            bail!("{} environment variable not set", self.api_key_env);
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        debug!(model = %self.model, messages = messages.len(), "calling chat completions");

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.context("Chat completion request failed")?;
        let status = resp.status();
        let json: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse chat completion JSON")?;

        if !status.is_success() {
            let message = json["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status));
            bail!("Chat completion error: {}", message);
        }

        parse_reply(&json)
    }
}

fn is_public_endpoint(base_url: &str) -> bool {
    base_url.contains("api.openai.com")
}

/// Extract `choices[0].message.content`; blank replies are errors.
fn parse_reply(json: &serde_json::Value) -> Result<String> {
    json["choices"]
        .get(0)
        .and_then(|c| c["message"]["content"].as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid chat completion reply format"))
}

/// Create the [`ChatModel`] named by `agent.provider`.
///
/// | Config Value | Model |
/// |-------------|-------|
/// | `"disabled"` | [`DisabledChatModel`] |
/// | `"openai"` | [`OpenAiChatModel`] |
pub fn create_chat_model(config: &AgentConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledChatModel)),
        "openai" => Ok(Arc::new(OpenAiChatModel::new(config)?)),
        other => bail!("Unknown agent provider: {}", other),
    }
}
