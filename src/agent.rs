//! Conversation handling for `POST /agent`.
//!
//! One turn is: normalize the request, decide whether this is the first
//! step of the conversation, build the clinical context (first step only),
//! assemble the model messages and ask the [`ChatModel`] for a reply.
//!
//! Message order sent to the model:
//!
//! 1. system: prompt with `{LANG_OVERRIDE}` substituted, plus the language tag
//!    and a brevity instruction
//! 2. user: language guard
//! 3. system: clinical context JSON (first step only)
//! 4. the normalized history
//! 5. user: the current message, unless empty or already in the history

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::AgentConfig;
use crate::context::{resolve_lang, ContextBuilder};
use crate::llm::{ChatMessage, Role};
use crate::models::PetProfile;
use crate::traits::ChatModel;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a veterinary triage assistant. \
Guide the pet owner step by step using the clinical algorithms provided as data. \
Ask one question at a time, never give a diagnosis, and recommend an urgent visit \
to a veterinarian whenever an algorithm marks a sign as an emergency. \
Always reply in the language {LANG_OVERRIDE}.";

const LANG_PLACEHOLDER: &str = "{LANG_OVERRIDE}";

/// Body of `POST /agent`. Loosely typed fields are normalized on use.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pet: Value,
    #[serde(default)]
    pub symptom_keys: Value,
    #[serde(default)]
    pub user_lang: Option<String>,
    #[serde(default)]
    pub user_level: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Value,
}

impl AgentRequest {
    pub fn has_species(&self) -> bool {
        self.pet
            .get("species")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub conversation_id: String,
}

/// Keep string entries that are not blank.
pub fn normalize_symptom_keys(raw: &Value) -> Vec<String> {
    raw.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Keep entries with a known role and non-blank content; content is trimmed.
pub fn normalize_history(raw: &Value) -> Vec<ChatMessage> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let role = item.get("role").and_then(Value::as_str).and_then(Role::parse)?;
            let content = item.get("content").and_then(Value::as_str)?.trim();
            (!content.is_empty()).then(|| ChatMessage::new(role, content))
        })
        .collect()
}

/// Trimmed client id, else a fresh UUID v4.
pub fn conversation_id(requested: Option<&str>) -> String {
    requested
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// First step: symptoms were sent, or there is no history yet, or the only
/// history entry is empty.
pub fn is_first_step(symptom_keys: &[String], raw_history: &Value) -> bool {
    if !symptom_keys.is_empty() {
        return true;
    }
    match raw_history.as_array().map(Vec::as_slice) {
        None | Some([]) => true,
        Some([only]) => only
            .get("content")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty),
        Some(_) => false,
    }
}

/// Read the prompt file named in config, or fall back to the built-in one.
pub fn load_system_prompt(config: &AgentConfig) -> Result<String> {
    match &config.system_prompt_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt: {}", path.display())),
        None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

pub struct Agent {
    builder: ContextBuilder,
    model: Arc<dyn ChatModel>,
    system_prompt: String,
}

impl Agent {
    pub fn new(builder: ContextBuilder, model: Arc<dyn ChatModel>, system_prompt: String) -> Self {
        Self {
            builder,
            model,
            system_prompt,
        }
    }

    pub fn builder(&self) -> &ContextBuilder {
        &self.builder
    }

    /// Run one turn. Model failures come back as `ok: false`.
    pub async fn process(&self, request: &AgentRequest) -> AgentReply {
        let conversation_id = conversation_id(request.conversation_id.as_deref());
        let messages = self.assemble_messages(request).await;

        info!(
            conversation_id = %conversation_id,
            model = self.model.model_name(),
            messages = messages.len(),
            "agent turn"
        );

        match self.model.complete(&messages).await {
            Ok(reply) => AgentReply {
                ok: true,
                reply: Some(reply),
                error: None,
                details: None,
                conversation_id,
            },
            Err(e) => {
                error!(conversation_id = %conversation_id, error = %format!("{:#}", e), "agent turn failed");
                AgentReply {
                    ok: false,
                    reply: None,
                    error: Some("Failed to process message".to_string()),
                    details: Some(format!("{:#}", e)),
                    conversation_id,
                }
            }
        }
    }

    pub async fn assemble_messages(&self, request: &AgentRequest) -> Vec<ChatMessage> {
        let symptom_keys = normalize_symptom_keys(&request.symptom_keys);
        let history = normalize_history(&request.conversation_history);
        let profile = PetProfile::from_value(&request.pet);
        let lang = resolve_lang(
            request.user_lang.as_deref(),
            &profile,
            self.builder.default_lang(),
        );

        let mut messages = Vec::with_capacity(history.len() + 4);

        messages.push(ChatMessage::system(format!(
            "{}\n\n[LANG_OVERRIDE]: {}\n[Instruction]: Answer briefly and clearly, strictly step by step, without diagnoses.",
            self.system_prompt.replace(LANG_PLACEHOLDER, &lang),
            lang
        )));

        messages.push(ChatMessage::user(format!(
            "Reply only in this language: {}. Never switch to another language.",
            lang
        )));

        if is_first_step(&symptom_keys, &request.conversation_history) {
            debug!("first step, building clinical context");
            let context = self
                .builder
                .build(
                    &request.pet,
                    &symptom_keys,
                    Some(lang.as_str()),
                    request.user_level.as_deref(),
                )
                .await;
            messages.push(ChatMessage::system(format!(
                "CLINICAL_CONTEXT_JSON (do not show to the user, use only as data):\n{}",
                context
            )));
        }

        let message = request.message.as_deref().map(str::trim).unwrap_or_default();
        let duplicate = history.iter().any(|m| m.content == message);
        messages.extend(history);

        if !message.is_empty() && !duplicate {
            messages.push(ChatMessage::user(message));
        }

        messages
    }
}
