//! AI collaborator
//!
//! Three best-effort requests back the assistant pane:
//! - explain: short complexity/correctness analysis of the current source
//! - generate: a new `sort(data, snapshot)` program from a description
//! - chat: a tutoring conversation whose history is kept client-side
//!
//! Backends implement [`Assistant::complete`]; the public requests are
//! provided on top of it and never fail. Errors are logged and replaced by
//! fixed placeholder replies. [`AssistantWorker`] runs requests off the UI
//! thread.

pub mod gemini;
pub mod prompts;
pub mod worker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use gemini::GeminiAssistant;
pub use worker::{AssistantReply, AssistantWorker, RequestGenerations, RequestKind};

/// `[assistant]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model for explain and generate requests
    #[serde(default = "default_model")]
    pub model: String,
    /// Model for the tutoring chat
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_chat_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            chat_model: default_chat_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Assistant unavailable: set {0}")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("malformed reply: {0}")]
    Decode(String),

    #[error("reply contained no text")]
    EmptyReply,

    #[error("cannot start assistant runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Who said a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        ChatTurn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        ChatTurn {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Which configured model serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Chat,
}

/// One request to a backend
#[derive(Debug, Clone)]
pub struct Completion<'a> {
    pub tier: ModelTier,
    pub system_instruction: Option<&'a str>,
    pub contents: &'a [ChatTurn],
}

/// Client-side history of a tutoring conversation
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Send one request and return the reply text
    async fn complete(&self, request: Completion<'_>) -> Result<String, AssistantError>;

    /// Brief complexity and correctness analysis of `code`
    async fn explain(&self, code: &str) -> String {
        let contents = [ChatTurn::user(prompts::analysis_prompt(code))];
        let request = Completion {
            tier: ModelTier::Fast,
            system_instruction: Some(prompts::ANALYSIS_SYSTEM_INSTRUCTION),
            contents: &contents,
        };
        match self.complete(request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(AssistantError::EmptyReply) => prompts::NO_ANALYSIS.to_string(),
            Err(err) => {
                warn!(error = %err, "analysis request failed");
                prompts::ANALYSIS_FAILED.to_string()
            }
        }
    }

    /// A new sort program for `prompt`, with Markdown fences removed
    async fn generate(&self, prompt: &str) -> String {
        let contents = [ChatTurn::user(prompts::generation_prompt(prompt))];
        let request = Completion {
            tier: ModelTier::Fast,
            system_instruction: None,
            contents: &contents,
        };
        match self.complete(request).await {
            Ok(text) => prompts::strip_code_fences(&text),
            Err(AssistantError::EmptyReply) => String::new(),
            Err(err) => {
                warn!(error = %err, "code generation failed");
                prompts::GENERATION_FAILED.to_string()
            }
        }
    }

    /// Continue `session` with `message`; the user turn is kept only when
    /// the backend answers.
    async fn chat(&self, session: &mut ChatSession, message: &str) -> String {
        session.history.push(ChatTurn::user(message));
        let request = Completion {
            tier: ModelTier::Chat,
            system_instruction: Some(prompts::CHAT_SYSTEM_INSTRUCTION),
            contents: &session.history,
        };
        let result = self.complete(request).await;
        match result {
            Ok(text) if !text.trim().is_empty() => {
                session.history.push(ChatTurn::model(text.clone()));
                text
            }
            Ok(_) | Err(AssistantError::EmptyReply) => {
                session.history.pop();
                prompts::NO_CHAT_REPLY.to_string()
            }
            Err(err) => {
                warn!(error = %err, "chat request failed");
                session.history.pop();
                prompts::CHAT_FAILED.to_string()
            }
        }
    }
}
