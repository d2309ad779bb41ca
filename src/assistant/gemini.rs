//! Gemini `generateContent` REST client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Assistant, AssistantConfig, AssistantError, ChatTurn, Completion, ModelTier, Role};

pub struct GeminiAssistant {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    chat_model: String,
}

impl std::fmt::Debug for GeminiAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAssistant")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("chat_model", &self.chat_model)
            .finish_non_exhaustive()
    }
}

impl GeminiAssistant {
    /// Build a client, reading the API key from the configured variable
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AssistantError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(GeminiAssistant {
            client,
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            chat_model: config.chat_model.clone(),
        })
    }

    fn url(&self, tier: ModelTier) -> String {
        let model = match tier {
            ModelTier::Fast => &self.model,
            ModelTier::Chat => &self.chat_model,
        };
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn complete(&self, request: Completion<'_>) -> Result<String, AssistantError> {
        let url = self.url(request.tier);
        let body = GenerateContentRequest::from(&request);
        debug!(url = %url, turns = request.contents.len(), "sending assistant request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|err| AssistantError::Decode(err.to_string()))?;
        parsed.text().ok_or(AssistantError::EmptyReply)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> From<&Completion<'a>> for GenerateContentRequest<'a> {
    fn from(request: &Completion<'a>) -> Self {
        let turn = |turn: &'a ChatTurn| Content {
            role: Some(turn.role),
            parts: vec![Part { text: &turn.text }],
        };
        GenerateContentRequest {
            system_instruction: request.system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: request.contents.iter().map(turn).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate joined together
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}
