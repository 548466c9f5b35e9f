//! Chat completion client

use super::error::GenerationError;
use super::transport::Transport;
use crate::config::GenerationConfig;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "OpenAI";

/// User content sent when an image prompt is requested for empty text
pub const IMAGE_PROMPT_FALLBACK: &str = "The message \"error\" in white wall.";

/// How adventurous the completion should be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Creativity {
    Low,
    #[default]
    #[value(alias = "mid")]
    Medium,
    High,
}

impl Creativity {
    /// Sampling temperature for this level
    pub fn temperature(self) -> f64 {
        match self {
            Creativity::Low => 0.0,
            Creativity::Medium => 0.5,
            Creativity::High => 1.0,
        }
    }
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub temperature: f64,
}

impl ChatRequest {
    /// Single user message at the temperature implied by `creativity`
    pub fn from_prompt(model: &str, prompt: &str, creativity: Creativity) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: creativity.temperature(),
        }
    }
}

/// Request asking the chat model to describe `target_text` as an image prompt
///
/// Word count, temperature and model come from `config`; `max_tokens` is
/// three times the word count.
pub fn image_prompt_request(config: &GenerationConfig, target_text: Option<&str>) -> ChatRequest {
    let instructions = format!(
        "Please imagine a common scene from the given text and express it as a detailed prompt in english for image generation AI.\n\n  rule:\n- begin  a sentence with  \"The prompt is:\".\n- without using bullet points.\n- in the third person.\n- {} words.\ntext :",
        config.image_max_words
    );
    let content = target_text
        .filter(|text| !text.is_empty())
        .unwrap_or(IMAGE_PROMPT_FALLBACK);

    ChatRequest {
        model: config.image_prompt_model.clone(),
        messages: vec![ChatMessage::system(instructions), ChatMessage::user(content)],
        max_tokens: Some(config.image_max_words.saturating_mul(3)),
        temperature: config.image_temperature,
    }
}

/// Anything that can turn a chat request into completion text
pub trait TextGenerationService {
    /// Run the request and return the trimmed content of the first choice
    fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError>;
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat completion client for the OpenAI API
#[derive(Debug, Clone)]
pub struct OpenAiChat<T> {
    transport: T,
    api_key: Option<String>,
    base_url: String,
}

impl<T: Transport> OpenAiChat<T> {
    /// Create a client using the key and base URL from `config`
    pub fn new(transport: T, config: &GenerationConfig) -> Self {
        Self {
            transport,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl<T: Transport> TextGenerationService for OpenAiChat<T> {
    fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential { service: SERVICE })?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::to_value(request).map_err(|e| GenerationError::ResponseShape {
            service: SERVICE,
            detail: format!("request could not be encoded: {}", e),
        })?;
        log::debug!("Chat request: {}", body);

        let response = self.transport.post_json(&url, api_key, &body)?;
        if !response.is_success() {
            return Err(GenerationError::from_status(SERVICE, &response));
        }

        let parsed: ChatResponse =
            serde_json::from_slice(&response.body).map_err(|e| GenerationError::ResponseShape {
                service: SERVICE,
                detail: e.to_string(),
            })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| GenerationError::ResponseShape {
                service: SERVICE,
                detail: "response has no choices".to_string(),
            })?;

        log::debug!("Chat response: {}", content);
        Ok(content)
    }
}
