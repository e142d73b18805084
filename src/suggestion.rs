use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::MemeCoinSuggestion;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

const GENERATOR_SYSTEM_PROMPT: &str = "You are a creative meme coin name generator that creates relevant and catchy names based on tweet content.";

const MODERATOR_SYSTEM_PROMPT: &str = "You are a content moderator for meme coin names. Validate if the suggested name is appropriate and not offensive.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client for the external text-completion collaborator. Produces a coin
/// name plus reasoning from arbitrary tweet text, moderates suggestions, and
/// fills the reply template.
#[derive(Debug, Clone)]
pub struct SuggestionGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SuggestionGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_BASE, api_key, model)
    }

    /// `base_url` override, mainly so tests can point at a mock server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Ask the model for a coin name based on `content`.
    ///
    /// An unreachable API or an HTTP error is a [`GenerationError`];
    /// completion content that is not the expected JSON shape degrades to
    /// [`MemeCoinSuggestion::fallback`] instead, since a malformed model
    /// answer is routine rather than exceptional.
    pub async fn generate(&self, content: &str) -> Result<MemeCoinSuggestion, GenerationError> {
        let prompt = format!(
            r#"As a meme coin name generator, analyze the following tweet content and create a creative, catchy, and relevant meme coin name. Consider the sentiment, keywords, and cultural references in the content.

Tweet content: "{content}"

Please provide:
1. A creative meme coin name (should end with "coin", "token", or a cryptocurrency-related suffix)
2. A brief explanation of why this name fits the content

Format your response as JSON:
{{
    "coinName": "suggested name",
    "reasoning": "explanation"
}}"#
        );

        let text = self
            .complete(GENERATOR_SYSTEM_PROMPT, &prompt, 0.7, 500)
            .await?;

        match serde_json::from_str::<MemeCoinSuggestion>(&text) {
            Ok(suggestion) => Ok(suggestion),
            Err(err) => {
                warn!(error = %err, "could not parse completion as a suggestion, using fallback");
                Ok(MemeCoinSuggestion::fallback())
            }
        }
    }

    /// Binary moderation check. Any failure to get a clear "true" back
    /// (API error, unexpected answer) counts as invalid.
    pub async fn validate(&self, suggestion: &MemeCoinSuggestion) -> bool {
        let prompt = format!(
            r#"Please validate this meme coin suggestion:
Name: {}
Reasoning: {}

Is this name:
1. Not offensive or inappropriate
2. Related to cryptocurrency or meme culture
3. Easy to remember and pronounce

Reply with just "true" or "false"."#,
            suggestion.coin_name, suggestion.reasoning
        );

        match self.complete(MODERATOR_SYSTEM_PROMPT, &prompt, 0.1, 10).await {
            Ok(text) => text.trim().eq_ignore_ascii_case("true"),
            Err(err) => {
                warn!(error = %err, "suggestion validation failed");
                false
            }
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::Empty)?;
        debug!(len = content.len(), "received completion");
        Ok(content)
    }
}

/// Fill the reply template. `{coinName}` and `{reasoning}` are substituted
/// verbatim; everything else passes through untouched.
pub fn format_response(suggestion: &MemeCoinSuggestion, template: &str) -> String {
    template
        .replace("{coinName}", &suggestion.coin_name)
        .replace("{reasoning}", &suggestion.reasoning)
}
