//! LLM API client abstraction for Gemini, OpenAI and Anthropic.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument};

/// LLM provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini.
    Gemini,
    /// OpenAI (GPT models).
    OpenAI,
    /// Anthropic (Claude models).
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    #[instrument]
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// A sensible default model for this provider.
    #[instrument]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-20241022",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// JSON pointer to the generated text in a successful response.
    fn text_pointer(self) -> &'static str {
        match self {
            Self::Gemini => "/candidates/0/content/parts/0/text",
            Self::OpenAI => "/choices/0/message/content",
            Self::Anthropic => "/content/0/text",
        }
    }
}

/// Configuration for LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    provider: LlmProvider,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: Option<String>,
}

impl LlmConfig {
    /// Creates a new LLM configuration.
    #[instrument(skip(api_key), fields(provider = ?provider, model = %model))]
    pub fn new(provider: LlmProvider, api_key: String, model: String, max_tokens: u32) -> Self {
        debug!("Creating LLM config");
        Self {
            provider,
            api_key,
            model,
            max_tokens,
            base_url: None,
        }
    }

    /// Overrides the API base URL (proxies, gateways).
    #[instrument(skip(self))]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Gets the provider.
    #[instrument(skip(self))]
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Gets the API key.
    #[instrument(skip(self))]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Gets the model name.
    #[instrument(skip(self))]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Gets the max tokens.
    #[instrument(skip(self))]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Gets the API base URL.
    #[instrument(skip(self))]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

/// LLM client that abstracts over multiple providers.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    /// Creates a new LLM client.
    #[instrument(skip(config), fields(provider = ?config.provider()))]
    pub fn new(config: LlmConfig) -> Self {
        info!("Creating LLM client");
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Gets the configuration.
    #[instrument(skip(self))]
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generates a free-text completion from a system prompt and user message.
    #[instrument(skip(self, system_prompt, user_message), fields(provider = ?self.config.provider, model = %self.config.model))]
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        debug!("Generating completion");
        self.complete(system_prompt, user_message, None).await
    }

    /// Generates a JSON completion.
    ///
    /// Gemini receives `schema` as its response schema; OpenAI is switched to
    /// JSON mode; Anthropic relies on the prompt alone.
    #[instrument(skip(self, system_prompt, user_message, schema), fields(provider = ?self.config.provider, model = %self.config.model))]
    pub async fn generate_json(
        &self,
        system_prompt: &str,
        user_message: &str,
        schema: &Value,
    ) -> Result<String, LlmError> {
        debug!("Generating JSON completion");
        self.complete(system_prompt, user_message, Some(schema)).await
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        schema: Option<&Value>,
    ) -> Result<String, LlmError> {
        let request = match self.config.provider {
            LlmProvider::Gemini => self.gemini_request(system_prompt, user_message, schema),
            LlmProvider::OpenAI => self.openai_request(system_prompt, user_message, schema),
            LlmProvider::Anthropic => self.anthropic_request(system_prompt, user_message),
        };
        let response = self.send(request).await?;

        let pointer = self.config.provider.text_pointer();
        let content = response
            .pointer(pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                error!(response = %response, pointer, "No text content in response");
                LlmError::new(format!(
                    "No text content in {} response",
                    self.config.provider
                ))
            })?
            .to_string();

        info!(content_length = content.len(), "Generated completion");
        Ok(content)
    }

    /// Builds a Gemini `generateContent` request.
    #[instrument(skip(self, system_prompt, user_message, schema))]
    fn gemini_request(
        &self,
        system_prompt: &str,
        user_message: &str,
        schema: Option<&Value>,
    ) -> reqwest::RequestBuilder {
        debug!("Building Gemini API request");
        let mut generation_config = json!({ "maxOutputTokens": self.config.max_tokens });
        if let Some(schema) = schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        }
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_message }] }],
            "generationConfig": generation_config,
        });
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model
        );
        self.http
            .post(url)
            .header("x-goog-api-key", self.config.api_key.clone())
            .header("content-type", "application/json")
            .json(&body)
    }

    /// Builds an OpenAI chat completions request.
    #[instrument(skip(self, system_prompt, user_message, schema))]
    fn openai_request(
        &self,
        system_prompt: &str,
        user_message: &str,
        schema: Option<&Value>,
    ) -> reqwest::RequestBuilder {
        debug!("Building OpenAI API request");
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message }
            ]
        });
        if schema.is_some() {
            body["response_format"] = json!({ "type": "json_object" });
        }
        self.http
            .post(format!("{}/chat/completions", self.config.base_url()))
            .bearer_auth(self.config.api_key.clone())
            .header("content-type", "application/json")
            .json(&body)
    }

    /// Builds an Anthropic messages request.
    #[instrument(skip(self, system_prompt, user_message))]
    fn anthropic_request(&self, system_prompt: &str, user_message: &str) -> reqwest::RequestBuilder {
        debug!("Building Anthropic API request");
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system_prompt,
            "messages": [
                {
                    "role": "user",
                    "content": user_message
                }
            ]
        });
        self.http
            .post(format!("{}/messages", self.config.base_url()))
            .header("x-api-key", self.config.api_key.clone())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
    }

    /// Sends a request and parses the JSON body of a successful response.
    #[instrument(skip(self, request), fields(provider = %self.config.provider))]
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, LlmError> {
        let provider = self.config.provider;
        debug!("Sending request");
        let response = request.send().await.map_err(|e| {
            error!(error = ?e, "API request failed");
            LlmError::new(format!("{} API request failed: {}", provider, e))
        })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read response");
            LlmError::new(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            error!(status = %status, response = %response_text, "API error");
            return Err(LlmError::new(format!(
                "{} API error {}: {}",
                provider, status, response_text
            )));
        }

        debug!(response_length = response_text.len(), "Parsing response");
        serde_json::from_str(&response_text).map_err(|e| {
            error!(error = ?e, response = %response_text, "Failed to parse response");
            LlmError::new(format!("Failed to parse response: {}", e))
        })
    }
}

/// LLM client error.
#[derive(Debug, Clone, Display, Error)]
#[display("LLM error: {} at {}:{}", message, file, line)]
pub struct LlmError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LlmError {
    /// Creates a new LLM error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "LLM error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
