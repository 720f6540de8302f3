//! Gemini REST client.
//!
//! Implements [`Gateway`] against the Gemini `generateContent` family of
//! endpoints: SSE streaming for chat (with search grounding and the record
//! tool declarations enabled), single-shot image and speech generation, and
//! the `predictLongRunning` start/poll pair for video.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde_json::json;

use prism_config::{ModelsConfig, PrismConfig};

use crate::backend::{ChatStream, Gateway, with_retry};
use crate::error::{GatewayError, Result};
use crate::sse::parse_sse_stream;
use crate::types::{
    AspectRatio, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, HistoryEntry, ImageConfig, ImageData, PrebuiltVoiceConfig, SpeechConfig,
    SpeechData, VideoOperation, VoiceConfig, WireContent, WireTool,
};

/// Default API base URL.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// System instruction for chat turns.
const SYSTEM_INSTRUCTION: &str = "You are Prism AI. You have access to a neural database. \
Use 'db_insert' to remember things for the user and 'db_find' to look up previous data. \
Also use Google Search for external facts.";

/// TTS voice used for speech synthesis.
const SPEECH_VOICE: &str = "Kore";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model names per capability.
    pub models: ModelsConfig,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient errors on single-shot calls.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,
}

impl GeminiConfig {
    /// Create a new config with the given API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            models: ModelsConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Build a config from the resolved application config.
    pub fn from_config(config: &PrismConfig) -> std::result::Result<Self, prism_config::ConfigError>
    {
        let api_key = config.resolve_api_key()?;
        Ok(Self {
            models: config.models.clone(),
            ..Self::new(api_key)
        })
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini Client
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini API gateway.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// The API key this client authenticates with.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Build a model endpoint URL, e.g. `{base}/models/{model}:generateContent`.
    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    /// Add authentication and content-type headers to a request.
    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-goog-api-key", &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// Handle a successful generateContent response.
    async fn handle_response(response: Response) -> Result<GenerateContentResponse> {
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Serialization(e.to_string()))
    }

    /// Map an error response to the gateway taxonomy.
    async fn handle_error_response(response: Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.clone());

        match status {
            401 | 403 => GatewayError::Auth(format!("Authentication failed: {message}")),
            _ => GatewayError::Api { status, message },
        }
    }

    /// The record-store tool declarations offered to the model.
    fn record_tool_declarations() -> Vec<FunctionDeclaration> {
        vec![
            FunctionDeclaration {
                name: "db_insert".to_string(),
                description: "Insert a new record into the database to remember information."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "collection": {
                            "type": "string",
                            "description": "The name of the collection (e.g., \"users\", \"notes\", \"tasks\")"
                        },
                        "document": {
                            "type": "string",
                            "description": "The content or data to store (as a JSON string or text)"
                        }
                    },
                    "required": ["collection", "document"]
                }),
            },
            FunctionDeclaration {
                name: "db_find".to_string(),
                description: "Find records in the database based on a search term.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search term to look for in the database."
                        }
                    },
                    "required": ["query"]
                }),
            },
        ]
    }

    /// Build a chat request: history + prompt, system instruction, grounding
    /// and record tools enabled.
    fn build_chat_request(prompt: &str, history: &[HistoryEntry]) -> GenerateContentRequest {
        let mut contents: Vec<WireContent> = history
            .iter()
            .map(|entry| WireContent::text(Some(entry.role.wire_name()), &entry.text))
            .collect();
        contents.push(WireContent::text(Some("user"), prompt));

        GenerateContentRequest {
            contents,
            system_instruction: Some(WireContent::text(None, SYSTEM_INSTRUCTION)),
            tools: vec![
                WireTool::GoogleSearch(Default::default()),
                WireTool::FunctionDeclarations(Self::record_tool_declarations()),
            ],
            generation_config: None,
        }
    }
}

#[async_trait]
impl Gateway for GeminiClient {
    async fn chat_stream(&self, prompt: &str, history: &[HistoryEntry]) -> Result<ChatStream> {
        let request = Self::build_chat_request(prompt, history);
        let url = format!(
            "{}?alt=sse",
            self.model_url(&self.config.models.chat, "streamGenerateContent")
        );

        tracing::debug!(model = %self.config.models.chat, "opening chat stream");

        let response = self
            .add_headers(self.client.post(url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageData> {
        let request = GenerateContentRequest {
            contents: vec![WireContent::text(None, prompt)],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: aspect_ratio.as_str().to_string(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let url = self.model_url(&self.config.models.image, "generateContent");

        let response = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "generate_image",
            || async {
                let response = self
                    .add_headers(self.client.post(&url))
                    .json(&request)
                    .send()
                    .await?;
                Self::handle_response(response).await
            },
        )
        .await?;

        response
            .first_inline_data()
            .map(|inline| ImageData {
                mime_type: inline.mime_type,
                data: inline.data,
            })
            .ok_or(GatewayError::EmptyResponse { what: "image" })
    }

    async fn generate_speech(&self, text: &str) -> Result<SpeechData> {
        let request = GenerateContentRequest {
            contents: vec![WireContent::text(None, text)],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: SPEECH_VOICE.to_string(),
                        },
                    },
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let url = self.model_url(&self.config.models.speech, "generateContent");

        let response = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "generate_speech",
            || async {
                let response = self
                    .add_headers(self.client.post(&url))
                    .json(&request)
                    .send()
                    .await?;
                Self::handle_response(response).await
            },
        )
        .await?;

        response
            .first_inline_data()
            .map(|inline| SpeechData { data: inline.data })
            .ok_or(GatewayError::EmptyResponse { what: "audio" })
    }

    async fn start_video(&self, prompt: &str) -> Result<VideoOperation> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "numberOfVideos": 1,
                "resolution": "720p",
                "aspectRatio": "16:9"
            }
        });
        let url = self.model_url(&self.config.models.video, "predictLongRunning");

        let response = self
            .add_headers(self.client.post(url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let started: OperationResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;

        tracing::info!(operation = %started.name, "video generation started");
        Ok(started.into_operation())
    }

    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        let url = format!("{}/{}", self.config.base_url, operation.name);

        let response = self.add_headers(self.client.get(url)).send().await?;

        // A vanished operation means the credential it was started under is
        // no longer valid; the caller runs a key-reselection flow.
        if response.status().as_u16() == 404 {
            return Err(GatewayError::OperationNotFound(operation.name.clone()));
        }
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let polled: OperationResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;

        if let Some(error) = polled.error {
            return Err(GatewayError::Api {
                status: 0,
                message: error.message,
            });
        }

        Ok(polled.into_operation())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operation Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

impl OperationResponse {
    fn into_operation(self) -> VideoOperation {
        let uri = self.response.as_ref().and_then(|r| {
            r.pointer("/generateVideoResponse/generatedSamples/0/video/uri")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });
        VideoOperation {
            name: self.name,
            done: self.done,
            uri,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    #[allow(dead_code)]
    #[serde(default)]
    code: i64,
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
