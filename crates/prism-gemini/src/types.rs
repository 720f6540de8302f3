//! Gateway types: the public chunk/media types consumed by the rest of the
//! system, and the Gemini wire types they are parsed from.
//!
//! The wire types follow the Gemini `generateContent` REST surface
//! (camelCase JSON); the public types are deliberately small so callers
//! never see provider JSON.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Chat History
// ─────────────────────────────────────────────────────────────────────────────

/// Role tag for a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// The Gemini wire name for this role ("model" for the assistant).
    pub fn wire_name(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        }
    }
}

/// One prior exchange entry passed as context for a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who said it.
    pub role: ChatRole,
    /// What was said.
    pub text: String,
}

impl HistoryEntry {
    /// Create a user history entry.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// Create an assistant history entry.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Chunks
// ─────────────────────────────────────────────────────────────────────────────

/// A structured tool-call request emitted mid-stream.
///
/// Ephemeral: produced by the gateway, consumed immediately by the
/// dispatcher, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the requested operation.
    pub name: String,
    /// Operation-specific key/value arguments.
    pub args: serde_json::Value,
}

/// A grounding citation surfaced during generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source URI.
    pub uri: String,
    /// Source title.
    pub title: String,
}

/// One incremental unit of a streamed chat response.
///
/// Any combination of the three payloads may be present; an entirely empty
/// chunk is legal and ignorable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Text delta to append to the assistant message.
    pub text: Option<String>,
    /// Tool-call requests to dispatch before the stream continues.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Citations to merge into the turn's source list.
    pub sources: Vec<Citation>,
}

impl ChatChunk {
    /// A chunk carrying only a text delta.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A chunk carrying a single tool call.
    pub fn tool_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            tool_calls: vec![ToolCallRequest {
                name: name.into(),
                args,
            }],
            ..Default::default()
        }
    }

    /// A chunk carrying only citations.
    pub fn sources(sources: Vec<Citation>) -> Self {
        Self {
            sources,
            ..Default::default()
        }
    }

    /// Whether the chunk carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tool_calls.is_empty() && self.sources.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Media Types
// ─────────────────────────────────────────────────────────────────────────────

/// Aspect ratios supported by image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1
    #[default]
    Square,
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
}

impl AspectRatio {
    /// The wire string for this ratio.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline image returned by a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// MIME type reported by the provider (typically `image/png`).
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// Sample rate of synthesized speech, in Hz.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech.
pub const SPEECH_CHANNELS: u16 = 1;

/// Bits per sample of synthesized speech (signed little-endian).
pub const SPEECH_BITS_PER_SAMPLE: u16 = 16;

/// Raw audio returned by speech synthesis: base64-encoded PCM,
/// single-channel, 16-bit signed samples at 24 kHz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechData {
    /// Base64-encoded PCM payload.
    pub data: String,
}

/// Handle for a long-running video generation operation.
///
/// Obtained from `start_video`, advanced by `poll_video`. Polling is the only
/// completion signal; there are no push notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoOperation {
    /// Server-side operation name, used for polling.
    pub name: String,
    /// Whether the operation has completed.
    pub done: bool,
    /// Result media URI, present once `done`. Fetching it requires the API
    /// key appended as a query parameter.
    pub uri: Option<String>,
}

impl VideoOperation {
    /// A freshly started, incomplete operation.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            uri: None,
        }
    }

    /// The result URI with the access credential appended, if complete.
    pub fn fetch_uri(&self, api_key: &str) -> Option<String> {
        self.uri.as_ref().map(|uri| {
            if uri.contains('?') {
                format!("{uri}&key={api_key}")
            } else {
                format!("{uri}?key={api_key}")
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types (Gemini generateContent)
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `generateContent` / `streamGenerateContent`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A role-tagged content entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

impl WireContent {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![WirePart {
                text: Some(text.into()),
                ..Default::default()
            }],
        }
    }
}

/// One part of a content entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<WireInlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireInlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A tool made available to the model: either the built-in search grounding
/// tool or a set of function declarations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum WireTool {
    GoogleSearch(serde_json::Map<String, serde_json::Value>),
    FunctionDeclarations(Vec<FunctionDeclaration>),
}

/// Declaration of a callable function with a JSON-schema parameter object.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Generation configuration (only the knobs this system uses).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

/// Response body for `generateContent`, also the per-event payload of the
/// SSE stream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: WireContent,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Flatten a wire response into the public chunk shape: concatenated
    /// text deltas, tool calls in order, and web grounding citations.
    pub fn into_chunk(self) -> ChatChunk {
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        let mut sources = Vec::new();

        for candidate in self.candidates {
            for part in candidate.content.parts {
                if let Some(t) = part.text {
                    text.push_str(&t);
                }
                if let Some(call) = part.function_call {
                    tool_calls.push(ToolCallRequest {
                        name: call.name,
                        args: call.args,
                    });
                }
            }
            if let Some(grounding) = candidate.grounding_metadata {
                for chunk in grounding.grounding_chunks {
                    if let Some(web) = chunk.web
                        && let Some(uri) = web.uri
                    {
                        sources.push(Citation {
                            uri,
                            title: web.title.unwrap_or_else(|| "Source".to_string()),
                        });
                    }
                }
            }
        }

        ChatChunk {
            text: if text.is_empty() { None } else { Some(text) },
            tool_calls,
            sources,
        }
    }

    /// The first inline-data payload in the response, if any.
    pub fn first_inline_data(self) -> Option<WireInlineData> {
        self.candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .find_map(|p| p.inline_data)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
