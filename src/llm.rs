//! Chat-completion client for the AI provider.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default OpenAI-compatible endpoint root.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Sampling temperature used for every step.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const DEFAULT_OUTPUT_LIMIT: u32 = 4_096;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)\r?\n?```$").expect("valid regex")
});

/// Maximum completion tokens a model accepts.
#[must_use]
pub fn model_output_limit(model: &str) -> u32 {
    let model = model.to_ascii_lowercase();
    if model.starts_with("gpt-4o") || model.starts_with("gpt-4.1") {
        16_384
    } else if model.starts_with("gpt-4-turbo") {
        4_096
    } else if model.starts_with("gpt-4") {
        8_192
    } else if model.starts_with("gpt-3.5") {
        4_096
    } else if model.starts_with("deepseek") {
        8_192
    } else {
        DEFAULT_OUTPUT_LIMIT
    }
}

/// One completion call: a system/user prompt pair and a token budget.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instructions for the assistant
    pub system: String,
    /// The task itself
    pub user: String,
    /// Requested completion budget before model clamping
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Creates a request with the default temperature.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Anything that turns a prompt pair into assistant text.
pub trait CompletionClient {
    /// Returns the assistant's reply with any surrounding code fence removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is empty.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("API key is empty"));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("blogsmith/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            model: model.into(),
        })
    }

    /// Model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, max_tokens = request.max_tokens))]
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let max_tokens = request.max_tokens.min(model_output_limit(&self.model));
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens,
        };

        debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::api(Some(status.as_u16()), message));
        }

        extract_content(&text)
    }
}

/// Pulls the first choice's text out of a chat-completion response body.
fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse("completion response", e.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::api(None, "response has no choices"))?;

    let content = strip_code_fence(&content);
    if content.is_empty() {
        return Err(Error::api(None, "response content is empty"));
    }
    Ok(content)
}

/// Removes a fenced code block wrapping the whole reply.
#[must_use]
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    FENCED_BLOCK
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str())
        .trim()
        .to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{CompletionClient, CompletionRequest};
    use crate::error::{Error, Result};
    use crate::prompt::PromptKind;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers each step with a canned reply and records the calls.
    #[derive(Default)]
    pub(crate) struct FakeClient {
        replies: HashMap<PromptKind, Result<String>>,
        pub(crate) calls: RefCell<Vec<(PromptKind, CompletionRequest)>>,
    }

    impl FakeClient {
        pub(crate) fn reply(mut self, kind: PromptKind, text: &str) -> Self {
            self.replies.insert(kind, Ok(text.to_string()));
            self
        }

        pub(crate) fn fail(mut self, kind: PromptKind) -> Self {
            self.replies
                .insert(kind, Err(Error::api(Some(500), format!("{} failed", kind.id()))));
            self
        }

        pub(crate) fn called(&self, kind: PromptKind) -> bool {
            self.calls.borrow().iter().any(|(k, _)| *k == kind)
        }

        pub(crate) fn prompt_for(&self, kind: PromptKind) -> Option<String> {
            self.calls
                .borrow()
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, r)| r.user.clone())
        }
    }

    impl CompletionClient for FakeClient {
        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            let kind = PromptKind::all()
                .iter()
                .copied()
                .find(|k| k.system_prompt() == request.system)
                .ok_or_else(|| Error::api(None, "unknown prompt"))?;
            self.calls.borrow_mut().push((kind, request.clone()));
            self.replies
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| Err(Error::api(None, format!("no reply for {}", kind.id()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markdown_fence() {
        assert_eq!(strip_code_fence("```markdown\n# Title\n\nBody\n```"), "# Title\n\nBody");
        assert_eq!(strip_code_fence("```\n[1, 2]\n```\n"), "[1, 2]");
        assert_eq!(strip_code_fence("```json\r\n{}\r\n```"), "{}");
    }

    #[test]
    fn test_strip_leaves_plain_text() {
        assert_eq!(strip_code_fence("  Просто текст  "), "Просто текст");
        let inner = "Текст\n\n```rust\nfn main() {}\n```\n\nЕщё текст";
        assert_eq!(strip_code_fence(inner), inner);
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"```\nЗаголовок\n```"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Заголовок");
    }

    #[test]
    fn test_extract_empty_choices() {
        let err = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_extract_blank_content() {
        let body = r#"{"choices":[{"message":{"content":"   "}}]}"#;
        assert!(extract_content(body).is_err());
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(extract_content(body).is_err());
    }

    #[test]
    fn test_model_output_limit() {
        assert_eq!(model_output_limit("gpt-4o-mini"), 16_384);
        assert_eq!(model_output_limit("gpt-4"), 8_192);
        assert_eq!(model_output_limit("gpt-3.5-turbo"), 4_096);
        assert_eq!(model_output_limit("some-local-model"), DEFAULT_OUTPUT_LIMIT);
    }

    #[test]
    fn test_request_defaults() {
        let request = CompletionRequest::new("sys", "user", 500);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, 500);
    }

    #[test]
    fn test_client_requires_key() {
        let err = OpenAiClient::new(DEFAULT_API_BASE, " ", DEFAULT_MODEL, Duration::from_secs(5))
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_endpoint_join() {
        let client = OpenAiClient::new("http://localhost:8080/v1/", "key", "m", Duration::from_secs(5))
            .unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(client.model(), "m");
    }
}
