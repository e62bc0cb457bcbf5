//! Oracle transport
//!
//! The classification oracle is an OpenAI-compatible chat-completions service.
//! Callers talk to it through the `CompletionBackend` trait so the session can
//! run against the real HTTP service or a scripted fake in tests.

use crate::credential::Credential;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Decoding temperature for every request. Pinned so identical input gives
/// stable verdicts.
pub const TEMPERATURE: f32 = 0.0;

/// Message role in a chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
}

/// Chat-completions request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Persona, user text and primed context, in that order.
    pub fn framed(model: &str, persona: &str, user_text: &str, context: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage::new(Role::System, persona),
                ChatMessage::new(Role::User, user_text),
                ChatMessage::new(Role::Assistant, context),
            ],
            temperature: TEMPERATURE,
        }
    }

    /// Content of the first user message
    pub fn user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Oracle transport errors. Every variant means the oracle is unavailable
/// for this request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("credential rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("rate limit reached, try again later")]
    RateLimited,

    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("oracle returned an empty response")]
    EmptyResponse,
}

/// Transport to the classification oracle
pub trait CompletionBackend {
    /// Send one request and return the raw text of the first choice.
    fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError>;
}

/// Connection settings for the HTTP backend
#[derive(Debug, Clone)]
pub struct HttpOracleSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
}

/// Real oracle backend over blocking HTTP
pub struct HttpOracle {
    settings: HttpOracleSettings,
    credential: Credential,
    client: reqwest::blocking::Client,
}

impl HttpOracle {
    pub fn new(settings: HttpOracleSettings, credential: Credential) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| OracleError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            credential,
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        )
    }
}

impl CompletionBackend for HttpOracle {
    fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.credential.expose())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.settings.timeout_secs)
                } else {
                    OracleError::Http(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(OracleError::Unauthorized(status.as_u16()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited);
        }
        if !status.is_success() {
            return Err(OracleError::Http(format!("HTTP {} from oracle", status)));
        }

        let body: CompletionResponse = response
            .json()
            .map_err(|e| OracleError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        extract_content(body)
    }
}

fn extract_content(body: CompletionResponse) -> Result<String, OracleError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(OracleError::EmptyResponse)
}

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, OracleError> + Send + Sync>;

/// Fake oracle for tests
///
/// Either replays a script of responses (the last one repeats) or computes
/// each response from the request. Every request is recorded.
pub struct FakeOracle {
    script: Mutex<Vec<Result<String, OracleError>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeOracle {
    /// Replay pre-defined responses in order
    pub fn new(script: Vec<Result<String, OracleError>>) -> Self {
        Self {
            script: Mutex::new(script),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Always fail with the same error
    pub fn always_error(error: OracleError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Answer with a function of the request
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, OracleError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(Vec::new()),
            responder: Some(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Snapshot of every request seen so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl CompletionBackend for FakeOracle {
    fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(responder) = &self.responder {
            return responder(request);
        }

        let mut script = self
            .script
            .lock()
            .map_err(|_| OracleError::Http("fake oracle poisoned".to_string()))?;
        match script.len() {
            0 => Err(OracleError::EmptyResponse),
            1 => script[0].clone(),
            _ => script.remove(0),
        }
    }
}

impl<B: CompletionBackend + ?Sized> CompletionBackend for &B {
    fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        (**self).complete(request)
    }
}

impl<B: CompletionBackend + ?Sized> CompletionBackend for Box<B> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        (**self).complete(request)
    }
}
