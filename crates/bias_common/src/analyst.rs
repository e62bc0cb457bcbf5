//! Oracle client - frames events for the oracle and records every answer
//!
//! Every request is three role-tagged messages: a fixed persona (system), the
//! caller's text (user) and a fixed context (assistant). The same client
//! renders the welcome banner with a different framing.

use crate::error::Result;
use crate::oracle::{CompletionBackend, CompletionRequest};
use crate::prompts::{self, Framing};
use crate::session_log::SessionLog;
use crate::types::{Event, Verdict};

/// Default oracle model
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub struct OracleClient<B> {
    backend: B,
    model: String,
    banner_model: String,
    echo_verdicts: bool,
}

impl<B: CompletionBackend> OracleClient<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            backend,
            banner_model: model.clone(),
            model,
            echo_verdicts: false,
        }
    }

    pub fn with_banner_model(mut self, model: impl Into<String>) -> Self {
        self.banner_model = model.into();
        self
    }

    /// Echo raw oracle text to the debug log
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_verdicts = echo;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the oracle for a bias assessment of one event
    pub fn classify(&self, event: &Event, log: &mut SessionLog) -> Result<Verdict> {
        let text = self.exchange(prompts::ANALYST, event.text(), &self.model, log)?;
        Ok(Verdict::new(&text))
    }

    /// Ask the oracle for the welcome banner
    pub fn render_banner(
        &self,
        app_name: &str,
        now: &str,
        location: &str,
        log: &mut SessionLog,
    ) -> Result<String> {
        let request = prompts::banner_request(app_name, now, location);
        self.exchange(prompts::BANNER, &request, &self.banner_model, log)
    }

    fn exchange(
        &self,
        framing: Framing,
        user_text: &str,
        model: &str,
        log: &mut SessionLog,
    ) -> Result<String> {
        let request = CompletionRequest::framed(model, framing.persona, user_text, framing.context);
        tracing::debug!(
            "Oracle request: model={} user_chars={}",
            model,
            user_text.chars().count()
        );

        let raw = self.backend.complete(&request).map_err(|e| {
            tracing::warn!("Oracle call failed: {}", e);
            e
        })?;
        let text = raw.trim().to_string();

        log.write(&text)?;
        if self.echo_verdicts {
            tracing::debug!("[oracle] {}", text);
        }
        Ok(text)
    }
}
