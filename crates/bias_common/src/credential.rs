//! Oracle credential acquisition
//!
//! A local secret file is tried first; if it is missing or does not look like
//! an API token, the operator is asked. The token lives in memory only.

use crate::error::{DetectorError, Result};
use regex::Regex;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Expected shape of an API token
pub const TOKEN_PATTERN: &str = r"^sk-[A-Za-z0-9_\-]{20,}$";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex"))
}

/// Where the credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    SecretFile,
    Prompt,
}

/// Oracle access token. Debug output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn looks_valid(&self) -> bool {
        token_regex().is_match(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

/// Secret-file-then-prompt fallback chain
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First line of the secret file, if it exists and matches the token pattern
    pub fn read_secret_file(&self) -> Option<Credential> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No usable secret file at {}: {}", self.path.display(), e);
                return None;
            }
        };

        let credential = Credential::new(content.lines().next().unwrap_or("").trim());
        if credential.looks_valid() {
            Some(credential)
        } else {
            tracing::warn!(
                "Secret file {} does not contain a valid token, asking instead",
                self.path.display()
            );
            None
        }
    }

    /// Resolve the credential, calling `prompt` only when the file is unusable.
    pub fn acquire<P>(&self, prompt: P) -> Result<(Credential, CredentialSource)>
    where
        P: FnOnce() -> io::Result<String>,
    {
        if let Some(credential) = self.read_secret_file() {
            return Ok((credential, CredentialSource::SecretFile));
        }

        let answer = prompt().map_err(|e| DetectorError::Credential(e.to_string()))?;
        let token = answer.trim();
        if token.is_empty() {
            return Err(DetectorError::Credential("no API key entered".to_string()));
        }
        Ok((Credential::new(token), CredentialSource::Prompt))
    }
}
