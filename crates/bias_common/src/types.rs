//! Core data types for one analysis turn.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-text description of a security decision to analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event(String);

impl Event {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Oracle's bias assessment for one event. Not parsed, only carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict(String);

impl Verdict {
    /// Surrounding whitespace is dropped.
    pub fn new(text: &str) -> Self {
        Self(text.trim().to_string())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// One event paired with its verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub event: Event,
    pub verdict: Verdict,
    pub timestamp: DateTime<Local>,
}

impl Exchange {
    pub fn new(event: Event, verdict: Verdict) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            verdict,
            timestamp: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_trimmed() {
        assert_eq!(Verdict::new("\n  Fair decision.  \n").text(), "Fair decision.");
    }

    #[test]
    fn test_blank_event() {
        assert!(Event::new("   ").is_blank());
        assert!(!Event::new("User X denied").is_blank());
    }
}
