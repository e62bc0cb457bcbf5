//! Demo catalog - canned events usable without typing
//!
//! Indices are 1-based and follow definition order.

use crate::error::{DetectorError, Result};
use crate::types::Event;

/// One pre-authored event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoQuery {
    pub index: usize,
    pub text: &'static str,
}

impl DemoQuery {
    pub fn event(&self) -> Event {
        Event::new(self.text)
    }
}

const BUILTIN: &[&str] = &[
    "User account j.kowalski was denied VPN access because the login originated from a country \
     flagged as high risk, although the same user connected from that country last month \
     without incident.",
    "The fraud model blocked a card payment from a customer aged 71 after an unusual \
     purchase amount, while a similar purchase by a 30-year-old customer with the same \
     history was approved.",
    "The access-control system escalated an employee to manual review because their \
     keyboard layout and system language did not match the office region, even though \
     their credentials and MFA were valid.",
];

/// Fixed, ordered set of demo events
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    entries: Vec<DemoQuery>,
}

impl DemoCatalog {
    /// Catalog compiled into the binary
    pub fn builtin() -> Self {
        Self::from_texts(BUILTIN)
    }

    pub fn from_texts(texts: &[&'static str]) -> Self {
        let entries = texts
            .iter()
            .enumerate()
            .map(|(i, text)| DemoQuery {
                index: i + 1,
                text: *text,
            })
            .collect();
        Self { entries }
    }

    pub fn list(&self) -> &[DemoQuery] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Entry at a 1-based index
    pub fn get(&self, index: usize) -> Result<DemoQuery> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .copied()
            .ok_or(DetectorError::CatalogOutOfRange {
                index,
                count: self.count(),
            })
    }
}

impl Default for DemoCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
