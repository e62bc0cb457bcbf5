//! Error types for the detector.
//!
//! Four conditions are recoverable at the menu (oracle unavailable, invalid
//! input, catalog index out of range, report write failure). Everything else
//! is a resource failure and ends the session.

use crate::oracle::OracleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid input: demo {index} does not exist (choose 1-{count})")]
    CatalogOutOfRange { index: usize, count: usize },

    #[error("Report could not be written: {0}")]
    ReportWriteFailed(String),

    #[error("Session log error: {0}")]
    SessionLog(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    /// True for conditions the engine reports and recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DetectorError::OracleUnavailable(_)
                | DetectorError::InvalidInput(_)
                | DetectorError::CatalogOutOfRange { .. }
                | DetectorError::ReportWriteFailed(_)
        )
    }

    /// Out-of-range catalog picks are a kind of invalid input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DetectorError::InvalidInput(_) | DetectorError::CatalogOutOfRange { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            DetectorError::OracleUnavailable(_) => "oracle_unavailable",
            DetectorError::InvalidInput(_) => "invalid_input",
            DetectorError::CatalogOutOfRange { .. } => "catalog_out_of_range",
            DetectorError::ReportWriteFailed(_) => "report_write_failed",
            DetectorError::SessionLog(_) => "session_log",
            DetectorError::Config(_) => "config",
            DetectorError::Credential(_) => "credential",
            DetectorError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;
