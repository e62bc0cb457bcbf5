//! Bias Common - shared engine pieces for the Risk Bias Detector
//!
//! Oracle transport and client, session audit log, demo catalog, PDF report
//! builder, credential chain and configuration.

pub mod analyst;
pub mod catalog;
pub mod config;
pub mod credential;
pub mod error;
pub mod oracle;
pub mod prompts;
pub mod report;
pub mod session_log;
pub mod text_wrap;
pub mod types;

pub use analyst::OracleClient;
pub use catalog::{DemoCatalog, DemoQuery};
pub use config::Config;
pub use credential::{Credential, CredentialSource, CredentialStore};
pub use error::{DetectorError, Result};
pub use oracle::{CompletionBackend, CompletionRequest, FakeOracle, HttpOracle, OracleError};
pub use report::{ReportBuilder, ReportDocument};
pub use session_log::SessionLog;
pub use types::{Event, Exchange, Verdict};
