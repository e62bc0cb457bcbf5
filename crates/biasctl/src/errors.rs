//! Exit codes for biasctl

use bias_common::DetectorError;

/// Exit code for success (including the operator's exit choice)
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the configuration file is missing or malformed
pub const EXIT_CONFIG_ERROR: i32 = 64;

/// Exit code when no credential could be obtained
pub const EXIT_CREDENTIAL_ERROR: i32 = 65;

/// Exit code when the session audit log cannot be opened or written
pub const EXIT_SESSION_LOG_ERROR: i32 = 70;

/// Map a fatal error chain to an exit code
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|e| e.downcast_ref::<DetectorError>()) {
        Some(DetectorError::Config(_)) => EXIT_CONFIG_ERROR,
        Some(DetectorError::Credential(_)) => EXIT_CREDENTIAL_ERROR,
        Some(DetectorError::SessionLog(_)) => EXIT_SESSION_LOG_ERROR,
        _ => EXIT_GENERAL_ERROR,
    }
}
