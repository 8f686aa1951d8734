//! Error types for the Huddle core library.
//!
//! Every fallible operation in the synchronization engine returns a
//! [`HuddleError`]. Errors fall into two families that callers treat very
//! differently: validation errors are raised before any remote call is made
//! and are always reported synchronously, while transport errors mean the
//! Remote Gateway was unreachable or refused the request and the operation
//! did not take effect.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Validation | Input rejected locally, no remote call made |
//! | E2001-E2099 | Config | Config file, environment and value errors |
//! | E3001-E3099 | Transport | Remote Gateway unreachable, timed out or rejected |
//! | E9001-E9099 | General | Internal, IO and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::MeetingStatus;

/// The main error type for the Huddle core library.
#[derive(Debug, Error)]
pub enum HuddleError {
    // ========================================================================
    // Validation Errors (E1001-E1099)
    // ========================================================================
    /// Meeting title was empty or whitespace-only
    #[error("[E1001] Meeting title must not be empty")]
    EmptyTitle,

    /// Message content was empty or whitespace-only
    #[error("[E1002] Message content must not be empty")]
    EmptyContent,

    /// Operation requires an active meeting but none is selected
    #[error("[E1003] No meeting is currently active")]
    NoActiveMeeting,

    /// Operation targeted a meeting other than the active one
    #[error("[E1004] Meeting '{requested}' is not the active meeting (active: '{active}')")]
    MeetingNotActive { requested: String, active: String },

    /// Requested lifecycle transition is not defined
    #[error("[E1005] Meeting '{meeting_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        meeting_id: String,
        from: MeetingStatus,
        to: MeetingStatus,
    },

    /// An agent discussion is already in flight
    #[error("[E1006] An agent discussion is already in progress")]
    DiscussionInProgress,

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Configuration file parse error
    #[error("[E2001] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2002] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// Required configuration is missing
    #[error("[E2003] Missing required configuration: {0}")]
    MissingConfig(String),

    // ========================================================================
    // Transport Errors (E3001-E3099)
    // ========================================================================
    /// Remote Gateway could not be reached
    #[error("[E3001] Meeting gateway unreachable: {0}")]
    GatewayUnreachable(String),

    /// Request to the Remote Gateway timed out
    #[error("[E3002] Meeting gateway request timed out: {0}")]
    GatewayTimeout(String),

    /// Remote Gateway answered with a non-success status
    #[error("[E3003] Meeting gateway rejected the request ({status}): {message}")]
    GatewayRejected { status: u16, message: String },

    /// Remote Gateway answered with a body that could not be decoded
    #[error("[E3004] Failed to parse gateway response: {0}")]
    GatewayParseError(String),

    /// Any other request failure
    #[error("[E3005] Gateway request failed: {0}")]
    GatewayRequestFailed(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("[E9002] IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("[E9003] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for Huddle operations.
pub type HuddleResult<T> = Result<T, HuddleError>;

impl From<reqwest::Error> for HuddleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HuddleError::GatewayTimeout(err.to_string())
        } else if err.is_connect() {
            HuddleError::GatewayUnreachable(err.to_string())
        } else if err.is_status() {
            HuddleError::GatewayRejected {
                status: err.status().map(|s| s.as_u16()).unwrap_or_default(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            HuddleError::GatewayParseError(err.to_string())
        } else {
            HuddleError::GatewayRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HuddleError {
    fn from(err: serde_json::Error) -> Self {
        HuddleError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for HuddleError {
    fn from(err: std::io::Error) -> Self {
        HuddleError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for HuddleError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => HuddleError::MissingConfig(key),
            config::ConfigError::FileParse { uri, cause } => HuddleError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => HuddleError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => HuddleError::ConfigParseError(err.to_string()),
        }
    }
}

impl From<crate::config::ConfigLoadError> for HuddleError {
    fn from(err: crate::config::ConfigLoadError) -> Self {
        match err {
            crate::config::ConfigLoadError::Config(e) => e.into(),
            crate::config::ConfigLoadError::MissingRequired(key) => HuddleError::MissingConfig(key),
            crate::config::ConfigLoadError::InvalidValue { key, message } => {
                HuddleError::InvalidConfigValue { key, message }
            }
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl HuddleError {
    /// Returns true if the input was rejected before any remote call.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            HuddleError::EmptyTitle
                | HuddleError::EmptyContent
                | HuddleError::NoActiveMeeting
                | HuddleError::MeetingNotActive { .. }
                | HuddleError::InvalidTransition { .. }
                | HuddleError::DiscussionInProgress
        )
    }

    /// Returns true if this error is related to configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            HuddleError::ConfigParseError(_)
                | HuddleError::InvalidConfigValue { .. }
                | HuddleError::MissingConfig(_)
        )
    }

    /// Returns true if the Remote Gateway call did not take effect.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            HuddleError::GatewayUnreachable(_)
                | HuddleError::GatewayTimeout(_)
                | HuddleError::GatewayRejected { .. }
                | HuddleError::GatewayParseError(_)
                | HuddleError::GatewayRequestFailed(_)
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            HuddleError::EmptyTitle => "E1001",
            HuddleError::EmptyContent => "E1002",
            HuddleError::NoActiveMeeting => "E1003",
            HuddleError::MeetingNotActive { .. } => "E1004",
            HuddleError::InvalidTransition { .. } => "E1005",
            HuddleError::DiscussionInProgress => "E1006",
            HuddleError::ConfigParseError(_) => "E2001",
            HuddleError::InvalidConfigValue { .. } => "E2002",
            HuddleError::MissingConfig(_) => "E2003",
            HuddleError::GatewayUnreachable(_) => "E3001",
            HuddleError::GatewayTimeout(_) => "E3002",
            HuddleError::GatewayRejected { .. } => "E3003",
            HuddleError::GatewayParseError(_) => "E3004",
            HuddleError::GatewayRequestFailed(_) => "E3005",
            HuddleError::Internal(_) => "E9001",
            HuddleError::IoError(_) => "E9002",
            HuddleError::SerializationError(_) => "E9003",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            HuddleError::EmptyTitle => Some("Give the meeting a title"),
            HuddleError::NoActiveMeeting | HuddleError::MeetingNotActive { .. } => {
                Some("Select the meeting before acting on it")
            }
            HuddleError::DiscussionInProgress => {
                Some("Wait for the current discussion round to finish")
            }
            HuddleError::GatewayUnreachable(_) => {
                Some("Check that the meeting server is running and HUDDLE_GATEWAY_URL is correct")
            }
            HuddleError::GatewayTimeout(_) => {
                Some("The meeting server is slow to respond. Try again in a few seconds")
            }
            HuddleError::ConfigParseError(_) | HuddleError::InvalidConfigValue { .. } => {
                Some("Check huddle.toml and HUDDLE_* environment variables")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_transport_error() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Gateway error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with suggestions.
pub struct CliErrorDisplay<'a> {
    error: &'a HuddleError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a HuddleError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl fmt::Display for CliErrorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}
