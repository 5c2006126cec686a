use thiserror::Error;

use crate::domain::Domain;

/// Binary-level error: a message plus the process exit code.
///
/// Exit codes: `2` for configuration/usage problems, `4` for runtime I/O.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised inside the fetch → normalize → derive pipeline.
///
/// None of these ever reach a snapshot consumer: `SourceUnavailable` and
/// `ParseFailure` are recovered where they occur, `Configuration` is fatal at
/// startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The provider call failed, timed out, or returned malformed data.
    #[error("{domain} source unavailable: {reason}")]
    SourceUnavailable { domain: Domain, reason: String },

    /// A single field could not be coerced to the expected type.
    #[error("cannot parse {field} from {value:?}")]
    ParseFailure { field: &'static str, value: String },

    /// Invalid refresh interval, timeout, or lookup table.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FeedError {
    pub fn unavailable(domain: Domain, reason: impl Into<String>) -> Self {
        FeedError::SourceUnavailable {
            domain,
            reason: reason.into(),
        }
    }

    pub fn parse(field: &'static str, value: impl Into<String>) -> Self {
        FeedError::ParseFailure {
            field,
            value: value.into(),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        let code = match err {
            FeedError::Configuration(_) => 2,
            _ => 4,
        };
        AppError::new(code, err.to_string())
    }
}
