use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ERROR_NAME: &str = "INTERNAL_SERVER_ERROR";
pub const DEFAULT_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Failure payload returned by the backend for a rejected request.
///
/// The `message` and `info` fields are shown to the user verbatim when a
/// pending mutation is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{name} ({status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            name: name.into(),
            message: message.into(),
            info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl Default for ApiError {
    fn default() -> Self {
        Self::new(500, DEFAULT_ERROR_NAME, DEFAULT_ERROR_MESSAGE)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
