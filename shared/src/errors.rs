//! Shared error types for the chaos monkey workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Invalid schedule: {input}")]
    InvalidSchedule { input: String },

    #[error("Configuration file error: {message}")]
    ConfigFile { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SharedError {
    pub fn invalid(field: &str, value: impl ToString) -> Self {
        SharedError::InvalidConfig {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
