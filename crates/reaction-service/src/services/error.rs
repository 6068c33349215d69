//! Service layer error types
//!
//! Failures inside the engine are logged and contained, so the only error a
//! caller sees comes from wiring the services together.

use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Validation error
    Validation(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
