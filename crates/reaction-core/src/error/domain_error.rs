//! Domain errors - error types for the domain layer and collaborator ports

use thiserror::Error;

use crate::value_objects::{IdentityRef, Snowflake};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("No identity can be derived for {0}")]
    IdentityUnresolvable(IdentityRef),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("No message from {author} sent at {sent_at}")]
    TargetMessageNotFound { author: Snowflake, sent_at: i64 },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Task queue for conversation {0} is closed")]
    QueueClosed(Snowflake),
}

impl DomainError {
    /// Get a stable error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::IdentityUnresolvable(_) => "UNRESOLVABLE_IDENTITY",
            Self::ConversationNotFound(_) => "UNKNOWN_CONVERSATION",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::TargetMessageNotFound { .. } => "UNKNOWN_TARGET_MESSAGE",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",

            // Infrastructure
            Self::StoreError(_) => "STORE_ERROR",
            Self::QueueClosed(_) => "QUEUE_CLOSED",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::IdentityUnresolvable(_)
                | Self::ConversationNotFound(_)
                | Self::MessageNotFound(_)
                | Self::TargetMessageNotFound { .. }
        )
    }
}
