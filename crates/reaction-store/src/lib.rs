//! # reaction-store
//!
//! In-memory implementations of the collaborator traits defined in
//! `reaction-core`: a message store indexed by send time and a directory
//! that maps wire identities to direct conversations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reaction_core::{IdentityRef, SnowflakeGenerator};
//! use reaction_store::{InMemoryDirectory, InMemoryMessageStore};
//!
//! let messages = Arc::new(InMemoryMessageStore::new());
//! let directory = InMemoryDirectory::new(
//!     Arc::clone(&messages),
//!     Arc::new(SnowflakeGenerator::default()),
//!     IdentityRef::parse("me")?,
//! );
//! ```

pub mod repositories;

// Re-export commonly used types
pub use repositories::{InMemoryDirectory, InMemoryMessageStore};
