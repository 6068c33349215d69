//! Value objects - immutable types that represent domain concepts

mod identity_ref;
mod snowflake;

pub use identity_ref::{IdentityRef, IdentityRefError};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
