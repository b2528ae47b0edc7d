//! Core types for the Bramble rule engine.
//!
//! This crate provides:
//! - [`Value`] - The dynamically typed payload value
//! - [`Payload`] - Persistent attribute maps for facts
//! - [`FactId`] - Monotonic fact identifiers
//! - [`Error`] - Rich error types with rule context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ident;
pub mod payload;
pub mod value;

// Re-export primary types at crate root for convenience
pub use error::{Error, ErrorKind};
pub use ident::FactId;
pub use payload::Payload;
pub use value::Value;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
