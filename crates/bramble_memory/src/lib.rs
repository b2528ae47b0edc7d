//! Typed working memory for the Bramble rule engine.
//!
//! This crate provides:
//! - [`Fact`] - An identity-tagged, typed payload
//! - [`WorkingMemory`] - The owned fact store with type indexing, recency
//!   stamping, and dirty-type tracking across cycles

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod fact;
pub mod memory;

pub use fact::Fact;
pub use memory::WorkingMemory;
