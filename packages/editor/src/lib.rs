//! Document mutation engine.
//!
//! All edits are expressed as [`Mutation`] values applied functionally to a
//! parsed document: [`apply_mutation`] never panics and returns the input
//! document unchanged when a mutation does not validate.

mod cookies;
mod mutations;
mod table;

pub use mutations::{apply_mutation, DropPosition, Mutation, MutationError};
pub use orgdown_parser::cookies::recompute_cookies_at;
