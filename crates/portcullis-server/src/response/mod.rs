//! Success response envelope.

pub mod types;

pub use types::*;
