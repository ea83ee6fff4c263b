//! Error handling for the Portcullis API server.

pub mod response;
pub mod types;

pub use types::{ApiError, ApiResult};
