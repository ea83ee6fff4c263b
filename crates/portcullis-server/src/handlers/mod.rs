//! Request handlers for the v1 routes.
//!
//! Handlers stay thin: admission (rate limiting, authentication, resource
//! loading and authorization) has already happened by the time they run.

pub mod auth;
pub mod posts;
pub mod users;
