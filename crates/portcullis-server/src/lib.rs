//! Portcullis API Server
//!
//! Request admission for a small JSON API. Every inbound request passes, in
//! order, through:
//!
//! - **Rate limiting**: fixed windows keyed by client address
//! - **Authentication**: HS256 bearer tokens, or basic auth for operator routes
//! - **Resource loading**: the targeted entity is fetched (404 when absent)
//! - **Authorization**: ownership first, then the route's minimum role
//!
//! User records are served through a read-through cache that is invalidated
//! whenever an account changes state.

#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod monitoring;
pub mod request;
pub mod response;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{MemoryStore, Storage};
use tokio::net::TcpListener;
use tracing::info;

/// Server builder for constructing and running the API server.
pub struct Server {
    addr: SocketAddr,
    state: AppState,
}

impl Server {
    /// Create a server over the in-process store.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a server over an arbitrary storage backend.
    pub fn with_store(config: ServerConfig, store: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let addr = config
            .server
            .socket_addr()
            .context("invalid bind address")?;
        let state = AppState::new(config, store)?;
        Ok(Self { addr, state })
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone())
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;

        info!(addr = %self.addr, "server listening");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

        Ok(())
    }
}
