//! HTTP client factory.
//!
//! All requests to the backend go through a client built here so they share
//! the same User-Agent, connection pool and timeouts.

use std::time::Duration;

use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// User-Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!("bob-client/", env!("CARGO_PKG_VERSION"));

/// Connection pool idle timeout so DNS is re-resolved periodically.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates an HTTP client configured from `config`.
///
/// Includes: User-Agent, tcp_nodelay, connect and total timeouts.
pub fn create_client(config: &ClientConfig) -> Result<Client> {
    create_client_builder(config)
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Creates an HTTP client builder with standard configuration.
///
/// Use this when you need to customize the client further before building.
pub fn create_client_builder(config: &ClientConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .tcp_nodelay(true)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(4)
}
