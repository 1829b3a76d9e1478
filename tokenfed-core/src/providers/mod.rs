//! Identity provider implementations.
//!
//! This module provides the three ways tokenfed obtains a token:
//! - [`client_credentials`] - Direct OAuth2 client-credentials exchange
//! - [`vault`] - Cloud-identity login to Vault, secret read, then a direct exchange
//! - [`static_token`] - Out-of-band token checked for liveness
//!
//! # Features
//!
//! This module is only available when the `oauth` feature is enabled.

pub mod client_credentials;
pub mod static_token;
pub mod vault;

pub use client_credentials::ClientCredentialsProvider;
pub use static_token::StaticTokenProvider;
pub use vault::VaultProvider;

use std::time::Duration;

use crate::generator::{FailureReason, ProviderError};

const USER_AGENT: &str = concat!("tokenfed/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the Vault and static token providers.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::HttpClient {
            message: e.to_string(),
        })
}

/// Classify a reqwest failure.
pub(crate) fn transport_failure(err: reqwest::Error, timeout: Duration) -> FailureReason {
    if err.is_timeout() {
        FailureReason::Timeout(timeout.as_secs())
    } else if err.is_decode() {
        FailureReason::Malformed(err.to_string())
    } else {
        FailureReason::Transport(err.to_string())
    }
}

/// Join a relative API path onto a base URL, tolerating slashes on either side.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
