//! # Provider
//!
//! Provider defines external data interfaces for the crate.

use anyhow::Result;
use bytes::Bytes;
use http::{Request, Response};

/// Provider entry point implemented by the host application.
pub trait Provider: HttpRequest + Config + Identity {}

/// The `HttpRequest` trait defines the behavior for fetching data from a source.
pub trait HttpRequest: Send + Sync {
    /// Make outbound HTTP request.
    ///
    /// Implementations are expected to bound the request with a timeout so a
    /// hung request cannot stall a poll cycle.
    fn fetch(&self, request: Request<Bytes>)
    -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// The `Config` trait is used by implementers to provide configuration to
/// dependent crates.
pub trait Config: Send + Sync {
    /// Request configuration setting.
    fn get(&self, key: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Supplies credentials for the telemetry source.
pub trait Identity: Send + Sync {
    /// Get the access token presented to the telemetry source.
    fn access_token(&self) -> impl Future<Output = Result<String>> + Send;
}
