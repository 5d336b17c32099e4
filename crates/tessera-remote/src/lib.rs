//! Resolution service and package index clients for tessera.
//!
//! This crate provides the wire types for the closure resolution API, the
//! `ResolutionClient`/`PackageClient` traits, an HTTP backend over `ureq`,
//! and an in-memory mock registry for tests and offline runs.

pub mod api;
pub mod config;
pub mod http;
pub mod mock;

pub use api::{
    ClosureEntry, LocalRequestPackage, PublicExactReference, PublicRequestPackage,
    ResolutionOutcome, ResolutionRequest, ResolutionResponse, RuntimeClosureEntry, WireLanguage,
};
pub use config::RemoteConfig;
pub use http::HttpBackend;
pub use mock::MockRegistry;

use thiserror::Error;

/// Protocol version sent as `X-Tessera-Protocol` header on all HTTP requests.
/// Servers can reject clients with incompatible protocol versions.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("package not found: {0}")]
    PackageNotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("remote config error: {0}")]
    Config(String),
}

/// Client for the closure resolution service.
pub trait ResolutionClient {
    /// Negotiate a version-consistent resolution for a discovered graph.
    fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResponse, RemoteError>;
}

/// Client for the package index download API.
pub trait PackageClient {
    /// Fetch the archive of one exact package version.
    ///
    /// A missing version is reported as [`RemoteError::PackageNotFound`];
    /// every other transport failure propagates as-is.
    fn download(
        &self,
        language: &str,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> Result<Vec<u8>, RemoteError>;
}

impl<T: ResolutionClient + ?Sized> ResolutionClient for std::sync::Arc<T> {
    fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResponse, RemoteError> {
        (**self).resolve(request)
    }
}

impl<T: PackageClient + ?Sized> PackageClient for std::sync::Arc<T> {
    fn download(
        &self,
        language: &str,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> Result<Vec<u8>, RemoteError> {
        (**self).download(language, owner, name, version)
    }
}
