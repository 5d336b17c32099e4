//! Dependency discovery, closure resolution, lock synthesis, and the
//! recursive restore engine for tessera.
//!
//! This crate ties the schema, store, and remote layers together into the
//! `Engine` — the central API for restoring a project: discover its
//! dependency graph, negotiate a resolution with the remote service,
//! persist a deterministic lock document, install every resolved package,
//! and recurse into the closure of every build/tool extension package.

pub mod builtin;
pub mod discover;
pub mod engine;
pub mod install;
pub mod resolve;
pub mod restore;
pub mod synthesize;

pub use discover::{DiscoveredGraph, LocalPackage, PublicPackage};
pub use engine::Engine;
pub use install::PackageInstaller;
pub use resolve::{resolve_closures, ResolvedClosures, RuntimeMember};
pub use restore::{Restorer, MAX_RESTORE_DEPTH};
pub use synthesize::build_package_lock;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("recipe error: {0}")]
    Recipe(#[from] tessera_schema::RecipeError),
    #[error("lock error: {0}")]
    Lock(#[from] tessera_schema::LockError),
    #[error("store error: {0}")]
    Store(#[from] tessera_store::StoreError),
    #[error("remote error: {0}")]
    Remote(#[from] tessera_remote::RemoteError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("project directory not found: {0}")]
    ProjectNotFound(PathBuf),
    #[error("tool dependency '{package}' in '{project}' must declare an explicit language tag")]
    MissingToolLanguage { package: String, project: String },
    #[error("unable to reach the resolution service ({0}), check your network connection")]
    ResolutionUnavailable(String),
    #[error("the resolution service rejected the request: {0}")]
    ResolutionFailed(String),
    #[error("resolution response violated the protocol contract: {0}")]
    InvalidResponse(String),
    #[error("package version not found in the index: {0}")]
    PackageNotFound(String),
    #[error("restore recursion exceeded the maximum depth of {0}")]
    DepthExceeded(usize),
}
