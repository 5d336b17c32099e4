//! Package store layout and archive handling for tessera.
//!
//! This crate provides the storage layer: `StoreLayout` for the on-disk
//! package store, its mirrored lock store, and the staging area, plus tar
//! archive pack/unpack helpers used when installing package archives.

pub mod archive;
pub mod layout;

pub use archive::{pack_archive, unpack_archive};
pub use layout::StoreLayout;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive entry '{0}' escapes the extraction directory")]
    UnsafeArchivePath(String),
}
