//! Idempotent installation of package archives into the store.

use crate::CoreError;
use std::fs;
use tessera_remote::{PackageClient, RemoteError};
use tessera_schema::LanguageName;
use tessera_store::{unpack_archive, StoreLayout};
use tracing::{debug, info};

/// Ensures package content is present in the store, downloading and
/// extracting on demand.
pub struct PackageInstaller<'a> {
    layout: &'a StoreLayout,
    client: &'a dyn PackageClient,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(layout: &'a StoreLayout, client: &'a dyn PackageClient) -> Self {
        Self { layout, client }
    }

    /// Ensure one exact package version exists under the package store.
    ///
    /// An existing version directory is trusted as-is. Otherwise the archive
    /// is downloaded to staging, extracted into a uniquely named staging
    /// subdirectory, and renamed into its final location in one step, so a
    /// crash mid-install never leaves a half-populated version directory.
    ///
    /// Returns `true` when the package was newly installed.
    pub fn ensure_installed(
        &self,
        language: &LanguageName,
        owner: Option<&str>,
        name: &str,
        version: &semver::Version,
    ) -> Result<bool, CoreError> {
        let version_str = version.to_string();
        let final_dir = self
            .layout
            .package_path(language, owner, name, &version_str);
        if final_dir.is_dir() {
            debug!("[{language}]{name}@{version} already installed");
            return Ok(false);
        }

        info!("installing [{language}]{name}@{version}");
        let data = self
            .client
            .download(language.as_str(), owner, name, &version_str)
            .map_err(|e| match e {
                RemoteError::PackageNotFound(coordinate) => CoreError::PackageNotFound(coordinate),
                other => CoreError::Remote(other),
            })?;

        let staging = self.layout.staging_dir();
        fs::create_dir_all(&staging)?;

        // Unique per identity so unrelated installs never collide in staging.
        let unique = format!("{language}_{name}_{version_str}");
        let archive_path = staging.join(format!("{unique}.tar"));
        fs::write(&archive_path, &data)?;

        let extract_dir = staging.join(&unique);
        if extract_dir.exists() {
            fs::remove_dir_all(&extract_dir)?;
        }
        unpack_archive(&data, &extract_dir)?;
        fs::remove_file(&archive_path)?;

        if let Some(parent) = final_dir.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&extract_dir, &final_dir)?;

        Ok(true)
    }
}
