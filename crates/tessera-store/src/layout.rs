use crate::StoreError;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_schema::LanguageName;

/// Owner path segment used for packages published without an owner.
pub const LOCAL_OWNER_SEGMENT: &str = "Local";

/// Directory layout for the tessera package and lock stores.
///
/// The package store holds one directory per installed package version; the
/// lock store mirrors the exact same path shape, each directory holding the
/// independently resolved lock document of that package. Staging is scratch
/// space for downloads and extraction before the atomic move into place.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    #[inline]
    pub fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    /// Temporary area for downloaded archives and extraction before the
    /// atomic rename into the package store.
    #[inline]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    fn identity_path(
        base: PathBuf,
        language: &LanguageName,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> PathBuf {
        base.join(language.as_str())
            .join(owner.unwrap_or(LOCAL_OWNER_SEGMENT))
            .join(name)
            .join(version)
    }

    /// Install directory of one package version:
    /// `packages/<Language>/<Owner-or-Local>/<Name>/<Version>/`.
    pub fn package_path(
        &self,
        language: &LanguageName,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> PathBuf {
        Self::identity_path(self.packages_dir(), language, owner, name, version)
    }

    /// Lock-store directory mirroring [`package_path`](Self::package_path).
    pub fn lock_dir(
        &self,
        language: &LanguageName,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> PathBuf {
        Self::identity_path(self.locks_dir(), language, owner, name, version)
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.packages_dir())?;
        fs::create_dir_all(self.locks_dir())?;
        fs::create_dir_all(self.staging_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = StoreLayout::new("/tmp/tessera-test");
        assert_eq!(
            layout.packages_dir(),
            PathBuf::from("/tmp/tessera-test/packages")
        );
        assert_eq!(layout.locks_dir(), PathBuf::from("/tmp/tessera-test/locks"));
        assert_eq!(
            layout.staging_dir(),
            PathBuf::from("/tmp/tessera-test/staging")
        );
    }

    #[test]
    fn package_path_with_owner() {
        let layout = StoreLayout::new("/store");
        let path = layout.package_path(&LanguageName::new("Cpp"), Some("fred"), "json", "1.2.3");
        assert_eq!(path, PathBuf::from("/store/packages/Cpp/fred/json/1.2.3"));
    }

    #[test]
    fn package_path_without_owner_uses_local_segment() {
        let layout = StoreLayout::new("/store");
        let path = layout.package_path(&LanguageName::new("Rune"), None, "assert", "4.4.4");
        assert_eq!(
            path,
            PathBuf::from("/store/packages/Rune/Local/assert/4.4.4")
        );
    }

    #[test]
    fn lock_dir_mirrors_package_path() {
        let layout = StoreLayout::new("/store");
        let pkg = layout.package_path(&LanguageName::new("Cpp"), Some("fred"), "json", "1.2.3");
        let lock = layout.lock_dir(&LanguageName::new("Cpp"), Some("fred"), "json", "1.2.3");
        assert_eq!(
            pkg.strip_prefix("/store/packages").unwrap(),
            lock.strip_prefix("/store/locks").unwrap()
        );
    }

    #[test]
    fn initialize_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();

        assert!(layout.packages_dir().is_dir());
        assert!(layout.locks_dir().is_dir());
        assert!(layout.staging_dir().is_dir());
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.initialize().unwrap();
        assert!(layout.packages_dir().is_dir());
    }
}
