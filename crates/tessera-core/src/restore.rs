//! The recursive restore engine.
//!
//! Given a project and its lock path, make the lock exist (resolving if
//! necessary), install everything it references, then recurse into the
//! closure of every build/tool extension package — each of which is a
//! project in its own right with an independently resolved and cached lock.

use crate::discover::DiscoveredGraph;
use crate::install::PackageInstaller;
use crate::resolve::resolve_closures;
use crate::synthesize::build_package_lock;
use crate::{builtin, CoreError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_remote::{PackageClient, ResolutionClient};
use tessera_schema::{LockVersion, PackageLock, PackageName, LOCK_FILE_NAME};
use tessera_store::StoreLayout;
use tracing::{debug, info};

/// Defensive bound on closure nesting. Real build-tool chains are a handful
/// of levels deep; anything beyond this is a broken graph.
pub const MAX_RESTORE_DEPTH: usize = 32;

/// One restore invocation: the processed set spans the whole recursion so a
/// package reachable through several closures is restored exactly once.
pub struct Restorer<'a> {
    layout: &'a StoreLayout,
    resolution: &'a dyn ResolutionClient,
    packages: &'a dyn PackageClient,
    processed: HashSet<PathBuf>,
}

impl<'a> Restorer<'a> {
    pub fn new(
        layout: &'a StoreLayout,
        resolution: &'a dyn ResolutionClient,
        packages: &'a dyn PackageClient,
    ) -> Self {
        Self {
            layout,
            resolution,
            packages,
            processed: HashSet::new(),
        }
    }

    /// Restore the project at `working_dir` against `lock_path`, recursing
    /// into every discovered build/tool extension closure.
    pub fn restore(&mut self, working_dir: &Path, lock_path: &Path) -> Result<(), CoreError> {
        self.restore_at(working_dir, lock_path, 0)
    }

    fn restore_at(
        &mut self,
        working_dir: &Path,
        lock_path: &Path,
        depth: usize,
    ) -> Result<(), CoreError> {
        if depth > MAX_RESTORE_DEPTH {
            return Err(CoreError::DepthExceeded(MAX_RESTORE_DEPTH));
        }

        let key = lock_key(lock_path)?;
        if self.processed.contains(&key) {
            info!("root {} already processed, skipping", key.display());
            return Ok(());
        }

        let lock = self.ensure_lock(working_dir, lock_path)?;
        self.restore_packages(&lock)?;
        self.recurse_closures(working_dir, &lock, depth)?;

        // Marked only once the whole subtree is restored; an aborted run
        // must not leave the path looking done.
        self.processed.insert(key);
        Ok(())
    }

    /// Load an existing lock verbatim, or run the full
    /// discover-resolve-synthesize pipeline and persist the result.
    fn ensure_lock(&self, working_dir: &Path, lock_path: &Path) -> Result<PackageLock, CoreError> {
        if lock_path.is_file() {
            info!("using existing lock {}", lock_path.display());
            return Ok(PackageLock::read_from_file(lock_path)?);
        }

        info!("resolving closure for {}", working_dir.display());
        let mut graph = DiscoveredGraph::new();
        let root_id = graph.discover(working_dir)?;
        let closures = resolve_closures(self.resolution, &graph, root_id)?;
        let lock = build_package_lock(&closures);
        lock.write_to_file(lock_path)?;
        info!("wrote {}", lock_path.display());
        Ok(lock)
    }

    /// Install every pinned package in every closure of the lock. Local path
    /// entries and the bundled runtime are skipped.
    fn restore_packages(&self, lock: &PackageLock) -> Result<(), CoreError> {
        info!("restoring packages");
        let installer = PackageInstaller::new(self.layout, self.packages);
        for languages in lock.closures.values() {
            for (language, entries) in languages {
                for (name_key, entry) in entries {
                    match entry.parsed_version() {
                        LockVersion::SemVer(version) => {
                            let name = PackageName::parse(name_key);
                            if builtin::is_builtin(
                                language,
                                name.owner.as_deref(),
                                &name.name,
                                &version,
                            ) {
                                debug!("skipping bundled {name_key}@{version}");
                                continue;
                            }
                            installer.ensure_installed(
                                language,
                                name.owner.as_deref(),
                                &name.name,
                                &version,
                            )?;
                        }
                        LockVersion::Path(path) => {
                            debug!("skipping local reference {name_key} -> {}", path.display());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Every non-root closure member is itself a project whose closure must
    /// be resolved: pinned packages recurse inside the store with a mirrored
    /// lock location, workspace-local packages keep their lock beside their
    /// source.
    fn recurse_closures(
        &mut self,
        working_dir: &Path,
        lock: &PackageLock,
        depth: usize,
    ) -> Result<(), CoreError> {
        for (closure, languages) in &lock.closures {
            if closure.is_root() {
                continue;
            }
            for (language, entries) in languages {
                for (name_key, entry) in entries {
                    let name = PackageName::parse(name_key);
                    match entry.parsed_version() {
                        LockVersion::SemVer(version) => {
                            if builtin::is_builtin(
                                language,
                                name.owner.as_deref(),
                                &name.name,
                                &version,
                            ) {
                                debug!("skipping bundled {name_key}@{version}");
                                continue;
                            }
                            let version_str = version.to_string();
                            let package_dir = self.layout.package_path(
                                language,
                                name.owner.as_deref(),
                                &name.name,
                                &version_str,
                            );
                            let lock_dir = self.layout.lock_dir(
                                language,
                                name.owner.as_deref(),
                                &name.name,
                                &version_str,
                            );
                            fs::create_dir_all(&lock_dir)?;
                            self.restore_at(
                                &package_dir,
                                &lock_dir.join(LOCK_FILE_NAME),
                                depth + 1,
                            )?;
                        }
                        LockVersion::Path(path) => {
                            let target = if path.is_absolute() {
                                path
                            } else {
                                working_dir.join(path)
                            };
                            self.restore_at(&target, &target.join(LOCK_FILE_NAME), depth + 1)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Canonical identity of a lock location, usable before the lock file itself
/// exists. The parent directory must exist, which every caller guarantees.
fn lock_key(lock_path: &Path) -> Result<PathBuf, CoreError> {
    let parent = lock_path.parent().unwrap_or(Path::new("."));
    let canonical = fs::canonicalize(parent)?;
    let name = lock_path
        .file_name()
        .ok_or_else(|| CoreError::Io(std::io::Error::other("lock path has no file name")))?;
    Ok(canonical.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_remote::MockRegistry;
    use tessera_schema::{ClosureName, LanguageName, LockEntry};

    #[test]
    fn self_referential_closure_hits_the_depth_guard() {
        let project = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(store.path());
        layout.initialize().unwrap();

        // A hand-built lock whose Build0 points back at its own directory.
        // The processed set only fills in on completion, so the guard is
        // what stops the recursion.
        let mut lock = PackageLock::new();
        lock.insert(
            ClosureName::new("Build0"),
            LanguageName::new("Cpp"),
            &PackageName::parse("Self"),
            LockEntry::local(Path::new("./")),
        );
        let lock_path = project.path().join(LOCK_FILE_NAME);
        lock.write_to_file(&lock_path).unwrap();

        let registry = MockRegistry::new();
        let mut restorer = Restorer::new(&layout, &registry, &registry);
        let err = restorer.restore(project.path(), &lock_path).unwrap_err();
        assert!(matches!(err, CoreError::DepthExceeded(MAX_RESTORE_DEPTH)));
    }

    #[test]
    fn lock_key_is_stable_across_spellings() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir_all(&nested).unwrap();

        let direct = lock_key(&nested.join(LOCK_FILE_NAME)).unwrap();
        let dotted = lock_key(&dir.path().join("a/./tessera.lock")).unwrap();
        assert_eq!(direct, dotted);
    }
}
