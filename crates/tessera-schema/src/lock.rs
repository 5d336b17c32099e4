//! The package lock document.
//!
//! A lock captures one fully resolved dependency closure set: the root
//! closure for the project itself plus one named closure per shared build or
//! tool extension bundle. The document is deterministic by construction —
//! every level is an ordered map, so identical resolutions serialize to
//! byte-identical TOML.

use crate::types::{ClosureName, LanguageName, PackageName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current lock schema version. A lock written by a different schema version
/// is rejected on load rather than silently trusted.
pub const LOCK_VERSION: u32 = 4;

/// File name of the lock document, beside the recipe or in the lock store.
pub const LOCK_FILE_NAME: &str = "tessera.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lock file serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("lock schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// One resolved package within a closure's language table.
///
/// `version` holds either an exact semantic version (published package) or a
/// relative path (local/workspace package). Only root-closure entries carry
/// the `build`/`tool` closure labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LockEntry {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<ClosureName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ClosureName>,
}

/// Classification of a lock entry's `version` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockVersion {
    SemVer(semver::Version),
    Path(PathBuf),
}

impl LockEntry {
    pub fn pinned(version: &semver::Version) -> Self {
        Self {
            version: version.to_string(),
            build: None,
            tool: None,
        }
    }

    pub fn local(path: &Path) -> Self {
        Self {
            version: path.to_string_lossy().into_owned(),
            build: None,
            tool: None,
        }
    }

    /// A version string that does not parse as semver is a local path.
    pub fn parsed_version(&self) -> LockVersion {
        match semver::Version::parse(&self.version) {
            Ok(version) => LockVersion::SemVer(version),
            Err(_) => LockVersion::Path(PathBuf::from(&self.version)),
        }
    }
}

pub type LanguageTable = BTreeMap<LanguageName, BTreeMap<String, LockEntry>>;

/// The lock document: schema version plus ordered closure tables.
///
/// Iteration is always root-closure first, then closures, languages, and
/// package names in lexicographic order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackageLock {
    pub version: u32,
    #[serde(default)]
    pub closures: BTreeMap<ClosureName, LanguageTable>,
}

impl Default for PackageLock {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageLock {
    pub fn new() -> Self {
        Self {
            version: LOCK_VERSION,
            closures: BTreeMap::new(),
        }
    }

    /// Insert an entry, creating the closure and language tables on demand.
    /// Returns false (and leaves the table unchanged) when the name was
    /// already present in that closure's language table.
    pub fn insert(
        &mut self,
        closure: ClosureName,
        language: LanguageName,
        name: &PackageName,
        entry: LockEntry,
    ) -> bool {
        let table = self
            .closures
            .entry(closure)
            .or_default()
            .entry(language)
            .or_default();
        match table.entry(name.to_string()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    /// Ensure a closure table exists even when it holds no packages.
    pub fn ensure_closure(&mut self, closure: ClosureName) {
        self.closures.entry(closure).or_default();
    }

    pub fn root(&self) -> Option<&LanguageTable> {
        self.closures.get(&ClosureName::root())
    }

    pub fn to_toml_string(&self) -> Result<String, LockError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Atomically persist the document. The write goes through a temp file in
    /// the destination directory followed by a rename and a parent-dir fsync,
    /// so no partial lock is ever visible.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LockError::Io(e.error))?;
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        let lock: Self = toml::from_str(&content)?;
        if lock.version != LOCK_VERSION {
            return Err(LockError::VersionMismatch {
                expected: LOCK_VERSION,
                found: lock.version,
            });
        }
        Ok(lock)
    }
}
