//! Recursive dependency graph discovery.
//!
//! Walks a project's recipe and every local project it references,
//! collecting the full set of reachable packages without resolving any
//! versions. All state is scoped to one discovery round: the integer ids
//! handed out here are correlation handles for a single resolution call and
//! never outlive it.

use crate::{builtin, CoreError};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tessera_schema::{
    parse_recipe_dir, DependencyRole, LanguageName, LanguageReference, RecipeDependency,
};
use tracing::debug;

/// A project discovered on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalPackage {
    pub id: u32,
    pub name: String,
    pub language: LanguageReference,
    /// Canonical project directory.
    pub directory: PathBuf,
    /// Dependency ids per declared role. Roles with no entries are omitted.
    pub dependencies: BTreeMap<DependencyRole, Vec<u32>>,
}

/// A published package referenced somewhere in the discovered graph.
#[derive(Debug, Clone)]
pub struct PublicPackage {
    pub id: u32,
    pub language: LanguageName,
    pub owner: Option<String>,
    pub name: String,
    pub version: semver::Version,
}

/// Accumulator for one discovery round.
///
/// Ids are unique across local and public packages within the round,
/// assigned as `count(local) + count(public) + 1` at creation time.
#[derive(Debug, Default)]
pub struct DiscoveredGraph {
    locals: BTreeMap<u32, LocalPackage>,
    by_path: HashMap<PathBuf, u32>,
    publics: Vec<PublicPackage>,
}

impl DiscoveredGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&self, id: u32) -> Option<&LocalPackage> {
        self.locals.get(&id)
    }

    pub fn locals(&self) -> impl Iterator<Item = &LocalPackage> {
        self.locals.values()
    }

    pub fn publics(&self) -> &[PublicPackage] {
        &self.publics
    }

    fn next_id(&self) -> u32 {
        (self.locals.len() + self.publics.len() + 1) as u32
    }

    /// Discover the project rooted at `directory` and everything reachable
    /// from it. Returns the project's id within this round.
    ///
    /// Re-entering a directory that was already discovered returns its
    /// existing id, which is what terminates local dependency cycles.
    pub fn discover(&mut self, directory: &Path) -> Result<u32, CoreError> {
        let canonical = fs::canonicalize(directory)
            .map_err(|_| CoreError::ProjectNotFound(directory.to_path_buf()))?;

        if let Some(&id) = self.by_path.get(&canonical) {
            debug!("already discovered {} as #{id}", canonical.display());
            return Ok(id);
        }

        let recipe = parse_recipe_dir(&canonical)?;
        debug!("discovered '{}' at {}", recipe.name, canonical.display());

        let id = self.next_id();
        self.by_path.insert(canonical.clone(), id);
        self.locals.insert(
            id,
            LocalPackage {
                id,
                name: recipe.name.clone(),
                language: recipe.language.clone(),
                directory: canonical.clone(),
                dependencies: BTreeMap::new(),
            },
        );

        let mut role_ids: BTreeMap<DependencyRole, Vec<u32>> = BTreeMap::new();
        for role in DependencyRole::ALL {
            let declared = recipe.dependencies(role)?;
            if declared.is_empty() {
                continue;
            }

            let mut ids = Vec::with_capacity(declared.len());
            for dependency in declared {
                let dep_id = match dependency {
                    RecipeDependency::Local(path) => {
                        let target = if path.is_absolute() {
                            path
                        } else {
                            canonical.join(path)
                        };
                        self.discover(&target)?
                    }
                    RecipeDependency::Public {
                        language,
                        owner,
                        name,
                        version,
                    } => {
                        let language = implicit_language(role, language, &recipe.language.name)
                            .ok_or_else(|| CoreError::MissingToolLanguage {
                                package: format!("{name}@{version}"),
                                project: recipe.name.clone(),
                            })?;
                        self.ensure_public(language, owner, name, version)
                    }
                };
                ids.push(dep_id);
            }
            role_ids.insert(role, ids);
        }

        if let Some(record) = self.locals.get_mut(&id) {
            record.dependencies = role_ids;
        }
        Ok(id)
    }

    /// Reuse the id of an identical public reference or allocate a new one.
    /// Identity is the exact (name, owner, language, version) tuple.
    fn ensure_public(
        &mut self,
        language: LanguageName,
        owner: Option<String>,
        name: String,
        version: semver::Version,
    ) -> u32 {
        if let Some(existing) = self.publics.iter().find(|p| {
            p.name == name && p.owner == owner && p.language == language && p.version == version
        }) {
            return existing.id;
        }
        let id = self.next_id();
        self.publics.push(PublicPackage {
            id,
            language,
            owner,
            name,
            version,
        });
        id
    }
}

/// The language a public dependency belongs to when its declaration carries
/// no explicit tag: build-role entries belong to the embedded scripting
/// runtime, tool-role entries must be tagged, everything else inherits the
/// declaring project's language.
fn implicit_language(
    role: DependencyRole,
    declared: Option<LanguageName>,
    project_language: &LanguageName,
) -> Option<LanguageName> {
    match (role, declared) {
        (_, Some(language)) => Some(language),
        (DependencyRole::Build, None) => Some(LanguageName::new(builtin::SCRIPT_LANGUAGE_NAME)),
        (DependencyRole::Tool, None) => None,
        (_, None) => Some(project_language.clone()),
    }
}
