//! Project recipe parsing.
//!
//! A recipe is the TOML manifest at the root of every tessera project. It
//! declares the project's name, its language header, its own version, and
//! dependency lists partitioned into roles.

use crate::reference::{LanguageReference, RecipeDependency, ReferenceError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the project manifest, looked up in the project directory.
pub const RECIPE_FILE_NAME: &str = "recipe.toml";

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to read recipe file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse recipe: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("no recipe found at '{0}'")]
    NotFound(String),
    #[error("invalid dependency reference: {0}")]
    Reference(#[from] ReferenceError),
}

/// The roles a dependency can be declared under.
///
/// The role determines the implicit language of entries that carry no
/// explicit language tag: build dependencies belong to the embedded
/// scripting language, tool dependencies must be tagged explicitly, and
/// everything else inherits the declaring project's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyRole {
    Runtime,
    Build,
    Test,
    Tool,
}

impl DependencyRole {
    pub const ALL: [Self; 4] = [Self::Runtime, Self::Build, Self::Test, Self::Tool];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Build => "build",
            Self::Test => "test",
            Self::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub name: String,
    pub language: LanguageReference,
    pub version: semver::Version,
    #[serde(default)]
    pub dependencies: DependencySection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DependencySection {
    #[serde(default)]
    pub runtime: Vec<String>,
    #[serde(default)]
    pub build: Vec<String>,
    #[serde(default)]
    pub test: Vec<String>,
    #[serde(default)]
    pub tool: Vec<String>,
}

impl Recipe {
    /// Parse the declared dependencies of one role into typed references.
    pub fn dependencies(&self, role: DependencyRole) -> Result<Vec<RecipeDependency>, RecipeError> {
        let raw = match role {
            DependencyRole::Runtime => &self.dependencies.runtime,
            DependencyRole::Build => &self.dependencies.build,
            DependencyRole::Test => &self.dependencies.test,
            DependencyRole::Tool => &self.dependencies.tool,
        };
        raw.iter()
            .map(|entry| entry.parse().map_err(RecipeError::Reference))
            .collect()
    }
}

pub fn parse_recipe_str(input: &str) -> Result<Recipe, RecipeError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_recipe_file(path: impl AsRef<Path>) -> Result<Recipe, RecipeError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RecipeError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    parse_recipe_str(&content)
}

/// Load the recipe of the project rooted at `dir`.
pub fn parse_recipe_dir(dir: impl AsRef<Path>) -> Result<Recipe, RecipeError> {
    parse_recipe_file(dir.as_ref().join(RECIPE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LanguageName;
    use std::path::PathBuf;

    #[test]
    fn parses_full_recipe() {
        let input = r#"
name = "App"
language = "Cpp|0.8"
version = "1.2.3"

[dependencies]
runtime = ["../json/", "fred|format@2.0.0"]
build = ["tools|assert@4.4.4"]
test = ["testing|harness@1.0.0"]
tool = ["[Cpp]tools|mkdir@1.1.0"]
"#;
        let recipe = parse_recipe_str(input).expect("should parse");
        assert_eq!(recipe.name, "App");
        assert_eq!(recipe.language.name, LanguageName::new("Cpp"));
        assert_eq!(recipe.version, semver::Version::new(1, 2, 3));
        assert_eq!(recipe.dependencies.runtime.len(), 2);
        assert_eq!(recipe.dependencies.build.len(), 1);

        let runtime = recipe.dependencies(DependencyRole::Runtime).unwrap();
        assert_eq!(
            runtime[0],
            RecipeDependency::Local(PathBuf::from("../json/"))
        );
        let tool = recipe.dependencies(DependencyRole::Tool).unwrap();
        assert!(matches!(
            &tool[0],
            RecipeDependency::Public { language: Some(lang), .. } if lang.as_str() == "Cpp"
        ));
    }

    #[test]
    fn parses_minimal_recipe() {
        let input = r#"
name = "Tiny"
language = "Rune|0.4"
version = "0.1.0"
"#;
        let recipe = parse_recipe_str(input).expect("should parse");
        assert!(recipe.dependencies.runtime.is_empty());
        assert!(recipe.dependencies(DependencyRole::Build).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"
name = "App"
language = "Cpp|0.8"
version = "1.0.0"
flavor = "spicy"
"#;
        assert!(parse_recipe_str(input).is_err());
    }

    #[test]
    fn rejects_missing_language() {
        let input = r#"
name = "App"
version = "1.0.0"
"#;
        assert!(parse_recipe_str(input).is_err());
    }

    #[test]
    fn surfaces_bad_dependency_reference() {
        let input = r#"
name = "App"
language = "Cpp|0.8"
version = "1.0.0"

[dependencies]
runtime = ["json"]
"#;
        let recipe = parse_recipe_str(input).unwrap();
        assert!(recipe.dependencies(DependencyRole::Runtime).is_err());
    }

    #[test]
    fn missing_file_is_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_recipe_dir(dir.path()).unwrap_err();
        assert!(matches!(err, RecipeError::NotFound(_)));
    }

    #[test]
    fn reads_recipe_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(RECIPE_FILE_NAME),
            "name = \"App\"\nlanguage = \"Cpp|0.8\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        let recipe = parse_recipe_dir(dir.path()).unwrap();
        assert_eq!(recipe.name, "App");
    }
}
