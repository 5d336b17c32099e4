//! Dependency reference types: language headers, declared recipe dependencies,
//! and fully resolved package references.

use crate::types::{LanguageName, PackageName};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid language reference '{0}', expected 'Name|version'")]
    InvalidLanguage(String),
    #[error("invalid version in reference '{0}'")]
    InvalidVersion(String),
    #[error("published reference '{0}' is missing a version, expected 'name@version'")]
    MissingVersion(String),
    #[error("reference '{0}' has an empty package name")]
    EmptyName(String),
}

/// Accepts `1`, `1.2`, and `1.2.3`, filling missing components with zero.
/// Language headers conventionally use the two-component form.
fn parse_loose_version(value: &str) -> Result<semver::Version, semver::Error> {
    match value.split('.').count() {
        1 => semver::Version::parse(&format!("{value}.0.0")),
        2 => semver::Version::parse(&format!("{value}.0")),
        _ => semver::Version::parse(value),
    }
}

/// A language ecosystem together with its schema version, e.g. `Cpp|0.8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageReference {
    pub name: LanguageName,
    pub version: semver::Version,
}

impl LanguageReference {
    pub fn new(name: impl Into<LanguageName>, version: semver::Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl FromStr for LanguageReference {
    type Err = ReferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, version) = value
            .split_once('|')
            .ok_or_else(|| ReferenceError::InvalidLanguage(value.to_owned()))?;
        if name.is_empty() {
            return Err(ReferenceError::InvalidLanguage(value.to_owned()));
        }
        let version = parse_loose_version(version)
            .map_err(|_| ReferenceError::InvalidVersion(value.to_owned()))?;
        Ok(Self {
            name: LanguageName::new(name),
            version,
        })
    }
}

// Display/serde render the canonical three-component form even when the
// recipe wrote a truncated one.
impl fmt::Display for LanguageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.name, self.version)
    }
}

impl Serialize for LanguageReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LanguageReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// A dependency as declared in a recipe, before resolution.
///
/// Either a filesystem path to a sibling project or a published package
/// coordinate. The language tag is optional at declaration time; the
/// discoverer fills it in from the declaring role's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeDependency {
    Local(PathBuf),
    Public {
        language: Option<LanguageName>,
        owner: Option<String>,
        name: String,
        version: semver::Version,
    },
}

impl FromStr for RecipeDependency {
    type Err = ReferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Anything path-shaped is a local reference; published coordinates
        // never contain a path separator.
        if value.starts_with('.') || value.contains('/') {
            return Ok(Self::Local(PathBuf::from(value)));
        }

        let (language, rest) = match value.strip_prefix('[') {
            Some(tagged) => {
                let (lang, rest) = tagged
                    .split_once(']')
                    .ok_or_else(|| ReferenceError::InvalidLanguage(value.to_owned()))?;
                if lang.is_empty() {
                    return Err(ReferenceError::InvalidLanguage(value.to_owned()));
                }
                (Some(LanguageName::new(lang)), rest)
            }
            None => (None, value),
        };

        let (coordinate, version) = rest
            .split_once('@')
            .ok_or_else(|| ReferenceError::MissingVersion(value.to_owned()))?;
        let version = parse_loose_version(version)
            .map_err(|_| ReferenceError::InvalidVersion(value.to_owned()))?;

        let package = PackageName::parse(coordinate);
        if package.name.is_empty() {
            return Err(ReferenceError::EmptyName(value.to_owned()));
        }

        Ok(Self::Public {
            language,
            owner: package.owner,
            name: package.name,
            version,
        })
    }
}

/// A fully resolved dependency: either a local project by path or an exact
/// fetchable artifact identity. Exactly one variant, always.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageReference {
    Local(PathBuf),
    Public {
        language: LanguageName,
        owner: Option<String>,
        name: String,
        version: semver::Version,
    },
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => f.write_str(&path.to_string_lossy()),
            Self::Public {
                language,
                owner,
                name,
                version,
            } => match owner {
                Some(owner) => write!(f, "[{language}]{owner}|{name}@{version}"),
                None => write!(f, "[{language}]{name}@{version}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_reference_two_component() {
        let lang: LanguageReference = "Cpp|0.8".parse().unwrap();
        assert_eq!(lang.name, LanguageName::new("Cpp"));
        assert_eq!(lang.version, semver::Version::new(0, 8, 0));
        assert_eq!(lang.to_string(), "Cpp|0.8.0");
    }

    #[test]
    fn language_reference_full_version() {
        let lang: LanguageReference = "Rune|0.4.2".parse().unwrap();
        assert_eq!(lang.version, semver::Version::new(0, 4, 2));
    }

    #[test]
    fn language_reference_rejects_missing_separator() {
        assert!("Cpp".parse::<LanguageReference>().is_err());
        assert!("|0.8".parse::<LanguageReference>().is_err());
        assert!("Cpp|abc".parse::<LanguageReference>().is_err());
    }

    #[test]
    fn language_reference_serde_as_string() {
        let lang: LanguageReference = "CSharp|1".parse().unwrap();
        let json = serde_json::to_string(&lang).unwrap();
        assert_eq!(json, "\"CSharp|1.0.0\"");
        let back: LanguageReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lang);
    }

    #[test]
    fn dependency_relative_path() {
        let dep: RecipeDependency = "../json/".parse().unwrap();
        assert_eq!(dep, RecipeDependency::Local(PathBuf::from("../json/")));
    }

    #[test]
    fn dependency_nested_path() {
        let dep: RecipeDependency = "tools/formatter".parse().unwrap();
        assert!(matches!(dep, RecipeDependency::Local(_)));
    }

    #[test]
    fn dependency_public_bare_name() {
        let dep: RecipeDependency = "json@1.2.3".parse().unwrap();
        assert_eq!(
            dep,
            RecipeDependency::Public {
                language: None,
                owner: None,
                name: "json".to_owned(),
                version: semver::Version::new(1, 2, 3),
            }
        );
    }

    #[test]
    fn dependency_public_with_owner_and_language() {
        let dep: RecipeDependency = "[Cpp]fred|json@1.2.3".parse().unwrap();
        assert_eq!(
            dep,
            RecipeDependency::Public {
                language: Some(LanguageName::new("Cpp")),
                owner: Some("fred".to_owned()),
                name: "json".to_owned(),
                version: semver::Version::new(1, 2, 3),
            }
        );
    }

    #[test]
    fn dependency_public_requires_version() {
        assert!("json".parse::<RecipeDependency>().is_err());
        assert!("fred|json".parse::<RecipeDependency>().is_err());
    }

    #[test]
    fn dependency_rejects_unterminated_language_tag() {
        assert!("[Cppjson@1.0.0".parse::<RecipeDependency>().is_err());
        assert!("[]json@1.0.0".parse::<RecipeDependency>().is_err());
    }

    #[test]
    fn package_reference_display() {
        let public = PackageReference::Public {
            language: LanguageName::new("Cpp"),
            owner: Some("fred".to_owned()),
            name: "json".to_owned(),
            version: semver::Version::new(1, 2, 3),
        };
        assert_eq!(public.to_string(), "[Cpp]fred|json@1.2.3");

        let local = PackageReference::Local(PathBuf::from("../json/"));
        assert_eq!(local.to_string(), "../json/");
    }
}
