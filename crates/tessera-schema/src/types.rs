//! Newtype wrappers for identifier strings, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so they can be used
//! directly as TOML table keys in the lock document.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Name of a package language ecosystem, e.g. `Cpp` or `Rune`.
    LanguageName
);

/// Name of one resolved closure within a lock document.
///
/// Either the constant root closure or a service-generated name such as
/// `Build0`/`Tool0`. Generated names are scoped to a single resolution
/// response and must never be compared across responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClosureName(String);

impl ClosureName {
    pub const ROOT: &'static str = "Root";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The closure containing the project under resolution itself.
    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// The root closure sorts before every generated closure so the lock document
// always leads with it.
impl Ord for ClosureName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_root(), other.is_root()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ClosureName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClosureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClosureName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClosureName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A package name, optionally qualified by its publishing owner.
///
/// Rendered and parsed as `name` or `owner|name`. The rendered form is the
/// uniqueness key for a package within one language table of a closure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName {
    pub owner: Option<String>,
    pub name: String,
}

impl PackageName {
    pub fn new(owner: Option<String>, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    /// Parse from `name` or `owner|name`.
    pub fn parse(value: &str) -> Self {
        match value.split_once('|') {
            Some((owner, name)) => Self {
                owner: Some(owner.to_owned()),
                name: name.to_owned(),
            },
            None => Self {
                owner: None,
                name: value.to_owned(),
            },
        }
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{owner}|{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
