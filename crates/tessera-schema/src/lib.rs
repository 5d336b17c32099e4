//! Recipe parsing, package identity, and the package lock document for tessera.
//!
//! This crate defines the schema layer: TOML recipe parsing (`Recipe`),
//! package and closure identity types (`PackageName`, `ClosureName`,
//! `PackageReference`), and the deterministic lock document (`PackageLock`)
//! with its atomic on-disk serialization.

pub mod lock;
pub mod recipe;
pub mod reference;
pub mod types;

pub use lock::{
    LanguageTable, LockEntry, LockError, LockVersion, PackageLock, LOCK_FILE_NAME, LOCK_VERSION,
};
pub use recipe::{
    parse_recipe_dir, parse_recipe_file, parse_recipe_str, DependencyRole, DependencySection,
    Recipe, RecipeError, RECIPE_FILE_NAME,
};
pub use reference::{LanguageReference, PackageReference, RecipeDependency, ReferenceError};
pub use types::{ClosureName, LanguageName, PackageName};
