//! The packages bundled with the tool itself.
//!
//! Build-role dependencies implicitly belong to the embedded Rune scripting
//! runtime, which ships with tessera at one exact version. That package is
//! pinned in every resolution request and is never downloaded or recursed
//! into during restore.

use tessera_remote::PublicExactReference;
use tessera_schema::LanguageName;

/// Name of the embedded scripting language.
pub const SCRIPT_LANGUAGE_NAME: &str = "Rune";

/// Owner of the bundled runtime package.
pub const SCRIPT_RUNTIME_OWNER: &str = "Tessera";

/// Name of the bundled runtime package.
pub const SCRIPT_RUNTIME_NAME: &str = "Rune.Runtime";

/// The exact runtime version shipped with this build of the tool.
pub fn script_runtime_version() -> semver::Version {
    semver::Version::new(0, 4, 2)
}

/// Version pins handed to the resolution service so it never selects an
/// embedded-runtime version incompatible with the one we ship.
pub fn preferred_versions() -> Vec<PublicExactReference> {
    vec![PublicExactReference {
        language: SCRIPT_LANGUAGE_NAME.to_owned(),
        owner: Some(SCRIPT_RUNTIME_OWNER.to_owned()),
        name: SCRIPT_RUNTIME_NAME.to_owned(),
        version: script_runtime_version().to_string(),
    }]
}

/// Whether a resolved package is the bundled runtime at exactly the pinned
/// version. Such entries ship with the tool and are skipped by install and
/// recursion alike.
pub fn is_builtin(
    language: &LanguageName,
    owner: Option<&str>,
    name: &str,
    version: &semver::Version,
) -> bool {
    language.as_str() == SCRIPT_LANGUAGE_NAME
        && owner == Some(SCRIPT_RUNTIME_OWNER)
        && name == SCRIPT_RUNTIME_NAME
        && *version == script_runtime_version()
}
