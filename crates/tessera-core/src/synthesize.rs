//! Lock synthesis: resolved closures in, deterministic lock document out.

use crate::resolve::ResolvedClosures;
use tessera_schema::{ClosureName, LockEntry, PackageLock, PackageName, PackageReference};

fn entry_version(reference: &PackageReference) -> String {
    match reference {
        PackageReference::Local(path) => path.to_string_lossy().into_owned(),
        PackageReference::Public { version, .. } => version.to_string(),
    }
}

/// Convert resolved closures into the canonical lock document.
///
/// Pure and deterministic: every level of the lock is an ordered map, so
/// identical inputs always serialize byte-identically. Root entries carry
/// their build/tool closure labels; named closures are added even when
/// empty, with label-less entries.
pub fn build_package_lock(closures: &ResolvedClosures) -> PackageLock {
    let mut lock = PackageLock::new();

    for (language, members) in &closures.runtime {
        for (name, member) in members {
            lock.insert(
                ClosureName::root(),
                language.clone(),
                &PackageName::parse(name),
                LockEntry {
                    version: entry_version(&member.reference),
                    build: Some(member.build.clone()),
                    tool: Some(member.tool.clone()),
                },
            );
        }
    }

    for group in [&closures.builds, &closures.tools] {
        for (closure, table) in group {
            lock.ensure_closure(closure.clone());
            for (language, members) in table {
                for (name, reference) in members {
                    lock.insert(
                        closure.clone(),
                        language.clone(),
                        &PackageName::parse(name),
                        LockEntry {
                            version: entry_version(reference),
                            build: None,
                            tool: None,
                        },
                    );
                }
            }
        }
    }

    lock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::RuntimeMember;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tessera_schema::LanguageName;

    fn sample_closures() -> ResolvedClosures {
        let mut resolved = ResolvedClosures::default();

        resolved
            .runtime
            .entry(LanguageName::new("Cpp"))
            .or_default()
            .insert(
                "App".to_owned(),
                RuntimeMember {
                    reference: PackageReference::Local(PathBuf::from("./")),
                    build: ClosureName::new("Build0"),
                    tool: ClosureName::new("Tool0"),
                },
            );
        resolved
            .runtime
            .entry(LanguageName::new("Cpp"))
            .or_default()
            .insert(
                "fred|json".to_owned(),
                RuntimeMember {
                    reference: PackageReference::Public {
                        language: LanguageName::new("Cpp"),
                        owner: Some("fred".to_owned()),
                        name: "json".to_owned(),
                        version: semver::Version::new(1, 2, 3),
                    },
                    build: ClosureName::new("Build0"),
                    tool: ClosureName::new("Tool0"),
                },
            );

        let mut build0: crate::resolve::ClosureTable = BTreeMap::new();
        build0.entry(LanguageName::new("Rune")).or_default().insert(
            "Tessera|Rune.Runtime".to_owned(),
            PackageReference::Public {
                language: LanguageName::new("Rune"),
                owner: Some("Tessera".to_owned()),
                name: "Rune.Runtime".to_owned(),
                version: semver::Version::new(0, 4, 2),
            },
        );
        resolved.builds.insert(ClosureName::new("Build0"), build0);
        resolved
            .tools
            .insert(ClosureName::new("Tool0"), BTreeMap::new());

        resolved
    }

    #[test]
    fn root_entries_carry_closure_labels() {
        let lock = build_package_lock(&sample_closures());
        let root = lock.root().unwrap();
        let entry = &root[&LanguageName::new("Cpp")]["fred|json"];
        assert_eq!(entry.version, "1.2.3");
        assert_eq!(entry.build.as_ref().unwrap().as_str(), "Build0");
        assert_eq!(entry.tool.as_ref().unwrap().as_str(), "Tool0");
    }

    #[test]
    fn local_entries_record_their_path() {
        let lock = build_package_lock(&sample_closures());
        let root = lock.root().unwrap();
        assert_eq!(root[&LanguageName::new("Cpp")]["App"].version, "./");
    }

    #[test]
    fn named_closure_entries_are_label_less() {
        let lock = build_package_lock(&sample_closures());
        let build0 = &lock.closures[&ClosureName::new("Build0")];
        let entry = &build0[&LanguageName::new("Rune")]["Tessera|Rune.Runtime"];
        assert_eq!(entry.version, "0.4.2");
        assert!(entry.build.is_none());
        assert!(entry.tool.is_none());
    }

    #[test]
    fn empty_closures_are_preserved() {
        let lock = build_package_lock(&sample_closures());
        assert!(lock.closures[&ClosureName::new("Tool0")].is_empty());
    }

    #[test]
    fn synthesis_is_deterministic() {
        let first = build_package_lock(&sample_closures())
            .to_toml_string()
            .unwrap();
        let second = build_package_lock(&sample_closures())
            .to_toml_string()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn lock_version_constant_is_set() {
        let lock = build_package_lock(&sample_closures());
        assert_eq!(lock.version, tessera_schema::LOCK_VERSION);
    }
}
