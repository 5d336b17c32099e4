//! Resolution service adapter.
//!
//! Translates a discovered graph into a resolution request, invokes the
//! service, and decodes the response into typed per-language closures. The
//! request-scoped ids from discovery are resolved back to local packages
//! here and go no further.

use crate::discover::DiscoveredGraph;
use crate::{builtin, CoreError};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tessera_remote::{
    ClosureEntry, LocalRequestPackage, PublicExactReference, ResolutionClient, ResolutionOutcome,
    ResolutionRequest, RemoteError, WireLanguage,
};
use tessera_schema::{ClosureName, LanguageName, PackageName, PackageReference};
use tracing::warn;

/// One resolved member of the root runtime closure, carrying the labels of
/// the build and tool closures attached to it.
#[derive(Debug, Clone)]
pub struct RuntimeMember {
    pub reference: PackageReference,
    pub build: ClosureName,
    pub tool: ClosureName,
}

pub type ClosureTable = BTreeMap<LanguageName, BTreeMap<String, PackageReference>>;

/// The decoded result of one resolution call.
#[derive(Debug, Clone, Default)]
pub struct ResolvedClosures {
    pub runtime: BTreeMap<LanguageName, BTreeMap<String, RuntimeMember>>,
    pub builds: BTreeMap<ClosureName, ClosureTable>,
    pub tools: BTreeMap<ClosureName, ClosureTable>,
}

fn wire_local(package: &crate::discover::LocalPackage) -> LocalRequestPackage {
    LocalRequestPackage {
        id: package.id,
        language: WireLanguage {
            name: package.language.name.to_string(),
            version: package.language.version.to_string(),
        },
        dependencies: package
            .dependencies
            .iter()
            .map(|(role, ids)| (role.as_str().to_owned(), ids.clone()))
            .collect(),
    }
}

/// Build the resolution request for a discovered graph. The bundled-runtime
/// pins ride along so the service never selects an incompatible embedded
/// language version.
pub fn build_request(
    graph: &DiscoveredGraph,
    root_id: u32,
) -> Result<ResolutionRequest, CoreError> {
    let root = graph
        .local(root_id)
        .ok_or_else(|| CoreError::InvalidResponse(format!("unknown local package id {root_id}")))?;

    Ok(ResolutionRequest {
        root_package: wire_local(root),
        local_packages: graph
            .locals()
            .filter(|p| p.id != root_id)
            .map(wire_local)
            .collect(),
        public_packages: graph
            .publics()
            .iter()
            .map(|p| tessera_remote::PublicRequestPackage {
                id: p.id,
                language: p.language.to_string(),
                owner: p.owner.clone(),
                name: p.name.clone(),
                version: p.version.to_string(),
            })
            .collect(),
        preferred_versions: builtin::preferred_versions(),
    })
}

/// Resolve the discovered graph into runtime/build/tool closures.
pub fn resolve_closures(
    client: &dyn ResolutionClient,
    graph: &DiscoveredGraph,
    root_id: u32,
) -> Result<ResolvedClosures, CoreError> {
    let request = build_request(graph, root_id)?;
    let root_dir = graph
        .local(root_id)
        .map(|p| p.directory.clone())
        .unwrap_or_default();

    let response = client.resolve(&request).map_err(|e| match e {
        RemoteError::Http(message) => CoreError::ResolutionUnavailable(message),
        RemoteError::Io(err) => CoreError::ResolutionUnavailable(err.to_string()),
        RemoteError::Serialization(message) => CoreError::InvalidResponse(message),
        other => CoreError::Remote(other),
    })?;

    if response.result == ResolutionOutcome::Failure {
        return Err(CoreError::ResolutionFailed(
            response
                .message
                .unwrap_or_else(|| "no details provided".to_owned()),
        ));
    }

    let mut resolved = ResolvedClosures::default();

    for entry in &response.runtime_closure {
        let (language, name, reference) =
            decode_reference(entry.public.as_ref(), entry.local_id, graph, &root_dir)?;
        let member = RuntimeMember {
            reference,
            build: ClosureName::new(&entry.build),
            tool: ClosureName::new(&entry.tool),
        };
        let table = resolved.runtime.entry(language.clone()).or_default();
        match table.entry(name.to_string()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(member);
            }
            std::collections::btree_map::Entry::Occupied(_) => {
                warn!("duplicate package '{name}' ({language}) in runtime closure, keeping the first");
            }
        }
    }

    decode_closure_group(
        &response.build_closures,
        graph,
        &root_dir,
        &mut resolved.builds,
    )?;
    decode_closure_group(
        &response.tool_closures,
        graph,
        &root_dir,
        &mut resolved.tools,
    )?;

    Ok(resolved)
}

fn decode_closure_group(
    wire: &BTreeMap<String, Vec<ClosureEntry>>,
    graph: &DiscoveredGraph,
    root_dir: &Path,
    out: &mut BTreeMap<ClosureName, ClosureTable>,
) -> Result<(), CoreError> {
    for (closure, entries) in wire {
        let closure = ClosureName::new(closure);
        let table = out.entry(closure.clone()).or_default();
        for entry in entries {
            let (language, name, reference) =
                decode_reference(entry.public.as_ref(), entry.local_id, graph, root_dir)?;
            match table
                .entry(language.clone())
                .or_default()
                .entry(name.to_string())
            {
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(reference);
                }
                std::collections::btree_map::Entry::Occupied(_) => {
                    warn!(
                        "duplicate package '{name}' ({language}) in closure {closure}, keeping the first"
                    );
                }
            }
        }
    }
    Ok(())
}

/// Decode one wire reference. Exactly one of `public`/`local_id` must be
/// populated; anything else violates the service contract.
fn decode_reference(
    public: Option<&PublicExactReference>,
    local_id: Option<u32>,
    graph: &DiscoveredGraph,
    root_dir: &Path,
) -> Result<(LanguageName, PackageName, PackageReference), CoreError> {
    match (public, local_id) {
        (Some(public), None) => {
            let version = semver::Version::parse(&public.version).map_err(|e| {
                CoreError::InvalidResponse(format!(
                    "unparsable version '{}' for '{}': {e}",
                    public.version, public.name
                ))
            })?;
            let language = LanguageName::new(&public.language);
            let name = PackageName::new(public.owner.clone(), public.name.clone());
            let reference = PackageReference::Public {
                language: language.clone(),
                owner: public.owner.clone(),
                name: public.name.clone(),
                version,
            };
            Ok((language, name, reference))
        }
        (None, Some(id)) => {
            let local = graph.local(id).ok_or_else(|| {
                CoreError::InvalidResponse(format!("reference to unknown local package id {id}"))
            })?;
            let language = local.language.name.clone();
            let name = PackageName::new(None, local.name.clone());
            let reference = PackageReference::Local(relative_path(root_dir, &local.directory));
            Ok((language, name, reference))
        }
        (Some(_), Some(_)) => Err(CoreError::InvalidResponse(
            "closure entry carries both a public reference and a local id".to_owned(),
        )),
        (None, None) => Err(CoreError::InvalidResponse(
            "closure entry carries neither a public reference nor a local id".to_owned(),
        )),
    }
}

/// Express `target` relative to `base`. Both paths must be absolute and
/// canonical. Identical paths yield `./`.
fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base_components: Vec<Component<'_>> = base.components().collect();
    let target_components: Vec<Component<'_>> = target.components().collect();

    let common = base_components
        .iter()
        .zip(&target_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component);
    }

    if relative.as_os_str().is_empty() {
        PathBuf::from("./")
    } else {
        relative
    }
}
