//! Wire types for the closure resolution API.
//!
//! These mirror the service's JSON contract and deliberately stay stringly
//! typed; decoding into domain types happens in the core adapter. Package
//! ids are correlation handles scoped to a single request/response pair.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireLanguage {
    pub name: String,
    pub version: String,
}

/// A project discovered on the local filesystem, identified only by its
/// request-scoped id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalRequestPackage {
    pub id: u32,
    pub language: WireLanguage,
    /// Dependency ids per role name (`runtime`, `build`, `test`, `tool`).
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<u32>>,
}

/// A published package referenced by the discovered graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicRequestPackage {
    pub id: u32,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub name: String,
    pub version: String,
}

/// An exact published package identity, used for preferred-version pins and
/// for resolved closure members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicExactReference {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub root_package: LocalRequestPackage,
    #[serde(default)]
    pub local_packages: Vec<LocalRequestPackage>,
    #[serde(default)]
    pub public_packages: Vec<PublicRequestPackage>,
    /// Pins for the packages bundled with the tool, so the service never
    /// selects an incompatible embedded-language runtime.
    #[serde(default)]
    pub preferred_versions: Vec<PublicExactReference>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Success,
    Failure,
}

/// One member of the root runtime closure. Exactly one of `public`/`local_id`
/// is populated; the adapter treats anything else as a contract violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeClosureEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<PublicExactReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<u32>,
    pub build: String,
    pub tool: String,
}

/// One member of a named build or tool closure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClosureEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<PublicExactReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionResponse {
    pub result: ResolutionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub runtime_closure: Vec<RuntimeClosureEntry>,
    #[serde(default)]
    pub build_closures: BTreeMap<String, Vec<ClosureEntry>>,
    #[serde(default)]
    pub tool_closures: BTreeMap<String, Vec<ClosureEntry>>,
}
