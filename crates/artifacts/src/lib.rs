//! Solc standard JSON input and output types.
//!
//! Everything a caller hands to the compiler, and everything the compiler hands back, has to
//! survive a serde round-trip unchanged: unknown keys are kept in flattened `other` maps, unknown
//! languages in [`SolcLanguage::Other`], and absent options are never materialized.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

use auditless_solc_core::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};

pub mod error;
pub use error::{Error, Severity, SourceLocation};

pub mod sources;
pub use sources::{Source, Sources};

/// `outputSelection` of the standard JSON settings: file -> contract -> outputs.
pub type OutputSelection = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Languages supported by solc.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SolcLanguage {
    #[default]
    Solidity,
    Yul,
    #[serde(rename = "SolidityAST")]
    SolidityAst,
    #[serde(rename = "EVMAssembly")]
    EvmAssembly,
    /// Any language newer compiler versions accept, passed through as is.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for SolcLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solidity => write!(f, "Solidity"),
            Self::Yul => write!(f, "Yul"),
            Self::SolidityAst => write!(f, "SolidityAST"),
            Self::EvmAssembly => write!(f, "EVMAssembly"),
            Self::Other(language) => f.write_str(language),
        }
    }
}

/// Input type `solc` expects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolcInput {
    pub language: SolcLanguage,
    pub sources: Sources,
    #[serde(default)]
    pub settings: Settings,
}

impl SolcInput {
    pub fn new(language: SolcLanguage, sources: Sources, settings: Settings) -> Self {
        Self { language, sources, settings }
    }

    /// Replaces every source that solc would load through `urls` with its content read from
    /// disk, so the input is self-contained.
    pub fn resolve_urls(mut self) -> Result<Self> {
        for (name, source) in self.sources.iter_mut() {
            if source.is_url() {
                trace!(%name, url = ?source.url(), "resolving source url");
                *source = source.resolved()?;
            }
        }
        Ok(self)
    }

    /// Returns `true` if any source still needs to be read by the compiler.
    pub fn has_urls(&self) -> bool {
        self.sources.values().any(Source::is_url)
    }
}

/// The `settings` object of the standard JSON input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remappings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<Optimizer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SettingsMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebuggingSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_selection: Option<OutputSelection>,
    /// Settings this crate doesn't model, e.g. `libraries` or `modelChecker`.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Settings {
    pub fn optimizer_mut(&mut self) -> &mut Optimizer {
        self.optimizer.get_or_insert_with(Default::default)
    }

    pub fn metadata_mut(&mut self) -> &mut SettingsMetadata {
        self.metadata.get_or_insert_with(Default::default)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<OptimizerDetails>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yul: Option<bool>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsMetadata {
    /// Use only literal content and not URLs (false by default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_literal_content: Option<bool>,
    /// Use the given hash method for the metadata hash that is appended to the bytecode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<BytecodeHash>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Determines the hash method for the metadata hash that is appended to the bytecode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BytecodeHash {
    #[default]
    #[serde(rename = "ipfs")]
    Ipfs,
    #[serde(rename = "none")]
    None,
    #[serde(rename = "bzzr1")]
    Bzzr1,
}

impl FromStr for BytecodeHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "ipfs" => Ok(Self::Ipfs),
            "bzzr1" => Ok(Self::Bzzr1),
            s => Err(format!("Unknown bytecode hash: {s}")),
        }
    }
}

impl fmt::Display for BytecodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ipfs => "ipfs",
            Self::None => "none",
            Self::Bzzr1 => "bzzr1",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebuggingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_strings: Option<RevertStrings>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// How to treat revert (and require) reason strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevertStrings {
    /// "default" does not inject compiler-generated revert strings and keeps user-supplied ones.
    #[default]
    Default,
    /// "strip" removes all revert strings (if possible, i.e. if literals are used) keeping
    /// side-effects
    Strip,
    /// "debug" injects strings for compiler-generated internal reverts, implemented for ABI
    /// encoders V1 and V2 for now.
    Debug,
    /// "verboseDebug" even appends further information to user-supplied revert strings (not yet
    /// implemented)
    VerboseDebug,
}

impl fmt::Display for RevertStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Self::Default => "default",
            Self::Strip => "strip",
            Self::Debug => "debug",
            Self::VerboseDebug => "verboseDebug",
        };
        write!(f, "{string}")
    }
}

impl FromStr for RevertStrings {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "strip" => Ok(Self::Strip),
            "debug" => Ok(Self::Debug),
            "verboseDebug" | "verbosedebug" => Ok(Self::VerboseDebug),
            s => Err(format!("Unknown revert string mode: {s}")),
        }
    }
}

/// Output type `solc` produces.
///
/// `sources` and `contracts` are kept as raw json: they're passed through, never interpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Error>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contracts: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl CompilerOutput {
    /// Whether the output contains a compiler error
    pub fn has_error(&self) -> bool {
        self.errors.iter().any(Error::is_error)
    }

    /// Returns an iterator over all error-severity diagnostics.
    pub fn errors_iter(&self) -> impl Iterator<Item = &Error> + '_ {
        self.errors.iter().filter(|err| err.is_error())
    }

    /// Renders all error-severity diagnostics, one per line.
    pub fn diagnostics(&self) -> String {
        self.errors_iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    }

    /// Returns the names of all contracts in the given source unit.
    pub fn contract_names(&self, file: &str) -> impl Iterator<Item = &str> + '_ {
        self.contracts.get(file).into_iter().flat_map(|c| c.keys().map(String::as_str))
    }
}
