//! Represents an entire build

use crate::compilers::SolcVersionedInput;
use auditless_solc_artifacts::CompilerOutput;
use auditless_solc_core::{
    error::Result,
    utils::{self, JSON_WRITE_CAPACITY},
};
use semver::{BuildMetadata, Version};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Format tag of every build info record, the one hardhat uses.
pub const BUILD_INFO_FORMAT: &str = "hh-sol-build-info-1";

/// Name of the folder under the artifacts root that holds all records.
pub const BUILD_INFO_DIR: &str = "build-info";

// A hardhat compatible build info representation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo<I, O> {
    pub id: String,
    #[serde(rename = "_format")]
    pub format: String,
    pub solc_version: Version,
    pub solc_long_version: Version,
    pub input: I,
    pub output: O,
}

impl<I: DeserializeOwned, O: DeserializeOwned> BuildInfo<I, O> {
    /// Deserializes the `BuildInfo` object from the given file
    pub fn read(path: &Path) -> Result<Self> {
        utils::read_json_file(path)
    }
}

/// Represents `BuildInfo` object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBuildInfo {
    /// The hash that identifies the BuildInfo
    pub id: String,
    /// serialized `BuildInfo` json
    #[serde(flatten)]
    pub build_info: BTreeMap<String, serde_json::Value>,
}

// === impl RawBuildInfo ===

impl RawBuildInfo {
    /// Serializes a `BuildInfo` object
    pub fn new(input: &SolcVersionedInput, output: &CompilerOutput) -> Result<Self> {
        let version = long_version(&input.version)?;
        let solc_short = format!("{}.{}.{}", version.major, version.minor, version.patch);
        let input = serde_json::to_value(input)?;
        let id = hash_input(&version, &serde_json::to_string(&input)?);

        let mut build_info = BTreeMap::new();
        build_info.insert("_format".to_string(), serde_json::to_value(BUILD_INFO_FORMAT)?);
        build_info.insert("solcVersion".to_string(), serde_json::to_value(&solc_short)?);
        build_info.insert("solcLongVersion".to_string(), serde_json::to_value(&version)?);
        build_info.insert("input".to_string(), input);
        build_info.insert("output".to_string(), serde_json::to_value(output)?);

        Ok(Self { id, build_info })
    }

    /// Returns the path of this record inside the given build info directory.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.id))
    }

    /// Writes the record to `<dir>/<id>.json` and returns that path.
    ///
    /// Creates `dir` if it doesn't exist yet. An existing record with the same id is overwritten;
    /// since the id is derived from the input, it describes the same build.
    #[instrument(level = "debug", skip_all, fields(id = %self.id))]
    pub fn write(&self, dir: &Path, pretty: bool) -> Result<PathBuf> {
        utils::create_dir_all(dir)?;
        let path = self.path_in(dir);
        if pretty {
            utils::write_json_file_pretty(self, &path, JSON_WRITE_CAPACITY)?;
        } else {
            utils::write_json_file(self, &path, JSON_WRITE_CAPACITY)?;
        }
        trace!(path = %path.display(), "wrote build info");
        Ok(path)
    }
}

/// Returns the build id of the given input.
///
/// The id covers the compiler version up to its commit and the entire standard json, settings
/// included, so
/// recompiling the same sources with other settings never reuses an id.
pub fn build_id(input: &SolcVersionedInput) -> Result<String> {
    let json = serde_json::to_value(input)?;
    Ok(hash_input(&long_version(&input.version)?, &serde_json::to_string(&json)?))
}

/// Returns the version as hardhat records it: build metadata cut after `commit.<hash>`, so builds
/// of the same release for different platforms agree.
///
/// `0.7.6+commit.7338295f.Linux.gcc` -> `0.7.6+commit.7338295f`
pub fn long_version(version: &Version) -> Result<Version> {
    let mut parts = version.build.as_str().split('.');
    let mut long = version.clone();
    if let (Some("commit"), Some(hash), Some(_)) = (parts.next(), parts.next(), parts.next()) {
        long.build = BuildMetadata::new(&format!("commit.{hash}"))?;
    }
    Ok(long)
}

// Hashes the json of a `serde_json::Value`, whose object keys are always sorted.
fn hash_input(version: &Version, json: &str) -> String {
    utils::unique_hash_many([BUILD_INFO_FORMAT, version.to_string().as_str(), json])
}
