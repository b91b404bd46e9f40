//! Utility functions

use crate::error::{SolcError, SolcIoError};
use alloy_primitives::hex;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Default capacity of the buffered writer used for json files.
pub const JSON_WRITE_CAPACITY: usize = 128 * 1024;

/// Returns the hex encoded 128-bit xxh3 hash of all `inputs`, hashed in order.
///
/// The result is stable across processes and platforms.
pub fn unique_hash_many(inputs: impl IntoIterator<Item = impl AsRef<[u8]>>) -> String {
    let mut hasher = xxhash_rust::xxh3::Xxh3::new();
    for input in inputs {
        hasher.update(input.as_ref());
    }
    encode_hash(hasher.digest128())
}

/// Returns the hex encoded 128-bit xxh3 hash of `input`.
pub fn unique_hash(input: impl AsRef<[u8]>) -> String {
    encode_hash(xxhash_rust::xxh3::xxh3_128(input.as_ref()))
}

fn encode_hash(x: u128) -> String {
    hex::encode(x.to_be_bytes())
}

/// Canonicalize the path, platform-agnostic.
///
/// On windows this will ensure the path only consists of `/` separators.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf, SolcIoError> {
    let path = path.as_ref();
    let res = dunce::canonicalize(path);
    #[cfg(windows)]
    let res = res.map(|p| {
        use path_slash::PathBufExt;
        PathBuf::from(p.to_slash_lossy().as_ref())
    });
    res.map_err(|err| SolcIoError::new(err, path))
}

/// Returns the canonicalized path, or the path itself if it does not exist (yet).
pub fn canonicalized(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    canonicalize(&path).unwrap_or(path)
}

/// Strips `root` from `source` and returns the relative path.
pub fn strip_prefix<'a>(source: &'a Path, root: &Path) -> &'a Path {
    source.strip_prefix(root).unwrap_or(source)
}

/// Returns the source unit name solc assigns to a file passed on its command line.
///
/// Relative to `base_path` if the file lies inside of it, the path as given otherwise. Always
/// uses `/` separators.
///
/// `/project/src/A.sol` with base path `/project` -> `src/A.sol`
pub fn source_unit_name(source: &Path, base_path: Option<&Path>) -> String {
    let name = match base_path {
        Some(base) if source.starts_with(base) => strip_prefix(source, base).to_path_buf(),
        Some(base) => match (canonicalize(source), canonicalize(base)) {
            (Ok(source_abs), Ok(base_abs)) if source_abs.starts_with(&base_abs) => {
                strip_prefix(&source_abs, &base_abs).to_path_buf()
            }
            _ => source.to_path_buf(),
        },
        None => source.to_path_buf(),
    };
    #[cfg(windows)]
    let name = {
        use path_slash::PathBufExt;
        PathBuf::from(name.to_slash_lossy().as_ref())
    };
    name.to_string_lossy().into_owned()
}

/// Reads the json file and deserialize it into the provided type.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, SolcError> {
    let file = fs::File::open(path).map_err(|err| SolcError::io(err, path))?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(Into::into)
}

/// Serializes the provided value to JSON and writes it to a file.
///
/// The file is written next to `path` first and then renamed onto it, so readers only ever see
/// a complete file, and a failed write leaves any previous content in place.
pub fn write_json_file<T: Serialize>(
    value: &T,
    path: &Path,
    capacity: usize,
) -> Result<(), SolcError> {
    write_atomic(path, capacity, |writer| serde_json::to_writer(writer, value))
}

/// Same as [`write_json_file`] but indents the output.
pub fn write_json_file_pretty<T: Serialize>(
    value: &T,
    path: &Path,
    capacity: usize,
) -> Result<(), SolcError> {
    write_atomic(path, capacity, |writer| serde_json::to_writer_pretty(writer, value))
}

fn write_atomic(
    path: &Path,
    capacity: usize,
    write: impl FnOnce(&mut BufWriter<&mut NamedTempFile>) -> serde_json::Result<()>,
) -> Result<(), SolcError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // no `.json` extension, so half written files never show up in `json_files`
    let mut file =
        tempfile::Builder::new().prefix(".tmp").tempfile_in(dir).map_err(|err| SolcError::io(err, dir))?;
    {
        let mut writer = BufWriter::with_capacity(capacity, &mut file);
        write(&mut writer)?;
        writer.flush().map_err(|err| SolcError::io(err, path))?;
    }
    file.persist(path).map_err(|err| SolcError::io(err.error, path))?;
    Ok(())
}

/// Creates the directory and all its ancestors if it does not exist.
///
/// Succeeds if the directory already exists, see [`fs::create_dir_all()`].
pub fn create_dir_all(dir: &Path) -> Result<(), SolcError> {
    fs::create_dir_all(dir).map_err(|err| SolcError::io(err, dir))
}

/// Returns all `*.json` files directly inside `dir`, sorted by path.
///
/// A missing directory yields an empty list.
#[cfg(feature = "walkdir")]
pub fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Creates a new named tempdir.
#[cfg(any(test, feature = "test-utils"))]
pub fn tempdir(name: &str) -> Result<tempfile::TempDir, SolcIoError> {
    tempfile::Builder::new().prefix(name).tempdir().map_err(|err| SolcIoError::new(err, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable() {
        assert_eq!(unique_hash_many(["abc"]), unique_hash("abc"));
        assert_eq!(unique_hash("abc").len(), 32);
        assert_eq!(unique_hash_many(["a", "bc"]), unique_hash_many(["ab", "c"]));
        assert_ne!(unique_hash("abc"), unique_hash("abd"));
    }

    #[test]
    fn can_create_dir_twice() {
        let tmp_dir = tempdir("out").unwrap();
        let dir = tmp_dir.path().join("artifacts/build-info");
        create_dir_all(&dir).unwrap();
        create_dir_all(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn json_file_roundtrip() {
        let tmp_dir = tempdir("json").unwrap();
        let path = tmp_dir.path().join("value.json");
        let value = serde_json::json!({ "b": 1, "a": [true, null] });
        write_json_file_pretty(&value, &path, JSON_WRITE_CAPACITY).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains('\n'));
        let read: serde_json::Value = read_json_file(&path).unwrap();
        assert_eq!(read, value);

        write_json_file(&value, &path, JSON_WRITE_CAPACITY).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn source_unit_names() {
        let tmp_dir = tempdir("names").unwrap();
        let file = tmp_dir.path().join("src").join("A.sol");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "contract A {}").unwrap();

        assert_eq!(source_unit_name(&file, None), file.to_string_lossy());
        assert_eq!(source_unit_name(&file, Some(tmp_dir.path())), "src/A.sol");
        let canonical_base = canonicalize(tmp_dir.path()).unwrap();
        assert_eq!(source_unit_name(&file, Some(&canonical_base)), "src/A.sol");
        assert_eq!(
            source_unit_name(Path::new("lib/B.sol"), Some(Path::new("/elsewhere"))),
            "lib/B.sol"
        );
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let tmp_dir = tempdir("json").unwrap();
        let path = tmp_dir.path().join("value.json");
        write_json_file(&serde_json::json!({ "a": 1 }), &path, JSON_WRITE_CAPACITY).unwrap();

        // json object keys must be strings
        let invalid = std::collections::BTreeMap::from([(vec![1u8], 1)]);
        assert!(write_json_file(&invalid, &path, JSON_WRITE_CAPACITY).is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":1}"#);
        assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_json_file_is_io_error() {
        let tmp_dir = tempdir("json").unwrap();
        let err = read_json_file::<serde_json::Value>(&tmp_dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, SolcError::Io(_)));
    }
}
