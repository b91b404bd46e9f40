use semver::Version;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type Result<T, E = SolcError> = std::result::Result<T, E>;

/// Various error types
#[derive(Debug, Error)]
pub enum SolcError {
    /// Errors related to the Solc executable itself.
    #[error("solc exited with {0}\n{1}")]
    SolcError(std::process::ExitStatus, String),
    /// The compiler ran but rejected the input.
    #[error("compilation failed:\n{0}")]
    Compilation(String),
    #[error("invalid UTF-8 in Solc output")]
    InvalidUtf8,
    #[error("unknown solc version from output: {0:?}")]
    VersionParse(String),
    #[error("solc {found} does not match the requested version {expected}")]
    VersionMismatch { expected: Version, found: Version },
    #[error(transparent)]
    SemverError(#[from] semver::Error),
    /// Deserialization error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Filesystem IO error
    #[error(transparent)]
    Io(#[from] SolcIoError),
    /// A build info record could not be written.
    #[error("failed to persist build info to \"{}\": {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: Box<SolcError>,
    },
    /// A remote source url that can't be read from disk.
    #[error("remote source files are not supported: {0}")]
    RemoteSource(String),
    /// An input option the standard JSON reconstruction does not support.
    #[error("unsupported compile option: {0}")]
    UnsupportedOption(&'static str),
    /// General purpose message.
    #[error("{0}")]
    Message(String),
}

impl SolcError {
    pub fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        SolcIoError::new(err, path).into()
    }

    /// Create an error from the Solc executable's output.
    pub fn solc_output(output: &std::process::Output) -> Self {
        let mut msg = String::from_utf8_lossy(&output.stderr);
        let mut trimmed = msg.trim();
        if trimmed.is_empty() {
            msg = String::from_utf8_lossy(&output.stdout);
            trimmed = msg.trim();
            if trimmed.is_empty() {
                trimmed = "<empty output>";
            }
        }
        Self::SolcError(output.status, trimmed.into())
    }

    pub fn msg(msg: impl std::fmt::Display) -> Self {
        Self::Message(msg.to_string())
    }

    pub fn persist(path: impl Into<PathBuf>, source: Self) -> Self {
        Self::Persist { path: path.into(), source: Box::new(source) }
    }

    /// Returns `true` if this error was raised while writing a build info record rather than by
    /// the compiler.
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist { .. })
    }
}

#[derive(Debug, Error)]
#[error("\"{}\": {io}", self.path.display())]
pub struct SolcIoError {
    io: io::Error,
    path: PathBuf,
}

impl SolcIoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    /// The path at which the error occurred
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying io error
    pub fn source(&self) -> &io::Error {
        &self.io
    }
}

impl From<SolcIoError> for io::Error {
    fn from(err: SolcIoError) -> Self {
        err.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_carries_path() {
        let err = SolcError::io(io::Error::from(io::ErrorKind::NotFound), "out/build-info");
        let SolcError::Io(io_err) = &err else { panic!("expected io error, got {err:?}") };
        assert_eq!(io_err.path(), Path::new("out/build-info"));
        assert!(err.to_string().starts_with("\"out/build-info\""));
    }

    #[test]
    fn persist_wraps_source() {
        let inner = SolcError::io(io::Error::from(io::ErrorKind::PermissionDenied), "/ro/a.json");
        let err = SolcError::persist("/ro/a.json", inner);
        assert!(err.is_persist());
        assert!(err.to_string().contains("failed to persist build info"));
        assert!(!SolcError::msg("nope").is_persist());
    }
}
