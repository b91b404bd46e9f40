//! Compiling with build info capture.

use crate::{
    buildinfo::{BuildInfo, RawBuildInfo, BUILD_INFO_DIR},
    compilers::{Compiler, SolcVersionedInput},
};
use auditless_solc_artifacts::{CompilerOutput, SolcInput};
use auditless_solc_core::{
    error::{Result, SolcError},
    utils,
};
use semver::Version;
use std::{fs, io, path::PathBuf};

/// What to do when a build info record can't be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistPolicy {
    /// Log a warning and hand back the successful compiler output.
    #[default]
    Log,
    /// Fail the call with [`SolcError::Persist`].
    Fail,
}

/// Where and how build info records are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactsConfig {
    /// Records are written to `<root>/build-info/<id>.json`.
    pub root: PathBuf,
    pub on_persist_error: PersistPolicy,
    /// Indent the written json.
    pub pretty: bool,
}

impl ArtifactsConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: utils::canonicalized(root),
            on_persist_error: PersistPolicy::default(),
            pretty: true,
        }
    }

    pub fn with_persist_policy(mut self, policy: PersistPolicy) -> Self {
        self.on_persist_error = policy;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// `<root>/build-info`
    pub fn build_info_dir(&self) -> PathBuf {
        self.root.join(BUILD_INFO_DIR)
    }

    /// `<root>/build-info/<id>.json`
    pub fn build_info_path(&self, id: &str) -> PathBuf {
        self.build_info_dir().join(format!("{id}.json"))
    }

    /// Creates the build info directory, succeeds if it already exists.
    pub fn create_dirs(&self) -> Result<()> {
        utils::create_dir_all(&self.build_info_dir())
    }

    /// Creates the build info directory and pins `root` to its canonical path, so records stay
    /// put when the working directory changes later on.
    pub fn prepare(mut self) -> Result<Self> {
        self.create_dirs()?;
        self.root = utils::canonicalize(&self.root)?;
        Ok(self)
    }

    /// Removes the build info directory and every record in it.
    pub fn clean(&self) -> Result<()> {
        let dir = self.build_info_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "removed build info");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SolcError::io(err, dir)),
        }
    }

    /// Paths of all records, sorted.
    pub fn build_info_files(&self) -> Vec<PathBuf> {
        utils::json_files(&self.build_info_dir())
    }

    /// Reads all records, sorted by id.
    pub fn read_all(&self) -> Result<Vec<BuildInfo<SolcInput, CompilerOutput>>> {
        self.build_info_files().iter().map(|path| BuildInfo::read(path)).collect()
    }

    /// Writes the record for `input` and `output`, returning its path.
    ///
    /// Every failure is reported as [`SolcError::Persist`].
    pub fn persist(&self, input: &SolcVersionedInput, output: &CompilerOutput) -> Result<PathBuf> {
        let dir = self.build_info_dir();
        let info = RawBuildInfo::new(input, output).map_err(|err| SolcError::persist(&dir, err))?;
        let path = info.path_in(&dir);
        info.write(&dir, self.pretty).map_err(|err| SolcError::persist(path, err))
    }
}

/// A [`Compiler`] that records a build info for every successful compilation of the compiler it
/// wraps.
///
/// Compiles through the inner compiler exactly once per call and returns its output unchanged.
/// Failed compilations propagate untouched and leave no record. Whether a failed write fails the
/// call is decided by [`ArtifactsConfig::on_persist_error`].
///
/// Calls made on the inner compiler directly are not recorded.
#[derive(Clone, Debug)]
pub struct CapturingCompiler<C> {
    inner: C,
    config: ArtifactsConfig,
}

impl<C: Compiler> CapturingCompiler<C> {
    pub fn new(inner: C, config: ArtifactsConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn config(&self) -> &ArtifactsConfig {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Points all further records to another configuration, without adding a layer.
    pub fn retarget(&mut self, config: ArtifactsConfig) {
        if config.root != self.config.root {
            debug!(from = %self.config.root.display(), to = %config.root.display(), "retargeting build info");
        }
        self.config = config;
    }

    /// Same as [`Compiler::compile`] but also returns the path of the written record, `None` if
    /// writing it failed and was only logged.
    #[instrument(name = "compile_captured", level = "debug", skip_all)]
    pub fn compile_captured(
        &self,
        input: &SolcVersionedInput,
    ) -> Result<(CompilerOutput, Option<PathBuf>)> {
        let output = self.inner.compile(input)?;

        let path = match self.config.persist(input, &output) {
            Ok(path) => {
                debug!(path = %path.display(), "captured build info");
                Some(path)
            }
            Err(err) => match self.config.on_persist_error {
                PersistPolicy::Log => {
                    warn!(%err, "failed to capture build info");
                    None
                }
                PersistPolicy::Fail => return Err(err),
            },
        };

        Ok((output, path))
    }
}

impl<C: Compiler> Compiler for CapturingCompiler<C> {
    fn version(&self) -> &Version {
        self.inner.version()
    }

    fn compile(&self, input: &SolcVersionedInput) -> Result<CompilerOutput> {
        self.compile_captured(input).map(|(output, _)| output)
    }

    fn captures_build_info(&self) -> bool {
        true
    }
}
