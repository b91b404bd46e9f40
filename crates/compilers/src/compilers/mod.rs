use auditless_solc_artifacts::{CompilerOutput, SolcInput};
use auditless_solc_core::error::Result;
use auto_impl::auto_impl;
use semver::Version;
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

pub mod solc;
pub use solc::Solc;

/// A compile function with a known input and output shape.
///
/// This is the seam the build info capture wraps: anything implementing it can be handed to
/// [`CapturingCompiler`](crate::CapturingCompiler) or to the crate level entry points.
#[auto_impl(&, Box, Arc)]
pub trait Compiler: Send + Sync {
    /// The version of the compiler, recorded in every build info.
    fn version(&self) -> &Version;

    /// Compiles the given input.
    ///
    /// Failing compilations must return an error rather than an output carrying error
    /// diagnostics, so that nothing gets recorded for them.
    fn compile(&self, input: &SolcVersionedInput) -> Result<CompilerOutput>;

    /// Returns `true` if this compiler already records build info on its own.
    fn captures_build_info(&self) -> bool {
        false
    }
}

/// [`SolcInput`] together with the compiler version it's meant for and the command line options
/// that are not part of the standard json.
///
/// Serializes to exactly the standard json that is fed to the compiler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolcVersionedInput {
    #[serde(skip)]
    pub version: Version,
    #[serde(flatten)]
    pub input: SolcInput,
    #[serde(skip)]
    pub allow_paths: BTreeSet<PathBuf>,
    #[serde(skip)]
    pub base_path: Option<PathBuf>,
    #[serde(skip)]
    pub include_paths: BTreeSet<PathBuf>,
}

impl SolcVersionedInput {
    pub fn build(input: SolcInput, version: Version) -> Self {
        Self {
            version,
            input,
            base_path: None,
            include_paths: Default::default(),
            allow_paths: Default::default(),
        }
    }

    pub fn with_allow_paths(mut self, allowed_paths: BTreeSet<PathBuf>) -> Self {
        self.allow_paths = allowed_paths;
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_include_paths(mut self, include_paths: BTreeSet<PathBuf>) -> Self {
        self.include_paths = include_paths;
        self
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }
}

/// Adapts a plain function into a [`Compiler`].
pub struct FnCompiler<F> {
    version: Version,
    f: F,
}

impl<F> fmt::Debug for FnCompiler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCompiler").field("version", &self.version).finish_non_exhaustive()
    }
}

impl<F> Compiler for FnCompiler<F>
where
    F: Fn(&SolcVersionedInput) -> Result<CompilerOutput> + Send + Sync,
{
    fn version(&self) -> &Version {
        &self.version
    }

    fn compile(&self, input: &SolcVersionedInput) -> Result<CompilerOutput> {
        (self.f)(input)
    }
}

/// Creates a [`Compiler`] for `version` that compiles by calling `f`.
///
/// ```
/// use auditless_solc::{compiler_fn, artifacts::CompilerOutput, Compiler};
///
/// let compiler = compiler_fn("0.7.6".parse().unwrap(), |_input| Ok(CompilerOutput::default()));
/// assert_eq!(compiler.version().to_string(), "0.7.6");
/// ```
pub fn compiler_fn<F>(version: Version, f: F) -> FnCompiler<F>
where
    F: Fn(&SolcVersionedInput) -> Result<CompilerOutput> + Send + Sync,
{
    FnCompiler { version, f }
}
