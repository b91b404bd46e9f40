//! Process-wide build info capture.
//!
//! [`activate`] switches every compilation made through [`compile_standard`], [`compile_source`]
//! and [`compile_files`] over to capturing build info. The entry points look up the current state
//! on every call instead of wrapping a function once, so activating again only moves the
//! artifacts root and never stacks captures.
//!
//! Calling [`Compiler::compile`] on a compiler directly bypasses the process-wide state.

use crate::{
    capture::{ArtifactsConfig, CapturingCompiler},
    compilers::{Compiler, SolcVersionedInput},
    input::CompileOptions,
};
use auditless_solc_artifacts::{CompilerOutput, SolcInput};
use auditless_solc_core::error::Result;
use std::{
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

/// Whether the compile entry points capture build info.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PatchState {
    #[default]
    Unpatched,
    /// Capturing into the given configuration. Terminal for the process.
    Patched(ArtifactsConfig),
}

static PATCH_STATE: RwLock<PatchState> = RwLock::new(PatchState::Unpatched);

/// Starts capturing build info of every compilation made through the entry points of this crate
/// into `<root>/build-info`.
///
/// Creates the build info directory right away and fails if it can't. A relative root is resolved
/// against the current working directory at this point. Calling it again replaces the root.
pub fn activate(root: impl Into<PathBuf>) -> Result<()> {
    activate_with(ArtifactsConfig::new(root))
}

/// Same as [`activate`] with a full configuration.
pub fn activate_with(config: ArtifactsConfig) -> Result<()> {
    let config = config.prepare()?;

    let mut state = PATCH_STATE.write().unwrap_or_else(PoisonError::into_inner);
    match &*state {
        PatchState::Unpatched => {
            debug!(root = %config.root.display(), "activated build info capture");
        }
        PatchState::Patched(prev) if prev.root != config.root => {
            debug!(from = %prev.root.display(), to = %config.root.display(), "retargeted build info capture");
        }
        PatchState::Patched(_) => {}
    }
    *state = PatchState::Patched(config);
    Ok(())
}

/// Returns a snapshot of the current state.
pub fn patch_state() -> PatchState {
    PATCH_STATE.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Returns `true` once [`activate`] succeeded.
pub fn is_active() -> bool {
    matches!(*PATCH_STATE.read().unwrap_or_else(PoisonError::into_inner), PatchState::Patched(_))
}

/// The configuration records are currently written with, if active.
pub fn active_config() -> Option<ArtifactsConfig> {
    match patch_state() {
        PatchState::Patched(config) => Some(config),
        PatchState::Unpatched => None,
    }
}

/// Compiles a standard json input.
///
/// The input is sent, and recorded, exactly as given.
pub fn compile_standard<C: Compiler>(compiler: &C, input: SolcInput) -> Result<CompilerOutput> {
    let input = SolcVersionedInput::build(input, compiler.version().clone());
    compile_versioned(compiler, &input)
}

/// Compiles the given source text as a single source unit named `<stdin>`.
pub fn compile_source<C: Compiler>(
    compiler: &C,
    source: impl Into<String>,
    opts: &CompileOptions,
) -> Result<CompilerOutput> {
    let input = opts.source_input(source, compiler.version().clone())?;
    compile_versioned(compiler, &input)
}

/// Compiles the given files, each becoming a source unit named by its file name.
pub fn compile_files<C, I, P>(compiler: &C, files: I, opts: &CompileOptions) -> Result<CompilerOutput>
where
    C: Compiler,
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let input = opts.files_input(files, compiler.version().clone())?;
    compile_versioned(compiler, &input)
}

/// Compiles `input`, capturing its build info if capture is active and `compiler` doesn't capture
/// on its own already.
pub fn compile_versioned<C: Compiler>(
    compiler: &C,
    input: &SolcVersionedInput,
) -> Result<CompilerOutput> {
    // The lock is released before compiling.
    let config = match patch_state() {
        PatchState::Patched(config) if !compiler.captures_build_info() => config,
        _ => return compiler.compile(input),
    };
    CapturingCompiler::new(compiler, config).compile(input)
}
