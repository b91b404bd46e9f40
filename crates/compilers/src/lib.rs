#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod activate;
pub use activate::{
    activate, activate_with, active_config, compile_files, compile_source, compile_standard,
    compile_versioned, is_active, patch_state, PatchState,
};

pub mod buildinfo;
pub use buildinfo::{
    build_id, long_version, BuildInfo, RawBuildInfo, BUILD_INFO_DIR, BUILD_INFO_FORMAT,
};

pub mod capture;
pub use capture::{ArtifactsConfig, CapturingCompiler, PersistPolicy};

pub mod compilers;
pub use compilers::{compiler_fn, Compiler, FnCompiler, Solc, SolcVersionedInput};

pub mod input;
pub use input::CompileOptions;

/// Re-export of the standard json types.
pub use auditless_solc_artifacts as artifacts;
pub use auditless_solc_core::{
    error::{Result, SolcError, SolcIoError},
    utils,
};
