//! Reconstructs the standard json input from command line style compile options.
//!
//! `compile_source` and `compile_files` take the same options one would pass to `solc` on the
//! command line. They are translated into a [`SolcInput`] up front so the exact same value is
//! compiled, fingerprinted and recorded.

use crate::compilers::{solc::SOLC_EXTENSIONS, SolcVersionedInput};
use auditless_solc_artifacts::{
    BytecodeHash, DebuggingSettings, OutputSelection, RevertStrings, Settings, SolcInput,
    SolcLanguage, Source, Sources,
};
use auditless_solc_core::{
    error::{Result, SolcError},
    utils,
};
use semver::Version;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// Source unit name used for source text compiled via [`CompileOptions::source_input`].
pub const STDIN_SOURCE_NAME: &str = "<stdin>";

/// Options of the command line style compile entry points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Remappings as `context:prefix=target` strings.
    pub import_remappings: Vec<String>,
    pub evm_version: Option<String>,
    pub revert_strings: Option<RevertStrings>,
    pub metadata_hash: Option<BytecodeHash>,
    /// Store sources as literal content in the metadata.
    pub metadata_literal: bool,
    pub optimize: bool,
    pub optimize_runs: Option<u64>,
    pub optimize_yul: bool,
    /// Custom yul optimizer steps. Not supported.
    pub yul_optimizations: Option<String>,
    pub output_selection: Option<OutputSelection>,
    /// Passed to solc as `--base-path`, never part of the json.
    pub base_path: Option<PathBuf>,
    /// Passed to solc as `--allow-paths`, never part of the json.
    pub allow_paths: BTreeSet<PathBuf>,
}

impl CompileOptions {
    /// Adds a `prefix=target` remapping.
    pub fn remapping(mut self, prefix: impl AsRef<str>, target: impl AsRef<str>) -> Self {
        self.import_remappings.push(format!("{}={}", prefix.as_ref(), target.as_ref()));
        self
    }

    pub fn evm_version(mut self, evm_version: impl Into<String>) -> Self {
        self.evm_version = Some(evm_version.into());
        self
    }

    pub fn revert_strings(mut self, revert_strings: RevertStrings) -> Self {
        self.revert_strings = Some(revert_strings);
        self
    }

    /// Enables the optimizer, optionally with a number of runs.
    pub fn optimize(mut self, runs: Option<u64>) -> Self {
        self.optimize = true;
        self.optimize_runs = runs;
        self
    }

    pub fn output_selection(mut self, selection: OutputSelection) -> Self {
        self.output_selection = Some(selection);
        self
    }

    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn allow_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.allow_paths.insert(path.into());
        self
    }

    /// Translates the options into standard json settings.
    ///
    /// Options that are not set are left out entirely, so the default options produce `{}`.
    pub fn settings(&self) -> Result<Settings> {
        if self.yul_optimizations.is_some() {
            return Err(SolcError::UnsupportedOption("yul_optimizations"));
        }

        let mut settings = Settings::default();
        if !self.import_remappings.is_empty() {
            settings.remappings = Some(self.import_remappings.clone());
        }
        settings.evm_version.clone_from(&self.evm_version);
        if let Some(revert_strings) = self.revert_strings {
            settings.debug =
                Some(DebuggingSettings { revert_strings: Some(revert_strings), ..Default::default() });
        }

        if let Some(hash) = self.metadata_hash {
            settings.metadata_mut().bytecode_hash = Some(hash);
        }
        if self.metadata_literal {
            settings.metadata_mut().use_literal_content = Some(true);
        }

        if self.optimize {
            settings.optimizer_mut().enabled = Some(true);
        }
        if let Some(runs) = self.optimize_runs {
            settings.optimizer_mut().runs = Some(runs);
        }
        if self.optimize_yul {
            settings.optimizer_mut().details.get_or_insert_with(Default::default).yul = Some(true);
        }

        settings.output_selection.clone_from(&self.output_selection);
        Ok(settings)
    }

    /// Builds the input for compiling `source` as a single source unit named `<stdin>`.
    pub fn source_input(
        &self,
        source: impl Into<String>,
        version: Version,
    ) -> Result<SolcVersionedInput> {
        let sources = Sources::from([(STDIN_SOURCE_NAME.to_string(), Source::new(source))]);
        let input = SolcInput::new(SolcLanguage::Solidity, sources, self.settings()?);
        Ok(self.versioned(input, version))
    }

    /// Builds the input for compiling the given files.
    ///
    /// Every file becomes a source unit named the way the solc command line names it: relative to
    /// `base_path` when it lies inside of it, the path as given otherwise. Relative imports thus
    /// resolve exactly as they would on the command line. The file's content is inlined byte for
    /// byte.
    pub fn files_input<I, P>(&self, files: I, version: Version) -> Result<SolcVersionedInput>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut sources = Sources::new();
        let mut all_yul = true;
        for file in files {
            let file = file.as_ref();
            if file.file_name().is_none() {
                return Err(SolcError::msg(format!("not a file: \"{}\"", file.display())));
            }
            let name = utils::source_unit_name(file, self.base_path.as_deref());
            all_yul &= file.extension().is_some_and(|ext| ext == SOLC_EXTENSIONS[1]);
            let url = file.to_string_lossy().into_owned();
            if sources.insert(name.clone(), Source::from_urls([url])).is_some() {
                return Err(SolcError::msg(format!("duplicate source unit name \"{name}\"")));
            }
        }
        if sources.is_empty() {
            return Err(SolcError::msg("no source files specified"));
        }

        let language = if all_yul { SolcLanguage::Yul } else { SolcLanguage::Solidity };
        let input = SolcInput::new(language, sources, self.settings()?).resolve_urls()?;
        Ok(self.versioned(input, version))
    }

    fn versioned(&self, input: SolcInput, version: Version) -> SolcVersionedInput {
        let input = SolcVersionedInput::build(input, version).with_allow_paths(self.allow_paths.clone());
        match &self.base_path {
            Some(base_path) => input.with_base_path(base_path.clone()),
            None => input,
        }
    }
}
