use super::{Compiler, SolcVersionedInput};
use auditless_solc_artifacts::{CompilerOutput, SolcInput};
use auditless_solc_core::error::{Result, SolcError};
use semver::Version;
use std::{
    collections::BTreeSet,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    str::FromStr,
};

/// Extensions acceptable by solc compiler.
pub const SOLC_EXTENSIONS: &[&str] = &["sol", "yul"];

/// Abstraction over `solc` command line utility
///
/// Supports sync solc `--standard-json` invocations. Installing and selecting solc versions is
/// left to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solc {
    /// Path to the `solc` executable
    pub solc: PathBuf,
    /// Compiler version.
    pub version: Version,
    /// Value for --base-path arg
    pub base_path: Option<PathBuf>,
    /// Value for --allow-paths arg.
    pub allow_paths: BTreeSet<PathBuf>,
    /// Value for --include-paths arg.
    pub include_paths: BTreeSet<PathBuf>,
    /// Additional arbitrary arguments.
    pub extra_args: Vec<String>,
}

impl Solc {
    /// A new instance which points to `solc`. Invokes `solc --version` to determine the version.
    ///
    /// Returns error if `solc` is not found in the system or if the version cannot be retrieved.
    #[instrument(name = "Solc::new", skip_all)]
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let version = Self::detect_version(&path)?;
        Ok(Self::new_with_version(path, version))
    }

    /// A new instance which points to `solc` with the given version
    pub fn new_with_version(path: impl Into<PathBuf>, version: Version) -> Self {
        Self {
            solc: path.into(),
            version,
            base_path: None,
            allow_paths: Default::default(),
            include_paths: Default::default(),
            extra_args: Default::default(),
        }
    }

    /// Sets solc's base path
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Adds directories to the `--allow-paths` list.
    pub fn with_allow_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.allow_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Adds directories to the `--include-path` list.
    pub fn with_include_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Adds an argument that is passed to the solc binary as is.
    pub fn arg<T: Into<String>>(mut self, arg: T) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds multiple arguments that are passed to the solc binary as is.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Invokes `solc --version` and parses the output as a SemVer [`Version`].
    #[instrument(level = "debug", skip_all)]
    pub fn detect_version(solc: impl AsRef<Path>) -> Result<Version> {
        let solc = solc.as_ref();
        let mut cmd = Command::new(solc);
        cmd.arg("--version").stdin(Stdio::piped()).stderr(Stdio::piped()).stdout(Stdio::piped());
        debug!(?cmd, "getting Solc version");
        let output = cmd.output().map_err(|e| SolcError::io(e, solc))?;
        trace!(?output);
        let version = version_from_output(output)?;
        debug!(%version);
        Ok(version)
    }

    /// Compiles with `--standard-json` and deserializes the output as [`CompilerOutput`].
    ///
    /// The output is returned as is, error diagnostics included.
    pub fn compile_exact(&self, input: &SolcInput) -> Result<CompilerOutput> {
        let output = self.compile_output(input)?;

        // Only run UTF-8 validation once.
        let output = std::str::from_utf8(&output).map_err(|_| SolcError::InvalidUtf8)?;

        Ok(serde_json::from_str(output)?)
    }

    /// Compiles with `--standard-json` and returns the raw `stdout` output.
    #[instrument(name = "compile", level = "debug", skip_all)]
    pub fn compile_output(&self, input: &SolcInput) -> Result<Vec<u8>> {
        let mut cmd = self.configure_cmd();

        trace!(input=%serde_json::to_string(input).unwrap_or_else(|e| e.to_string()));
        debug!(?cmd, "compiling");

        let mut child = cmd.spawn().map_err(self.map_io_err())?;
        debug!("spawned");

        let stdin = child.stdin.take().ok_or_else(|| SolcError::msg("solc stdin unavailable"))?;
        let mut writer = BufWriter::new(stdin);
        serde_json::to_writer(&mut writer, input)?;
        writer.flush().map_err(self.map_io_err())?;
        drop(writer);
        debug!("wrote JSON input to stdin");

        let output = child.wait_with_output().map_err(self.map_io_err())?;
        debug!(%output.status, output.stderr = ?String::from_utf8_lossy(&output.stderr), "finished");

        compile_output(output)
    }

    fn map_io_err(&self) -> impl FnOnce(std::io::Error) -> SolcError + '_ {
        move |err| SolcError::io(err, &self.solc)
    }

    fn configure_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.solc);
        cmd.stdin(Stdio::piped()).stderr(Stdio::piped()).stdout(Stdio::piped());
        cmd.args(&self.extra_args);

        if !self.allow_paths.is_empty() {
            cmd.arg("--allow-paths");
            cmd.arg(
                self.allow_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        if let Some(base_path) = &self.base_path {
            cmd.arg("--base-path").arg(base_path);
            cmd.current_dir(base_path);
        }
        for path in &self.include_paths {
            cmd.arg("--include-path").arg(path);
        }

        cmd.arg("--standard-json");

        cmd
    }
}

impl Compiler for Solc {
    fn version(&self) -> &Version {
        &self.version
    }

    /// Runs solc with the input's command line options merged into this instance's.
    ///
    /// Fails with [`SolcError::Compilation`] if solc reports any error-severity diagnostic.
    fn compile(&self, input: &SolcVersionedInput) -> Result<CompilerOutput> {
        if !same_release(&input.version, &self.version) {
            return Err(SolcError::VersionMismatch {
                expected: input.version.clone(),
                found: self.version.clone(),
            });
        }

        let mut solc = self.clone();
        if input.base_path.is_some() {
            solc.base_path.clone_from(&input.base_path);
        }
        solc.allow_paths.extend(input.allow_paths.iter().cloned());
        solc.include_paths.extend(input.include_paths.iter().cloned());

        let output = solc.compile_exact(&input.input)?;
        if output.has_error() {
            return Err(SolcError::Compilation(output.diagnostics()));
        }
        Ok(output)
    }
}

fn same_release(a: &Version, b: &Version) -> bool {
    (a.major, a.minor, a.patch) == (b.major, b.minor, b.patch) && a.pre == b.pre
}

fn compile_output(output: Output) -> Result<Vec<u8>> {
    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(SolcError::solc_output(&output))
    }
}

fn version_from_output(output: Output) -> Result<Version> {
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .last()
            .ok_or_else(|| SolcError::VersionParse(stdout.to_string()))?;
        // NOTE: semver doesn't like `+` in g++ in build metadata which is invalid semver
        Ok(Version::from_str(&version.trim_start_matches("Version: ").replace(".g++", ".gcc"))?)
    } else {
        Err(SolcError::solc_output(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn output(status: i32, stdout: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(status << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    #[test]
    #[cfg(unix)]
    fn parses_version_output() {
        let out = output(
            0,
            "solc, the solidity compiler commandline interface\nVersion: 0.7.6+commit.7338295f.Linux.g++\n",
        );
        let version = version_from_output(out).unwrap();
        assert_eq!((version.major, version.minor, version.patch), (0, 7, 6));
        assert_eq!(version.build.as_str(), "commit.7338295f.Linux.gcc");
    }

    #[test]
    #[cfg(unix)]
    fn failed_version_output_is_solc_error() {
        let err = version_from_output(output(1, "")).unwrap_err();
        assert!(matches!(err, SolcError::SolcError(..)), "{err:?}");
    }

    #[test]
    fn configures_cmd() {
        let solc = Solc::new_with_version("solc", Version::new(0, 8, 20))
            .with_base_path("/project")
            .with_allow_paths(["/lib", "/node_modules"])
            .with_include_paths(["/include"])
            .arg("--via-ir");
        let cmd = solc.configure_cmd();
        let args = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect::<Vec<_>>();
        assert_eq!(
            args,
            [
                "--via-ir",
                "--allow-paths",
                "/lib,/node_modules",
                "--base-path",
                "/project",
                "--include-path",
                "/include",
                "--standard-json"
            ]
        );
    }

    #[test]
    fn version_mismatch_is_rejected_before_running() {
        let solc = Solc::new_with_version("/does/not/exist/solc", Version::new(0, 8, 20));
        let input = SolcVersionedInput::build(Default::default(), Version::new(0, 7, 6));
        let err = solc.compile(&input).unwrap_err();
        assert!(matches!(err, SolcError::VersionMismatch { .. }), "{err:?}");
    }

    #[test]
    fn missing_binary_is_io_error() {
        let solc = Solc::new_with_version("/does/not/exist/solc", Version::new(0, 7, 6));
        let input = SolcVersionedInput::build(Default::default(), Version::new(0, 7, 6));
        let err = solc.compile(&input).unwrap_err();
        assert!(matches!(err, SolcError::Io(_)), "{err:?}");
    }
}
