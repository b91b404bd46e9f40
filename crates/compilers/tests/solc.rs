//! Runs the `solc` process wrapper against a stand-in executable.

#![cfg(unix)]

use auditless_solc::{
    artifacts::{Settings, SolcInput, SolcLanguage, Source, Sources},
    utils::tempdir,
    ArtifactsConfig, CapturingCompiler, Compiler, CompileOptions, Solc, SolcError,
    SolcVersionedInput,
};
use similar_asserts::assert_eq;
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tempfile::TempDir;

const FAKE_SOLC: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "solc, the solidity compiler commandline interface"
    echo "Version: 0.7.6+commit.7338295f.Linux.g++"
    exit 0
fi
input=$(cat)
case "$input" in
    *CRASH*)
        echo "Segmentation fault" >&2
        exit 1
        ;;
    *"SYNTAX ERROR"*)
        printf '%s\n' '{"errors":[{"component":"general","errorCode":"2314","formattedMessage":"ParserError: Expected pragma, import directive or contract/interface/library/struct/enum/constant/function definition.\n","message":"Expected pragma, import directive or contract/interface/library/struct/enum/constant/function definition.","severity":"error","sourceLocation":{"end":12,"file":"<stdin>","start":0},"type":"ParserError"}],"sources":{}}'
        ;;
    *)
        printf '%s\n' '{"contracts":{"<stdin>":{"Test":{"abi":[],"evm":{"bytecode":{"object":"6080604052"}}}}},"sources":{"<stdin>":{"id":0}}}'
        ;;
esac
"#;

const SOURCE: &str = "pragma solidity ^0.7.6;\ncontract Test { function test() public { } }";

// Written once, before any test spawns a process, so no child inherits an open handle to it.
fn fake_solc() -> &'static Path {
    static SOLC: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = SOLC.get_or_init(|| {
        let dir = tempdir("fake-solc").unwrap();
        let path = dir.path().join("solc");
        fs::write(&path, FAKE_SOLC).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

fn stdin_input(solc: &Solc, source: &str) -> SolcVersionedInput {
    CompileOptions::default().source_input(source, solc.version.clone()).unwrap()
}

#[test]
fn detects_version() {
    let solc = Solc::new(fake_solc()).unwrap();
    assert_eq!(solc.version.to_string(), "0.7.6+commit.7338295f.Linux.gcc");
}

#[test]
fn compiles_and_records() {
    let tmp = tempdir("artifacts").unwrap();
    let solc = Solc::new(fake_solc()).unwrap();
    let input = stdin_input(&solc, SOURCE);
    let direct = solc.compile(&input).unwrap();
    assert_eq!(direct.contract_names("<stdin>").collect::<Vec<_>>(), ["Test"]);

    let compiler = CapturingCompiler::new(solc, ArtifactsConfig::new(tmp.path()));
    let (output, path) = compiler.compile_captured(&input).unwrap();
    assert_eq!(output, direct);
    assert!(path.unwrap().is_file());

    let infos = compiler.config().read_all().unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].solc_version.to_string(), "0.7.6");
    assert_eq!(infos[0].solc_long_version.to_string(), "0.7.6+commit.7338295f");
    assert_eq!(
        infos[0].input,
        SolcInput::new(
            SolcLanguage::Solidity,
            Sources::from([("<stdin>".to_string(), Source::new(SOURCE))]),
            Settings::default(),
        )
    );
    assert_eq!(infos[0].output, output);
}

#[test]
fn syntax_error_is_compilation_error() {
    let tmp = tempdir("artifacts").unwrap();
    let solc = Solc::new(fake_solc()).unwrap();
    let input = stdin_input(&solc, "SYNTAX ERROR");

    // the raw output still carries the diagnostics
    let raw = solc.compile_exact(&input.input).unwrap();
    assert!(raw.has_error());

    let compiler = CapturingCompiler::new(solc, ArtifactsConfig::new(tmp.path()));
    let err = compiler.compile(&input).unwrap_err();
    match err {
        SolcError::Compilation(diagnostics) => {
            assert!(diagnostics.starts_with("ParserError: Expected pragma"), "{diagnostics}")
        }
        err => panic!("unexpected error: {err:?}"),
    }
    assert!(compiler.config().build_info_files().is_empty());
}

#[test]
fn failing_process_is_solc_error() {
    let tmp = tempdir("artifacts").unwrap();
    let solc = Solc::new(fake_solc()).unwrap();
    let input = stdin_input(&solc, "CRASH");

    let compiler = CapturingCompiler::new(solc, ArtifactsConfig::new(tmp.path()));
    let err = compiler.compile(&input).unwrap_err();
    assert!(matches!(err, SolcError::SolcError(..)), "{err:?}");
    assert!(err.to_string().contains("Segmentation fault"));
    assert!(compiler.config().build_info_files().is_empty());
}

#[test]
fn compiles_with_command_line_paths() {
    let project = tempdir("project").unwrap();
    let solc = Solc::new(fake_solc()).unwrap();
    let input = CompileOptions::default()
        .base_path(project.path())
        .allow_path(project.path())
        .source_input(SOURCE, solc.version.clone())
        .unwrap();
    let output = solc.compile(&input).unwrap();
    assert!(output.contracts.contains_key("<stdin>"));
}
