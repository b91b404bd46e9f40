//! build info benches
#[macro_use]
extern crate criterion;

use auditless_solc::{
    artifacts::{CompilerOutput, Settings, SolcInput, SolcLanguage, Source, Sources},
    build_id, compiler_fn, utils::tempdir, ArtifactsConfig, CapturingCompiler, Compiler,
    RawBuildInfo, SolcVersionedInput,
};
use criterion::Criterion;
use std::collections::BTreeMap;

fn build_info_benchmark(c: &mut Criterion) {
    let input = load_input(50);
    let output = output_for(&input);

    let mut group = c.benchmark_group("build info");
    group.bench_function("build id", |b| {
        b.iter(|| build_id(&input).unwrap());
    });
    group.bench_function("raw build info", |b| {
        b.iter(|| RawBuildInfo::new(&input, &output).unwrap());
    });

    let tmp = tempdir("bench").unwrap();
    let compiler = CapturingCompiler::new(
        compiler_fn(input.version.clone(), |_| Ok(output.clone())),
        ArtifactsConfig::new(tmp.path()).with_pretty(false),
    );
    group.sample_size(10);
    group.bench_function("captured compile", |b| {
        b.iter(|| compiler.compile(&input).unwrap());
    });
}

fn load_input(num_sources: usize) -> SolcVersionedInput {
    let sources: Sources = (0..num_sources)
        .map(|i| {
            let content = format!(
                "pragma solidity ^0.7.6;\ncontract Test{i} {{ function test() public {{ }} }}\n"
            );
            (format!("contracts/Test{i}.sol"), Source::new(content))
        })
        .collect();
    SolcVersionedInput::build(
        SolcInput::new(SolcLanguage::Solidity, sources, Settings::default()),
        "0.7.6+commit.7338295f".parse().unwrap(),
    )
}

fn output_for(input: &SolcVersionedInput) -> CompilerOutput {
    let mut output = CompilerOutput::default();
    for (id, name) in input.input.sources.keys().enumerate() {
        output.sources.insert(name.clone(), serde_json::json!({ "id": id }));
        output.contracts.insert(
            name.clone(),
            BTreeMap::from([(
                "Test".to_string(),
                serde_json::json!({ "abi": [], "evm": { "bytecode": { "object": "6080604052" } } }),
            )]),
        );
    }
    output
}

criterion_group!(benches, build_info_benchmark);
criterion_main!(benches);
