use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lineage_forest::{build_forest, sample_forest, SamplerConfig};
use lineage_trace::{parse_lines, ParserConfig};

fn synthetic_log(programs: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(programs * 6);
    for n in 0..programs {
        lines.push(format!("<<<{}>>>", n * 1_000));
        if n % 50 == 0 {
            lines.push("# Generate".into());
        } else {
            lines.push("# Mutate".into());
            lines.push(format!(">>>p{}", n / 3));
            lines.push("<<<".into());
        }
        lines.push(format!(">>>p{n}"));
        lines.push("<<<".into());
        lines.push("- proc 0 executeRaw 4".into());
        lines.push(format!("= {:x}", 0xffff_ffff_8100_0000u64 + n as u64));
        lines.push("# addInputToCorpus Source: 1".into());
    }
    lines
}

fn build_forest_bench(c: &mut Criterion) {
    let lines = synthetic_log(20_000);
    c.bench_function("parse_and_build_20k", |b| {
        b.iter(|| {
            let registry = parse_lines(&lines, &ParserConfig::default());
            black_box(build_forest(&registry));
        });
    });

    let registry = parse_lines(&lines, &ParserConfig::default());
    let forest = build_forest(&registry);
    let config = SamplerConfig::default();
    c.bench_function("sample_20k", |b| {
        b.iter(|| black_box(sample_forest(&forest, &registry, &config).unwrap()));
    });
}

criterion_group!(benches, build_forest_bench);
criterion_main!(benches);
