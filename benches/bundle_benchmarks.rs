//! Benchmarks for bundle building and fingerprinting

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;
use tokio::runtime::Runtime;
use wdl_omics_run::bundle::{BundleBuilder, MemorySourceReader, SourceLocation};
use wdl_omics_run::fingerprint::BundleFingerprint;

/// A main document importing `imports` task libraries.
fn create_reader(imports: usize) -> MemorySourceReader {
    let mut main = String::from("version 1.0\n\n");
    for i in 0..imports {
        main.push_str(&format!("import \"lib/tasks_{i}.wdl\" as t{i}\n"));
    }
    main.push_str("\nworkflow bench {\n  input { File reads }\n");
    for i in 0..imports {
        main.push_str(&format!("  call t{i}.step{i} {{ input: f = reads }}\n"));
    }
    main.push_str("}\n");

    let mut reader = MemorySourceReader::new().with_document("/bench/main.wdl", &main);
    for i in 0..imports {
        let task = format!(
            "version 1.0\n\ntask step{i} {{\n  input {{ File f }}\n  command <<< wc -l ~{{f}} >>>\n  output {{ Int n = read_int(stdout()) }}\n}}\n"
        );
        reader = reader.with_document(&format!("/bench/lib/tasks_{i}.wdl"), &task);
    }
    reader
}

fn bench_bundle_build(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let main = SourceLocation::parse("/bench/main.wdl").unwrap();

    let mut group = c.benchmark_group("bundle_build");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    for imports in [1, 10, 50].iter() {
        let reader = create_reader(*imports);
        let (reader, main) = (&reader, &main);
        group.bench_with_input(BenchmarkId::new("imports", imports), imports, |b, _| {
            b.to_async(&rt).iter(|| async move {
                let loaded = BundleBuilder::new(reader).build(main).await.unwrap();
                black_box(loaded.bundle.fingerprint())
            });
        });
    }
    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    for size in [1024, 64 * 1024, 1024 * 1024].iter() {
        let bytes = vec![0x5au8; *size];
        group.bench_with_input(BenchmarkId::new("sha256", size), &bytes, |b, bytes| {
            b.iter(|| black_box(BundleFingerprint::of(bytes)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_bundle_build, bench_fingerprint);
criterion_main!(benches);
