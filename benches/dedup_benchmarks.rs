use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dedup::engine::{Engine, RunOptions};
use dedup::progress::NullSink;
use dedup::scanner::{DigestAlgorithm, Hasher};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// `depth` levels, two subdirectories per level, `files_per_dir` files each.
/// Every other file repeats content from the previous one.
fn create_tree(path: &Path, depth: usize, files_per_dir: usize) {
    fs::create_dir_all(path).expect("Failed to create dir");
    for i in 0..files_per_dir {
        let content = format!("content {} {}", path.display(), i - i % 2);
        fs::write(path.join(format!("file_{i}.txt")), content).expect("Failed to write file");
    }
    if depth > 1 {
        for i in 0..2 {
            create_tree(&path.join(format!("dir_{i}")), depth - 1, files_per_dir);
        }
    }
}

fn bench_digests(c: &mut Criterion) {
    let data = vec![0xA5u8; 1024 * 1024];
    let mut group = c.benchmark_group("fingerprint_1mib");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for alg in DigestAlgorithm::ALL {
        let hasher = Hasher::new(alg);
        group.bench_with_input(BenchmarkId::from_parameter(alg), &data, |b, data| {
            b.iter(|| black_box(hasher.fingerprint_reader(data.as_slice()).unwrap()));
        });
    }
    group.finish();
}

fn bench_dry_run_merge(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let dst = temp.path().join("dst");
    let src = temp.path().join("src");
    create_tree(&dst, 3, 10);
    create_tree(&src, 4, 10);
    let roots = vec![dst, src];

    let mut group = c.benchmark_group("dry_run_merge");
    for workers in [1, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &w| {
            b.iter(|| {
                // Dry-run leaves the tree intact between iterations.
                let options = RunOptions::default()
                    .with_merge(true)
                    .with_recursive(true)
                    .with_dry_run(true)
                    .with_workers(w);
                let engine = Engine::new(options, Arc::new(NullSink));
                black_box(engine.run(&roots).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_digests, bench_dry_run_merge);
criterion_main!(benches);
