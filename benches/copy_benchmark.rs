//! Performance benchmarks for FileXtransfer
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use filextransfer::config::CopyMode;
use filextransfer::core::{BatchRunner, NoProgress};
use filextransfer::fs::{CopyOptions, FileCopier, RelativePath, ScanConfig};
use filextransfer::sync::Comparator;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

/// Create a test file of the specified size
fn create_test_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

fn bench_copy_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_file_copy");

    for size in [1024 * 1024, 16 * 1024 * 1024, 100 * 1024 * 1024] {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let src_file = create_test_file(src_dir.path(), "large.bin", size);
        let dst_file = dst_dir.path().join("large.bin");
        let label = humansize::format_size(size as u64, humansize::BINARY);

        group.throughput(Throughput::Bytes(size as u64));

        for mode in [CopyMode::Fast, CopyMode::Chunked] {
            let copier = FileCopier::new(CopyOptions::with_mode(mode));
            group.bench_with_input(BenchmarkId::new(mode.name(), &label), &size, |b, _| {
                b.iter(|| {
                    black_box(copier.copy(&src_file, &dst_file).unwrap());
                });
            });
        }
    }

    group.finish();
}

fn bench_batch_small_files(c: &mut Criterion) {
    let src_dir = TempDir::new().unwrap();
    let dst_dir = TempDir::new().unwrap();

    let mut paths = Vec::new();
    for i in 0..10 {
        let subdir = src_dir.path().join(format!("dir_{}", i));
        std::fs::create_dir_all(&subdir).unwrap();
        for j in 0..10 {
            create_test_file(&subdir, &format!("file_{}.txt", j), 1024);
            paths.push(RelativePath::new(format!("dir_{}/file_{}.txt", i, j)));
        }
    }

    c.bench_function("batch_100_small_files", |b| {
        let runner = BatchRunner::new(CopyOptions::default());
        b.iter(|| {
            let result = runner.run(&paths, src_dir.path(), dst_dir.path(), &NoProgress);
            black_box(result.success_count)
        });
    });
}

fn bench_analyze(c: &mut Criterion) {
    let origin = TempDir::new().unwrap();
    let backup = TempDir::new().unwrap();

    for i in 0..10 {
        for dir in [origin.path(), backup.path()] {
            std::fs::create_dir_all(dir.join(format!("subdir_{}", i))).unwrap();
        }
        for j in 0..100 {
            let name = format!("subdir_{}/file_{}.txt", i, j);
            create_test_file(origin.path(), &name, 128);
            if j % 2 == 0 {
                create_test_file(backup.path(), &name, 128);
            }
        }
    }

    c.bench_function("analyze_1000_vs_500_files", |b| {
        let comparator = Comparator::new(ScanConfig::default()).unwrap();
        b.iter(|| black_box(comparator.analyze(origin.path(), backup.path()).unwrap().missing.len()));
    });
}

criterion_group!(benches, bench_copy_modes, bench_batch_small_files, bench_analyze);

criterion_main!(benches);
