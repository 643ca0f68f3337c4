//! Performance benchmarks for finemap-prep
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use finemap_prep::core::{align_locus, ScoreMode, ZscoreIndex};
use std::io::Write;
use tempfile::TempDir;

/// Write a synthetic Z-score file with `n` rows
fn synthetic_zscore_file(dir: &std::path::Path, n: u64) -> std::path::PathBuf {
    let path = dir.join("chr4.EUR.zscores");
    let mut f = std::io::BufWriter::new(std::fs::File::create(&path).unwrap());
    writeln!(f, "snp\tpos\tref\talt\tzscore\trsquare").unwrap();
    for i in 0..n {
        writeln!(
            f,
            "rs{}\t{}\tA\tG\t{}\t0.9",
            i,
            1000 + i * 50,
            (i as f64).sin()
        )
        .unwrap();
    }
    f.flush().unwrap();
    path
}

/// Build synthetic VCF text with `n` data lines, half of them covered
fn synthetic_vcf(n: u64) -> String {
    let mut text = String::from(
        "##fileformat=VCFv4.1\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\n",
    );
    for i in 0..n {
        // odd rows fall between indexed positions
        let pos = 1000 + i * 25;
        text.push_str(&format!(
            "4\t{}\trs{}\tA\tG\t.\tPASS\t.\tGT\t0|1\t0|0\n",
            pos, i
        ));
    }
    text
}

/// Benchmark Z-score index construction
fn bench_index_build(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();

    let mut group = c.benchmark_group("zscore_index_build");
    for size in [1_000u64, 10_000, 50_000].iter() {
        let path = synthetic_zscore_file(tmp.path(), *size);
        group.throughput(Throughput::Elements(*size));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let index = ZscoreIndex::from_file(black_box(&path), ScoreMode::Raw).unwrap();
                black_box(index)
            })
        });
    }
    group.finish();
}

/// Benchmark locus alignment over the in-memory VCF slice
fn bench_align_locus(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let zscore_path = synthetic_zscore_file(tmp.path(), 20_000);
    let index = ZscoreIndex::from_file(&zscore_path, ScoreMode::Raw).unwrap();

    let mut group = c.benchmark_group("align_locus");
    for size in [1_000u64, 10_000].iter() {
        let vcf = synthetic_vcf(*size);
        group.throughput(Throughput::Elements(*size));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let aligned =
                    align_locus(black_box(&vcf), &index, tmp.path(), "rs_bench", "EUR").unwrap();
                black_box(aligned)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_build, bench_align_locus);
criterion_main!(benches);
