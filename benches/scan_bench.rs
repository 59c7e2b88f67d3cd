//! Scan and deduplication benchmarks.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `scan` | Reading a logfile and testing every line, per match type and size |
//! | `scan_incremental` | Skipping a large consumed prefix to read a short tail |
//! | `dedup` | Grouping matches with few vs many distinct contents |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench scan_bench
//! open target/criterion/report/index.html
//! ```

use std::hint::black_box;
use std::io::Write;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logmon_core::dedup::deduplicate;
use logmon_core::{MatchRecord, MatchType, MonitorSpec, PatternMatch, ReadMode, Rotation};
use logmon_feeds::scan;

fn log_file(lines: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp log");
    for i in 0..lines {
        let level = if i % 10 == 0 { "ERROR" } else { "INFO " };
        writeln!(
            file,
            "2024-01-15 10:00:00 {level} request {i} status={} worker-{}",
            200 + i % 5,
            i % 4
        )
        .expect("write log");
    }
    file
}

fn spec(match_type: MatchType, text: &str) -> MonitorSpec {
    let (directory, basename) = MonitorSpec::split_file_pattern("bench.log").expect("pattern");
    MonitorSpec {
        logical_name: "bench".into(),
        instance: "bench".into(),
        file_pattern: "bench.log".into(),
        directory,
        basename,
        event_type: "Bench".into(),
        read_mode: ReadMode::Full,
        rotation: Rotation::No,
        deduplicate: true,
        responsible: "bench".into(),
        field1: String::new(),
        field2: String::new(),
        alarm_on_error: false,
        alarm_on_error_severity: None,
        patterns: vec![PatternMatch::new(match_type, text).expect("pattern")],
    }
}

// ---------------------------------------------------------------------------
// Full scans
// ---------------------------------------------------------------------------

fn scan_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for lines in [1_000usize, 100_000] {
        let file = log_file(lines);
        group.throughput(Throughput::Elements(lines as u64));
        for (name, match_type, text) in [
            ("substring", MatchType::Substring, "ERROR"),
            ("regexp", MatchType::Regexp, r"status=50\d"),
        ] {
            let spec = spec(match_type, text);
            let watches: Vec<_> = spec.watches().collect();
            group.bench_with_input(BenchmarkId::new(name, lines), &lines, |b, _| {
                b.iter(|| black_box(scan(file.path(), ReadMode::Full, 0, &watches).expect("scan")))
            });
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Incremental tail
// ---------------------------------------------------------------------------

fn incremental_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_incremental");
    let file = log_file(100_000);
    let spec = spec(MatchType::Substring, "ERROR");
    let watches: Vec<_> = spec.watches().collect();

    // only the last 100 lines are new
    group.bench_function("tail_100_of_100k", |b| {
        b.iter(|| {
            black_box(scan(file.path(), ReadMode::Incremental, 99_900, &watches).expect("scan"))
        })
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

fn dedup_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");

    for distinct in [1usize, 1_000] {
        let records: Vec<MatchRecord> = (0..10_000)
            .map(|i| MatchRecord::new(format!("match-{}", i % distinct)))
            .collect();
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::new("distinct", distinct), &records, |b, records| {
            b.iter(|| black_box(deduplicate(records.clone(), true)))
        });
    }

    group.finish();
}

criterion_group!(benches, scan_bench, incremental_bench, dedup_bench);
criterion_main!(benches);
