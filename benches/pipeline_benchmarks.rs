use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use parkwatch::archive::decode::{decode_line, restore_padding};
use parkwatch::capture::journal::format_line;
use parkwatch::delivery::transport::sink_line;
use parkwatch::{aggregate, ArchiveReader, Envelope, MemoryArchiveStore, Occupancy, Reading};

/// Deterministic synthetic readings, ten seconds apart.
fn synthetic_readings(count: usize) -> Vec<Reading> {
    let start = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            Reading::at(
                start + ChronoDuration::seconds(10 * i as i64),
                15.0 + (i % 20) as f64 / 2.0,
                Occupancy::FIXED[i % Occupancy::FIXED.len()].clone(),
            )
        })
        .collect()
}

/// Benchmark envelope encoding
fn bench_envelope_encode(c: &mut Criterion) {
    let reading = synthetic_readings(1).remove(0);

    c.bench_function("envelope_encode", |b| {
        b.iter(|| Envelope::encode(&reading).expect("Should encode"))
    });
}

/// Benchmark journal line formatting
fn bench_journal_line_format(c: &mut Criterion) {
    let reading = synthetic_readings(1).remove(0);

    c.bench_function("journal_line_format", |b| b.iter(|| format_line(&reading)));
}

/// Benchmark base64 padding restoration
fn bench_padding_restoration(c: &mut Criterion) {
    let bodies: Vec<String> = (0..64).map(|len| "A".repeat(len)).collect();

    c.bench_function("padding_restoration", |b| {
        b.iter(|| {
            for body in &bodies {
                let _ = restore_padding(body);
            }
        })
    });
}

/// Benchmark decoding one archived sink line
fn bench_line_decode(c: &mut Criterion) {
    let reading = synthetic_readings(1).remove(0);
    let line = sink_line(&serde_json::to_vec(&reading).expect("Should serialize"));
    let line = line.trim();

    c.bench_function("line_decode", |b| {
        b.iter(|| decode_line(line).expect("Should decode"))
    });
}

/// Benchmark a full archive scan at different store sizes
fn bench_archive_scan(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");

    for size in [100, 1000].iter() {
        let readings = synthetic_readings(*size);
        let mut content = String::new();
        for reading in &readings {
            content.push_str(&sink_line(
                &serde_json::to_vec(reading).expect("Should serialize"),
            ));
        }
        let mut store = MemoryArchiveStore::new();
        store.insert("bench.json", content);
        let reader = ArchiveReader::new(store);

        c.bench_with_input(BenchmarkId::new("archive_scan", size), size, |b, _| {
            b.to_async(&rt).iter(|| async {
                reader.read_all().await.expect("Should scan")
            })
        });
    }
}

/// Benchmark aggregation over different reading counts
fn bench_aggregate(c: &mut Criterion) {
    for size in [100, 1000, 5000].iter() {
        let readings = synthetic_readings(*size);

        c.bench_with_input(BenchmarkId::new("aggregate", size), size, |b, _| {
            b.iter(|| aggregate(&readings))
        });
    }
}

/// Benchmark JSON serialization of a finished report
fn bench_report_serialization(c: &mut Criterion) {
    let report = aggregate(&synthetic_readings(1000));

    c.bench_function("report_serialization", |b| {
        b.iter(|| serde_json::to_string(&report).expect("Should serialize"))
    });
}

criterion_group!(
    benches,
    bench_envelope_encode,
    bench_journal_line_format,
    bench_padding_restoration,
    bench_line_decode,
    bench_archive_scan,
    bench_aggregate,
    bench_report_serialization
);

criterion_main!(benches);
