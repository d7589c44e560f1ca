use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use siphon_codec::{
    AnnotationPolicy, EncodeOptions, Encoder, Limits, RecordStream, SourceFormat, TargetFormat,
};

fn sample_document(records: usize) -> String {
    let mut doc = String::new();
    for i in 0..records {
        doc.push_str(&format!(
            "{{dn:\"cn=user{i}@example.com\",attributes:{{description:[\"entry {i}\",base64::\"TGlzdGU=\"],count:{i},score:1.5}}}}\n"
        ));
    }
    doc
}

fn bench_decode(c: &mut Criterion) {
    let doc = sample_document(1_000);
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(doc.len() as u64));
    group.bench_function("interchange_1k_records", |b| {
        b.iter(|| {
            let stream = RecordStream::open(
                SourceFormat::Ion,
                black_box(doc.as_bytes()),
                Limits::default(),
            );
            let count = stream.filter(|r| r.is_ok()).count();
            assert_eq!(count, 1_000);
        });
    });
    group.finish();
}

fn bench_transcode(c: &mut Criterion) {
    let doc = sample_document(1_000);
    let mut group = c.benchmark_group("transcode");
    group.throughput(Throughput::Bytes(doc.len() as u64));
    group.bench_function("interchange_to_jsonl_1k_records", |b| {
        b.iter(|| {
            let stream = RecordStream::open(
                SourceFormat::Ion,
                black_box(doc.as_bytes()),
                Limits::default(),
            );
            let mut encoder =
                Encoder::new(TargetFormat::JsonLines, &EncodeOptions::default()).unwrap();
            let policy = AnnotationPolicy::Strip;
            let mut bytes = 0usize;
            for (i, record) in stream.enumerate() {
                let value = policy.apply(record.unwrap());
                bytes += encoder.encode(&value, i as u64).unwrap().len();
            }
            black_box(bytes);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_decode, bench_transcode);
criterion_main!(benches);
