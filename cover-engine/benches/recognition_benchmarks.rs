use std::sync::Arc;

use cover_core::{DescriptorSet, ExtractorConfig, Frame};
use cover_engine::{
    DatabaseBuilder, FeatureExtractor, LabelPolicy, Matcher, MatchingConfig, NoMetadata, OrbExtractor,
    RecognitionEngine, ReferenceView,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random grey blocks, a stand-in for a printed cover
fn create_cover_frame(width: usize, height: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let block = 8;
    let cols = width.div_ceil(block);
    let shades: Vec<u8> = (0..cols * height.div_ceil(block)).map(|_| rng.gen_range(0..=255u8)).collect();
    let pixels = (0..width * height)
        .map(|i| shades[(i / width / block) * cols + (i % width) / block])
        .collect();
    Frame::new(width, height, pixels).unwrap()
}

fn extract(extractor: &OrbExtractor, frame: &Frame) -> DescriptorSet {
    extractor.extract(frame).unwrap()
}

/// Benchmark feature extraction over common frame sizes
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    group.sample_size(20);
    let extractor = OrbExtractor::new(ExtractorConfig::default()).unwrap();

    for &(width, height) in &[(320, 240), (640, 480)] {
        let frame = create_cover_frame(width, height, 1);
        group.bench_with_input(
            BenchmarkId::new("orb", format!("{}x{}", width, height)),
            &frame,
            |b, frame| b.iter(|| black_box(extractor.extract(black_box(frame)).unwrap())),
        );
    }
    group.finish();
}

/// Benchmark cross-checked matching at the query cap
fn bench_matching(c: &mut Criterion) {
    let extractor = OrbExtractor::new(ExtractorConfig::default()).unwrap();
    let reference = extract(&extractor, &create_cover_frame(640, 480, 2));
    let mut query = extract(&extractor, &create_cover_frame(640, 480, 3));
    query.truncate(1000);

    let mut group = c.benchmark_group("matching");
    group.sample_size(20);
    for cross_check in [true, false] {
        let matcher = Matcher::default().with_cross_check(cross_check);
        group.bench_function(format!("cross_check_{}", cross_check), |b| {
            b.iter(|| black_box(matcher.match_sets(black_box(&reference), black_box(&query))))
        });
    }
    group.finish();
}

/// Benchmark a full recognition run against a few labels
fn bench_recognition(c: &mut Criterion) {
    let extractor = Arc::new(OrbExtractor::new(ExtractorConfig::default()).unwrap());
    let mut builder = DatabaseBuilder::new(LabelPolicy::Overwrite);
    for (seed, label) in [(10, "alpha"), (11, "beta"), (12, "gamma"), (13, "delta")] {
        let frame = create_cover_frame(400, 600, seed);
        builder.insert(
            label,
            ReferenceView {
                descriptors: extract(&extractor, &frame),
                dimensions: (400, 600),
                source: None,
            },
        );
    }
    let engine = RecognitionEngine::new(
        extractor,
        Arc::new(builder.finish()),
        Arc::new(NoMetadata),
        MatchingConfig::default(),
    );

    let mut group = c.benchmark_group("recognition");
    group.sample_size(10);
    let known = create_cover_frame(400, 600, 12);
    let unknown = create_cover_frame(400, 600, 99);
    group.bench_function("known_cover", |b| b.iter(|| black_box(engine.recognize(black_box(&known)))));
    group.bench_function("unknown_cover", |b| b.iter(|| black_box(engine.recognize(black_box(&unknown)))));
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_matching, bench_recognition);
criterion_main!(benches);
