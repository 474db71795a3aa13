use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use twist_engine::{Controls, PipelineConfig, ResamplerQuality, TwistOscillator, ENGINE_NAMES};

const BLOCK: usize = 64;

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_96k_block64");
    for (engine, name) in ENGINE_NAMES.iter().enumerate() {
        let mut osc = TwistOscillator::new(PipelineConfig::default()).unwrap().with_seed(1);
        osc.set_controls(&Controls { engine: engine as i32, ..Controls::default() });
        osc.initialize(60.0, false, true);
        let (mut l, mut r) = ([0.0f32; BLOCK], [0.0f32; BLOCK]);
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                osc.process_block(black_box(60.0), 0.1, true, false, 0.0, &mut l, &mut r);
                black_box(l[BLOCK - 1] + r[BLOCK - 1]);
            });
        });
    }
    group.finish();
}

fn bench_quality(c: &mut Criterion) {
    let mut group = c.benchmark_group("resampler_44k1_block64");
    for quality in [ResamplerQuality::Fast, ResamplerQuality::Medium, ResamplerQuality::Best] {
        let config = PipelineConfig { target_rate: 44_100.0, quality, ..PipelineConfig::default() };
        let mut osc = TwistOscillator::new(config).unwrap().with_seed(1);
        osc.initialize(48.0, false, false);
        let (mut l, mut r) = ([0.0f32; BLOCK], [0.0f32; BLOCK]);
        group.bench_function(BenchmarkId::from_parameter(format!("{quality:?}")), |b| {
            b.iter(|| osc.process_block(48.0, 0.0, false, false, 0.0, black_box(&mut l), &mut r));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engines, bench_quality);
criterion_main!(benches);
