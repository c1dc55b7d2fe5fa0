//! Benchmarks for the animation codec and playback tick.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use chroma_fx::{
    animation::{Animation2D, AnyAnimation, Frame2D, FrameEditor, decode_bytes, encode_to_vec},
    backend::LogBackend,
    engine::ChromaEngine,
    schema::{Device2D, EngineConfig},
};
use rand::{SeedableRng, rngs::StdRng};

fn keyboard_animation(frames: usize) -> AnyAnimation {
    let mut animation = Animation2D::new(
        Device2D::Keyboard,
        vec![Frame2D::new(Device2D::Keyboard); frames],
    );
    let mut rng = StdRng::seed_from_u64(7);
    for i in 0..frames {
        animation.randomize_frame(i, &mut rng);
    }
    animation.into()
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for frames in [1, 30, 300] {
        let animation = keyboard_animation(frames);
        let bytes = encode_to_vec(&animation);

        group.bench_with_input(BenchmarkId::new("decode", frames), &bytes, |b, bytes| {
            b.iter(|| decode_bytes(black_box(bytes)));
        });

        group.bench_with_input(BenchmarkId::new("encode", frames), &animation, |b, animation| {
            b.iter(|| encode_to_vec(black_box(animation)));
        });
    }

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for frames in [30, 300] {
        let config = EngineConfig {
            auto_start_scheduler: false,
            ..EngineConfig::default()
        };
        let engine = ChromaEngine::new(config, Box::new(LogBackend::new()))
            .expect("valid config");
        let id = engine
            .insert("bench", keyboard_animation(frames))
            .expect("fresh path");
        engine.play(id, true);
        assert!(engine.with_animation(id, |a| a.as_dyn().is_playing()) == Some(true));

        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, _| {
            b.iter(|| engine.tick(black_box(std::time::Duration::from_millis(33))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_tick);
criterion_main!(benches);
