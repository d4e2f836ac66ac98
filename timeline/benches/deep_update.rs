use criterion::{criterion_group, criterion_main, Criterion};
use timeline::{state::mutable_state_on, Timeline, TimelineConfig};

fn deep_update(c: &mut Criterion) {
    c.bench_function("deep_update", |b| {
        b.iter(|| {
            let timeline = Timeline::new(TimelineConfig::default());
            let root = mutable_state_on(&timeline, 0, None);
            let mut chain = Vec::new();
            for _ in 0..1000usize {
                let next = match chain.last() {
                    Some(prev) => prev,
                    None => &*root,
                };
                chain.push(next.map(|v| v + 1));
            }
            assert_eq!(chain[999].value(), 1000);
            root.set(1);
            assert_eq!(chain[999].value(), 1001);
        });
    });
}

criterion_group!(benches, deep_update);
criterion_main!(benches);
