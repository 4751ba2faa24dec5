use criterion::{black_box, criterion_group, criterion_main, Criterion};
use physics::{CartPole, CartPoleConfig};

fn bench_cartpole_episode(c: &mut Criterion) {
    c.bench_function("cartpole_200_steps", |b| {
        let mut cartpole = CartPole::new(CartPoleConfig::default()).unwrap();
        let mut rng = fastrand::Rng::with_seed(0);
        b.iter(|| {
            cartpole.reset(&mut rng);
            for i in 0..200 {
                let action = if i % 2 == 0 { 1.0 } else { -1.0 };
                black_box(cartpole.step(action).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_cartpole_episode);
criterion_main!(benches);
