use criterion::{criterion_group, criterion_main, Criterion};
use rl::{one_hot, A2cAgent, A2cConfig, CartPoleEnv, CartPoleEnvConfig, Env, Trajectory};
use std::hint::black_box;
use sysinfo::System;

/// Collects one cart-pole episode with the agent's own policy.
fn rollout(agent: &mut A2cAgent, env: &mut CartPoleEnv) -> Trajectory {
    let mut trajectory = Trajectory::new();
    let mut state = env.reset();
    loop {
        let action = agent.choose_an_action(&state).expect("valid state");
        let step = env.step(action).expect("valid action");
        trajectory.push(std::mem::replace(&mut state, step.observation), action, step.reward);
        if step.done {
            return trajectory;
        }
    }
}

fn bench_a2c_train_step(c: &mut Criterion) {
    let mut agent = A2cAgent::new(4, 2, A2cConfig::default(), 0).expect("agent");
    let mut env = CartPoleEnv::new(CartPoleEnvConfig::default(), 0).expect("env");
    let trajectory = rollout(&mut agent, &mut env);
    let actions = one_hot(trajectory.actions(), 2).expect("actions");

    c.bench_function("a2c_train_step", |b| {
        b.iter(|| {
            agent
                .train(
                    black_box(trajectory.states()),
                    black_box(&actions),
                    black_box(trajectory.rewards()),
                )
                .expect("train")
        });
    });

    c.bench_function("a2c_choose_an_action", |b| {
        let state = [0.01, -0.02, 0.03, 0.0];
        b.iter(|| agent.choose_an_action(black_box(&state)).expect("action"));
    });

    // Print hardware stats
    let sys = System::new_all();
    let cpu_brand = sys.cpus().first().map_or("unknown", |c| c.brand());
    let cores = System::physical_core_count().unwrap_or(sys.cpus().len());
    let mem_mb = sys.total_memory() / (1024 * 1024);
    println!("Hardware: {cpu_brand} with {cores} cores, {mem_mb} MB RAM");
}

criterion_group!(benches, bench_a2c_train_step);
criterion_main!(benches);
