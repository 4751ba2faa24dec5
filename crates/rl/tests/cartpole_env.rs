use physics::CartPoleConfig;
use rl::*;

fn loose_limits() -> CartPoleEnvConfig {
    CartPoleEnvConfig {
        physics: CartPoleConfig {
            failure_angle: 1.0e6,
            position_limit: 1.0e6,
            ..CartPoleConfig::default()
        },
        ..CartPoleEnvConfig::default()
    }
}

#[test]
fn stepping_before_reset_is_an_error() -> anyhow::Result<()> {
    let mut env = CartPoleEnv::new(CartPoleEnvConfig::default(), 0)?;
    assert_eq!(env.step(0), Err(EnvError::NeedsReset));
    Ok(())
}

#[test]
fn out_of_range_action_is_an_error() -> anyhow::Result<()> {
    let mut env = CartPoleEnv::new(CartPoleEnvConfig::default(), 0)?;
    env.reset();
    assert_eq!(env.step(2), Err(EnvError::InvalidAction { action: 2, count: 2 }));
    Ok(())
}

#[test]
fn spaces_and_threshold() -> anyhow::Result<()> {
    let env = CartPoleEnv::new(CartPoleEnvConfig::default(), 0)?;
    assert_eq!(env.observation_size(), 4);
    assert_eq!(env.action_count(), 2);
    assert_eq!(env.reward_threshold(), Some(195.0));
    Ok(())
}

#[test]
fn reset_is_seeded_and_small() -> anyhow::Result<()> {
    let mut a = CartPoleEnv::new(CartPoleEnvConfig::default(), 9)?;
    let mut b = CartPoleEnv::new(CartPoleEnvConfig::default(), 9)?;
    for _ in 0..5 {
        let obs = a.reset();
        assert_eq!(obs, b.reset());
        assert_eq!(obs.len(), 4);
        assert!(obs.iter().all(|v| v.abs() <= 0.05));
    }
    Ok(())
}

#[test]
fn constant_push_fails_before_the_time_limit() -> anyhow::Result<()> {
    let mut env = CartPoleEnv::new(CartPoleEnvConfig::default(), 1)?;
    env.reset();
    let mut steps = 0;
    loop {
        let step = env.step(1)?;
        steps += 1;
        assert_eq!(step.reward, 1.0);
        assert_eq!(step.info.elapsed_steps, steps);
        if step.done {
            assert!(!step.info.truncated);
            break;
        }
    }
    assert!(steps < 200, "took {steps} steps");
    assert_eq!(env.step(0), Err(EnvError::NeedsReset));
    Ok(())
}

#[test]
fn time_limit_truncates_at_200_steps() -> anyhow::Result<()> {
    let mut env = CartPoleEnv::new(loose_limits(), 3)?;
    env.reset();
    for t in 1..=200 {
        let step = env.step(t % 2)?;
        assert_eq!(step.done, t == 200, "step {t}");
        assert_eq!(step.info.truncated, t == 200);
    }
    assert_eq!(env.step(0), Err(EnvError::NeedsReset));

    env.reset();
    assert!(!env.step(0)?.done);
    Ok(())
}

#[test]
fn invalid_physics_is_rejected() {
    let config = CartPoleEnvConfig {
        physics: CartPoleConfig { tau: 0.0, ..CartPoleConfig::default() },
        ..CartPoleEnvConfig::default()
    };
    assert!(matches!(CartPoleEnv::new(config, 0), Err(EnvError::Physics(_))));
}
