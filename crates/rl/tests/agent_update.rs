use approx::{assert_abs_diff_eq, assert_relative_eq};
use ml::{Adam, Tensor};
use rl::advantage::{discounted_returns, normalize};
use rl::*;

fn trajectory(len: usize) -> (Vec<Vec<f32>>, Vec<Vec<f32>>, Vec<f32>) {
    let states = (0..len)
        .map(|t| {
            let t = t as f32;
            vec![0.01 * t, -0.02 * t, 0.03 * (t * 0.5).sin(), 0.1 * (t * 0.3).cos()]
        })
        .collect();
    let actions = one_hot(&(0..len).map(|t| t % 2).collect::<Vec<_>>(), 2).unwrap();
    (states, actions, vec![1.0; len])
}

fn small_config() -> A2cConfig {
    A2cConfig { hidden_layers: vec![16], learning_rate: 1e-3, ..A2cConfig::default() }
}

#[test]
fn one_update_lowers_the_loss_on_the_same_batch() -> anyhow::Result<()> {
    let mut agent = A2cAgent::new(4, 2, small_config(), 3)?;
    let (states, actions, rewards) = trajectory(20);

    let batch = agent.prepare_batch(&states, &actions, &rewards)?;
    let before = agent.model().evaluate_loss(&batch);
    let stats = agent.train(&states, &actions, &rewards)?;
    let after = agent.model().evaluate_loss(&batch);

    assert_abs_diff_eq!(stats.loss.total, before.total, epsilon = 1e-4);
    assert!(after.total < before.total, "before {before:?} after {after:?}");
    assert_eq!(stats.steps, 20);
    Ok(())
}

#[test]
fn fit_on_a_fixed_batch_keeps_improving() -> anyhow::Result<()> {
    let agent = A2cAgent::new(4, 2, small_config(), 5)?;
    let (states, actions, rewards) = trajectory(12);
    let batch = agent.prepare_batch(&states, &actions, &rewards)?;

    let mut rng = fastrand::Rng::with_seed(5);
    let mut model = ActorCritic::new(4, 2, &[16], 0.01, &mut rng)?;
    let mut adam = Adam::new(&model.params(), 1e-3);
    let mut previous = model.evaluate_loss(&batch).total;
    for _ in 0..5 {
        model.fit(&batch, &mut adam)?;
        let current = model.evaluate_loss(&batch).total;
        assert!(current < previous, "loss went from {previous} to {current}");
        previous = current;
    }
    Ok(())
}

#[test]
fn prepared_advantages_are_normalised() -> anyhow::Result<()> {
    let agent = A2cAgent::new(4, 2, small_config(), 1)?;
    let (states, actions, rewards) = trajectory(30);
    let batch = agent.prepare_batch(&states, &actions, &rewards)?;

    let adv = batch.advantages.data();
    let n = adv.len() as f32;
    let mean = adv.iter().sum::<f32>() / n;
    let std = (adv.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n).sqrt();
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(std, 1.0, epsilon = 1e-4);

    let expected = discounted_returns(&rewards, 0.99);
    for (g, e) in batch.returns.data().iter().zip(&expected) {
        assert_abs_diff_eq!(*g, *e, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn normalise_scales_arbitrary_values() {
    let out = normalize(&[3.0, -1.0, 10.0, 4.5, 0.0], 1e-8);
    let mean = out.iter().sum::<f32>() / 5.0;
    let std = (out.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / 5.0).sqrt();
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(std, 1.0, epsilon = 1e-5);
}

#[test]
fn single_step_episode_trains_only_the_critic() -> anyhow::Result<()> {
    let mut agent = A2cAgent::new(4, 2, small_config(), 2)?;
    let (states, actions, rewards) = trajectory(1);
    let stats = agent.train(&states, &actions, &rewards)?;
    assert_abs_diff_eq!(stats.loss.policy, 0.0);
    assert!(stats.loss.value > 0.0);
    assert_abs_diff_eq!(stats.mean_return, 1.0);
    Ok(())
}

#[test]
fn train_rejects_malformed_input() -> anyhow::Result<()> {
    let mut agent = A2cAgent::new(4, 2, small_config(), 0)?;
    let (states, actions, rewards) = trajectory(3);

    assert!(matches!(
        agent.train(&states, &actions[..2], &rewards),
        Err(A2cError::LengthMismatch { states: 3, actions: 2, rewards: 3 })
    ));
    assert!(matches!(agent.train(&[], &[], &[]), Err(A2cError::EmptyTrajectory)));

    let narrow = vec![vec![0.0; 3]; 3];
    assert!(matches!(
        agent.train(&narrow, &actions, &rewards),
        Err(A2cError::StateSize { expected: 4, got: 3 })
    ));

    let wide_actions = vec![vec![1.0, 0.0, 0.0]; 3];
    assert!(matches!(
        agent.train(&states, &wide_actions, &rewards),
        Err(A2cError::ActionEncoding { expected: 2, got: 3 })
    ));
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    let config = A2cConfig { gamma: 1.5, ..A2cConfig::default() };
    assert!(matches!(A2cAgent::new(4, 2, config, 0), Err(A2cError::InvalidConfig(_))));
    assert!(matches!(
        A2cAgent::new(0, 2, A2cConfig::default(), 0),
        Err(A2cError::InvalidConfig(_))
    ));
}

/// A batch with spread-out states and hand-picked advantages and returns.
fn hand_batch() -> (Batch, Vec<Vec<f32>>, Vec<usize>) {
    let states: Vec<Vec<f32>> = (0..8)
        .map(|t| {
            let t = t as f32;
            vec![2.0 * (0.7 * t).sin(), 2.0 * (0.3 * t).cos(), 0.25 * t, -0.15 * t]
        })
        .collect();
    let actions = vec![0, 1, 1, 0, 1, 0, 0, 1];
    let advantages = vec![1.0, 0.5, 2.0, 0.25, 1.5, 0.75, 1.25, 0.1];
    let returns = vec![3.0, 2.5, 2.0, 1.5, 1.0, 0.5, -0.5, 4.0];
    let batch = Batch {
        states: Tensor::from_vec(vec![8, 4], states.concat()),
        actions: Tensor::from_vec(vec![8, 2], one_hot(&actions, 2).unwrap().concat()),
        advantages: Tensor::from_vec(vec![8], advantages),
        returns: Tensor::from_vec(vec![8], returns),
    };
    (batch, states, actions)
}

#[test]
fn loss_terms_match_their_definitions() -> anyhow::Result<()> {
    let agent = A2cAgent::new(4, 2, small_config(), 13)?;
    let model = agent.model();
    let (batch, states, actions) = hand_batch();
    let loss = model.evaluate_loss(&batch);

    let values = model.values(&batch.states);
    let adv = batch.advantages.data();
    let returns = batch.returns.data();
    let n = states.len() as f32;
    let (mut policy, mut value, mut entropy) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (t, state) in states.iter().enumerate() {
        let probs = model.policy(state)?;
        policy -= probs[actions[t]].clamp(1e-8, 1.0).ln() * adv[t];
        value += (values[t] - returns[t]).powi(2) / n;
        entropy -= probs.iter().map(|p| p * p.clamp(1e-8, 1.0).ln()).sum::<f32>() / n;
    }

    assert!(entropy > 0.0);
    assert_relative_eq!(loss.policy, policy, max_relative = 1e-4);
    assert_relative_eq!(loss.value, value, max_relative = 1e-4);
    assert_relative_eq!(loss.entropy, entropy, max_relative = 1e-4);
    assert_relative_eq!(loss.total, policy + value - 0.01 * entropy, max_relative = 1e-4);
    assert_abs_diff_eq!(
        loss.total - loss.policy - loss.value,
        -0.01 * loss.entropy,
        epsilon = 5e-5
    );
    Ok(())
}

#[test]
fn gradients_agree_with_finite_differences() -> anyhow::Result<()> {
    let agent = A2cAgent::new(4, 2, small_config(), 21)?;
    let model = agent.model().clone();
    let (batch, _, _) = hand_batch();
    let (loss, grads) = model.gradients(&batch)?;
    assert_eq!(grads.len(), model.params().len());

    // First trunk weight matrix, at its steepest entry.
    let trunk = &grads[0];
    let k = (0..trunk.len())
        .max_by(|&i, &j| trunk[i].abs().total_cmp(&trunk[j].abs()))
        .unwrap();
    let h = 1e-3;
    let mut plus = model.clone();
    plus.params_mut()[0].data[k] += h;
    let mut minus = model.clone();
    minus.params_mut()[0].data[k] -= h;
    let numeric = (plus.evaluate_loss(&batch).total - minus.evaluate_loss(&batch).total) / (2.0 * h);
    assert_relative_eq!(trunk[k], numeric, epsilon = 2e-3, max_relative = 3e-2);

    // The value-head bias has the closed form 2 * mean(v - G).
    let values = model.values(&batch.states);
    let expected = values
        .iter()
        .zip(batch.returns.data())
        .map(|(v, g)| 2.0 * (v - g))
        .sum::<f32>()
        / values.len() as f32;
    let bias = grads.last().unwrap();
    assert_eq!(bias.len(), 1);
    assert_relative_eq!(bias[0], expected, epsilon = 1e-5, max_relative = 1e-4);

    // Taking gradients leaves the model as it was.
    assert_eq!(model.evaluate_loss(&batch), loss);
    Ok(())
}
