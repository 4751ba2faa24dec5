use ml::tape::Tape;
use ml::*;
use std::collections::HashMap;

type Build<'a> = dyn Fn(&Tensor, &mut Tape, &mut HashMap<usize, Tensor>) -> Tensor + 'a;

/// Compares the tape gradient of `build(param)` against central differences.
fn finite_diff_check(param: &Tensor, build: &Build<'_>, epsilon: f32, tolerance: f32) {
    let mut tensors = HashMap::new();
    let mut tape = Tape::new();
    let loss = build(param, &mut tape, &mut tensors);
    tape.backward(&loss, &mut tensors).unwrap();
    let analytical = tensors.get(&param.id).unwrap().grad.clone().unwrap();

    for i in 0..param.len() {
        let mut plus = param.clone();
        let mut minus = param.clone();
        plus.data[i] += epsilon;
        minus.data[i] -= epsilon;

        let loss_plus = build(&plus, &mut Tape::new(), &mut HashMap::new()).item();
        let loss_minus = build(&minus, &mut Tape::new(), &mut HashMap::new()).item();
        let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);

        let diff = (numerical - analytical[i]).abs();
        assert!(
            diff < tolerance,
            "grad check failed for element {i}: numerical {numerical}, analytical {}",
            analytical[i]
        );
    }
}

#[test]
fn dense_backward_fd() {
    let x = Tensor::from_vec(vec![2, 3], vec![0.9, -0.1, 0.3, -0.4, 0.7, 0.2]);
    let w = Tensor::from_vec(vec![2, 3], vec![0.1, -0.2, 0.3, 0.4, 0.5, -0.6]).with_grad();
    let b = Tensor::from_vec(vec![2], vec![0.05, -0.05]);

    finite_diff_check(
        &w,
        &|w, tape, tensors| {
            let y = w.matmul(&x, tape, tensors).add_broadcast(&b, tape, tensors);
            y.pow(2.0, tape, tensors).reduce_sum(tape, tensors)
        },
        1e-3,
        1e-2,
    );
}

#[test]
fn bias_backward_fd() {
    let x = Tensor::from_vec(vec![2, 2], vec![0.5, -1.0, 1.5, 0.25]);
    let w = Tensor::from_vec(vec![3, 2], vec![0.3, -0.7, 0.2, 0.1, -0.4, 0.6]);
    let b = Tensor::from_vec(vec![3], vec![0.1, 0.2, 0.3]).with_grad();

    finite_diff_check(
        &b,
        &|b, tape, tensors| {
            let y = w.matmul(&x, tape, tensors).add_broadcast(b, tape, tensors);
            y.relu(tape, tensors).reduce_mean(tape, tensors)
        },
        1e-3,
        1e-2,
    );
}

#[test]
fn softmax_log_select_fd() {
    let x = Tensor::from_vec(vec![3, 2], vec![0.2, -0.5, 1.0, 0.3, -0.8, 0.6]);
    let mask = Tensor::from_vec(vec![3, 3], vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    let scale = Tensor::from_vec(vec![3], vec![1.5, -0.5, 0.7]);
    let w = Tensor::from_vec(vec![3, 2], vec![0.4, -0.3, 0.2, 0.8, -0.5, 0.1]).with_grad();

    finite_diff_check(
        &w,
        &|w, tape, tensors| {
            let logits = w.matmul(&x, tape, tensors);
            let probs = logits.softmax(tape, tensors);
            let selected = probs.mul(&mask, tape, tensors).row_sum(tape, tensors);
            let logp = selected.clamp(1e-8, 1.0, tape, tensors).log(tape, tensors);
            logp.mul(&scale, tape, tensors)
                .reduce_sum(tape, tensors)
                .mul_scalar(-1.0, tape, tensors)
        },
        1e-3,
        1e-2,
    );
}

#[test]
fn shared_operand_accumulates() {
    let mut tensors = HashMap::new();
    let mut tape = Tape::new();
    let x = Tensor::from_vec(vec![2], vec![3.0, -2.0]).with_grad();
    let y = x.mul(&x, &mut tape, &mut tensors).reduce_sum(&mut tape, &mut tensors);
    tape.backward(&y, &mut tensors).unwrap();
    let grad = tensors.get(&x.id).unwrap().grad.clone().unwrap();
    assert_eq!(grad, vec![6.0, -4.0]);
}

#[test]
fn missing_operand_is_reported() {
    let mut tensors = HashMap::new();
    let mut tape = Tape::new();
    let x = Tensor::from_vec(vec![2], vec![1.0, 2.0]).with_grad();
    let y = x.reduce_sum(&mut tape, &mut tensors);
    tensors.remove(&x.id);
    let err = tape.backward(&y, &mut tensors).unwrap_err();
    assert!(matches!(err, MlError::MissingTensor(id) if id == x.id));
}
