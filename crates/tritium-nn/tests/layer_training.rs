//! Integration test: layer creation, forward pass and confidence updates.
//!
//! Drives layers with scripted entropy so every initial weight is known,
//! then checks forward sums, shape validation and training behaviour.

use tritium_core::{ErrorKind, Trit};
use tritium_nn::{
    compute_gradients, loss, ActivationConfig, ChaChaEntropy, GradientConfig, Layer, LayerConfig,
    LossKind,
};
use tritium_tensor::Tensor;
use tritium_test_utils::{
    assert_close, scratch_pool, tensor_from, trits, ConstantEntropy, ScriptedEntropy,
};

/// Draws that decode to TRUE with confidence 1 / UNKNOWN with
/// confidence 1 / FALSE with confidence 1.
const TRUE_FULL: f64 = 0.999_999_999;
const UNKNOWN_FULL: f64 = 0.5;
const FALSE_FULL: f64 = 0.0;

#[test]
fn scripted_initialisation_is_exact() {
    let pool = scratch_pool();
    let mut entropy = ScriptedEntropy::new(vec![FALSE_FULL, UNKNOWN_FULL, TRUE_FULL]);
    let layer = Layer::new(&pool, 3, 2, &mut entropy).unwrap();
    // 6 weights then 2 biases.
    assert_eq!(entropy.consumed(), 8);
    assert_eq!(layer.weights().values().collect::<Vec<_>>(), trits("F?T F?T"));
    assert_eq!(layer.bias().values().collect::<Vec<_>>(), trits("F?"));
    assert_close(layer.weights().confidences(), &[1.0; 6], 1e-6);
}

#[test]
fn forward_with_known_weights() {
    let pool = scratch_pool();
    let layer = Layer::new(&pool, 4, 1, &mut ScriptedEntropy::new(vec![TRUE_FULL])).unwrap();
    let x = tensor_from(&pool, &[2, 4], &trits("TTTT FFFF"), &[0.1; 8]);
    let y = layer.forward(&x).unwrap();
    assert_eq!(y.dims(), &[2, 1]);
    // Row 0: 4·0.1 + 1 = 1.4 → TRUE, 0.5 + 0.5·min(0.9, 1)
    // Row 1: -0.4 + 1 = 0.6 → TRUE, 0.5 + 0.5·0.1
    assert_eq!(y.values().collect::<Vec<_>>(), trits("TT"));
    assert_close(y.confidences(), &[0.95, 0.55], 1e-6);
}

#[test]
fn forward_rejects_wrong_width_and_changes_nothing() {
    let pool = scratch_pool();
    let layer = Layer::new(&pool, 3, 2, &mut ChaChaEntropy::new(5)).unwrap();
    let weights_before = layer.weights().encoded_values().to_vec();
    let wconf_before: Vec<u64> = layer.weights().confidences().iter().map(|c| c.to_bits()).collect();
    let bconf_before: Vec<u64> = layer.bias().confidences().iter().map(|c| c.to_bits()).collect();
    let in_use = pool.bytes_in_use();

    let x = Tensor::new(&pool, &[2, 4]).unwrap();
    let err = layer.forward(&x).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);

    assert_eq!(layer.weights().encoded_values(), weights_before.as_slice());
    let wconf_after: Vec<u64> = layer.weights().confidences().iter().map(|c| c.to_bits()).collect();
    let bconf_after: Vec<u64> = layer.bias().confidences().iter().map(|c| c.to_bits()).collect();
    assert_eq!(wconf_after, wconf_before);
    assert_eq!(bconf_after, bconf_before);
    drop(x);
    assert_eq!(pool.bytes_in_use(), in_use);
}

#[test]
fn forward_output_comes_from_layer_pool() {
    let layer_pool = scratch_pool();
    let input_pool = scratch_pool();
    let layer = Layer::new(&layer_pool, 2, 2, &mut ConstantEntropy(0.9)).unwrap();
    let x = Tensor::new(&input_pool, &[2]).unwrap();
    let y = layer.forward(&x).unwrap();
    assert_eq!(y.pool().id(), layer_pool.id());
}

#[test]
fn custom_activation_is_used() {
    let pool = scratch_pool();
    let config = LayerConfig::new(1, 1).with_activation(ActivationConfig::symmetric(5.0));
    let layer = Layer::with_config(&pool, config, &mut ConstantEntropy(TRUE_FULL)).unwrap();
    let x = tensor_from(&pool, &[1], &trits("T"), &[1.0]);
    // s = 1 + 1 = 2, inside (-5, 5).
    let y = layer.forward(&x).unwrap();
    assert_eq!(y.value(0), Trit::Unknown);
    assert_close(y.confidences(), &[0.6], 1e-6);
}

#[test]
fn zero_learning_rate_keeps_confidences() {
    let pool = scratch_pool();
    let layer = Layer::new(&pool, 5, 3, &mut ChaChaEntropy::new(9)).unwrap();
    let x = Tensor::new(&pool, &[4, 5]).unwrap();
    let mut y = layer.forward(&x).unwrap();
    let before: Vec<u64> = y.confidences().iter().map(|c| c.to_bits()).collect();
    let target = vec![0.5; y.len()];
    compute_gradients(&mut y, &target, 0.0, &GradientConfig::default()).unwrap();
    let after: Vec<u64> = y.confidences().iter().map(|c| c.to_bits()).collect();
    assert_eq!(before, after);
}

#[test]
fn training_reduces_mse() {
    let pool = scratch_pool();
    let mut t = tensor_from(&pool, &[4], &trits("TTFF"), &[0.2, 0.9, 0.3, 0.8]);
    let target = [1.0, 1.0, -1.0, -1.0];
    let mut previous = loss(&t, &target, LossKind::Mse).unwrap();
    for _ in 0..20 {
        let step = compute_gradients(&mut t, &target, 0.5, &GradientConfig::default()).unwrap();
        assert!((step.loss - previous).abs() < 1e-12);
        previous = loss(&t, &target, LossKind::Mse).unwrap();
        assert!(previous <= step.loss + 1e-12);
    }
    assert!(previous < 1e-3, "loss did not converge: {previous}");
}

#[test]
fn misaligned_elements_flip_toward_target() {
    let pool = scratch_pool();
    let mut t = tensor_from(&pool, &[3], &trits("FT?"), &[0.3, 0.3, 0.3]);
    let target = [1.0, -1.0, 1.0];
    let mut flips = 0;
    for _ in 0..10 {
        flips += compute_gradients(&mut t, &target, 1.0, &GradientConfig::default())
            .unwrap()
            .flips;
    }
    assert_eq!(flips, 2);
    assert_eq!(t.values().collect::<Vec<_>>(), trits("TF?"));
}

#[test]
fn gradient_target_length_mismatch() {
    let pool = scratch_pool();
    let mut t = Tensor::new(&pool, &[2, 2]).unwrap();
    let err = compute_gradients(&mut t, &[1.0; 3], 0.1, &GradientConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn layer_creation_failure_is_recoverable() {
    let pool = tritium_arena::Pool::with_capacity(1024).unwrap();
    let err = Layer::new(&pool, 64, 64, &mut ConstantEntropy(0.5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);
    assert_eq!(pool.bytes_in_use(), 0);
    assert!(Layer::new(&pool, 2, 2, &mut ConstantEntropy(0.5)).is_ok());
}
