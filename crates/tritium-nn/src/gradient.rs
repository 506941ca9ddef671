//! Confidence-channel gradients and the update / re-quantization step.
//!
//! Each element predicts `p = v·c`. The loss gradient is taken with
//! respect to the confidence `c` only; values are discrete and change
//! solely through re-quantization:
//!
//! ```text
//!   c_old ≥ floor > c_new   and   signum(target) ≠ v   ⇒   v ← signum(target)
//! ```
//!
//! A transition needs the confidence to *cross* the floor during this
//! step, so an element already below it never oscillates.
//!
//! UNKNOWN elements predict `p = 0` whatever their confidence, so their
//! gradient is zero and their confidence never moves. UNKNOWN is therefore
//! absorbing: once re-quantized to UNKNOWN an element stays there until
//! its value is set directly.

use tracing::debug;
use tritium_core::{confidence, TernaryError, Trit};
use tritium_tensor::Tensor;

use crate::config::{GradientConfig, LossKind};

/// Clamp applied to cross-entropy probabilities.
pub const PROBABILITY_EPSILON: f64 = 1e-7;

/// Outcome of one [`compute_gradients`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStep {
    /// Loss before the update.
    pub loss: f64,
    /// Elements whose value changed.
    pub flips: usize,
    /// Largest `|∂L/∂c|` over the tensor.
    pub max_abs_gradient: f64,
}

/// Evaluate the loss of `tensor` against `target` without modifying it.
///
/// # Errors
///
/// As for [`compute_gradients`], minus the learning-rate check.
pub fn loss(tensor: &Tensor<'_>, target: &[f64], kind: LossKind) -> Result<f64, TernaryError> {
    validate_target(tensor, target, kind)?;
    let n = tensor.len() as f64;
    let total: f64 = tensor
        .values()
        .zip(tensor.confidences())
        .zip(target)
        .map(|((v, &c), &t)| element_loss(kind, v.as_f64() * c, t))
        .sum();
    Ok(total / n)
}

/// Compute `∂L/∂c` for every element, store it in the gradient channel
/// and apply `c ← clamp(c - learning_rate·∂L/∂c, 0, 1)`, re-quantizing
/// values whose confidence crosses `config.flip_floor`.
///
/// With `learning_rate == 0` confidences and values are left bit-for-bit
/// unchanged (the gradient channel is still written).
///
/// # Errors
///
/// Nothing is written on error.
///
/// - [`TernaryError::DimensionMismatch`] if `target.len() != tensor.len()`.
/// - [`TernaryError::InvalidParameter`] if `learning_rate` is negative or
///   not finite, a target is not finite, a cross-entropy target is outside
///   `[-1, 1]`, or `config` fails validation.
/// - [`TernaryError::Overflow`] if a gradient or the loss is not finite,
///   which finite but huge MSE targets can cause.
pub fn compute_gradients(
    tensor: &mut Tensor<'_>,
    target: &[f64],
    learning_rate: f64,
    config: &GradientConfig,
) -> Result<GradientStep, TernaryError> {
    config.validate()?;
    if !learning_rate.is_finite() || learning_rate < 0.0 {
        return Err(TernaryError::invalid(format!(
            "learning rate must be finite and non-negative, got {learning_rate}"
        )));
    }
    validate_target(tensor, target, config.loss)?;

    let n = tensor.len() as f64;
    let mut step = GradientStep {
        loss: 0.0,
        flips: 0,
        max_abs_gradient: 0.0,
    };
    let elements = tensor.values().zip(tensor.confidences()).zip(target);
    for (i, ((value, &c), &t)) in elements.enumerate() {
        let v = value.as_f64();
        let g = element_gradient(config.loss, v * c, v, t, n);
        if !g.is_finite() {
            return Err(TernaryError::Overflow {
                reason: format!("gradient at index {i} overflows for target {t}"),
            });
        }
        step.loss += element_loss(config.loss, v * c, t);
        step.max_abs_gradient = step.max_abs_gradient.max(g.abs());
    }
    step.loss /= n;
    if !step.loss.is_finite() {
        return Err(TernaryError::Overflow {
            reason: format!("{} loss overflows over {} elements", config.loss, target.len()),
        });
    }

    let mut parts = tensor.parts_mut();
    for (i, &t) in target.iter().enumerate() {
        let value = parts.values.get(i);
        let v = value.as_f64();
        let c_old = parts.confidence.get(i);
        let g = element_gradient(config.loss, v * c_old, v, t, n);
        parts.gradient[i] = g;
        if learning_rate == 0.0 {
            continue;
        }

        let c_new = confidence::clamp_unit(c_old - learning_rate * g);
        parts.confidence.set_clamped(i, c_new);

        if c_old >= config.flip_floor && c_new < config.flip_floor {
            let implied = implied_state(t, config.unknown_band);
            if implied != value {
                parts.values.set(i, implied);
                step.flips += 1;
                if config.reset_gradient_on_flip {
                    parts.gradient[i] = 0.0;
                }
            }
        }
    }
    if step.flips > 0 {
        debug!(
            "{} loss {:.6}: re-quantized {} of {} elements",
            config.loss,
            step.loss,
            step.flips,
            target.len()
        );
    }
    Ok(step)
}

fn validate_target(tensor: &Tensor<'_>, target: &[f64], kind: LossKind) -> Result<(), TernaryError> {
    if target.len() != tensor.len() {
        return Err(TernaryError::mismatch(format!(
            "target has {} elements, tensor {} has {}",
            target.len(),
            tensor.shape(),
            tensor.len()
        )));
    }
    if let Some(i) = target.iter().position(|t| !t.is_finite()) {
        return Err(TernaryError::invalid(format!(
            "target {} at index {i} is not finite",
            target[i]
        )));
    }
    if kind == LossKind::CrossEntropy {
        if let Some(i) = target.iter().position(|t| !(-1.0..=1.0).contains(t)) {
            return Err(TernaryError::invalid(format!(
                "cross-entropy target {} at index {i} outside [-1, 1]",
                target[i]
            )));
        }
    }
    Ok(())
}

fn implied_state(target: f64, unknown_band: f64) -> Trit {
    if target.abs() <= unknown_band {
        Trit::Unknown
    } else if target > 0.0 {
        Trit::True
    } else {
        Trit::False
    }
}

fn probability(x: f64) -> f64 {
    ((x + 1.0) / 2.0).clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

fn element_loss(kind: LossKind, p: f64, t: f64) -> f64 {
    match kind {
        LossKind::Mse => (p - t) * (p - t),
        LossKind::CrossEntropy => {
            let q = probability(p);
            let y = (t + 1.0) / 2.0;
            -(y * q.ln() + (1.0 - y) * (1.0 - q).ln())
        }
    }
}

fn element_gradient(kind: LossKind, p: f64, v: f64, t: f64, n: f64) -> f64 {
    match kind {
        LossKind::Mse => 2.0 / n * (p - t) * v,
        LossKind::CrossEntropy => {
            let q = probability(p);
            let y = (t + 1.0) / 2.0;
            (q - y) / (q * (1.0 - q)) * (v / 2.0) / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tritium_arena::Pool;
    use tritium_core::ErrorKind;
    use tritium_core::Trit::{False as F, True as T, Unknown as U};

    fn tensor<'p>(pool: &'p Pool, v: &[Trit], c: &[f64]) -> Tensor<'p> {
        let mut t = Tensor::new(pool, &[v.len()]).unwrap();
        t.fill(v, c).unwrap();
        t
    }

    #[test]
    fn mse_gradient_matches_closed_form() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T, F], &[0.5, 0.5]);
        let step = compute_gradients(&mut t, &[1.0, 1.0], 0.0, &GradientConfig::default()).unwrap();
        // p = [0.5, -0.5]; L = (0.25 + 2.25) / 2
        assert!((step.loss - 1.25).abs() < 1e-12);
        // dL/dc = (2/2)(p - t)v = [-0.5, 1.5]
        assert!((t.gradient(0) + 0.5).abs() < 1e-12);
        assert!((t.gradient(1) - 1.5).abs() < 1e-12);
        assert!((step.max_abs_gradient - 1.5).abs() < 1e-12);
        assert_eq!(t.confidences(), &[0.5, 0.5]);
    }

    #[test]
    fn update_moves_confidence_toward_target() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T, F], &[0.5, 0.5]);
        compute_gradients(&mut t, &[1.0, 1.0], 0.1, &GradientConfig::default()).unwrap();
        assert!((t.confidence(0) - 0.55).abs() < 1e-12);
        assert!((t.confidence(1) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn crossing_the_floor_flips_to_target_sign() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[F], &[0.1]);
        // dL/dc = 2(-0.1 - 1)(-1) = 2.2; c_new = clamp(0.1 - 2.2) = 0
        let step = compute_gradients(&mut t, &[1.0], 1.0, &GradientConfig::default()).unwrap();
        assert_eq!(step.flips, 1);
        assert_eq!(t.value(0), T);
        assert_eq!(t.confidence(0), 0.0);
        assert_eq!(t.gradient(0), 0.0);
    }

    #[test]
    fn flip_can_keep_gradient() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[F], &[0.1]);
        let cfg = GradientConfig {
            reset_gradient_on_flip: false,
            ..Default::default()
        };
        compute_gradients(&mut t, &[1.0], 1.0, &cfg).unwrap();
        assert_eq!(t.value(0), T);
        assert!((t.gradient(0) - 2.2).abs() < 1e-12);
    }

    #[test]
    fn below_floor_does_not_flip_again() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[F], &[0.01]);
        let step = compute_gradients(&mut t, &[1.0], 1.0, &GradientConfig::default()).unwrap();
        assert_eq!(step.flips, 0);
        assert_eq!(t.value(0), F);
    }

    #[test]
    fn near_zero_target_implies_unknown() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T], &[0.1]);
        let step = compute_gradients(&mut t, &[0.0], 1.0, &GradientConfig::default()).unwrap();
        assert_eq!(step.flips, 1);
        assert_eq!(t.value(0), U);
    }

    #[test]
    fn unknown_elements_have_zero_gradient() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[U, U], &[0.7, 0.2]);
        compute_gradients(&mut t, &[1.0, -1.0], 0.5, &GradientConfig::default()).unwrap();
        assert_eq!(t.gradients(), &[0.0, 0.0]);
        assert_eq!(t.confidences(), &[0.7, 0.2]);
    }

    #[test]
    fn unknown_is_absorbing() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T], &[0.1]);
        compute_gradients(&mut t, &[0.0], 1.0, &GradientConfig::default()).unwrap();
        assert_eq!(t.value(0), U);
        for kind in [LossKind::Mse, LossKind::CrossEntropy] {
            for _ in 0..3 {
                let step =
                    compute_gradients(&mut t, &[1.0], 5.0, &GradientConfig::with_loss(kind)).unwrap();
                assert_eq!(step.flips, 0);
            }
        }
        assert_eq!(t.value(0), U);
        assert_eq!(t.gradient(0), 0.0);
    }

    #[test]
    fn cross_entropy_gradient_sign() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T, T], &[0.2, 0.9]);
        let cfg = GradientConfig::with_loss(LossKind::CrossEntropy);
        let step = compute_gradients(&mut t, &[1.0, -1.0], 0.0, &cfg).unwrap();
        assert!(t.gradient(0) < 0.0, "raising c moves p toward +1");
        assert!(t.gradient(1) > 0.0, "lowering c moves p toward -1");
        assert!(step.loss > 0.0);
        let l = loss(&t, &[1.0, -1.0], LossKind::CrossEntropy).unwrap();
        assert!((l - step.loss).abs() < 1e-12);
    }

    #[test]
    fn cross_entropy_rejects_targets_outside_unit_range() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T], &[0.5]);
        let cfg = GradientConfig::with_loss(LossKind::CrossEntropy);
        let err = compute_gradients(&mut t, &[2.0], 0.1, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(compute_gradients(&mut t, &[2.0], 0.1, &GradientConfig::default()).is_ok());
    }

    #[test]
    fn invalid_inputs_write_nothing() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T, F], &[0.5, 0.5]);
        let cfg = GradientConfig::default();
        let cases: [(&[f64], f64, ErrorKind); 4] = [
            (&[1.0], 0.1, ErrorKind::DimensionMismatch),
            (&[1.0, 1.0], -0.1, ErrorKind::InvalidParameter),
            (&[1.0, 1.0], f64::NAN, ErrorKind::InvalidParameter),
            (&[1.0, f64::INFINITY], 0.1, ErrorKind::InvalidParameter),
        ];
        for (target, lr, kind) in cases {
            let err = compute_gradients(&mut t, target, lr, &cfg).unwrap_err();
            assert_eq!(err.kind(), kind);
        }
        assert_eq!(t.confidences(), &[0.5, 0.5]);
        assert_eq!(t.gradients(), &[0.0, 0.0]);
    }

    #[test]
    fn overflowing_gradient_is_rejected_before_any_write() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        // 2·(0.5 - 1e308) overflows to -inf.
        let mut t = tensor(&pool, &[T], &[0.5]);
        for lr in [0.0, 0.1] {
            let err = compute_gradients(&mut t, &[1e308], lr, &GradientConfig::default())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Overflow);
        }
        assert_eq!(t.confidence(0), 0.5);
        assert_eq!(t.gradient(0), 0.0);
        assert_eq!(t.value(0), T);
    }

    #[test]
    fn overflowing_loss_is_rejected() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        let mut t = tensor(&pool, &[T, F], &[0.5, 0.04]);
        let err = compute_gradients(&mut t, &[1.0, 1e200], 0.1, &GradientConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(t.confidences(), &[0.5, 0.04]);
        assert_eq!(t.gradients(), &[0.0, 0.0]);
        assert_eq!(t.encoded_values(), &[1, -1]);
    }

    #[test]
    fn zero_learning_rate_writes_gradient_only() {
        let pool = Pool::with_capacity(1 << 14).unwrap();
        // c = 0.05 sits on the floor; any update would cross it.
        let mut t = tensor(&pool, &[F], &[0.05]);
        let step = compute_gradients(&mut t, &[1e100], 0.0, &GradientConfig::default()).unwrap();
        assert_eq!(step.flips, 0);
        assert_eq!(t.value(0), F);
        assert_eq!(t.confidence(0), 0.05);
        assert!(t.gradient(0) > 1e99);
    }

    proptest! {
        #[test]
        fn zero_learning_rate_is_identity_on_confidence(
            data in proptest::collection::vec((-1i8..=1, 0.0f64..=1.0, -3.0f64..3.0), 1..32),
            ce in any::<bool>(),
        ) {
            let pool = Pool::with_capacity(1 << 16).unwrap();
            let values: Vec<Trit> = data.iter().map(|d| Trit::from_signum(d.0)).collect();
            let confs: Vec<f64> = data.iter().map(|d| d.1).collect();
            let kind = if ce { LossKind::CrossEntropy } else { LossKind::Mse };
            let target: Vec<f64> = data
                .iter()
                .map(|d| if ce { d.2 / 3.0 } else { d.2 })
                .collect();
            let mut t = tensor(&pool, &values, &confs);
            let step = compute_gradients(&mut t, &target, 0.0, &GradientConfig::with_loss(kind)).unwrap();
            prop_assert_eq!(step.flips, 0);
            prop_assert_eq!(t.confidences(), confs.as_slice());
            let expected: Vec<i8> = values.iter().map(|v| v.as_i8()).collect();
            prop_assert_eq!(t.encoded_values(), expected.as_slice());
        }

        #[test]
        fn confidences_stay_in_unit_interval(
            data in proptest::collection::vec((-1i8..=1, 0.0f64..=1.0, -1.0f64..=1.0), 1..32),
            lr in 0.0f64..50.0,
        ) {
            let pool = Pool::with_capacity(1 << 16).unwrap();
            let values: Vec<Trit> = data.iter().map(|d| Trit::from_signum(d.0)).collect();
            let confs: Vec<f64> = data.iter().map(|d| d.1).collect();
            let target: Vec<f64> = data.iter().map(|d| d.2).collect();
            let mut t = tensor(&pool, &values, &confs);
            for kind in [LossKind::Mse, LossKind::CrossEntropy] {
                compute_gradients(&mut t, &target, lr, &GradientConfig::with_loss(kind)).unwrap();
                prop_assert!(t.confidences().iter().all(|c| (0.0..=1.0).contains(c)));
                prop_assert!(t.gradients().iter().all(|g| g.is_finite()));
            }
        }
    }
}
