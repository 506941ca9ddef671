//! Re-quantization of continuous pre-activations into the ternary domain.

use tritium_core::{confidence, TernaryError, Trit};

/// Thresholds and confidence curve for mapping a pre-activation sum `s`
/// to a `(Trit, confidence)` pair.
///
/// ```text
///            FALSE          UNKNOWN           TRUE
///   ─────────────────|──────────────────|─────────────────▶ s
///                 theta_low          theta_high
/// ```
///
/// Past a threshold the confidence starts at `edge_confidence` and rises
/// linearly to `1.0` over `margin`. Between the thresholds it peaks at
/// `1.0` at the midpoint and falls to `0.0` at either threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActivationConfig {
    /// Sums at or below this are FALSE. Default: `-0.5`.
    pub theta_low: f64,
    /// Sums at or above this are TRUE. Default: `0.5`.
    pub theta_high: f64,
    /// Distance past a threshold at which confidence saturates. Default: `1.0`.
    pub margin: f64,
    /// Confidence exactly at a threshold. Default: `0.5`.
    pub edge_confidence: f64,
}

impl ActivationConfig {
    /// Thresholds at `±theta` with default margin and edge confidence.
    pub fn symmetric(theta: f64) -> Self {
        Self {
            theta_low: -theta,
            theta_high: theta,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// [`TernaryError::InvalidParameter`] unless the thresholds are finite
    /// with `theta_low < theta_high`, `margin` is finite and positive, and
    /// `edge_confidence` is in `[0, 1]`.
    pub fn validate(&self) -> Result<(), TernaryError> {
        if !self.theta_low.is_finite() || !self.theta_high.is_finite() {
            return Err(TernaryError::invalid(format!(
                "activation thresholds must be finite, got [{}, {}]",
                self.theta_low, self.theta_high
            )));
        }
        if self.theta_low >= self.theta_high {
            return Err(TernaryError::invalid(format!(
                "theta_low ({}) must be below theta_high ({})",
                self.theta_low, self.theta_high
            )));
        }
        if !self.margin.is_finite() || self.margin <= 0.0 {
            return Err(TernaryError::invalid(format!(
                "margin must be finite and positive, got {}",
                self.margin
            )));
        }
        if !confidence::is_valid(self.edge_confidence) {
            return Err(TernaryError::invalid(format!(
                "edge_confidence must be in [0, 1], got {}",
                self.edge_confidence
            )));
        }
        Ok(())
    }

    /// Map a pre-activation sum to a trit and its confidence.
    pub fn apply(&self, s: f64) -> (Trit, f64) {
        let edge = self.edge_confidence;
        if s >= self.theta_high {
            let ramp = ((s - self.theta_high) / self.margin).min(1.0);
            (Trit::True, confidence::clamp_unit(edge + (1.0 - edge) * ramp))
        } else if s <= self.theta_low {
            let ramp = ((self.theta_low - s) / self.margin).min(1.0);
            (Trit::False, confidence::clamp_unit(edge + (1.0 - edge) * ramp))
        } else {
            let half_width = (self.theta_high - self.theta_low) / 2.0;
            let distance = (s - self.theta_low).min(self.theta_high - s);
            (Trit::Unknown, confidence::clamp_unit(distance / half_width))
        }
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            theta_low: -0.5,
            theta_high: 0.5,
            margin: 1.0,
            edge_confidence: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn default_bands() {
        let a = ActivationConfig::default();
        let (t, c) = a.apply(0.5);
        assert_eq!(t, Trit::True);
        assert!(close(c, 0.5));
        let (t, c) = a.apply(1.0);
        assert_eq!(t, Trit::True);
        assert!(close(c, 0.75));
        assert_eq!(a.apply(10.0), (Trit::True, 1.0));
        let (t, c) = a.apply(-1.5);
        assert_eq!(t, Trit::False);
        assert!(close(c, 1.0));
        assert_eq!(a.apply(0.0), (Trit::Unknown, 1.0));
        let (t, c) = a.apply(0.25);
        assert_eq!(t, Trit::Unknown);
        assert!(close(c, 0.5));
    }

    #[test]
    fn nan_sum_is_unknown_with_zero_confidence() {
        assert_eq!(ActivationConfig::default().apply(f64::NAN), (Trit::Unknown, 0.0));
    }

    #[test]
    fn symmetric_builds_mirrored_thresholds() {
        let a = ActivationConfig::symmetric(2.0);
        assert_eq!(a.theta_low, -2.0);
        assert_eq!(a.theta_high, 2.0);
        assert!(a.validate().is_ok());
        assert!(ActivationConfig::symmetric(0.0).validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let bad = [
            ActivationConfig {
                margin: 0.0,
                ..Default::default()
            },
            ActivationConfig {
                edge_confidence: 1.5,
                ..Default::default()
            },
            ActivationConfig {
                theta_high: f64::INFINITY,
                ..Default::default()
            },
            ActivationConfig {
                theta_low: 1.0,
                theta_high: 0.0,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    proptest! {
        #[test]
        fn confidence_always_in_unit_interval(s in -100.0f64..100.0) {
            let (_, c) = ActivationConfig::default().apply(s);
            prop_assert!((0.0..=1.0).contains(&c));
        }

        #[test]
        fn state_is_monotone_in_sum(a in -5.0f64..5.0, b in -5.0f64..5.0) {
            let cfg = ActivationConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(cfg.apply(lo).0 <= cfg.apply(hi).0);
        }
    }
}
