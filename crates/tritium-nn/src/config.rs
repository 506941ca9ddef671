//! Layer and training configuration.

use std::fmt;

use tritium_core::{confidence, TernaryError};

use crate::activation::ActivationConfig;

/// Construction parameters for a [`Layer`](crate::Layer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerConfig {
    /// Width of the input's innermost axis. Must be non-zero.
    pub input_size: usize,
    /// Number of output units. Must be non-zero.
    pub output_size: usize,
    /// Re-quantization applied to every pre-activation sum.
    pub activation: ActivationConfig,
}

impl LayerConfig {
    /// A config with the default activation.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            output_size,
            activation: ActivationConfig::default(),
        }
    }

    /// Override the activation.
    pub fn with_activation(mut self, activation: ActivationConfig) -> Self {
        self.activation = activation;
        self
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::DimensionMismatch`] if either size is zero.
    /// - [`TernaryError::InvalidParameter`] if the activation is invalid.
    pub fn validate(&self) -> Result<(), TernaryError> {
        if self.input_size == 0 || self.output_size == 0 {
            return Err(TernaryError::mismatch(format!(
                "layer sizes must be non-zero, got {} -> {}",
                self.input_size, self.output_size
            )));
        }
        self.activation.validate()
    }
}

/// Loss used by [`compute_gradients`](crate::compute_gradients).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LossKind {
    /// Mean squared error between `v·c` and the target.
    #[default]
    Mse,
    /// Binary cross-entropy after mapping `v·c` and the target from
    /// `[-1, 1]` to `[0, 1]`. Targets must lie in `[-1, 1]`.
    CrossEntropy,
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mse => "mse",
            Self::CrossEntropy => "cross-entropy",
        })
    }
}

/// Parameters of one confidence update step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientConfig {
    /// Loss function. Default: [`LossKind::Mse`].
    pub loss: LossKind,

    /// Confidence floor whose downward crossing may flip an element's
    /// value. Default: `0.05`. Must be in `[0, 1]`.
    pub flip_floor: f64,

    /// Targets with `|t|` at or below this imply UNKNOWN. Default: `1e-6`.
    /// Must be finite and non-negative.
    pub unknown_band: f64,

    /// Zero an element's gradient when its value flips. Default: `true`.
    pub reset_gradient_on_flip: bool,
}

impl GradientConfig {
    /// Default config with a different loss.
    pub fn with_loss(loss: LossKind) -> Self {
        Self {
            loss,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// [`TernaryError::InvalidParameter`] if `flip_floor` is outside
    /// `[0, 1]` or `unknown_band` is negative or not finite.
    pub fn validate(&self) -> Result<(), TernaryError> {
        if !confidence::is_valid(self.flip_floor) {
            return Err(TernaryError::invalid(format!(
                "flip_floor must be in [0, 1], got {}",
                self.flip_floor
            )));
        }
        if !self.unknown_band.is_finite() || self.unknown_band < 0.0 {
            return Err(TernaryError::invalid(format!(
                "unknown_band must be finite and non-negative, got {}",
                self.unknown_band
            )));
        }
        Ok(())
    }
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            loss: LossKind::Mse,
            flip_floor: 0.05,
            unknown_band: 1e-6,
            reset_gradient_on_flip: true,
        }
    }
}
