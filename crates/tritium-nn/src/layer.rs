//! Fully connected ternary layers.

use tracing::debug;
use tritium_arena::Pool;
use tritium_core::{confidence, Shape, TernaryError, Trit};
use tritium_tensor::{kernels, Kernels, Tensor};

use crate::activation::ActivationConfig;
use crate::config::LayerConfig;
use crate::entropy::EntropySource;

const THIRD: f64 = 1.0 / 3.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;

/// Map a uniform sample to an initial `(Trit, confidence)`.
///
/// `[0, 1/3)` is FALSE, `[1/3, 2/3)` UNKNOWN and `[2/3, 1)` TRUE. The
/// confidence is the distance to the nearest region boundary divided by
/// the largest such distance inside the region (`1/3` for the outer
/// regions, `1/6` for the middle one).
pub fn sample_trit(u: f64) -> (Trit, f64) {
    if u < THIRD {
        (Trit::False, confidence::clamp_unit((THIRD - u) / THIRD))
    } else if u < TWO_THIRDS {
        let distance = (u - THIRD).min(TWO_THIRDS - u);
        (Trit::Unknown, confidence::clamp_unit(distance / (THIRD / 2.0)))
    } else {
        (Trit::True, confidence::clamp_unit((u - TWO_THIRDS) / THIRD))
    }
}

/// A fully connected layer with ternary weights `[output, input]` and
/// bias `[output]`.
///
/// Both tensors come from the same pool and borrow it. The layer's sizes
/// are fixed for its lifetime.
#[derive(Debug)]
pub struct Layer<'p> {
    weights: Tensor<'p>,
    bias: Tensor<'p>,
    activation: ActivationConfig,
}

impl<'p> Layer<'p> {
    /// Allocate and randomly initialise a layer with the default activation.
    ///
    /// # Errors
    ///
    /// See [`Layer::with_config`].
    pub fn new(
        pool: &'p Pool,
        input_size: usize,
        output_size: usize,
        entropy: &mut dyn EntropySource,
    ) -> Result<Self, TernaryError> {
        Self::with_config(pool, LayerConfig::new(input_size, output_size), entropy)
    }

    /// Allocate and randomly initialise a layer.
    ///
    /// Weights are drawn first in row-major order, then the bias, one
    /// [`EntropySource::next_uniform`] call per element mapped through
    /// [`sample_trit`]. Gradients start at zero.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::DimensionMismatch`] if either size is zero.
    /// - [`TernaryError::InvalidParameter`] if the activation is invalid.
    /// - [`TernaryError::Overflow`] / [`TernaryError::AllocationFailed`]
    ///   from tensor allocation. Nothing stays allocated on failure.
    pub fn with_config(
        pool: &'p Pool,
        config: LayerConfig,
        entropy: &mut dyn EntropySource,
    ) -> Result<Self, TernaryError> {
        config.validate()?;
        let mut weights = Tensor::new(pool, &[config.output_size, config.input_size])?;
        let mut bias = Tensor::new(pool, &[config.output_size])?;
        randomise(&mut weights, entropy);
        randomise(&mut bias, entropy);
        debug!(
            "initialised {}x{} layer from pool {}",
            config.output_size,
            config.input_size,
            pool.id()
        );
        Ok(Self {
            weights,
            bias,
            activation: config.activation,
        })
    }

    /// Assemble a layer from existing tensors.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::DimensionMismatch`] unless `weights` is 2-D,
    ///   `bias` is 1-D and `bias.len()` equals the weights' output extent.
    /// - [`TernaryError::InvalidParameter`] if the two tensors live in
    ///   different pools or the activation is invalid.
    pub fn from_tensors(
        weights: Tensor<'p>,
        bias: Tensor<'p>,
        activation: ActivationConfig,
    ) -> Result<Self, TernaryError> {
        if weights.ndims() != 2 || bias.ndims() != 1 || bias.len() != weights.dims()[0] {
            return Err(TernaryError::mismatch(format!(
                "weights {} and bias {} do not form a layer",
                weights.shape(),
                bias.shape()
            )));
        }
        if weights.pool().id() != bias.pool().id() {
            return Err(TernaryError::invalid(
                "layer weights and bias come from different pools",
            ));
        }
        activation.validate()?;
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    /// Width of the input's innermost axis.
    pub fn input_size(&self) -> usize {
        self.weights.dims()[1]
    }

    /// Number of output units.
    pub fn output_size(&self) -> usize {
        self.weights.dims()[0]
    }

    /// The `[output, input]` weight tensor.
    pub fn weights(&self) -> &Tensor<'p> {
        &self.weights
    }

    /// The `[output]` bias tensor.
    pub fn bias(&self) -> &Tensor<'p> {
        &self.bias
    }

    /// Mutable weights, for training.
    pub fn weights_mut(&mut self) -> &mut Tensor<'p> {
        &mut self.weights
    }

    /// Mutable bias, for training.
    pub fn bias_mut(&mut self) -> &mut Tensor<'p> {
        &mut self.bias
    }

    /// The activation applied by [`Layer::forward`].
    pub fn activation(&self) -> &ActivationConfig {
        &self.activation
    }

    /// The pool the layer's tensors live in.
    pub fn pool(&self) -> &'p Pool {
        self.weights.pool()
    }

    /// Split into `(weights, bias, activation)`.
    pub fn into_parts(self) -> (Tensor<'p>, Tensor<'p>, ActivationConfig) {
        (self.weights, self.bias, self.activation)
    }

    /// Run the layer on `input`, allocating the output from the layer's pool.
    ///
    /// Every axis but the last is a batch axis: an input of shape
    /// `[..., input_size]` produces an output of shape `[..., output_size]`.
    ///
    /// # Errors
    ///
    /// - [`TernaryError::DimensionMismatch`] if the input's last extent is
    ///   not `input_size`.
    /// - [`TernaryError::AllocationFailed`] if the pool cannot hold the output.
    pub fn forward(&self, input: &Tensor<'_>) -> Result<Tensor<'p>, TernaryError> {
        let shape = self.output_shape(input)?;
        let mut out = Tensor::new(self.pool(), shape.dims())?;
        self.compute(kernels(), input, &mut out);
        Ok(out)
    }

    /// Run the layer on `input`, writing into `out`.
    ///
    /// # Errors
    ///
    /// [`TernaryError::DimensionMismatch`] if the input's last extent is
    /// not `input_size` or `out` does not have the output shape.
    pub fn forward_into(
        &self,
        input: &Tensor<'_>,
        out: &mut Tensor<'_>,
    ) -> Result<(), TernaryError> {
        self.forward_into_with(kernels(), input, out)
    }

    /// [`Layer::forward_into`] on explicit kernels.
    pub fn forward_into_with(
        &self,
        k: &dyn Kernels,
        input: &Tensor<'_>,
        out: &mut Tensor<'_>,
    ) -> Result<(), TernaryError> {
        let shape = self.output_shape(input)?;
        if out.dims() != shape.dims() {
            return Err(TernaryError::mismatch(format!(
                "forward output is {}, expected {shape}",
                out.shape()
            )));
        }
        self.compute(k, input, out);
        Ok(())
    }

    fn output_shape(&self, input: &Tensor<'_>) -> Result<Shape, TernaryError> {
        if input.shape().last() != self.input_size() {
            return Err(TernaryError::mismatch(format!(
                "layer expects inputs of width {}, got shape {}",
                self.input_size(),
                input.shape()
            )));
        }
        input.shape().with_last(self.output_size())
    }

    /// Shapes already validated.
    fn compute(&self, k: &dyn Kernels, input: &Tensor<'_>, out: &mut Tensor<'_>) {
        let n_in = self.input_size();
        let n_out = self.output_size();
        let (x_v, x_c) = (input.encoded_values(), input.confidences());
        let (w_v, w_c) = (self.weights.encoded_values(), self.weights.confidences());
        let (b_v, b_c) = (self.bias.encoded_values(), self.bias.confidences());
        let mut parts = out.parts_mut();
        for row in 0..input.shape().rows() {
            let xs = row * n_in..(row + 1) * n_in;
            for o in 0..n_out {
                let ws = o * n_in..(o + 1) * n_in;
                let dot = k.weighted_dot(
                    &x_v[xs.clone()],
                    &x_c[xs.clone()],
                    &w_v[ws.clone()],
                    &w_c[ws],
                );
                let s = dot + f64::from(b_v[o]) * b_c[o];
                let (trit, conf) = self.activation.apply(s);
                let idx = row * n_out + o;
                parts.values.set(idx, trit);
                parts.confidence.set_clamped(idx, conf);
            }
        }
        parts.gradient.fill(0.0);
    }
}

fn randomise(t: &mut Tensor<'_>, entropy: &mut dyn EntropySource) {
    let mut parts = t.parts_mut();
    for i in 0..parts.values.len() {
        let (trit, conf) = sample_trit(entropy.next_uniform());
        parts.values.set(i, trit);
        parts.confidence.set_clamped(i, conf);
    }
}
