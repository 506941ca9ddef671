//! Encoding and decoding of whole layer stacks.

use std::io::{self, Read, Write};

use tracing::{debug, warn};
use tritium_arena::Pool;
use tritium_nn::{ActivationConfig, Layer};
use tritium_tensor::Tensor;

use crate::codec::{
    read_array, read_confidences, read_trits, read_u32_le, read_u64_le, write_f64s_le,
    write_trits, write_u32_le, write_u64_le,
};
use crate::error::ModelError;
use crate::{FORMAT_VERSION, MAGIC};

/// Header size: magic, version and layer count.
const HEADER_LEN: usize = 4 + 4 + 4;

/// Bytes [`serialize`] will produce for `layers`, or `None` on overflow.
pub fn serialized_len(layers: &[Layer<'_>]) -> Option<usize> {
    layers.iter().try_fold(HEADER_LEN, |acc, layer| {
        let elements = layer.weights().len().checked_add(layer.bias().len())?;
        // Two u64 sizes, then one value byte and eight confidence bytes per element.
        acc.checked_add(16)?.checked_add(elements.checked_mul(9)?)
    })
}

/// Encode `layers` into a fresh buffer.
///
/// # Errors
///
/// [`ModelError::Malformed`] if there are more than `u32::MAX` layers.
pub fn serialize(layers: &[Layer<'_>]) -> Result<Vec<u8>, ModelError> {
    let mut buf = Vec::with_capacity(serialized_len(layers).unwrap_or(HEADER_LEN));
    write_layers(&mut buf, layers)?;
    Ok(buf)
}

/// Encode `layers` into `w`.
///
/// # Errors
///
/// I/O errors from `w`, or [`ModelError::Malformed`] if there are more
/// than `u32::MAX` layers.
pub fn write_layers(w: &mut dyn Write, layers: &[Layer<'_>]) -> Result<(), ModelError> {
    let count = u32::try_from(layers.len())
        .map_err(|_| ModelError::malformed(format!("{} layers exceed u32", layers.len())))?;
    w.write_all(&MAGIC)?;
    write_u32_le(w, FORMAT_VERSION)?;
    write_u32_le(w, count)?;
    for layer in layers {
        write_u64_le(w, layer.output_size() as u64)?;
        write_u64_le(w, layer.input_size() as u64)?;
        write_trits(w, layer.weights().encoded_values())?;
        write_f64s_le(w, layer.weights().confidences())?;
        write_trits(w, layer.bias().encoded_values())?;
        write_f64s_le(w, layer.bias().confidences())?;
    }
    Ok(())
}

/// Decode a complete model from `bytes`, allocating every layer from `pool`.
///
/// Every decoded layer gets `activation`. Gradients start at zero.
///
/// # Errors
///
/// Everything [`read_layers`] reports, plus [`ModelError::Malformed`] if
/// bytes remain after the last layer.
pub fn deserialize<'p>(
    bytes: &[u8],
    pool: &'p Pool,
    activation: ActivationConfig,
) -> Result<Vec<Layer<'p>>, ModelError> {
    let mut rest = bytes;
    let layers = read_layers(&mut rest, pool, activation)?;
    if !rest.is_empty() {
        warn!(
            "rejected model: {} trailing bytes after {} layers",
            rest.len(),
            layers.len()
        );
        return Err(ModelError::malformed(format!(
            "{} trailing bytes after the last layer",
            rest.len()
        )));
    }
    Ok(layers)
}

/// Decode the header and the declared number of layers from `r`.
///
/// Reads nothing past the last layer. Layers are fully validated before
/// they are returned; on error every tensor allocated so far goes back
/// to `pool`.
///
/// # Errors
///
/// - [`ModelError::InvalidMagic`] / [`ModelError::UnsupportedVersion`]
///   for a foreign or newer header.
/// - [`ModelError::Truncated`] if the input ends early.
/// - [`ModelError::Malformed`] for zero or overflowing sizes, invalid
///   trit bytes or out-of-range confidences.
/// - [`ModelError::Tensor`] if `pool` cannot hold a complete layer record
///   or `activation` is invalid. A record that cannot be allocated and
///   also ends early reports [`ModelError::Truncated`].
pub fn read_layers<'p>(
    r: &mut dyn Read,
    pool: &'p Pool,
    activation: ActivationConfig,
) -> Result<Vec<Layer<'p>>, ModelError> {
    decode(r, pool, activation)
        .inspect(|layers| debug!("decoded {} layers into pool {}", layers.len(), pool.id()))
        .inspect_err(|e| warn!("rejected model: {e}"))
}

fn decode<'p>(
    r: &mut dyn Read,
    pool: &'p Pool,
    activation: ActivationConfig,
) -> Result<Vec<Layer<'p>>, ModelError> {
    activation.validate()?;
    let magic: [u8; 4] = read_array(r)?;
    if magic != MAGIC {
        return Err(ModelError::InvalidMagic { found: magic });
    }
    let version = read_u32_le(r)?;
    if version != FORMAT_VERSION {
        return Err(ModelError::UnsupportedVersion { found: version });
    }
    let count = read_u32_le(r)?;
    let mut layers = Vec::new();
    for index in 0..count {
        layers.push(decode_layer(r, pool, activation, index)?);
    }
    Ok(layers)
}

fn decode_layer<'p>(
    r: &mut dyn Read,
    pool: &'p Pool,
    activation: ActivationConfig,
    index: u32,
) -> Result<Layer<'p>, ModelError> {
    let output_size = read_size(r, index, "output")?;
    let input_size = read_size(r, index, "input")?;
    if output_size.checked_mul(input_size).is_none() {
        return Err(ModelError::malformed(format!(
            "layer {index}: {output_size}x{input_size} weights overflow"
        )));
    }
    // Allocation bounds every buffer below by the pool's capacity.
    let tensors = Tensor::new(pool, &[output_size, input_size])
        .and_then(|w| Ok((w, Tensor::new(pool, &[output_size])?)));
    let (mut weights, mut bias) = match tensors {
        Ok(pair) => pair,
        Err(e) => {
            // A record that ends early is truncated whatever sizes it declares.
            let payload = payload_len(output_size, input_size).ok_or_else(|| {
                ModelError::malformed(format!(
                    "layer {index}: {output_size}x{input_size} payload overflows"
                ))
            })?;
            let present = io::copy(&mut Read::take(&mut *r, payload), &mut io::sink())?;
            if present < payload {
                return Err(ModelError::Truncated);
            }
            return Err(e.into());
        }
    };

    let n = weights.len();
    let weight_values = read_trits(r, n, "weights")?;
    let weight_confidences = read_confidences(r, n, "weight")?;
    let bias_values = read_trits(r, output_size, "bias")?;
    let bias_confidences = read_confidences(r, output_size, "bias")?;

    weights.fill(&weight_values, &weight_confidences)?;
    bias.fill(&bias_values, &bias_confidences)?;
    Ok(Layer::from_tensors(weights, bias, activation)?)
}

/// Payload bytes of an `output x input` record: nine bytes per element.
fn payload_len(output_size: usize, input_size: usize) -> Option<u64> {
    let elements = output_size.checked_mul(input_size)?.checked_add(output_size)?;
    u64::try_from(elements).ok()?.checked_mul(9)
}

fn read_size(r: &mut dyn Read, index: u32, which: &str) -> Result<usize, ModelError> {
    let raw = read_u64_le(r)?;
    let size = usize::try_from(raw).map_err(|_| {
        ModelError::malformed(format!("layer {index}: {which} size {raw} exceeds usize"))
    })?;
    if size == 0 {
        return Err(ModelError::malformed(format!(
            "layer {index}: {which} size is zero"
        )));
    }
    Ok(size)
}
