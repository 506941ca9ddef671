//! Little-endian primitives for the model format.
//!
//! No padding and no self-describing schema: every field's position
//! follows from the fields before it.

use std::io::{Read, Write};

use tritium_core::{confidence, Trit};

use crate::error::ModelError;

// ── Primitive writers ───────────────────────────────────────────

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), ModelError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), ModelError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write trit encodings, one signed byte each.
pub fn write_trits(w: &mut dyn Write, values: &[i8]) -> Result<(), ModelError> {
    let bytes: Vec<u8> = values.iter().map(|&v| v as u8).collect();
    w.write_all(&bytes)?;
    Ok(())
}

/// Write confidences as little-endian f64s.
pub fn write_f64s_le(w: &mut dyn Write, values: &[f64]) -> Result<(), ModelError> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    w.write_all(&bytes)?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read exactly `N` bytes.
pub fn read_array<const N: usize>(r: &mut dyn Read) -> Result<[u8; N], ModelError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, ModelError> {
    Ok(u32::from_le_bytes(read_array(r)?))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, ModelError> {
    Ok(u64::from_le_bytes(read_array(r)?))
}

/// Read `n` trit bytes, rejecting anything outside `{-1, 0, 1}`.
///
/// `what` names the channel in error messages.
pub fn read_trits(r: &mut dyn Read, n: usize, what: &str) -> Result<Vec<Trit>, ModelError> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf)?;
    buf.iter()
        .enumerate()
        .map(|(i, &b)| {
            Trit::from_i8(b as i8).ok_or_else(|| {
                ModelError::malformed(format!("invalid trit byte {b:#04x} in {what} at index {i}"))
            })
        })
        .collect()
}

/// Read `n` little-endian f64 confidences, rejecting any outside `[0, 1]`.
pub fn read_confidences(r: &mut dyn Read, n: usize, what: &str) -> Result<Vec<f64>, ModelError> {
    let len = n
        .checked_mul(8)
        .ok_or_else(|| ModelError::malformed(format!("{what} confidence block overflows")))?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    buf.chunks_exact(8)
        .enumerate()
        .map(|(i, chunk)| {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            let c = f64::from_le_bytes(le);
            if confidence::is_valid(c) {
                Ok(c)
            } else {
                Err(ModelError::malformed(format!(
                    "{what} confidence {c} at index {i} outside [0, 1]"
                )))
            }
        })
        .collect()
}
