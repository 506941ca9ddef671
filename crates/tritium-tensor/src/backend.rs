//! Vector kernel strategies for the batched operators.
//!
//! Operators never branch on CPU features themselves. They call through
//! a [`Kernels`] implementation chosen once per process by
//! [`Backend::detect`], or one passed explicitly to the `*_with` forms.
//!
//! | Backend | Implementation |
//! |---------|----------------|
//! | `scalar` | [`ScalarKernels`]: one element per iteration |
//! | `chunked` | [`ChunkedKernels`]: fixed 8-lane chunks the compiler can vectorize |
//!
//! Both produce bit-identical results for [`Kernels::combine`],
//! [`Kernels::combine_assign`] and [`Kernels::negate`].
//! [`Kernels::weighted_dot`] sums in a different order and agrees within
//! floating tolerance.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::{info, warn};
use tritium_core::{confidence, TernaryError};

/// Environment variable that overrides backend detection.
pub const BACKEND_ENV: &str = "TRITIUM_BACKEND";

const LANES: usize = 8;

/// Binary Kleene connective applied by [`Kernels::combine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicOp {
    /// `min` on values, product on confidence.
    And,
    /// `max` on values, `1 - (1 - a)(1 - b)` on confidence.
    Or,
}

impl LogicOp {
    #[inline(always)]
    fn value(self, a: i8, b: i8) -> i8 {
        match self {
            Self::And => a.min(b),
            Self::Or => a.max(b),
        }
    }

    #[inline(always)]
    fn confidence(self, a: f64, b: f64) -> f64 {
        match self {
            Self::And => confidence::and(a, b),
            Self::Or => confidence::or(a, b),
        }
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "AND",
            Self::Or => "OR",
        })
    }
}

/// Elementwise kernels over raw channel slices.
///
/// Callers guarantee that every slice passed to one call has the same
/// length and that value slices hold valid trit encodings.
pub trait Kernels: Send + Sync {
    /// Short identifier, e.g. `"scalar"`.
    fn name(&self) -> &'static str;

    /// `out[i] = op(a[i], b[i])` on values and confidences.
    #[allow(clippy::too_many_arguments)]
    fn combine(
        &self,
        op: LogicOp,
        out_v: &mut [i8],
        out_c: &mut [f64],
        a_v: &[i8],
        a_c: &[f64],
        b_v: &[i8],
        b_c: &[f64],
    );

    /// `acc[i] = op(acc[i], b[i])` on values and confidences.
    fn combine_assign(
        &self,
        op: LogicOp,
        acc_v: &mut [i8],
        acc_c: &mut [f64],
        b_v: &[i8],
        b_c: &[f64],
    );

    /// Negate every value in place.
    fn negate(&self, values: &mut [i8]);

    /// `Σ a_v[i]·a_c[i]·b_v[i]·b_c[i]`.
    fn weighted_dot(&self, a_v: &[i8], a_c: &[f64], b_v: &[i8], b_c: &[f64]) -> f64;
}

/// Straight-line reference kernels.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarKernels;

impl Kernels for ScalarKernels {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn combine(
        &self,
        op: LogicOp,
        out_v: &mut [i8],
        out_c: &mut [f64],
        a_v: &[i8],
        a_c: &[f64],
        b_v: &[i8],
        b_c: &[f64],
    ) {
        for i in 0..out_v.len() {
            out_v[i] = op.value(a_v[i], b_v[i]);
            out_c[i] = op.confidence(a_c[i], b_c[i]);
        }
    }

    fn combine_assign(
        &self,
        op: LogicOp,
        acc_v: &mut [i8],
        acc_c: &mut [f64],
        b_v: &[i8],
        b_c: &[f64],
    ) {
        for i in 0..acc_v.len() {
            acc_v[i] = op.value(acc_v[i], b_v[i]);
            acc_c[i] = op.confidence(acc_c[i], b_c[i]);
        }
    }

    fn negate(&self, values: &mut [i8]) {
        for v in values {
            *v = -*v;
        }
    }

    fn weighted_dot(&self, a_v: &[i8], a_c: &[f64], b_v: &[i8], b_c: &[f64]) -> f64 {
        let mut sum = 0.0;
        for i in 0..a_v.len() {
            sum += f64::from(a_v[i]) * a_c[i] * f64::from(b_v[i]) * b_c[i];
        }
        sum
    }
}

/// Kernels that walk the channels in fixed 8-lane chunks.
///
/// Each chunk body has a compile-time trip count and no cross-lane
/// dependencies, which is what lets the optimizer emit packed
/// instructions. Remainders go through the scalar path.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkedKernels;

impl Kernels for ChunkedKernels {
    fn name(&self) -> &'static str {
        "chunked"
    }

    fn combine(
        &self,
        op: LogicOp,
        out_v: &mut [i8],
        out_c: &mut [f64],
        a_v: &[i8],
        a_c: &[f64],
        b_v: &[i8],
        b_c: &[f64],
    ) {
        let split = out_v.len() - out_v.len() % LANES;
        let (ov_head, ov_tail) = out_v.split_at_mut(split);
        let (oc_head, oc_tail) = out_c.split_at_mut(split);
        let lanes = ov_head
            .chunks_exact_mut(LANES)
            .zip(oc_head.chunks_exact_mut(LANES))
            .zip(a_v.chunks_exact(LANES).zip(a_c.chunks_exact(LANES)))
            .zip(b_v.chunks_exact(LANES).zip(b_c.chunks_exact(LANES)));
        for (((ov, oc), (av, ac)), (bv, bc)) in lanes {
            for l in 0..LANES {
                ov[l] = op.value(av[l], bv[l]);
                oc[l] = op.confidence(ac[l], bc[l]);
            }
        }
        ScalarKernels.combine(
            op,
            ov_tail,
            oc_tail,
            &a_v[split..],
            &a_c[split..],
            &b_v[split..],
            &b_c[split..],
        );
    }

    fn combine_assign(
        &self,
        op: LogicOp,
        acc_v: &mut [i8],
        acc_c: &mut [f64],
        b_v: &[i8],
        b_c: &[f64],
    ) {
        let split = acc_v.len() - acc_v.len() % LANES;
        let (av_head, av_tail) = acc_v.split_at_mut(split);
        let (ac_head, ac_tail) = acc_c.split_at_mut(split);
        let lanes = av_head
            .chunks_exact_mut(LANES)
            .zip(ac_head.chunks_exact_mut(LANES))
            .zip(b_v.chunks_exact(LANES).zip(b_c.chunks_exact(LANES)));
        for ((av, ac), (bv, bc)) in lanes {
            for l in 0..LANES {
                av[l] = op.value(av[l], bv[l]);
                ac[l] = op.confidence(ac[l], bc[l]);
            }
        }
        ScalarKernels.combine_assign(op, av_tail, ac_tail, &b_v[split..], &b_c[split..]);
    }

    fn negate(&self, values: &mut [i8]) {
        let mut chunks = values.chunks_exact_mut(LANES);
        for chunk in &mut chunks {
            for v in chunk.iter_mut() {
                *v = -*v;
            }
        }
        ScalarKernels.negate(chunks.into_remainder());
    }

    fn weighted_dot(&self, a_v: &[i8], a_c: &[f64], b_v: &[i8], b_c: &[f64]) -> f64 {
        let split = a_v.len() - a_v.len() % LANES;
        let mut acc = [0.0f64; LANES];
        let lanes = a_v[..split]
            .chunks_exact(LANES)
            .zip(a_c.chunks_exact(LANES))
            .zip(b_v.chunks_exact(LANES).zip(b_c.chunks_exact(LANES)));
        for ((av, ac), (bv, bc)) in lanes {
            for l in 0..LANES {
                acc[l] += f64::from(av[l]) * ac[l] * f64::from(bv[l]) * bc[l];
            }
        }
        acc.iter().sum::<f64>()
            + ScalarKernels.weighted_dot(
                &a_v[split..],
                &a_c[split..],
                &b_v[split..],
                &b_c[split..],
            )
    }
}

static SCALAR: ScalarKernels = ScalarKernels;
static CHUNKED: ChunkedKernels = ChunkedKernels;
static SELECTED: OnceLock<Backend> = OnceLock::new();

/// Available kernel strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// [`ScalarKernels`].
    Scalar,
    /// [`ChunkedKernels`].
    Chunked,
}

impl Backend {
    /// Pick a backend for this machine.
    ///
    /// A recognised [`BACKEND_ENV`] value wins. Otherwise x86 targets use
    /// [`Backend::Chunked`] when AVX2 is present, aarch64 always does
    /// (NEON is baseline), and everything else falls back to
    /// [`Backend::Scalar`].
    pub fn detect() -> Self {
        if let Ok(requested) = std::env::var(BACKEND_ENV) {
            match requested.parse() {
                Ok(backend) => return backend,
                Err(e) => warn!("ignoring {BACKEND_ENV}: {e}"),
            }
        }
        Self::from_cpu()
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn from_cpu() -> Self {
        if std::arch::is_x86_feature_detected!("avx2") {
            Self::Chunked
        } else {
            Self::Scalar
        }
    }

    #[cfg(target_arch = "aarch64")]
    fn from_cpu() -> Self {
        Self::Chunked
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    fn from_cpu() -> Self {
        Self::Scalar
    }

    /// The kernel implementation for this backend.
    pub fn kernels(self) -> &'static dyn Kernels {
        match self {
            Self::Scalar => &SCALAR,
            Self::Chunked => &CHUNKED,
        }
    }

    /// Lowercase name, as accepted by [`BACKEND_ENV`].
    pub fn name(self) -> &'static str {
        self.kernels().name()
    }
}

impl FromStr for Backend {
    type Err = TernaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(Self::Scalar),
            "chunked" => Ok(Self::Chunked),
            other => Err(TernaryError::invalid(format!(
                "unknown backend '{other}', expected 'scalar' or 'chunked'"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The process-wide backend, detected on first use.
pub fn selected_backend() -> Backend {
    *SELECTED.get_or_init(|| {
        let backend = Backend::detect();
        info!("selected {backend} tensor kernels");
        backend
    })
}

/// Kernels of the process-wide backend.
pub fn kernels() -> &'static dyn Kernels {
    selected_backend().kernels()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn trits(len: usize) -> impl Strategy<Value = Vec<i8>> {
        proptest::collection::vec(-1i8..=1, len)
    }

    fn confs(len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(0.0f64..=1.0, len)
    }

    fn channels() -> impl Strategy<Value = (Vec<i8>, Vec<f64>, Vec<i8>, Vec<f64>)> {
        (0usize..40).prop_flat_map(|n| (trits(n), confs(n), trits(n), confs(n)))
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("scalar".parse::<Backend>().unwrap(), Backend::Scalar);
        assert_eq!(" Chunked ".parse::<Backend>().unwrap(), Backend::Chunked);
        assert!("avx512".parse::<Backend>().is_err());
        assert_eq!(Backend::Chunked.to_string(), "chunked");
    }

    #[test]
    fn selection_is_stable() {
        assert_eq!(selected_backend(), selected_backend());
        assert_eq!(kernels().name(), selected_backend().name());
    }

    #[test]
    fn scalar_and_matches_kleene() {
        let mut ov = [0i8; 3];
        let mut oc = [0.0; 3];
        ScalarKernels.combine(
            LogicOp::And,
            &mut ov,
            &mut oc,
            &[1, -1, 0],
            &[0.5, 1.0, 0.5],
            &[1, 1, 1],
            &[0.5, 0.5, 1.0],
        );
        assert_eq!(ov, [1, -1, 0]);
        assert_eq!(oc, [0.25, 0.5, 0.5]);
    }

    #[test]
    fn chunked_negate_handles_remainder() {
        let mut v: Vec<i8> = (0..11).map(|i| (i % 3) as i8 - 1).collect();
        let expected: Vec<i8> = v.iter().map(|x| -x).collect();
        ChunkedKernels.negate(&mut v);
        assert_eq!(v, expected);
    }

    proptest! {
        #[test]
        fn chunked_combine_matches_scalar(
            (av, ac, bv, bc) in channels(),
            or in any::<bool>(),
        ) {
            let op = if or { LogicOp::Or } else { LogicOp::And };
            let n = av.len();
            let (mut sv, mut sc) = (vec![0i8; n], vec![0.0; n]);
            let (mut cv, mut cc) = (vec![0i8; n], vec![0.0; n]);
            ScalarKernels.combine(op, &mut sv, &mut sc, &av, &ac, &bv, &bc);
            ChunkedKernels.combine(op, &mut cv, &mut cc, &av, &ac, &bv, &bc);
            prop_assert_eq!(&sv, &cv);
            prop_assert_eq!(&sc, &cc);

            let (mut accv, mut accc) = (av.clone(), ac.clone());
            ChunkedKernels.combine_assign(op, &mut accv, &mut accc, &bv, &bc);
            prop_assert_eq!(accv, sv);
            prop_assert_eq!(accc, sc);
        }

        #[test]
        fn chunked_dot_matches_scalar((av, ac, bv, bc) in channels()) {
            let s = ScalarKernels.weighted_dot(&av, &ac, &bv, &bc);
            let c = ChunkedKernels.weighted_dot(&av, &ac, &bv, &bc);
            prop_assert!((s - c).abs() < 1e-9, "scalar {s} chunked {c}");
        }
    }
}
