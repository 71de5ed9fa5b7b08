//! Radix-2 Transform Engine
//!
//! In-place iterative decimation-in-time FFT over interleaved complex
//! buffers (see [`crate::buffer`] for the layout).
//!
//! ## Conventions
//!
//! One routine serves both directions. `Direction::Forward` uses the
//! standard DFT kernel `e^{-2πikn/K}`, `Direction::Inverse` flips the sign of
//! the exponent. Neither direction normalizes:
//!
//! ```text
//! inverse(forward(x)) == K · x
//! ```
//!
//! so the caller divides by `K` exactly once, after the inverse pass
//! ([`inverse_normalized`] does both).
//!
//! ## Algorithm
//!
//! ```text
//!  bit-reverse  ──►  stage 1 (span 2)  ──►  stage 2 (span 4)  ──► … ──►  stage log2(K)
//!                    K/2 groups             K/4 groups                   1 group
//! ```
//!
//! Butterfly groups inside a stage touch disjoint memory, so with the
//! `parallel` feature a stage is a data-parallel map over groups.

use num_complex::Complex64;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::types::{ConvError, ConvResult};

/// Smallest complex length for which [`Execution::Auto`] goes parallel
pub const PARALLEL_MIN_SIZE: usize = 1 << 12;

/// Transform direction, used as the sign of the twiddle exponent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `e^{-2πikn/K}`
    Forward,
    /// `e^{+2πikn/K}`
    Inverse,
}

impl Direction {
    /// +1 for forward, -1 for inverse
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Inverse => -1.0,
        }
    }
}

/// How independent work items (butterfly groups, spectral bins) are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// Parallel for buffers of at least [`PARALLEL_MIN_SIZE`] complex samples
    #[default]
    Auto,
    Sequential,
    /// Always parallel when the `parallel` feature is enabled
    Parallel,
}

impl Execution {
    pub(crate) fn is_parallel(self, k: usize) -> bool {
        if !cfg!(feature = "parallel") {
            return false;
        }
        match self {
            Execution::Auto => k >= PARALLEL_MIN_SIZE,
            Execution::Sequential => false,
            Execution::Parallel => true,
        }
    }
}

/// Transform `buffer` (2K scalars) in place.
///
/// `k` must be a power of two and `buffer.len()` must be `2 * k`.
pub fn transform(buffer: &mut [f64], k: usize, direction: Direction) -> ConvResult<()> {
    transform_with(buffer, k, direction, Execution::Auto)
}

/// [`transform`] with an explicit scheduling choice. Results do not depend
/// on `execution`.
pub fn transform_with(
    buffer: &mut [f64],
    k: usize,
    direction: Direction,
    execution: Execution,
) -> ConvResult<()> {
    validate_size(buffer.len(), k)?;
    if k < 2 {
        return Ok(());
    }

    bit_reverse_permute(buffer, k);

    let parallel = execution.is_parallel(k);
    let mut span = 2;
    while span <= k {
        let twiddles = stage_twiddles(span, direction);
        run_stage(buffer, span, &twiddles, parallel);
        span <<= 1;
    }
    Ok(())
}

/// Forward transform, `K` taken from the buffer length
pub fn forward(buffer: &mut [f64]) -> ConvResult<()> {
    let k = buffer.len() / 2;
    transform(buffer, k, Direction::Forward)
}

/// Unnormalized inverse transform, `K` taken from the buffer length
pub fn inverse(buffer: &mut [f64]) -> ConvResult<()> {
    let k = buffer.len() / 2;
    transform(buffer, k, Direction::Inverse)
}

/// Inverse transform followed by the single division by `K`
pub fn inverse_normalized(buffer: &mut [f64]) -> ConvResult<()> {
    inverse(buffer)?;
    let scale = 1.0 / (buffer.len() / 2) as f64;
    for v in buffer.iter_mut() {
        *v *= scale;
    }
    Ok(())
}

fn validate_size(len: usize, k: usize) -> ConvResult<()> {
    if k == 0 || !k.is_power_of_two() {
        return Err(ConvError::InvalidSize {
            op: "transform",
            reason: "complex length must be a power of two",
            len,
            k,
        });
    }
    if len != 2 * k {
        return Err(ConvError::InvalidSize {
            op: "transform",
            reason: "buffer length must be twice the complex length",
            len,
            k,
        });
    }
    Ok(())
}

/// Swap complex entries into bit-reversed order. Real and imaginary parts
/// move together.
fn bit_reverse_permute(data: &mut [f64], k: usize) {
    let bits = k.trailing_zeros();
    for i in 0..k {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(2 * i, 2 * j);
            data.swap(2 * i + 1, 2 * j + 1);
        }
    }
}

/// Twiddles `e^{-sign·2πij/span}` for `j` in `0..span/2`
fn stage_twiddles(span: usize, direction: Direction) -> Vec<Complex64> {
    let step = -direction.sign() * 2.0 * PI / span as f64;
    (0..span / 2)
        .map(|j| {
            let theta = step * j as f64;
            Complex64::new(theta.cos(), theta.sin())
        })
        .collect()
}

fn run_stage(buffer: &mut [f64], span: usize, twiddles: &[Complex64], parallel: bool) {
    let group_len = 2 * span;

    #[cfg(feature = "parallel")]
    if parallel {
        buffer
            .par_chunks_mut(group_len)
            .for_each(|group| butterfly_group(group, twiddles));
        return;
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    buffer
        .chunks_mut(group_len)
        .for_each(|group| butterfly_group(group, twiddles));
}

/// Combine one group of `2 * twiddles.len()` complex samples
#[inline]
fn butterfly_group(group: &mut [f64], twiddles: &[Complex64]) {
    let half = twiddles.len();
    for (j, w) in twiddles.iter().enumerate() {
        let e = 2 * j;
        let o = 2 * (j + half);

        let odd_re = group[o];
        let odd_im = group[o + 1];
        let tr = w.re * odd_re - w.im * odd_im;
        let ti = w.re * odd_im + w.im * odd_re;

        let even_re = group[e];
        let even_im = group[e + 1];
        group[o] = even_re - tr;
        group[o + 1] = even_im - ti;
        group[e] = even_re + tr;
        group[e + 1] = even_im + ti;
    }
}
