//! Spectral Multiplier
//!
//! Pointwise complex multiplication of two interleaved spectra. By the
//! convolution theorem this is circular convolution of the corresponding
//! time-domain signals.

use num_complex::Complex64;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::fft::Execution;
use crate::types::{ConvError, ConvResult};

/// `a · b` per complex bin, returned as a new buffer
pub fn multiply(a: &[f64], b: &[f64]) -> ConvResult<Vec<f64>> {
    let mut out = a.to_vec();
    multiply_in_place(&mut out, b)?;
    Ok(out)
}

/// `acc[i] = acc[i] · b[i]` per complex bin
pub fn multiply_in_place(acc: &mut [f64], b: &[f64]) -> ConvResult<()> {
    multiply_in_place_with(acc, b, Execution::Auto)
}

pub fn multiply_in_place_with(acc: &mut [f64], b: &[f64], execution: Execution) -> ConvResult<()> {
    check_lengths(acc.len(), b.len())?;

    #[cfg(feature = "parallel")]
    if execution.is_parallel(acc.len() / 2) {
        acc.par_chunks_exact_mut(2)
            .zip(b.par_chunks_exact(2))
            .for_each(|(x, y)| mul_bin(x, y));
        return Ok(());
    }
    #[cfg(not(feature = "parallel"))]
    let _ = execution;

    acc.chunks_exact_mut(2)
        .zip(b.chunks_exact(2))
        .for_each(|(x, y)| mul_bin(x, y));
    Ok(())
}

#[inline]
fn mul_bin(x: &mut [f64], y: &[f64]) {
    let p = Complex64::new(x[0], x[1]) * Complex64::new(y[0], y[1]);
    x[0] = p.re;
    x[1] = p.im;
}

fn check_lengths(a: usize, b: usize) -> ConvResult<()> {
    if a != b {
        return Err(ConvError::InvalidSize {
            op: "multiply",
            reason: "spectra differ in length",
            len: b,
            k: a / 2,
        });
    }
    if a % 2 != 0 {
        return Err(ConvError::InvalidSize {
            op: "multiply",
            reason: "interleaved buffer has odd length",
            len: a,
            k: a / 2,
        });
    }
    Ok(())
}
