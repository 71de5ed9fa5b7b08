//! Convolution Orchestrator
//!
//! Linear convolution of an input signal `x` (length M) with an impulse
//! response `h` (length N) through the convolution theorem:
//!
//! ```text
//!   x ──► zero-pad to K ──► FFT ──┐
//!                                 ├──► X·H ──► IFFT ──► ÷K ──► re[0..P)
//!   h ──► zero-pad to K ──► FFT ──┘
//!
//!   P = M + N - 1
//! ```
//!
//! ## Transform size
//!
//! Two sizing policies are available:
//!
//! | Policy                      | K                                  |
//! |-----------------------------|------------------------------------|
//! | [`SizingPolicy::Linear`]    | `next_power_of_two(M + N - 1)`     |
//! | [`SizingPolicy::Reference`] | `2^(floor(log2(2M - 1)) + 1)`      |
//!
//! `Reference` depends only on M. Whenever `K < P` (a long impulse
//! response against a short input) the result is a circular convolution
//! modulo K: impulse samples past K fold onto `i mod K`, and output samples
//! past K repeat the circular result periodically. `Linear` always yields
//! the true linear convolution.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffer::InterleavedBuffer;
use crate::fft::{self, Direction, Execution};
use crate::spectral;
use crate::types::{ConvError, ConvResult, Sample};

/// How the padded transform size K is derived from the signal lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingPolicy {
    /// Smallest power of two holding the full linear result
    #[default]
    Linear,
    /// `2^(floor(log2(2M - 1)) + 1)` from the input length alone
    Reference,
}

impl std::fmt::Display for SizingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingPolicy::Linear => write!(f, "linear"),
            SizingPolicy::Reference => write!(f, "reference"),
        }
    }
}

impl std::str::FromStr for SizingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(SizingPolicy::Linear),
            "reference" => Ok(SizingPolicy::Reference),
            other => Err(format!(
                "unknown sizing policy '{}', expected 'linear' or 'reference'",
                other
            )),
        }
    }
}

/// Padded transform size for signals of length `m` (input) and `n` (impulse)
pub fn padded_size(m: usize, n: usize, policy: SizingPolicy) -> ConvResult<usize> {
    if m == 0 || n == 0 {
        return Err(ConvError::InvalidInput {
            reason: "signals must be non-empty",
            input_len: m,
            impulse_len: n,
        });
    }
    let k = match policy {
        SizingPolicy::Linear => (m + n - 1).next_power_of_two(),
        SizingPolicy::Reference => 1usize << ((2 * m - 1).ilog2() + 1),
    };
    Ok(k)
}

/// Sizing decision for one convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolutionPlan {
    /// Complex transform length
    pub k: usize,
    /// `M + N - 1`
    pub output_len: usize,
    /// `K < P`: the tail of the result is circular, not linear
    pub aliased: bool,
}

/// FFT convolution engine
#[derive(Debug, Clone, Copy, Default)]
pub struct Convolver {
    policy: SizingPolicy,
    execution: Execution,
}

impl Convolver {
    pub fn new(policy: SizingPolicy) -> Self {
        Self {
            policy,
            execution: Execution::Auto,
        }
    }

    /// Override how transform stages and spectral bins are scheduled
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn policy(&self) -> SizingPolicy {
        self.policy
    }

    /// Work out K and P without transforming anything
    pub fn plan(&self, m: usize, n: usize) -> ConvResult<ConvolutionPlan> {
        let k = padded_size(m, n, self.policy)?;
        let output_len = m + n - 1;
        Ok(ConvolutionPlan {
            k,
            output_len,
            aliased: k < output_len,
        })
    }

    /// Convolve `x` with `h`, returning `M + N - 1` samples
    pub fn convolve(&self, x: &[Sample], h: &[Sample]) -> ConvResult<Vec<Sample>> {
        let plan = self.plan(x.len(), h.len())?;
        let k = plan.k;

        debug!(
            input_len = x.len(),
            impulse_len = h.len(),
            k,
            output_len = plan.output_len,
            policy = %self.policy,
            "Planned convolution"
        );
        if plan.aliased {
            warn!(
                k,
                output_len = plan.output_len,
                "Transform size is smaller than the linear result; samples from index {} on are circular",
                2 * x.len() - 1
            );
        }

        let mut signal = InterleavedBuffer::from_real(x, k);
        let mut impulse = InterleavedBuffer::from_real(h, k);

        fft::transform_with(signal.as_mut_slice(), k, Direction::Forward, self.execution)?;
        fft::transform_with(impulse.as_mut_slice(), k, Direction::Forward, self.execution)?;

        spectral::multiply_in_place_with(signal.as_mut_slice(), impulse.as_slice(), self.execution)?;

        fft::transform_with(signal.as_mut_slice(), k, Direction::Inverse, self.execution)?;
        signal.scale(1.0 / k as f64);

        Ok(signal.real_parts(plan.output_len))
    }
}

/// Convolve with the default ([`SizingPolicy::Linear`]) engine
pub fn convolve(x: &[Sample], h: &[Sample]) -> ConvResult<Vec<Sample>> {
    Convolver::default().convolve(x, h)
}

/// Time-domain linear convolution, O(M·N)
pub fn convolve_direct(x: &[Sample], h: &[Sample]) -> ConvResult<Vec<Sample>> {
    if x.is_empty() || h.is_empty() {
        return Err(ConvError::InvalidInput {
            reason: "signals must be non-empty",
            input_len: x.len(),
            impulse_len: h.len(),
        });
    }
    let mut y = vec![0.0; x.len() + h.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        for (j, &hj) in h.iter().enumerate() {
            y[i + j] += xi * hj;
        }
    }
    Ok(y)
}
