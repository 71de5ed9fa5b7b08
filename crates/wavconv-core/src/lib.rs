//! # WAV Convolution Library
//!
//! This crate convolves a mono audio signal with an impulse response using
//! the FFT. The linear convolution `y[n] = Σ x[k]·h[n-k]` of an `M`-sample
//! input and an `N`-sample impulse response is computed in `O(K log K)` by
//! zero-padding both signals to a power-of-two size `K`, transforming,
//! multiplying bin by bin, and transforming back.
//!
//! ## Overview
//!
//! - **Transform Engine** ([`fft`]): in-place iterative radix-2 FFT over an
//!   interleaved `[re, im, re, im, ...]` buffer
//! - **Spectral Multiplier** ([`spectral`]): element-wise complex product
//! - **Convolution Orchestrator** ([`convolve`]): sizing, padding, transform
//!   and truncation to `M + N - 1` samples
//! - **Normalization** ([`normalize`]): scale by `1 / max(1, peak)`
//! - **WAV I/O** ([`wav_source_sink`]): mono PCM/float WAV source and sink
//!
//! ## Signal Flow
//!
//! ```text
//! x, h → pad to K → FFT → X·H → IFFT → ÷K → truncate → normalize → WAV
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use wavconv_core::prelude::*;
//!
//! let (spec, x) = read_signal("input.wav")?;
//! let (_, h) = read_signal("ir.wav")?;
//!
//! let mut y = Convolver::new(SizingPolicy::Linear).convolve(&x, &h)?;
//! normalize_in_place(&mut y);
//!
//! write_signal("output.wav", &spec, &y)?;
//! # Ok::<(), wavconv_core::ConvError>(())
//! ```

pub mod buffer;
pub mod config;
pub mod convolve;
pub mod fft;
pub mod normalize;
pub mod observe;
pub mod spectral;
pub mod types;
pub mod wav_source_sink;

pub use buffer::InterleavedBuffer;
pub use config::{ConfigError, WavconvConfig};
pub use convolve::{convolve, convolve_direct, ConvolutionPlan, Convolver, SizingPolicy};
pub use fft::{Direction, Execution};
pub use types::{ConvError, ConvResult, Sample};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::WavconvConfig;
    pub use crate::convolve::{convolve, Convolver, SizingPolicy};
    pub use crate::normalize::{normalize, normalize_in_place};
    pub use crate::types::{ConvError, ConvResult, Sample};
    pub use crate::wav_source_sink::{read_signal, write_signal, WavSpec};
}
