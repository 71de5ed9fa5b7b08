//! Interleaved complex buffers
//!
//! The transform engine and the spectral multiplier share one memory layout:
//! a flat `f64` array of length `2K` where element `2i` is the real part and
//! element `2i + 1` the imaginary part of complex sample `i`.
//!
//! ```text
//!  index:   0     1     2     3     4     5    ...  2K-2   2K-1
//!         ┌─────┬─────┬─────┬─────┬─────┬─────┬───┬──────┬──────┐
//!         │ re0 │ im0 │ re1 │ im1 │ re2 │ im2 │...│ reK-1│ imK-1│
//!         └─────┴─────┴─────┴─────┴─────┴─────┴───┴──────┴──────┘
//! ```

use num_complex::Complex64;

use crate::types::Sample;

/// Owned interleaved complex buffer
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedBuffer {
    data: Vec<f64>,
}

impl InterleavedBuffer {
    /// Zero-filled buffer holding `k` complex samples
    pub fn zeroed(k: usize) -> Self {
        Self {
            data: vec![0.0; 2 * k],
        }
    }

    /// Zero-padded buffer with `samples` in the real slots.
    ///
    /// Samples beyond `k` wrap onto slot `i mod k` and accumulate, which is
    /// exactly what a `k`-point circular convolution sees. When
    /// `samples.len() <= k` this is plain zero padding.
    pub fn from_real(samples: &[Sample], k: usize) -> Self {
        let mut buffer = Self::zeroed(k);
        if k == 0 {
            return buffer;
        }
        for (i, &s) in samples.iter().enumerate() {
            buffer.data[2 * (i % k)] += s;
        }
        buffer
    }

    /// Build from complex samples
    pub fn from_complex(samples: &[Complex64]) -> Self {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for c in samples {
            data.push(c.re);
            data.push(c.im);
        }
        Self { data }
    }

    /// Wrap an existing interleaved vector. Odd lengths are rejected.
    pub fn from_interleaved(data: Vec<f64>) -> Option<Self> {
        if data.len() % 2 != 0 {
            return None;
        }
        Some(Self { data })
    }

    /// Number of complex samples (`K`)
    pub fn complex_len(&self) -> usize {
        self.data.len() / 2
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.data
    }

    /// Complex sample `i`
    pub fn get(&self, i: usize) -> Complex64 {
        Complex64::new(self.data[2 * i], self.data[2 * i + 1])
    }

    /// Iterate over complex samples
    pub fn iter_complex(&self) -> impl Iterator<Item = Complex64> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| Complex64::new(pair[0], pair[1]))
    }

    pub fn to_complex(&self) -> Vec<Complex64> {
        self.iter_complex().collect()
    }

    /// Multiply every scalar by `factor`
    pub fn scale(&mut self, factor: f64) {
        for v in self.data.iter_mut() {
            *v *= factor;
        }
    }

    /// Real parts of the first `count` complex samples.
    ///
    /// Indices past the end of the buffer read sample `i mod K`, i.e. the
    /// periodic extension of a circular result.
    pub fn real_parts(&self, count: usize) -> Vec<Sample> {
        let k = self.complex_len();
        if k == 0 {
            return vec![0.0; count];
        }
        (0..count).map(|i| self.data[2 * (i % k)]).collect()
    }
}
