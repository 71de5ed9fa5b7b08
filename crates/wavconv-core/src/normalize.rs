//! Peak normalization
//!
//! Scales a signal by `1 / max(1, peak)`. Signals whose peak is already
//! within `[-1, 1]` pass through unchanged; louder ones are brought down so
//! the peak sits exactly at full scale.

use crate::types::Sample;

/// Largest absolute sample value, 0.0 for an empty signal
pub fn peak(samples: &[Sample]) -> Sample {
    samples.iter().fold(0.0, |acc: f64, &s| acc.max(s.abs()))
}

/// Divisor applied by [`normalize`]; never below 1
pub fn gain_divisor(samples: &[Sample]) -> Sample {
    peak(samples).max(1.0)
}

pub fn normalize(samples: &[Sample]) -> Vec<Sample> {
    let mut out = samples.to_vec();
    normalize_in_place(&mut out);
    out
}

/// Normalize in place, returning the divisor that was applied
pub fn normalize_in_place(samples: &mut [Sample]) -> Sample {
    let lim = gain_divisor(samples);
    if lim > 1.0 {
        for s in samples.iter_mut() {
            *s /= lim;
        }
    }
    lim
}
