//! Frequency check for sampled integers.
//!
//! Counts how often each value in `[0, max_val)` occurs and runs a chi-square
//! goodness-of-fit test against the uniform distribution.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{Error, Result};

/// Ranges wider than this are not histogrammed.
pub const MAX_HISTOGRAM_BINS: u64 = 1 << 20;

/// p-value below which the uniformity check fails.
pub const DEFAULT_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Serialize)]
pub struct FrequencyReport {
    pub max_val: u64,
    pub samples: usize,
    /// `counts[v]` is how many times `v` occurred.
    pub counts: Vec<u64>,
    /// Expected count per value under uniformity.
    pub expected: f64,
    pub chi_square: f64,
    pub degrees_of_freedom: u64,
    pub p_value: f64,
    pub passed: bool,
}

impl FrequencyReport {
    /// Letter grade from the p-value: A (>= 0.1) down to F (< 0.0001).
    pub fn grade(&self) -> char {
        match self.p_value {
            p if p >= 0.1 => 'A',
            p if p >= 0.01 => 'B',
            p if p >= 0.001 => 'C',
            p if p >= 0.0001 => 'D',
            _ => 'F',
        }
    }
}

/// Histogram plus chi-square test of `values` against uniform `[0, max_val)`.
pub fn frequency_report(values: &[u64], max_val: u64) -> Result<FrequencyReport> {
    if max_val < 2 {
        return Err(Error::invalid("frequency check needs max_val >= 2"));
    }
    if max_val > MAX_HISTOGRAM_BINS {
        return Err(Error::invalid(format!(
            "frequency check supports at most {MAX_HISTOGRAM_BINS} bins (got {max_val})"
        )));
    }
    if values.is_empty() {
        return Err(Error::invalid("frequency check needs at least one value"));
    }

    let mut counts = vec![0u64; max_val as usize];
    for &v in values {
        let slot = counts
            .get_mut(v as usize)
            .ok_or_else(|| Error::invalid(format!("value {v} is not below {max_val}")))?;
        *slot += 1;
    }

    let expected = values.len() as f64 / max_val as f64;
    let chi_square: f64 = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum();
    let degrees_of_freedom = max_val - 1;
    let p_value = ChiSquared::new(degrees_of_freedom as f64)
        .map(|dist| 1.0 - dist.cdf(chi_square))
        .map_err(|e| Error::invalid(format!("chi-square distribution: {e}")))?;

    Ok(FrequencyReport {
        max_val,
        samples: values.len(),
        counts,
        expected,
        chi_square,
        degrees_of_freedom,
        p_value,
        passed: p_value >= DEFAULT_THRESHOLD,
    })
}
