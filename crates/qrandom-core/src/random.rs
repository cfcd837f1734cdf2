//! Familiar random helpers built on [`Sampler`]: floats, ranges, choices,
//! shuffles and samples.
//!
//! Each helper makes exactly one `sample_*` call, so each costs one fetch
//! plan's worth of remote calls.

use crate::error::{Error, Result};
use crate::sampler::Sampler;
use crate::source::EntropySource;

/// Integer range behind [`Sampler::random_floats`]: 20 decimal digits.
pub const FLOAT_SCALE: u128 = 100_000_000_000_000_000_000;

/// Largest `f64` below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

fn unit_float(v: u128) -> f64 {
    // v < 10^20 can still round up to 1.0 in f64.
    (v as f64 / FLOAT_SCALE as f64).min(BELOW_ONE)
}

/// Index into a working set of `len` items for a unit float.
fn pick_index(f: f64, len: usize) -> usize {
    ((f * len as f64) as usize).min(len - 1)
}

impl<S: EntropySource> Sampler<S> {
    /// `count` floats in `[0, 1)`.
    pub fn random_floats(&self, count: usize) -> Result<Vec<f64>> {
        Ok(self
            .sample_wide(FLOAT_SCALE, count)?
            .into_iter()
            .map(unit_float)
            .collect())
    }

    /// One float in `[0, 1)`.
    pub fn random(&self) -> Result<f64> {
        first(self.random_floats(1)?)
    }

    /// `count` floats `start + (end - start) * f`, with `f` in `[0, 1)`.
    pub fn uniform_floats(&self, start: f64, end: f64, count: usize) -> Result<Vec<f64>> {
        if !start.is_finite() || !end.is_finite() {
            return Err(Error::invalid("uniform bounds must be finite"));
        }
        Ok(self
            .random_floats(count)?
            .into_iter()
            .map(|f| start + (end - start) * f)
            .collect())
    }

    pub fn uniform(&self, start: f64, end: f64) -> Result<f64> {
        first(self.uniform_floats(start, end, 1)?)
    }

    /// Integer in `[a, b]`, both ends inclusive.
    pub fn randint(&self, a: i64, b: i64) -> Result<i64> {
        if a > b {
            return Err(Error::invalid(format!("empty range: {a} > {b}")));
        }
        let span = (i128::from(b) - i128::from(a) + 1) as u128;
        let offset = first(self.sample_wide(span, 1)?)?;
        // a + offset <= b, so this stays in i64.
        Ok((i128::from(a) + offset as i128) as i64)
    }

    /// `count` integers of `k` random bits each, `k` in `1..=64`.
    pub fn getrandbits_list(&self, k: u32, count: usize) -> Result<Vec<u64>> {
        if !(1..=64).contains(&k) {
            return Err(Error::invalid(format!("bit count must be in 1..=64 (got {k})")));
        }
        Ok(self
            .sample_wide(1u128 << k, count)?
            .into_iter()
            .map(|v| v as u64)
            .collect())
    }

    pub fn getrandbits(&self, k: u32) -> Result<u64> {
        first(self.getrandbits_list(k, 1)?)
    }

    /// One element of `seq`.
    pub fn choice<'a, T>(&self, seq: &'a [T]) -> Result<&'a T> {
        first(self.choices_uniform(seq, 1)?)
    }

    /// `k` elements of `seq`, with replacement, equally likely.
    pub fn choices_uniform<'a, T>(&self, seq: &'a [T], k: usize) -> Result<Vec<&'a T>> {
        if seq.is_empty() {
            return Err(Error::invalid("cannot choose from an empty sequence"));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .sample_ints(seq.len() as u64, k)?
            .into_iter()
            .map(|i| &seq[i as usize])
            .collect())
    }

    /// `k` elements of `seq`, with replacement, element `i` weighted by `weights[i]`.
    ///
    /// `None` weights every element 1. Same distribution as choosing uniformly
    /// from `seq` with each element repeated `weight` times.
    pub fn choices<'a, T>(
        &self,
        seq: &'a [T],
        weights: Option<&[u64]>,
        k: usize,
    ) -> Result<Vec<&'a T>> {
        let Some(weights) = weights else {
            return self.choices_uniform(seq, k);
        };
        if weights.len() != seq.len() {
            return Err(Error::invalid(format!(
                "{} weights for {} elements",
                weights.len(),
                seq.len()
            )));
        }
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut total: u64 = 0;
        for &w in weights {
            total = total
                .checked_add(w)
                .ok_or_else(|| Error::invalid("total weight overflows u64"))?;
            cumulative.push(total);
        }
        if total == 0 {
            return Err(Error::invalid("total weight must be positive"));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        Ok(self
            .sample_ints(total, k)?
            .into_iter()
            .map(|draw| &seq[cumulative.partition_point(|&c| c <= draw)])
            .collect())
    }

    /// `k` distinct positions of `seq`, chosen without replacement.
    pub fn sample<T: Clone>(&self, seq: &[T], k: usize) -> Result<Vec<T>> {
        if k > seq.len() {
            return Err(Error::invalid(format!(
                "sample larger than population: {k} > {}",
                seq.len()
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let draws = self.random_floats(k)?;
        Ok(draw_without_replacement(seq.to_vec(), &draws))
    }

    /// Shuffle `seq` in place.
    pub fn shuffle<T>(&self, seq: &mut Vec<T>) -> Result<()> {
        if seq.len() < 2 {
            return Ok(());
        }
        let draws = self.random_floats(seq.len())?;
        let work = std::mem::take(seq);
        *seq = draw_without_replacement(work, &draws);
        Ok(())
    }
}

/// Each draw removes `floor(f * remaining)` from the working set.
fn draw_without_replacement<T>(mut work: Vec<T>, draws: &[f64]) -> Vec<T> {
    let mut out = Vec::with_capacity(draws.len());
    for &f in draws {
        let idx = pick_index(f, work.len());
        out.push(work.remove(idx));
    }
    out
}

fn first<T>(values: Vec<T>) -> Result<T> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| Error::protocol("sampler returned no values"))
}
