//! Entropy batch sampler: many bounded integers out of each hex block.
//!
//! A block of `B` hex digits is an integer in `[0, 16^B)`. Written in base
//! `max_val` it has `floor(log_max_val(16^B))` full digits. The lowest digit is
//! dropped and the top one is left unused as a margin, so
//!
//! ```text
//! fits = floor(log_max_val(16^B)) - 1
//! ```
//!
//! digits are peeled off each block, lowest first. Blocks are fetched in
//! batches of up to `batch_size` per call and extraction stops the moment the
//! requested count is reached.
//!
//! The margin is a heuristic against top-digit bias, not a uniformity proof.

use num_bigint::BigUint;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::source::{EntropySource, FetchRequest, MAX_FETCH_BLOCK_SIZE, MAX_FETCH_COUNT};

/// Hex digits per block requested from the source.
pub const MAX_BLOCK: usize = MAX_FETCH_BLOCK_SIZE;

/// Blocks per remote call.
pub const MAX_BATCH: usize = MAX_FETCH_COUNT;

/// Block and batch sizing for a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Hex digits per block, `1..=1024`.
    pub block_size: usize,
    /// Blocks per fetch, `1..=1024`.
    pub batch_size: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            block_size: MAX_BLOCK,
            batch_size: MAX_BATCH,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BLOCK).contains(&self.block_size) {
            return Err(Error::invalid(format!(
                "block size must be in 1..={MAX_BLOCK} (got {})",
                self.block_size
            )));
        }
        if !(1..=MAX_BATCH).contains(&self.batch_size) {
            return Err(Error::invalid(format!(
                "batch size must be in 1..={MAX_BATCH} (got {})",
                self.batch_size
            )));
        }
        Ok(())
    }
}

/// How a request for `count` values below `max_val` is split into fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchPlan {
    pub max_val: u128,
    pub count: usize,
    pub block_size: usize,
    pub batch_size: usize,
    /// Values extracted per block.
    pub fits: usize,
    /// Blocks needed in total, `ceil(count / fits)`.
    pub blocks: usize,
    /// Remote calls needed, `ceil(blocks / batch_size)`.
    pub passes: usize,
}

impl FetchPlan {
    /// Plan a request. Fails if `count` is zero, `max_val < 2`, or a block
    /// cannot hold even one safe digit.
    pub fn new(max_val: u128, count: usize, config: &SamplerConfig) -> Result<Self> {
        config.validate()?;
        if count == 0 {
            return Err(Error::invalid("count must be at least 1"));
        }
        if max_val < 2 {
            return Err(Error::invalid(format!(
                "max_val must be at least 2 to plan fetches (got {max_val})"
            )));
        }
        let fits = base_digits(max_val, config.block_size).saturating_sub(1);
        if fits == 0 {
            return Err(Error::invalid(format!(
                "a {}-digit block cannot hold a safe base-{max_val} digit",
                config.block_size
            )));
        }
        let blocks = count.div_ceil(fits);
        let passes = blocks.div_ceil(config.batch_size);
        Ok(Self {
            max_val,
            count,
            block_size: config.block_size,
            batch_size: config.batch_size,
            fits,
            blocks,
            passes,
        })
    }
}

impl std::fmt::Display for FetchPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} values below {}: {} per {}-digit block, {} block(s) in {} call(s) of up to {}",
            self.count,
            self.max_val,
            self.fits,
            self.block_size,
            self.blocks,
            self.passes,
            self.batch_size
        )
    }
}

/// `floor(log_base(16^block_size))`, the number of whole base-`base` digits
/// in a block. Exact: the float estimate is corrected with integer powers.
fn base_digits(base: u128, block_size: usize) -> usize {
    let capacity = BigUint::from(1u32) << (4 * block_size);
    let b = BigUint::from(base);
    let fits_in = |k: usize| -> bool {
        u32::try_from(k)
            .map(|k| b.pow(k) <= capacity)
            .unwrap_or(false)
    };

    let estimate = (4.0 * block_size as f64 / (base as f64).log2()).floor() as usize;
    let mut k = estimate;
    while k > 0 && !fits_in(k) {
        k -= 1;
    }
    while fits_in(k + 1) {
        k += 1;
    }
    k
}

/// Turns fetched hex blocks into bounded integers.
pub struct Sampler<S> {
    source: S,
    config: SamplerConfig,
}

impl<S: EntropySource> Sampler<S> {
    /// Sampler with the default 1024×1024 sizing.
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: SamplerConfig::default(),
        }
    }

    pub fn with_config(source: S, config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// The fetch plan `sample_wide(max_val, count)` would follow.
    pub fn plan(&self, max_val: u128, count: usize) -> Result<FetchPlan> {
        FetchPlan::new(max_val, count, &self.config)
    }

    /// Exactly `count` integers, each in `[0, max_val)`, in extraction order.
    ///
    /// `max_val == 1` yields zeros without fetching. Source errors are
    /// returned as-is and nothing is retried.
    pub fn sample_ints(&self, max_val: u64, count: usize) -> Result<Vec<u64>> {
        let wide = self.sample_wide(u128::from(max_val), count)?;
        // Every value is below max_val, which came from a u64.
        Ok(wide.into_iter().map(|v| v as u64).collect())
    }

    /// [`Sampler::sample_ints`] for ranges up to `u128::MAX`.
    pub fn sample_wide(&self, max_val: u128, count: usize) -> Result<Vec<u128>> {
        if count == 0 {
            return Err(Error::invalid("count must be at least 1"));
        }
        if max_val == 0 {
            return Err(Error::invalid("max_val must be positive"));
        }
        let mut out = Vec::new();
        out.try_reserve_exact(count)
            .map_err(|_| Error::invalid(format!("cannot hold {count} values in memory")))?;
        if max_val == 1 {
            out.resize(count, 0);
            return Ok(out);
        }

        let plan = self.plan(max_val, count)?;
        log::debug!("{} from source '{}'", plan, self.source.name());

        let modulus = BigUint::from(max_val);
        let mut blocks_left = plan.blocks;

        for pass in 0..plan.passes {
            let n = blocks_left.min(plan.batch_size);
            log::debug!("pass {}/{}: fetching {n} block(s)", pass + 1, plan.passes);

            let request = FetchRequest::hex16(n, plan.block_size)?;
            let blocks = self.source.fetch(&request)?.into_hex_blocks(&request)?;
            for block in &blocks {
                peel_block(block, &modulus, plan.fits, count, &mut out)?;
                if out.len() == count {
                    return Ok(out);
                }
            }
            blocks_left -= n;
        }

        // blocks * fits >= count, so the loop always returns early.
        Err(Error::protocol(format!(
            "sources yielded {} of {count} values",
            out.len()
        )))
    }
}

/// Drop the lowest base-`modulus` digit of `block`, then push up to `fits`
/// digits (lowest first) until `out` holds `count` values.
fn peel_block(
    block: &str,
    modulus: &BigUint,
    fits: usize,
    count: usize,
    out: &mut Vec<u128>,
) -> Result<()> {
    let mut value = BigUint::parse_bytes(block.as_bytes(), 16)
        .ok_or_else(|| Error::protocol(format!("not a hexadecimal block: {block:?}")))?;
    value /= modulus;
    for _ in 0..fits {
        if out.len() == count {
            break;
        }
        let digit = &value % modulus;
        let digit = u128::try_from(&digit)
            .map_err(|_| Error::protocol("extracted digit exceeds max_val"))?;
        out.push(digit);
        value /= modulus;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReplaySource;

    fn small(block_size: usize, batch_size: usize) -> SamplerConfig {
        SamplerConfig {
            block_size,
            batch_size,
        }
    }

    // -----------------------------------------------------------------------
    // base_digits / FetchPlan
    // -----------------------------------------------------------------------

    #[test]
    fn test_base_digits_exact() {
        assert_eq!(base_digits(16, 4), 4);
        assert_eq!(base_digits(2, 4), 16);
        assert_eq!(base_digits(10, 4), 4); // 10^4 <= 65536 < 10^5
        assert_eq!(base_digits(256, 4), 2);
        assert_eq!(base_digits(257, 4), 1);
        assert_eq!(base_digits(2, 1024), 4096);
        assert_eq!(base_digits(u128::MAX, 1024), 32);
    }

    #[test]
    fn test_base_digits_larger_than_block() {
        assert_eq!(base_digits(17, 1), 0);
        assert_eq!(base_digits(16, 1), 1);
    }

    #[test]
    fn test_plan_default_sizing() {
        let plan = FetchPlan::new(10, 1_000_000, &SamplerConfig::default()).unwrap();
        // floor(4096 / log2(10)) = 1233
        assert_eq!(plan.fits, 1232);
        assert_eq!(plan.blocks, 812);
        assert_eq!(plan.passes, 1);
    }

    #[test]
    fn test_plan_multi_pass() {
        let plan = FetchPlan::new(2, 1000, &small(4, 8)).unwrap();
        assert_eq!(plan.fits, 15);
        assert_eq!(plan.blocks, 67);
        assert_eq!(plan.passes, 9);
    }

    #[test]
    fn test_plan_serializes_all_fields() {
        let plan = FetchPlan::new(2, 1000, &small(4, 8)).unwrap();
        let json = serde_json::to_value(plan).unwrap();
        assert_eq!(json["max_val"], 2);
        assert_eq!(json["count"], 1000);
        assert_eq!(json["block_size"], 4);
        assert_eq!(json["batch_size"], 8);
        assert_eq!(json["fits"], 15);
        assert_eq!(json["blocks"], 67);
        assert_eq!(json["passes"], 9);
    }

    #[test]
    fn test_plan_rejects_zero_fits() {
        assert!(FetchPlan::new(256, 1, &small(4, 1)).is_ok());
        assert!(matches!(
            FetchPlan::new(257, 1, &small(4, 1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(small(0, 1).validate().is_err());
        assert!(small(1, 0).validate().is_err());
        assert!(small(1025, 1).validate().is_err());
        assert!(small(1, 1025).validate().is_err());
        assert!(SamplerConfig::default().validate().is_ok());
    }

    // -----------------------------------------------------------------------
    // Extraction order
    // -----------------------------------------------------------------------

    #[test]
    fn test_peel_order_hex_digits() {
        // 0xF0A1 / 16 = 0xF0A; fits = 3, digits lowest first: A, 0, F.
        let src = ReplaySource::new(["F0A1"]);
        let sampler = Sampler::with_config(&src, small(4, 1024)).unwrap();
        assert_eq!(sampler.sample_ints(16, 3).unwrap(), vec![0xA, 0x0, 0xF]);
    }

    #[test]
    fn test_peel_continues_into_next_block() {
        let src = ReplaySource::new(["F0A1", "1234"]);
        let sampler = Sampler::with_config(&src, small(4, 1024)).unwrap();
        assert_eq!(sampler.sample_ints(16, 5).unwrap(), vec![0xA, 0x0, 0xF, 0x3, 0x2]);
        assert_eq!(src.calls(), vec![FetchRequest::hex16(2, 4).unwrap()]);
    }

    #[test]
    fn test_peel_decimal_base() {
        // 0xFFFF = 65535; /10 = 6553; fits = 3 -> 3, 5, 5
        let src = ReplaySource::new(["ffff"]);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        assert_eq!(sampler.sample_ints(10, 3).unwrap(), vec![3, 5, 5]);
    }

    #[test]
    fn test_one_block_per_pass() {
        let src = ReplaySource::new(["F0A1", "1234"]);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        sampler.sample_ints(16, 5).unwrap();
        let one = FetchRequest::hex16(1, 4).unwrap();
        assert_eq!(src.calls(), vec![one, one]);
    }

    // -----------------------------------------------------------------------
    // Counts and bounds
    // -----------------------------------------------------------------------

    #[test]
    fn test_binary_single_and_multi_pass() {
        for count in [1, 10, 15, 16, 1000] {
            let src = ReplaySource::cycling(["ffff", "0000", "a5a5", "3c96"]);
            let sampler = Sampler::with_config(&src, small(4, 8)).unwrap();
            let values = sampler.sample_ints(2, count).unwrap();
            assert_eq!(values.len(), count);
            assert!(values.iter().all(|&v| v < 2));
        }
    }

    #[test]
    fn test_binary_pass_count_matches_plan() {
        let src = ReplaySource::cycling(["a5a5"]);
        let sampler = Sampler::with_config(&src, small(4, 8)).unwrap();
        sampler.sample_ints(2, 1000).unwrap();
        let calls = src.calls();
        assert_eq!(calls.len(), 9);
        assert_eq!(calls.iter().map(|r| r.count).sum::<usize>(), 67);
        assert_eq!(calls.last().unwrap().count, 3);
    }

    #[test]
    fn test_single_sample_fetches_one_block() {
        let src = ReplaySource::cycling(["0123456789abcdef"]);
        let sampler = Sampler::with_config(&src, small(16, 1024)).unwrap();
        assert_eq!(sampler.sample_ints(6, 1).unwrap().len(), 1);
        assert_eq!(src.calls(), vec![FetchRequest::hex16(1, 16).unwrap()]);
    }

    #[test]
    fn test_values_below_max_for_odd_ranges() {
        let src =
            ReplaySource::cycling(["9f3c01ab77e2d45f", "ffffffffffffffff", "0000000000000001"]);
        let sampler = Sampler::with_config(&src, small(16, 2)).unwrap();
        for max_val in [3u64, 7, 100, 1000, 65_537] {
            let values = sampler.sample_ints(max_val, 50).unwrap();
            assert_eq!(values.len(), 50);
            assert!(values.iter().all(|&v| v < max_val), "max_val={max_val}");
        }
    }

    #[test]
    fn test_wide_range() {
        let src = ReplaySource::cycling(["f".repeat(64)]);
        let sampler = Sampler::with_config(&src, small(64, 4)).unwrap();
        let max_val = 10u128.pow(20);
        let values = sampler.sample_wide(max_val, 5).unwrap();
        assert_eq!(values.len(), 5);
        assert!(values.iter().all(|&v| v < max_val));
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[test]
    fn test_max_val_one_is_all_zeros_without_fetch() {
        let src = ReplaySource::new(Vec::<String>::new());
        let sampler = Sampler::new(&src);
        assert_eq!(sampler.sample_ints(1, 4).unwrap(), vec![0; 4]);
        assert_eq!(src.call_count(), 0);
    }

    #[test]
    fn test_invalid_arguments_before_fetch() {
        let src = ReplaySource::cycling(["ffff"]);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        assert!(matches!(sampler.sample_ints(0, 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(sampler.sample_ints(10, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(sampler.sample_ints(300, 1), Err(Error::InvalidArgument(_))));
        assert_eq!(src.call_count(), 0);
    }

    #[test]
    fn test_unallocatable_count_is_an_error() {
        let src = ReplaySource::cycling(["ffff"]);
        let sampler = Sampler::new(&src);
        for max_val in [1u64, 2, 6] {
            assert!(matches!(
                sampler.sample_ints(max_val, usize::MAX / 8),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert_eq!(src.call_count(), 0);
    }

    #[test]
    fn test_failure_aborts_without_further_fetches() {
        let src = ReplaySource::cycling(["ffff"]).failing_at(0);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        assert!(matches!(
            sampler.sample_ints(2, 100),
            Err(Error::SourceUnavailable(_))
        ));
        assert_eq!(src.call_count(), 1);
    }

    #[test]
    fn test_failure_mid_run_discards_partial_result() {
        let src = ReplaySource::cycling(["ffff"]).failing_at(2);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        assert!(sampler.sample_ints(2, 100).is_err());
        assert_eq!(src.call_count(), 3);
    }

    #[test]
    fn test_malformed_block_is_protocol_error() {
        let src = ReplaySource::new(["zz12"]);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        assert!(matches!(
            sampler.sample_ints(16, 1),
            Err(Error::SourceProtocolError(_))
        ));
    }

    #[test]
    fn test_short_block_is_protocol_error() {
        let src = ReplaySource::new(["123"]);
        let sampler = Sampler::with_config(&src, small(4, 1)).unwrap();
        assert!(matches!(
            sampler.sample_ints(16, 1),
            Err(Error::SourceProtocolError(_))
        ));
    }
}
