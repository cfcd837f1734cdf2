//! # qrandom-core
//!
//! **Arbitrarily many bounded random integers from a handful of QRNG fetches.**
//!
//! The ANU quantum random number service hands out blocks of up to 1024 hex
//! digits, up to 1024 blocks per call. `qrandom-core` unpacks each block into
//! as many independent base-`max_val` digits as it safely holds, fetching only
//! as many blocks as the request needs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use qrandom_core::{AnuClient, Sampler};
//!
//! let sampler = Sampler::new(AnuClient::default());
//!
//! // 100 dice rolls (0..6) from one HTTP call
//! let rolls = sampler.sample_ints(6, 100)?;
//! assert_eq!(rolls.len(), 100);
//!
//! let mut deck: Vec<u32> = (1..=52).collect();
//! sampler.shuffle(&mut deck)?;
//! # Ok::<(), qrandom_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Source (fetch hex blocks) → Sampler (peel digits) → helpers (floats, choice, shuffle)
//!
//! Every source implements the [`EntropySource`] trait: [`AnuClient`] talks
//! HTTP, [`OsSource`] serves the same shapes from the OS RNG, and
//! [`ReplaySource`] replays fixed blocks for deterministic tests.

pub mod analysis;
pub mod client;
pub mod error;
pub mod random;
pub mod sampler;
pub mod source;
pub mod wire;

pub use analysis::{FrequencyReport, frequency_report};
pub use client::{AnuClient, ClientConfig, DEFAULT_ENDPOINT};
pub use error::{Error, Result};
pub use random::FLOAT_SCALE;
pub use sampler::{FetchPlan, MAX_BATCH, MAX_BLOCK, Sampler, SamplerConfig};
pub use source::{
    DataKind, EntropyBatch, EntropySource, FetchRequest, OsSource, ReplaySource, SourceInfo,
};
pub use wire::AnuResponse;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
