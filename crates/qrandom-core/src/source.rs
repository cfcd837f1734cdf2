//! Entropy source trait, request/response types, and the built-in sources.
//!
//! Every source implements [`EntropySource`], a single fetch capability shaped
//! after the ANU QRNG API: ask for `count` values of a [`DataKind`], get an
//! [`EntropyBatch`] back or fail. The sampler only ever asks for `hex16`
//! blocks, but the other kinds are served for the CLI `fetch` command and the
//! local server.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{Error, Result};

/// Largest `count` a single fetch may request.
pub const MAX_FETCH_COUNT: usize = 1024;

/// Largest hex block a single fetch may request.
pub const MAX_FETCH_BLOCK_SIZE: usize = 1024;

/// Data type served by an entropy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Integers in `0..=255`.
    Uint8,
    /// Integers in `0..=65535`.
    Uint16,
    /// Hexadecimal strings of a requested block size.
    Hex16,
}

impl DataKind {
    pub const ALL: [DataKind; 3] = [DataKind::Uint8, DataKind::Uint16, DataKind::Hex16];

    /// Wire name used by the ANU API (`type=` query parameter).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Hex16 => "hex16",
        }
    }

    /// Parse a wire name. Case-sensitive, like the API itself.
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                Error::invalid(format!(
                    "data type must be one of uint8, uint16, hex16 (got '{s}')"
                ))
            })
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetch from an entropy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: DataKind,
    /// Number of values (or blocks) to return, `1..=1024`.
    pub count: usize,
    /// Hex digits per block. Only meaningful for [`DataKind::Hex16`]; always 1 otherwise.
    pub block_size: usize,
}

impl FetchRequest {
    /// Build a validated request. Non-hex kinds ignore `block_size`.
    pub fn new(kind: DataKind, count: usize, block_size: usize) -> Result<Self> {
        if !(1..=MAX_FETCH_COUNT).contains(&count) {
            return Err(Error::invalid(format!(
                "fetch count must be in 1..={MAX_FETCH_COUNT} (got {count})"
            )));
        }
        let block_size = match kind {
            DataKind::Hex16 => {
                if !(1..=MAX_FETCH_BLOCK_SIZE).contains(&block_size) {
                    return Err(Error::invalid(format!(
                        "block size must be in 1..={MAX_FETCH_BLOCK_SIZE} (got {block_size})"
                    )));
                }
                block_size
            }
            DataKind::Uint8 | DataKind::Uint16 => 1,
        };
        Ok(Self {
            kind,
            count,
            block_size,
        })
    }

    pub fn hex16(count: usize, block_size: usize) -> Result<Self> {
        Self::new(DataKind::Hex16, count, block_size)
    }
}

/// Values returned by one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntropyBatch {
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Hex16(Vec<String>),
}

impl EntropyBatch {
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Uint8(_) => DataKind::Uint8,
            Self::Uint16(_) => DataKind::Uint16,
            Self::Hex16(_) => DataKind::Hex16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Uint8(v) => v.len(),
            Self::Uint16(v) => v.len(),
            Self::Hex16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check this batch against the request that produced it.
    ///
    /// Kind and element count must match. Hex blocks must be exactly
    /// `block_size` hexadecimal digits.
    pub fn check(&self, request: &FetchRequest) -> Result<()> {
        if self.kind() != request.kind {
            return Err(Error::protocol(format!(
                "expected {} data, got {}",
                request.kind,
                self.kind()
            )));
        }
        if self.len() != request.count {
            return Err(Error::protocol(format!(
                "expected {} elements, got {}",
                request.count,
                self.len()
            )));
        }
        if let Self::Hex16(blocks) = self {
            for (i, block) in blocks.iter().enumerate() {
                if block.len() != request.block_size {
                    return Err(Error::protocol(format!(
                        "block {i} has {} digits, expected {}",
                        block.len(),
                        request.block_size
                    )));
                }
                if !block.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(Error::protocol(format!(
                        "block {i} contains non-hexadecimal characters"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate against `request` and return the hex blocks.
    pub fn into_hex_blocks(self, request: &FetchRequest) -> Result<Vec<String>> {
        self.check(request)?;
        match self {
            Self::Hex16(blocks) => Ok(blocks),
            other => Err(Error::protocol(format!(
                "expected hex16 data, got {}",
                other.kind()
            ))),
        }
    }
}

/// Metadata about an entropy source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Unique identifier (e.g. `"anu"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Whether fetching crosses the network.
    pub remote: bool,
}

/// Trait that every entropy source must implement.
pub trait EntropySource: Send + Sync {
    /// Source metadata.
    fn info(&self) -> &SourceInfo;

    /// Fetch one batch. Blocks until the source answers or fails.
    fn fetch(&self, request: &FetchRequest) -> Result<EntropyBatch>;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}

impl<S: EntropySource + ?Sized> EntropySource for Box<S> {
    fn info(&self) -> &SourceInfo {
        (**self).info()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<EntropyBatch> {
        (**self).fetch(request)
    }
}

impl<S: EntropySource + ?Sized> EntropySource for &S {
    fn info(&self) -> &SourceInfo {
        (**self).info()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<EntropyBatch> {
        (**self).fetch(request)
    }
}

// ---------------------------------------------------------------------------
// OS entropy
// ---------------------------------------------------------------------------

static OS_INFO: SourceInfo = SourceInfo {
    name: "os",
    description: "Operating system CSPRNG (getrandom), ANU-shaped output",
    remote: false,
};

/// Local source backed by the operating system RNG.
///
/// Not quantum. Serves the same shapes as the ANU API, so it stands in for the
/// remote service when working offline and backs the local server.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSource;

impl OsSource {
    fn random_bytes(n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        getrandom::fill(&mut buf)
            .map_err(|e| Error::SourceUnavailable(format!("getrandom failed: {e}")))?;
        Ok(buf)
    }
}

impl EntropySource for OsSource {
    fn info(&self) -> &SourceInfo {
        &OS_INFO
    }

    fn fetch(&self, request: &FetchRequest) -> Result<EntropyBatch> {
        match request.kind {
            DataKind::Uint8 => Ok(EntropyBatch::Uint8(Self::random_bytes(request.count)?)),
            DataKind::Uint16 => {
                let raw = Self::random_bytes(request.count * 2)?;
                let vals = raw
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                Ok(EntropyBatch::Uint16(vals))
            }
            DataKind::Hex16 => {
                let bytes_per_block = request.block_size.div_ceil(2);
                let raw = Self::random_bytes(request.count * bytes_per_block)?;
                let blocks = raw
                    .chunks_exact(bytes_per_block)
                    .map(|chunk| {
                        let mut s = hex_encode(chunk);
                        s.truncate(request.block_size);
                        s
                    })
                    .collect();
                Ok(EntropyBatch::Hex16(blocks))
            }
        }
    }
}

fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

static REPLAY_INFO: SourceInfo = SourceInfo {
    name: "replay",
    description: "Replays a fixed list of hex blocks",
    remote: false,
};

struct ReplayState {
    queue: VecDeque<String>,
    calls: Vec<FetchRequest>,
}

/// Deterministic source that hands out pre-set hex blocks in order.
///
/// Records every request it receives. Fetching more blocks than remain is a
/// [`Error::SourceUnavailable`], unless built with [`ReplaySource::cycling`].
pub struct ReplaySource {
    blocks: Vec<String>,
    cycle: bool,
    fail_at: Option<usize>,
    state: Mutex<ReplayState>,
}

impl ReplaySource {
    pub fn new<I, T>(blocks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let blocks: Vec<String> = blocks.into_iter().map(Into::into).collect();
        Self {
            state: Mutex::new(ReplayState {
                queue: blocks.iter().cloned().collect(),
                calls: Vec::new(),
            }),
            blocks,
            cycle: false,
            fail_at: None,
        }
    }

    /// Restart from the first block whenever the list runs out.
    pub fn cycling<I, T>(blocks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            cycle: true,
            ..Self::new(blocks)
        }
    }

    /// Answer the `n`th fetch (0-based) as if the service reported `success: false`.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReplayState> {
        // A panic while holding the lock can only come from a test assertion.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EntropySource for ReplaySource {
    fn info(&self) -> &SourceInfo {
        &REPLAY_INFO
    }

    fn fetch(&self, request: &FetchRequest) -> Result<EntropyBatch> {
        let mut state = self.lock();
        let call = state.calls.len();
        state.calls.push(*request);

        if self.fail_at == Some(call) {
            return Err(Error::SourceUnavailable(
                "replay source reported success=false".to_string(),
            ));
        }
        if request.kind != DataKind::Hex16 {
            return Err(Error::invalid("replay source only serves hex16"));
        }

        let mut out = Vec::with_capacity(request.count);
        for _ in 0..request.count {
            if state.queue.is_empty() && self.cycle && !self.blocks.is_empty() {
                state.queue.extend(self.blocks.iter().cloned());
            }
            match state.queue.pop_front() {
                Some(block) => out.push(block),
                None => {
                    return Err(Error::SourceUnavailable(
                        "replay source exhausted".to_string(),
                    ));
                }
            }
        }
        Ok(EntropyBatch::Hex16(out))
    }
}
