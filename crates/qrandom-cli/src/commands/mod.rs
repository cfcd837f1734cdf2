pub mod fetch;
pub mod freq;
pub mod numbers;
pub mod pick;
pub mod server;

use std::time::Duration;

use qrandom_core::{
    AnuClient, ClientConfig, EntropySource, Error, OsSource, Sampler, SamplerConfig,
};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Where entropy comes from and how it is batched; shared by every command.
pub struct SourceOptions {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub local: bool,
    pub block_size: usize,
    pub batch_size: usize,
}

impl SourceOptions {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            block_size: self.block_size,
            batch_size: self.batch_size,
        }
    }
}

/// Build the entropy source selected on the command line.
pub fn make_source(opts: &SourceOptions) -> Box<dyn EntropySource> {
    if opts.local {
        log::info!("using local OS entropy (not quantum)");
        Box::new(OsSource)
    } else {
        log::info!("using {}", opts.endpoint);
        Box::new(AnuClient::new(ClientConfig {
            endpoint: opts.endpoint.clone(),
            timeout: Duration::from_secs(opts.timeout_secs),
        }))
    }
}

/// Build a sampler over the selected source.
pub fn make_sampler(opts: &SourceOptions) -> Result<Sampler<Box<dyn EntropySource>>, Error> {
    Sampler::with_config(make_source(opts), opts.sampler_config())
}

/// Parse `"3,1,0,2"` into integer weights.
pub fn parse_weights(s: &str) -> Result<Vec<u64>, Error> {
    s.split(',')
        .map(|w| w.trim())
        .map(|w| {
            w.parse::<u64>().map_err(|_| {
                Error::InvalidArgument(format!("weight '{w}' is not a non-negative integer"))
            })
        })
        .collect()
}
