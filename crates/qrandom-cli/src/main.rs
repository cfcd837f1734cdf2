//! CLI for qrandom: bounded integers, floats, shuffles and samples from
//! quantum random hex blocks.

mod commands;

use clap::{Args, Parser, Subcommand};

use commands::SourceOptions;

#[derive(Parser)]
#[command(name = "qrandom")]
#[command(about = "qrandom: many random draws from few quantum random fetches")]
#[command(version = qrandom_core::VERSION)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// ANU-compatible jsonI.php endpoint
    #[arg(
        long,
        global = true,
        env = "QRANDOM_ENDPOINT",
        default_value = qrandom_core::DEFAULT_ENDPOINT
    )]
    endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "QRANDOM_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Use the OS random generator instead of the remote service (not quantum)
    #[arg(long, global = true)]
    local: bool,

    /// Hex digits per fetched block (1-1024)
    #[arg(long, global = true, default_value = "1024")]
    block_size: usize,

    /// Blocks per remote call (1-1024)
    #[arg(long, global = true, default_value = "1024")]
    batch_size: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Print integers in [0, MAX), one per line
    Ints {
        /// Exclusive upper bound
        #[arg(long)]
        max: u64,

        /// How many integers
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Print one integer in [A, B], both inclusive
    Randint {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },

    /// Print floats in [0, 1)
    Floats {
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Print floats in [START, END)
    Uniform {
        #[arg(allow_negative_numbers = true)]
        start: f64,
        #[arg(allow_negative_numbers = true)]
        end: f64,

        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Print integers of K random bits (K in 1-64)
    Bits {
        k: u32,

        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Print one of the given items
    Choice {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Print K items chosen with replacement, optionally weighted
    Choices {
        /// Number of picks
        #[arg(long, default_value = "1")]
        k: usize,

        /// Comma-separated integer weights, one per item
        #[arg(long)]
        weights: Option<String>,

        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Print K distinct items chosen without replacement
    Sample {
        #[arg(long, default_value = "1")]
        k: usize,

        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Print the items in random order
    Shuffle {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Fetch one raw batch and print it as ANU JSON
    Fetch {
        /// Data type
        #[arg(long = "type", default_value = "hex16", value_parser = ["uint8", "uint16", "hex16"])]
        data_type: String,

        /// Number of values or blocks (1-1024)
        #[arg(long, default_value = "1")]
        length: usize,

        /// Hex digits per block, hex16 only (1-1024)
        #[arg(long, default_value = "16")]
        size: usize,
    },

    /// Show how a request would be split into fetches, without fetching
    Plan {
        #[arg(long)]
        max: u128,

        #[arg(long)]
        count: usize,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sample integers and run a chi-square uniformity check
    Freq {
        #[arg(long, default_value = "10")]
        max: u64,

        #[arg(long, default_value = "1000")]
        count: usize,

        /// Write the full report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Start a local HTTP entropy server (ANU QRNG API compatible, OS entropy)
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8042")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = SourceOptions {
        endpoint: cli.source.endpoint,
        timeout_secs: cli.source.timeout_secs,
        local: cli.source.local,
        block_size: cli.source.block_size,
        batch_size: cli.source.batch_size,
    };

    let result = match cli.command {
        Commands::Ints { max, count } => commands::numbers::ints(&opts, max, count),
        Commands::Randint { a, b } => commands::numbers::randint(&opts, a, b),
        Commands::Floats { count } => commands::numbers::floats(&opts, count),
        Commands::Uniform { start, end, count } => {
            commands::numbers::uniform(&opts, start, end, count)
        }
        Commands::Bits { k, count } => commands::numbers::bits(&opts, k, count),
        Commands::Choice { items } => commands::pick::choice(&opts, &items),
        Commands::Choices { k, weights, items } => {
            commands::pick::choices(&opts, &items, weights.as_deref(), k)
        }
        Commands::Sample { k, items } => commands::pick::sample(&opts, &items, k),
        Commands::Shuffle { items } => commands::pick::shuffle(&opts, items),
        Commands::Fetch {
            data_type,
            length,
            size,
        } => commands::fetch::run(&opts, &data_type, length, size),
        Commands::Plan { max, count, json } => commands::fetch::plan(&opts, max, count, json),
        Commands::Freq { max, count, output } => {
            commands::freq::run(&opts, max, count, output.as_deref())
        }
        Commands::Server { port, host } => commands::server::run(&host, port),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
