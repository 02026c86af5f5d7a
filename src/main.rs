//! SHA-3 Miner CLI
//!
//! Command-line front end for the simulated SHA3-256 nonce search block.
//!
//! # Commands
//!
//! - `mine` - Run one search through the register protocol
//! - `hash` - Print the SHA3-256 digest of some input
//! - `search` - Batch nonce search without the device model
//! - `benchmark` - Measure nonce hash throughput
//! - `config` - Show or write the driver configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha3miner::algorithm::{self, batch_search, hash_nonce, SHA3_256_RATE};
use sha3miner::config::{default_config_path, ensure_parent_dir, MinerConfig};
use sha3miner::device::SimulatedMiner;
use sha3miner::driver::{MiningDriver, EXIT_DEVICE_ERROR, EXIT_FOUND, EXIT_TIMED_OUT};
use sha3miner::{sha3_256, RegisterLayout};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sha3-miner")]
#[command(author = "Cyberia")]
#[command(version = "0.1.0")]
#[command(about = "SHA3-256 proof-of-work nonce search driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a nonce on the simulated device
    Mine {
        /// First nonce to try
        #[arg(long)]
        nonce: Option<u32>,

        /// Accept a nonce whose hash is below this value
        #[arg(long)]
        target: Option<u32>,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Register layout (canonical or split)
        #[arg(long)]
        layout: Option<RegisterLayout>,
    },

    /// Compute the SHA3-256 digest of TEXT
    Hash {
        /// Input text
        text: String,

        /// Treat TEXT as hex-encoded bytes
        #[arg(long)]
        hex: bool,
    },

    /// Search nonces directly, without the register protocol
    Search {
        /// First nonce to try
        #[arg(long, default_value = "1")]
        nonce: u32,

        /// Accept a nonce whose hash is below this value
        #[arg(long)]
        target: u32,

        /// Number of nonces to try
        #[arg(long, default_value = "1000000")]
        max_iterations: u32,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of hashes to compute
        #[arg(short, long, default_value = "1000000")]
        count: u32,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Print the effective configuration, or write it to a file
    Config {
        /// Write the configuration to FILE
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Mine {
            nonce,
            target,
            timeout_ms,
            layout,
        } => cmd_mine(cli.config, nonce, target, timeout_ms, layout),
        Commands::Hash { text, hex } => cmd_hash(&text, hex),
        Commands::Search {
            nonce,
            target,
            max_iterations,
        } => cmd_search(nonce, target, max_iterations),
        Commands::Benchmark { count, threads } => cmd_benchmark(count, threads),
        Commands::Config { write } => cmd_config(cli.config, write),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_DEVICE_ERROR);
        }
    }
}

/// Config from `--config`, else the default file if present, else defaults
fn load_config(path: Option<PathBuf>) -> anyhow::Result<MinerConfig> {
    match path {
        Some(path) => Ok(MinerConfig::load(&path)?),
        None => {
            let path = default_config_path();
            if path.exists() {
                Ok(MinerConfig::load(&path)?)
            } else {
                Ok(MinerConfig::default())
            }
        }
    }
}

fn cmd_mine(
    config_path: Option<PathBuf>,
    nonce: Option<u32>,
    target: Option<u32>,
    timeout_ms: Option<u64>,
    layout: Option<RegisterLayout>,
) -> anyhow::Result<i32> {
    let mut config = load_config(config_path)?;
    if let Some(nonce) = nonce {
        config.initial_nonce = nonce;
    }
    if let Some(target) = target {
        config.target = target;
    }
    if let Some(ms) = timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(layout) = layout {
        config.layout = layout;
    }

    println!("Starting mining...");
    println!("Initial nonce: {}", config.initial_nonce);
    println!("Target: 0x{:08X}", config.target);
    println!("Layout: {:?}", config.layout);

    let device = SimulatedMiner::new(config.layout, config.ticks_per_slice)?;
    let driver = MiningDriver::new(device, config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;
    let report = runtime.block_on(driver.run())?;

    match report.solution() {
        Some(nonce) => {
            println!("\nFound valid nonce!");
            println!("Nonce: {} (0x{:08X})", nonce, nonce);
            println!("Hash: 0x{:08X}", hash_nonce(nonce));
        }
        None => println!("\nNo solution before timeout"),
    }
    println!("Hashes computed: {}", report.hash_count);
    println!("Time elapsed: {:.2}s", report.elapsed.as_secs_f64());
    println!("Hashrate: {:.2} H/s", report.hash_rate());

    Ok(report.exit_code())
}

fn cmd_hash(text: &str, is_hex: bool) -> anyhow::Result<i32> {
    let input = if is_hex {
        hex::decode(text.trim_start_matches("0x"))?
    } else {
        text.as_bytes().to_vec()
    };

    println!("{}", hex::encode(sha3_256(&input)));
    Ok(EXIT_FOUND)
}

fn cmd_search(nonce: u32, target: u32, max_iterations: u32) -> anyhow::Result<i32> {
    println!(
        "Searching {} nonces from {} for hash < 0x{:08X}...",
        max_iterations, nonce, target
    );

    let start = Instant::now();
    let outcome = batch_search(nonce, target, max_iterations);
    let elapsed = start.elapsed();

    match outcome.solution {
        Some(found) => {
            println!("Nonce: {} (hash 0x{:08X})", found, hash_nonce(found));
            println!("Iterations: {}", outcome.iterations_completed);
            println!("Time elapsed: {:.3}s", elapsed.as_secs_f64());
            Ok(EXIT_FOUND)
        }
        None => {
            println!("No solution in {} iterations", outcome.iterations_completed);
            Ok(EXIT_TIMED_OUT)
        }
    }
}

fn cmd_benchmark(count: u32, threads: Option<usize>) -> anyhow::Result<i32> {
    let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);
    println!(
        "Running benchmark with {} hashes on {} threads...",
        count, num_threads
    );

    let hashes = Arc::new(AtomicU64::new(0));
    let per_thread = count / num_threads as u32;
    let start = Instant::now();

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let hashes = Arc::clone(&hashes);
            let first = per_thread.wrapping_mul(t as u32);
            let quota = if t + 1 == num_threads {
                count - per_thread * (num_threads as u32 - 1)
            } else {
                per_thread
            };
            std::thread::spawn(move || {
                let mut acc = 0u32;
                for i in 0..quota {
                    acc ^= hash_nonce(first.wrapping_add(i));
                }
                hashes.fetch_add(quota as u64, Ordering::Relaxed);
                acc
            })
        })
        .collect();

    for handle in handles {
        std::hint::black_box(
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("benchmark thread panicked"))?,
        );
    }

    let elapsed = start.elapsed();
    let total = hashes.load(Ordering::Relaxed);
    let hashrate = total as f64 / elapsed.as_secs_f64();

    println!("\nResults:");
    println!("  Total hashes: {}", total);
    println!("  Time elapsed: {:.2}s", elapsed.as_secs_f64());
    println!("  Hashrate: {:.2} H/s", hashrate);
    println!("  Per thread: {:.2} H/s", hashrate / num_threads as f64);

    println!("\nAlgorithm parameters:");
    println!("  Keccak rounds: {}", algorithm::KECCAK_ROUNDS);
    println!("  Rate: {} bytes", SHA3_256_RATE);
    println!("  Pipeline depth: {}", algorithm::PIPELINE_DEPTH);

    Ok(EXIT_FOUND)
}

fn cmd_config(config_path: Option<PathBuf>, write: Option<PathBuf>) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;

    match write {
        Some(path) => {
            let path = ensure_parent_dir(&path)?;
            config.save(&path)?;
            println!("Configuration written to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(EXIT_FOUND)
}
