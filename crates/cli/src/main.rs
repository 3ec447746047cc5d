//! Memory-system simulator CLI.
//!
//! This binary drives the hybrid controller with a synthetic request stream.
//! It performs:
//! 1. **Configuration:** Built-in defaults or a JSON file (see `MemoryConfig`).
//! 2. **Workload:** Sequential, strided, or random line addresses with a
//!    configurable writeback share, one enqueue attempt per cycle with
//!    queue-full backpressure.
//! 3. **Reporting:** Aggregate and per-kind statistics after the queues drain.

use clap::{Parser, ValueEnum};
use std::{fs, process};

use hmsim_core::common::addr::LineAddr;
use hmsim_core::common::constants::STATUS_UPDATE_INTERVAL;
use hmsim_core::config::MemoryConfig;
use hmsim_core::mem::controller::EnqueueResult;
use hmsim_core::mem::packet::{Packet, RequestKind};
use hmsim_core::stats::ChannelStats;
use hmsim_core::Simulator;

#[derive(Parser, Debug)]
#[command(
    name = "hmsim",
    author,
    version,
    about = "Cycle-accurate hybrid DDR+HBM memory-system simulator",
    long_about = "Drive the hybrid memory controller with a synthetic workload.\n\nConfiguration is JSON (see MemoryConfig); the CLI uses built-in defaults when no file is given.\n\nExamples:\n  hmsim --requests 100000 --pattern random\n  hmsim --config ddr_only.json --pattern strided --stride 64 --write-percent 40"
)]
struct Cli {
    /// JSON configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Number of requests to generate.
    #[arg(short, long, default_value_t = 100_000)]
    requests: u64,

    /// Address pattern for the generated stream.
    #[arg(short, long, value_enum, default_value_t = Pattern::Random)]
    pattern: Pattern,

    /// Line-address stride for the strided pattern.
    #[arg(long, default_value_t = 17)]
    stride: u64,

    /// Share of writebacks in the stream, in percent.
    #[arg(long, default_value_t = 25)]
    write_percent: u64,

    /// Seed for the random pattern.
    #[arg(long, default_value_t = 0x9e37_79b9_7f4a_7c15)]
    seed: u64,

    /// Hard cycle limit for the whole run.
    #[arg(long, default_value_t = 1_000_000_000)]
    max_cycles: u64,
}

/// Synthetic address patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pattern {
    /// Consecutive line addresses (maximal row-buffer locality).
    Sequential,
    /// Fixed stride between line addresses.
    Strided,
    /// Uniform random line addresses.
    Random,
}

/// Xorshift64 generator; deterministic across runs for a given seed.
#[derive(Debug)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => match MemoryConfig::from_json(&text) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("[!] FATAL: invalid config '{}': {}", path, e);
                    process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("[!] FATAL: could not read config '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => MemoryConfig::default(),
    };

    let mut sim = match Simulator::new(&config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("[!] FATAL: {}", e);
            process::exit(1);
        }
    };

    let timing = *sim.memory.timing();
    let total_lines = sim.memory.geometry().total_lines();
    println!("Configuration: {}", cli.config.as_deref().unwrap_or("default"));
    println!(
        "  HBM lines: {}  total lines: {}  tRP/tRCD/tCAS: {}/{}/{}  turnaround: {}  return: {}",
        sim.memory.geometry().hbm_lines(),
        total_lines,
        timing.t_rp,
        timing.t_rcd,
        timing.t_cas,
        timing.turn_around,
        timing.return_time
    );
    println!(
        "  Workload: {} requests, pattern {:?}, {}% writes",
        cli.requests, cli.pattern, cli.write_percent
    );
    println!();

    let mut rng = XorShift64::new(cli.seed);
    let mut generated = 0u64;
    let mut rejected_retries = 0u64;
    let mut pending_pkt: Option<Packet> = None;

    while (generated < cli.requests || sim.memory.pending_requests() > 0)
        && sim.cycle() < cli.max_cycles
    {
        let pkt = pending_pkt.take().or_else(|| {
            if generated >= cli.requests {
                return None;
            }
            let line = match cli.pattern {
                Pattern::Sequential => generated % total_lines,
                Pattern::Strided => (generated * cli.stride) % total_lines,
                Pattern::Random => rng.next_u64() % total_lines,
            };
            let kind = if (rng.next_u64() % 100) < cli.write_percent {
                RequestKind::Writeback
            } else {
                RequestKind::Load
            };
            generated += 1;
            Some(Packet::new(LineAddr::new(line), kind, sim.cycle()))
        });

        if let Some(pkt) = pkt {
            let result = match pkt.kind {
                RequestKind::Writeback => sim.memory.add_wq(pkt),
                _ => sim.memory.add_rq(pkt),
            };
            if let EnqueueResult::Full(returned) = result {
                rejected_retries += 1;
                pending_pkt = Some(returned);
            }
        }

        if let Err(e) = sim.tick() {
            eprintln!("\n[!] FATAL: {}", e);
            process::exit(1);
        }
        if sim.cycle() % STATUS_UPDATE_INTERVAL == 0 {
            println!(
                "  ... cycle {}: {} generated, {} pending",
                sim.cycle(),
                generated,
                sim.memory.pending_requests()
            );
        }
    }

    print_stats(&sim, rejected_retries);
}

/// Prints the aggregate and per-kind statistics.
fn print_stats(sim: &Simulator, rejected_retries: u64) {
    let stats = sim.memory.aggregate_stats();

    println!("==========================================================");
    println!("HYBRID MEMORY SIMULATION STATISTICS");
    println!("==========================================================");
    println!("sim_cycles               {}", sim.cycle());
    println!("requests_completed       {}", stats.service.total_issued);
    println!(
        "avg_memory_access_time   {:.4} cycles",
        stats.service.average_memory_access_time()
    );
    println!("enqueue_retries          {}", rejected_retries);
    println!("----------------------------------------------------------");
    print_kind("HBM", &stats.hbm);
    print_kind("DDR", &stats.ddr);
    println!("==========================================================");
}

/// Prints one memory kind's summed channel counters.
fn print_kind(name: &str, stats: &ChannelStats) {
    println!("{} STATISTICS", name);
    println!(
        "  RQ row_buffer_hit      {:<10} row_buffer_miss: {}",
        stats.rq_row_buffer_hit, stats.rq_row_buffer_miss
    );
    println!(
        "  WQ row_buffer_hit      {:<10} row_buffer_miss: {}  full: {}  forward: {}",
        stats.wq_row_buffer_hit, stats.wq_row_buffer_miss, stats.wq_full, stats.wq_forward
    );
    match stats.avg_congested_cycles() {
        Some(avg) => println!("  DBUS avg_congested     {:.4} cycles", avg),
        None => println!("  DBUS avg_congested     -"),
    }
    println!("----------------------------------------------------------");
}
