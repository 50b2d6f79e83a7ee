//! mru - drive synthetic workloads through a memoized function

mod workload;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::workload::{Pattern, Report, Shape, Workload};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of slots); zero or negative disables caching
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    capacity: i64,

    /// Index keys by content digest to skip linear scans
    #[arg(short, long)]
    accelerated: bool,

    /// Order in which keys are requested
    #[arg(short, long, value_enum, default_value_t = Pattern::Cyclic)]
    pattern: Pattern,

    /// Argument shape passed to the memoized function
    #[arg(short, long, value_enum, default_value_t = Shape::Scalar)]
    shape: Shape,

    /// Number of distinct keys
    #[arg(short, long, default_value_t = 16)]
    keys: u64,

    /// Total number of calls
    #[arg(short = 'n', long, default_value_t = 1000)]
    calls: u64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("mru v{}", env!("CARGO_PKG_VERSION"));
    info!(
        capacity = args.capacity,
        accelerated = args.accelerated,
        pattern = ?args.pattern,
        shape = ?args.shape,
        "starting workload"
    );

    let report = Workload {
        capacity: args.capacity,
        accelerated: args.accelerated,
        pattern: args.pattern,
        shape: args.shape,
        keys: args.keys,
        calls: args.calls,
    }
    .run();

    info!(computed = report.computed, "workload finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &Report) {
    let workload = &report.workload;
    println!("\n📊 WORKLOAD:");
    println!("   Pattern:      {:?}", workload.pattern);
    println!("   Shape:        {:?}", workload.shape);
    println!("   Keys:         {}", workload.keys);
    println!("   Calls:        {}", workload.calls);
    println!("   Computed:     {}", report.computed);

    match &report.stats {
        Some(stats) => {
            println!("\n💾 CACHE ({} slots):", workload.capacity);
            println!("   Accelerated:  {}", workload.accelerated);
            println!("   Hits:         {}", stats.hits);
            println!("   Fast hits:    {}", stats.fast_hits);
            println!("   Misses:       {}", stats.misses);
            println!("   Evictions:    {}", stats.evictions);
            println!("   Hit rate:     {:.1}%", stats.hit_ratio * 100.0);
        }
        None => {
            println!("\n💾 CACHE: disabled (capacity {})", workload.capacity);
        }
    }
}
