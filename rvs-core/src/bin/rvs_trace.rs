//! RVS trace CLI - capture and inspect ipoint traces
//!
//! Usage:
//!     rvs-trace capture --ipoints 64 --out trace.bin
//!     rvs-trace capture --ipoints 64 --processor 2 --rounds 10 --out trace.bin --json
//!     rvs-trace dump trace.bin --limit 20
//!     rvs-trace merge user.bin kernel.bin --out trace.bin

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rvs_core::trace::{read_trace_file, write_trace_file};
use rvs_core::{
    markers, merge_traces, NativeClock, ProcessorClock, RVSError, Result, TargetProcessor,
    TraceConfig, TraceEntry, TraceStats, Tracer,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rvs-trace")]
#[command(about = "Capture and inspect RVS ipoint traces")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a calibration loop and write the trace to a file
    Capture {
        /// Ipoints per loop iteration (ids 1..=N)
        #[arg(long)]
        ipoints: u32,

        /// Loop iterations
        #[arg(long, default_value_t = 1)]
        rounds: u32,

        /// Buffer capacity in entries (overrides the config file)
        #[arg(long)]
        capacity: Option<usize>,

        /// Processor to record (default: the one running the capture)
        #[arg(long)]
        processor: Option<u32>,

        /// JSON trace configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output trace file
        #[arg(long)]
        out: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the records of a trace file
    Dump {
        /// Trace file to read
        file: PathBuf,

        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Print at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Interleave two trace files by timestamp
    Merge {
        /// Trace whose entries win timestamp ties
        first: PathBuf,

        /// Trace merged into the first
        second: PathBuf,

        /// Output trace file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct CaptureSummary {
    out: PathBuf,
    clock: &'static str,
    entries: usize,
    stats: TraceStats,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rvs_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Capture {
            ipoints,
            rounds,
            capacity,
            processor,
            config,
            out,
            json,
        } => capture(ipoints, rounds, capacity, processor, config, out, json),
        Command::Dump { file, json, limit } => dump(file, json, limit),
        Command::Merge { first, second, out } => merge(first, second, out),
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

fn capture(
    ipoints: u32,
    rounds: u32,
    capacity: Option<usize>,
    processor: Option<u32>,
    config_path: Option<PathBuf>,
    out: PathBuf,
    json: bool,
) -> Result<()> {
    check_ipoints(ipoints)?;
    let config = build_config(config_path.as_deref(), capacity, processor)?;

    pin_to_processor(pin_target(&config));

    let tracer = Tracer::new(config, NativeClock::new())?;
    let entries = run_calibration(&tracer, ipoints, rounds);
    if entries.is_empty() {
        tracing::warn!("capture recorded nothing; is the thread on the target processor?");
    }
    write_trace_file(&out, &entries)?;

    let summary = CaptureSummary {
        out,
        clock: tracer.clock().name(),
        entries: entries.len(),
        stats: tracer.stats(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Wrote {} entries to {}", summary.entries, summary.out.display());
        println!("  clock:      {}", summary.clock);
        match summary.stats.target {
            Some(target) => println!("  processor:  {}", target),
            None => println!("  processor:  none"),
        }
        println!("  capacity:   {}", summary.stats.capacity);
        println!("  missed:     {}", summary.stats.missed);
        if summary.stats.overflow_imminent {
            println!("  warning:    buffer filled past its overflow threshold");
        }
    }
    Ok(())
}

/// Loop ids are 1..=N plus 0 and N+1 around each round; none may be reserved
fn check_ipoints(ipoints: u32) -> Result<()> {
    if ipoints == 0 || ipoints >= markers::RESERVED_BASE - 1 {
        return Err(RVSError::InvalidConfig {
            reason: format!("--ipoints must be in 1..{}", markers::RESERVED_BASE - 1),
        });
    }
    Ok(())
}

/// Config file (or defaults), then command-line overrides
fn build_config(
    config_path: Option<&Path>,
    capacity: Option<usize>,
    processor: Option<u32>,
) -> Result<TraceConfig> {
    let mut config = match config_path {
        Some(path) => TraceConfig::from_json_file(path)?,
        None => TraceConfig::new(),
    };
    if let Some(capacity) = capacity {
        config = config.with_capacity(capacity);
    }
    if let Some(processor) = processor {
        config = config.with_target_processor(processor);
    }
    Ok(config)
}

/// Processor to pin the capture thread to; `None` stays where it is
fn pin_target(config: &TraceConfig) -> Option<u32> {
    match config.target {
        TargetProcessor::Processor(processor) => Some(processor),
        TargetProcessor::Caller => None,
    }
}

/// Record `rounds` passes of the calibration loop and return the trace
fn run_calibration<C: ProcessorClock>(
    tracer: &Tracer<C>,
    ipoints: u32,
    rounds: u32,
) -> Vec<TraceEntry> {
    let loop_exit = ipoints + 1;

    tracer.reset();
    tracer.start();
    for _ in 0..rounds {
        tracer.record(0);
        for id in 1..=ipoints {
            tracer.record(id);
        }
        tracer.record(loop_exit);
    }
    tracer.stop();

    let mut entries = vec![TraceEntry::default(); tracer.len()];
    let copied = tracer.download(&mut entries);
    entries.truncate(copied);
    entries
}

fn dump(file: PathBuf, json: bool, limit: Option<usize>) -> Result<()> {
    let mut entries = read_trace_file(&file)?;
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for line in dump_lines(&entries) {
        println!("{}", line);
    }
    Ok(())
}

/// Table rows for `dump`, header first
fn dump_lines(entries: &[TraceEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("{:>8}  {:<14}  {:>10}  {:>10}", "index", "id", "timestamp", "delta"));

    let mut previous: Option<u32> = None;
    for (index, entry) in entries.iter().enumerate() {
        let id = match markers::marker_name(entry.id) {
            Some(name) => name.to_string(),
            None => format!("{:08x}", entry.id),
        };
        let delta = previous
            .map(|prev| entry.timestamp.wrapping_sub(prev).to_string())
            .unwrap_or_default();
        lines.push(format!("{:>8}  {:<14}  {:>10}  {:>10}", index, id, entry.timestamp, delta));
        previous = Some(entry.timestamp);
    }
    lines
}

fn merge(first: PathBuf, second: PathBuf, out: PathBuf) -> Result<()> {
    let count = merge_files(&first, &second, &out)?;
    println!("Merged {} entries into {}", count, out.display());
    Ok(())
}

/// Merge two trace files into `out`; returns the merged entry count
fn merge_files(first: &Path, second: &Path, out: &Path) -> Result<usize> {
    let first = read_trace_file(first)?;
    let second = read_trace_file(second)?;
    let merged = merge_traces(&first, &second);
    write_trace_file(out, &merged)?;
    tracing::debug!(first = first.len(), second = second.len(), "traces merged");
    Ok(merged.len())
}

/// Keep the capture on one processor so the target keeps matching
///
/// `None` pins to whichever processor the thread is on now.
#[cfg(target_os = "linux")]
fn pin_to_processor(processor: Option<u32>) {
    let cpu = match processor {
        Some(cpu) => cpu as libc::c_int,
        None => unsafe { libc::sched_getcpu() },
    };
    if cpu < 0 || cpu as usize >= libc::CPU_SETSIZE as usize {
        tracing::warn!(cpu, "cannot pin capture thread");
        return;
    }

    let pinned = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu as usize, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if pinned != 0 {
        tracing::warn!(cpu, error = %std::io::Error::last_os_error(), "cannot pin capture thread");
    } else {
        tracing::debug!(cpu, "capture thread pinned");
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_processor(_processor: Option<u32>) {}
