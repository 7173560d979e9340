/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parking_lot::Mutex;
use tracing::{error, info};

use cadence_sch::config::TableSetManager;
use cadence_sch::profile::FrameProfile;
use cadence_sch::runtime::{EpochMetClock, LogBus, SchedulerRuntime, TokioSlotTimer};
use cadence_sch::scheduler::Scheduler;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Cadence-SCH activity scheduler (Rust implementation).
///
/// Example:
///   cadence-sch -t config/table_set.yaml -r 30 --simulate-pulse
#[derive(Debug, Parser)]
#[command(
    name = "cadence-sch",
    about = "Cadence-SCH table-driven activity scheduler – Rust implementation",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML table-set file (message + schedule definitions).
    #[arg(short = 't', long = "tables")]
    tables: Option<PathBuf>,

    /// Seconds to run before reporting final counters.
    #[arg(short = 'r', long = "run-for", default_value_t = 10)]
    run_for: u64,

    /// Drive an internal 1 Hz major-frame pulse (bench mode; in flight the
    /// pulse comes from the time service).
    #[arg(short = 'p', long = "simulate-pulse", default_value_t = false)]
    simulate_pulse: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Cadence-SCH starting up...");

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();

    info!(
        tables         = ?cli.tables,
        run_for        = cli.run_for,
        simulate_pulse = cli.simulate_pulse,
        "Configuration"
    );

    // ── Build the scheduler ───────────────────────────────────────────────────
    let timer = Arc::new(TokioSlotTimer::new());
    let mut scheduler = match Scheduler::new(
        FrameProfile::default(),
        Arc::new(LogBus),
        Arc::new(EpochMetClock::new()),
        Arc::clone(&timer) as Arc<dyn cadence_sch::scheduler::SlotTimer>,
    ) {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid frame profile: {e}");
            process::exit(1);
        }
    };

    // ── Load the table set ────────────────────────────────────────────────────
    match &cli.tables {
        Some(path) => {
            let mut mgr = TableSetManager::new();
            if let Err(e) = mgr.load_from_file(path) {
                error!("Failed to load table set: {:#}", e);
                process::exit(1);
            }
            mgr.apply(&mut scheduler);
        }
        None => {
            info!("No table set provided, running with empty tables");
        }
    }

    // ── Start the runtime ─────────────────────────────────────────────────────
    let scheduler = Arc::new(Mutex::new(scheduler));
    let runtime = Arc::new(SchedulerRuntime::new(Arc::clone(&scheduler), timer));

    if let Err(e) = runtime.start() {
        error!("Failed to start scheduler runtime: {e}");
        process::exit(1);
    }

    if cli.simulate_pulse {
        let pulse_runtime = Arc::clone(&runtime);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            loop {
                tick.tick().await;
                pulse_runtime.major_frame_pulse();
            }
        });
    }

    tokio::time::sleep(Duration::from_secs(cli.run_for)).await;

    // ── Report final counters ─────────────────────────────────────────────────
    let counters = scheduler.lock().counters();
    info!(
        slots_processed         = counters.slots_processed,
        slots_skipped           = counters.slots_skipped,
        multi_slot_events       = counters.multi_slot_events,
        same_slot_events        = counters.same_slot_events,
        activity_success        = counters.activity_success,
        activity_failure        = counters.activity_failure,
        valid_major_frames      = counters.valid_major_frames,
        missed_major_frames     = counters.missed_major_frames,
        unexpected_major_frames = counters.unexpected_major_frames,
        "Final counters"
    );
}
