//! Virtual MCU daemon entry point.
//!
//! Runs the timer-dispatch core against the simulated board: a shared
//! wrapping clock, a handful of periodic software timers, and a simulated
//! interrupt gate. Each loop turn models one hardware timer interrupt
//! followed by one cooperative task slot for the idle booster.

mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use mcu_common::config::{DispatchWindows, TimingConfig};
use mcu_common::metrics::SleepMetrics;
use mcu_common::tick::{ticks_from_us, Tick};
use mcu_dispatch::dispatch::Dispatcher;
use mcu_dispatch::hal::{InterruptGate, TimerQueue};
use mcu_dispatch::idle::IdleBooster;
use mcu_dispatch::sim::{SimClock, SimGate, SimQueue};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::signals::ShutdownSignal;

/// MCU daemon command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "mcu-daemon",
    about = "Virtual MCU daemon - simulated interrupt-driven timer dispatch",
    version,
    long_about = None
)]
struct Args {
    /// Path to a timing configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Timer interrupts to simulate (0 = run until a shutdown signal).
    #[arg(long, default_value = "100000")]
    interrupts: u64,

    /// Number of simulated periodic timers.
    #[arg(long, default_value = "4")]
    timers: u32,

    /// Simulated ticks elapsing per clock read.
    #[arg(long, default_value = "1")]
    clock_step: u32,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting virtual MCU daemon");

    let config = load_config(&args)?;
    let windows = config
        .windows()
        .context("invalid timing configuration")?;

    info!(
        clock_freq_hz = config.clock_freq_hz,
        min_try_ticks = windows.min_try,
        repeat_window_ticks = windows.repeat_window,
        idle_window_ticks = windows.idle_repeat_window,
        "Timing configuration loaded"
    );

    let shutdown = ShutdownSignal::install().context("failed to install signal handlers")?;

    run_simulation(&args, config.clock_freq_hz, windows, shutdown)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("mcu_daemon={level},mcu_dispatch={level},mcu_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `MCU_CONFIG_PATH` environment variable
/// 3. `config/default.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<TimingConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return TimingConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("MCU_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from MCU_CONFIG_PATH");
            return TimingConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from MCU_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "MCU_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return TimingConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    info!("No config file found, using built-in defaults");
    Ok(TimingConfig::default())
}

/// Main simulation loop: alternate interrupt-context dispatch with the
/// cooperative idle booster until the interrupt budget or a shutdown
/// signal ends the run.
fn run_simulation(
    args: &Args,
    clock_freq_hz: u32,
    windows: DispatchWindows,
    shutdown: ShutdownSignal,
) -> Result<()> {
    let clock_step = if args.clock_step == 0 {
        warn!("--clock-step 0 would stall the poll loop, using 1");
        1
    } else {
        args.clock_step
    };
    let clock = SimClock::with_step(0, clock_step);
    // Park an empty queue one simulated second out.
    let mut queue = SimQueue::new(clock.clone(), clock_freq_hz.max(1_000_000));
    let mut gate = SimGate::new(clock.clone(), windows.idle_repeat_window);

    // Periodic load: timer i fires every (i+1) * 100us, staggered starts.
    let mut fire_counts = Vec::new();
    for i in 0..args.timers {
        let period = ticks_from_us(100 * (i + 1), clock_freq_hz).max(1);
        let first = ticks_from_us(50 * (i + 1), clock_freq_hz).max(1);
        fire_counts.push(queue.schedule_periodic_counted(Tick(first), period));
    }
    info!(timers = args.timers, "Simulated timer load scheduled");

    let mut dispatcher = Dispatcher::new(windows, clock.peek());
    let mut booster = IdleBooster::new();
    let mut metrics = SleepMetrics::new();

    let mut next_wake = queue.head_waketime();
    let mut interrupts: u64 = 0;

    while args.interrupts == 0 || interrupts < args.interrupts {
        if shutdown.is_requested() {
            // Shutdown hook: discard the eager budget for a clean restart.
            dispatcher.reset(clock.peek());
            info!(interrupts, "Shutdown requested, dispatch guard reset");
            break;
        }

        // The hardware comparator fires at the requested wake tick.
        clock.advance_to(next_wake);
        gate.disable();
        next_wake = match dispatcher.run(&clock, &mut queue, &mut gate) {
            Ok(tick) => tick,
            Err(fault) => {
                gate.enable();
                error!(%fault, "fatal scheduling fault, halting");
                return Err(fault.into());
            }
        };
        gate.enable();
        interrupts += 1;

        // One cooperative task slot per interrupt.
        booster.run_once(&mut dispatcher, &clock, &queue, &mut gate, &mut metrics);
    }

    info!(
        interrupts,
        defers = dispatcher.defer_count(),
        sleeps = metrics.sleep_count(),
        slept_ticks = metrics.total_ticks(),
        mean_sleep_ticks = metrics.mean().unwrap_or(0),
        "Simulation complete"
    );
    for (i, count) in fire_counts.iter().enumerate() {
        info!(timer = i, fired = count.get(), "timer fire count");
    }

    Ok(())
}
