//! # pulsescope - Main Entry Point
//!
//! Two operational modes:
//! - **counters**: open a hardware counter on a thread and stream periodic
//!   readings, optionally exporting them as JSON
//! - **collect**: accept a probe connection and decode length-prefixed
//!   telemetry frames until the peer goes away

use std::fs::File;
use std::io::BufWriter;
use std::net::TcpListener;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use pulsescope::cli::{Args, Command};
use pulsescope::domain::{CollectorError, CounterError, Tid};
use pulsescope::export::SampleExporter;
use pulsescope::perf::{EventSpec, HardwareEvent, HwCounter};
use pulsescope::preflight::run_preflight_checks;
use pulsescope::transport::Framer;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("paranoid") || msg.contains("permission denied") {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    match Args::parse().command {
        Command::Counters { event, tid, interval, duration, export, kernel } => {
            run_counters(&event, Tid(tid), interval, duration, export, kernel)
        }
        Command::Collect { listen } => run_collect(&listen),
    }
}

fn run_counters(
    event: &str,
    tid: Tid,
    interval_ms: u64,
    duration_s: u64,
    export: Option<PathBuf>,
    kernel: bool,
) -> Result<()> {
    run_preflight_checks()?;

    let event: HardwareEvent = event.parse::<HardwareEvent>()?;
    let mut spec = EventSpec::new(event);
    if kernel {
        spec = spec.include_kernel();
    }

    let counter = HwCounter::open(&spec, None, tid);
    if !counter.active() {
        return Err(CounterError::OpenFailed {
            event: event.to_string(),
            target: tid.to_string(),
        }
        .into());
    }
    counter.enable().context("failed to enable counter")?;
    info!("counting '{event}' on {tid} every {interval_ms}ms");

    let mut exporter = SampleExporter::new(event.to_string());
    let started = Instant::now();
    let mut last = counter.read();
    loop {
        std::thread::sleep(Duration::from_millis(interval_ms));

        let value = counter.read();
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ns = started.elapsed().as_nanos() as u64;
        exporter.record(elapsed_ns, value);
        println!(
            "{:>12.3}ms  {event:>14}  {value:>16}  (+{})",
            started.elapsed().as_secs_f64() * 1e3,
            value.wrapping_sub(last),
        );
        last = value;

        if duration_s > 0 && started.elapsed() >= Duration::from_secs(duration_s) {
            break;
        }
    }
    counter.disable().context("failed to disable counter")?;

    if let Some(path) = export {
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        exporter.export(BufWriter::new(file))?;
        info!("wrote {} samples to {}", exporter.len(), path.display());
    }
    Ok(())
}

fn run_collect(listen: &str) -> Result<()> {
    let listener = TcpListener::bind(listen).map_err(|source| CollectorError::Bind {
        addr: listen.to_string(),
        source,
    })?;
    info!("listening for a probe on {listen}");

    let (stream, peer) = listener.accept().context("accept failed")?;
    info!("probe connected from {peer}");

    let mut framer = Framer::bound(stream);
    let mut frames = 0u64;
    let mut bytes = 0u64;
    loop {
        if let Some(frame) = framer.read_frame() {
            frames += 1;
            bytes += frame.len() as u64;
            info!("frame {frames}: {} bytes", frame.len());
        } else if !framer.is_connected() {
            break;
        }
    }

    warn!("probe disconnected after {frames} frames ({bytes} bytes)");
    Ok(())
}
