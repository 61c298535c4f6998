//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pulsescope",
    about = "Sample hardware PMU counters and collect telemetry frames",
    after_help = "\
EXAMPLES:
    pulsescope counters                                Count instructions on this thread
    pulsescope counters --event cycles --duration 5    Five seconds of cycle counts
    pulsescope counters --export samples.json          Also write samples as JSON
    pulsescope collect --listen 127.0.0.1:7401         Receive frames from a probe"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open a hardware counter and print periodic readings
    Counters {
        /// Hardware event to count (cycles, instructions, cache-misses, ...)
        #[arg(long, default_value = "instructions")]
        event: String,

        /// Thread to attach to (0 = the calling thread)
        #[arg(long, default_value = "0")]
        tid: u32,

        /// Sampling interval in milliseconds
        #[arg(long, default_value = "100")]
        interval: u64,

        /// Stop after N seconds (0 = unlimited)
        #[arg(long, default_value = "10")]
        duration: u64,

        /// Export samples as JSON
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,

        /// Count kernel-mode events too (needs privileges)
        #[arg(long)]
        kernel: bool,
    },

    /// Accept one peer connection and decode length-prefixed frames
    Collect {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:7401")]
        listen: String,
    },
}
