//! Minimal probe-side sender: connects to a running `pulsescope collect`
//! and writes a handful of length-prefixed frames.
//!
//! Run the collector first, then:
//!
//! ```bash
//! cargo run --example frame-sender -- 127.0.0.1:7401
//! ```

use std::io::Write;
use std::net::TcpStream;

use anyhow::{Context, Result};
use pulsescope_common::wire::encode_frame_header;

fn main() -> Result<()> {
    let addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:7401".to_string());
    let mut stream =
        TcpStream::connect(&addr).with_context(|| format!("failed to connect to {addr}"))?;

    for (i, payload) in
        [b"hello".as_slice(), b"", b"a somewhat longer telemetry payload"].iter().enumerate()
    {
        stream.write_all(&encode_frame_header(payload.len() as u64))?;
        stream.write_all(payload)?;
        println!("sent frame {i}: {} bytes", payload.len());
    }
    Ok(())
}
