//! Frame cursor state machine
//!
//! [`Framer`] pulls bytes from a bound source into its buffer and advances a
//! three-state cursor: reading the fixed 8-byte header, reading the declared
//! body, or disconnected. Each `read_frame` call yields at most one complete
//! frame; running short of bytes is not an error, it simply yields nothing
//! until the caller tries again.
//!
//! A hard source failure or a header declaring an impossible length both
//! force the disconnected state: once a length field cannot be trusted the
//! stream cannot be realigned, so local recovery is never attempted. Only
//! [`Framer::reset`] leaves the disconnected state.

use std::io::{self, Read};

use bytes::Bytes;
use log::{debug, warn};
use pulsescope_common::wire::{
    parse_frame_header, FRAME_BUFFER_CAPACITY, FRAME_HEADER_LEN, MAX_PAYLOAD_LEN,
};

use super::buffer::FrameBuffer;

/// One complete protocol data unit, owned by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Where the cursor currently sits in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Expecting the fixed-size length prefix
    Header,
    /// Expecting the body the last header declared
    Body,
    /// No usable source; terminal until rebound
    Disconnected,
}

/// Outcome of one read attempt for the current phase.
enum ReadStatus {
    /// The buffer holds exactly the bytes this phase expects
    Complete,
    /// Fewer bytes than expected are available right now
    Partial,
    /// The source reported a hard failure
    Error,
}

/// Streaming frame decoder over any byte source.
///
/// The framer owns its buffer but not the source: bind a `&TcpStream` or
/// `&mut R` to keep ownership with the caller. Not reentrant; drive one
/// instance from one logical thread of control at a time.
#[derive(Debug)]
pub struct Framer<S> {
    source: Option<S>,
    buffer: FrameBuffer,
    cursor: Cursor,
    /// Total bytes the current phase expects in the buffer; positive
    /// whenever the cursor is not disconnected
    expected: usize,
}

impl<S: Read> Framer<S> {
    /// Unbound framer; disconnected until [`reset`](Self::reset) binds a
    /// source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            buffer: FrameBuffer::with_capacity(FRAME_BUFFER_CAPACITY),
            cursor: Cursor::Disconnected,
            expected: 0,
        }
    }

    /// Framer bound to `source`, ready to read a header.
    #[must_use]
    pub fn bound(source: S) -> Self {
        let mut framer = Self::new();
        framer.reset(Some(source));
        framer
    }

    /// Whether a source is bound and the stream is still believed healthy.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.cursor != Cursor::Disconnected
    }

    /// Advance the state machine with whatever bytes are available now.
    ///
    /// Returns one complete frame, or `None` when no frame is ready: either
    /// more bytes are needed (try again later) or the framer is
    /// disconnected (check [`is_connected`](Self::is_connected)). At most
    /// one frame is emitted per call even if more bytes are buffered in the
    /// source.
    pub fn read_frame(&mut self) -> Option<Frame> {
        loop {
            match self.cursor {
                Cursor::Disconnected => return None,
                Cursor::Header => match self.fill() {
                    ReadStatus::Partial => return None,
                    ReadStatus::Error => {
                        self.disconnect();
                        return None;
                    }
                    ReadStatus::Complete => {
                        if !self.begin_body() {
                            return None;
                        }
                        // Re-enter the loop: the body may already be
                        // satisfiable, a zero-length one trivially so.
                    }
                },
                Cursor::Body => match self.fill() {
                    ReadStatus::Partial => return None,
                    ReadStatus::Error => {
                        self.disconnect();
                        return None;
                    }
                    ReadStatus::Complete => {
                        let frame = Frame { payload: self.buffer.take() };
                        self.cursor = Cursor::Header;
                        self.expected = FRAME_HEADER_LEN;
                        return Some(frame);
                    }
                },
            }
        }
    }

    /// Discard any in-flight partial frame and rebind or unbind the source.
    ///
    /// Always clears the buffer. With a source the framer re-enters the
    /// header phase; without one it is disconnected. Works from any prior
    /// state and is the only way out of disconnection.
    pub fn reset(&mut self, source: Option<S>) {
        self.source = source;
        self.buffer.reset();
        if self.source.is_some() {
            self.cursor = Cursor::Header;
            self.expected = FRAME_HEADER_LEN;
        } else {
            self.cursor = Cursor::Disconnected;
            self.expected = 0;
        }
    }

    /// Parse the buffered header and switch to the body phase.
    ///
    /// Returns false when the declared length is a protocol violation, in
    /// which case the framer has disconnected.
    fn begin_body(&mut self) -> bool {
        let mut header = [0u8; FRAME_HEADER_LEN];
        header.copy_from_slice(self.buffer.as_slice());
        let declared = parse_frame_header(&header);

        if declared > MAX_PAYLOAD_LEN as u64 {
            warn!(
                "frame header declares {declared} byte body, limit is {MAX_PAYLOAD_LEN}; \
                 stream alignment lost, disconnecting"
            );
            self.disconnect();
            return false;
        }

        self.buffer.reset();
        #[allow(clippy::cast_possible_truncation)]
        {
            self.expected = declared as usize;
        }
        self.cursor = Cursor::Body;
        true
    }

    /// One read attempt toward the current phase's expected byte count.
    fn fill(&mut self) -> ReadStatus {
        let want = self.expected - self.buffer.len();
        if want == 0 {
            return ReadStatus::Complete;
        }
        let Some(source) = self.source.as_mut() else {
            return ReadStatus::Error;
        };
        match self.buffer.fill_from(source, want) {
            // A clean zero-byte read is the peer closing the stream
            Ok(0) => ReadStatus::Error,
            Ok(n) if n == want => ReadStatus::Complete,
            Ok(_) => ReadStatus::Partial,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                ReadStatus::Partial
            }
            Err(e) => {
                debug!("source read failed: {e}");
                ReadStatus::Error
            }
        }
    }

    /// Escalate a fatal condition: notify once, drop the binding, park the
    /// cursor. Reconnection policy belongs to the caller.
    fn disconnect(&mut self) {
        warn!("frame source disconnected; framer parked until reset");
        self.source = None;
        self.buffer.reset();
        self.cursor = Cursor::Disconnected;
        self.expected = 0;
    }
}

impl<S: Read> Default for Framer<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsescope_common::wire::encode_frame_header;
    use std::collections::VecDeque;

    /// Scripted byte source: replays data chunks, transient stalls, EOF and
    /// hard failures in order.
    enum Step {
        Data(Vec<u8>),
        Stall,
        Fail,
    }

    struct Script {
        steps: VecDeque<Step>,
    }

    impl Script {
        fn new(steps: Vec<Step>) -> Self {
            Self { steps: steps.into_iter().collect() }
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                Some(Step::Data(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        chunk.drain(..n);
                        self.steps.push_front(Step::Data(chunk));
                    }
                    Ok(n)
                }
                Some(Step::Stall) => Err(io::Error::from(io::ErrorKind::WouldBlock)),
                Some(Step::Fail) => Err(io::Error::from(io::ErrorKind::ConnectionReset)),
                None => Ok(0), // peer closed
            }
        }
    }

    fn frame_bytes(payload: &[u8]) -> Vec<u8> {
        let mut bytes = encode_frame_header(payload.len() as u64).to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn whole_frame_in_one_chunk() {
        let source = Script::new(vec![Step::Data(frame_bytes(b"sample"))]);
        let mut framer = Framer::bound(source);
        let frame = framer.read_frame().expect("complete frame available");
        assert_eq!(frame.payload(), b"sample");
        assert!(framer.is_connected());
    }

    #[test]
    fn zero_length_body_yields_one_empty_frame() {
        let source = Script::new(vec![Step::Data(encode_frame_header(0).to_vec())]);
        let mut framer = Framer::bound(source);
        let frame = framer.read_frame().expect("empty frame is a valid frame");
        assert!(frame.is_empty());
        // Exactly one: the next call has nothing to deliver.
        assert!(framer.read_frame().is_none());
    }

    #[test]
    fn byte_at_a_time_delivery_reassembles_payload() {
        let payload = b"one byte at a time";
        let mut steps = Vec::new();
        for byte in frame_bytes(payload) {
            steps.push(Step::Data(vec![byte]));
            steps.push(Step::Stall);
        }
        let mut framer = Framer::bound(Script::new(steps));

        let mut frames = Vec::new();
        // Drive until the scripted stream would report EOF.
        for _ in 0..(frame_bytes(payload).len() * 2 + 1) {
            if let Some(frame) = framer.read_frame() {
                frames.push(frame);
            }
            if !framer.is_connected() {
                break;
            }
        }
        assert_eq!(frames.len(), 1, "chunk boundaries must not split or duplicate frames");
        assert_eq!(frames[0].payload(), payload);
    }

    #[test]
    fn back_to_back_frames_emit_one_per_call() {
        let mut bytes = frame_bytes(b"first");
        bytes.extend_from_slice(&frame_bytes(b"second"));
        let mut framer = Framer::bound(Script::new(vec![Step::Data(bytes)]));

        assert_eq!(framer.read_frame().unwrap().payload(), b"first");
        assert_eq!(framer.read_frame().unwrap().payload(), b"second");
        assert!(framer.read_frame().is_none());
    }

    #[test]
    fn oversized_header_disconnects_and_stays_down() {
        let huge = encode_frame_header((MAX_PAYLOAD_LEN + 1) as u64).to_vec();
        let mut framer = Framer::bound(Script::new(vec![Step::Data(huge)]));

        assert!(framer.read_frame().is_none());
        assert!(!framer.is_connected());
        // Terminal until reset: repeated calls keep yielding nothing.
        assert!(framer.read_frame().is_none());
        assert!(framer.read_frame().is_none());
    }

    #[test]
    fn max_payload_exactly_at_capacity_is_legal() {
        let payload = vec![0xabu8; MAX_PAYLOAD_LEN];
        let mut framer = Framer::bound(Script::new(vec![Step::Data(frame_bytes(&payload))]));
        let frame = framer.read_frame().expect("capacity-sized frame is legal");
        assert_eq!(frame.len(), MAX_PAYLOAD_LEN);
        assert!(framer.is_connected());
    }

    #[test]
    fn hard_error_mid_body_disconnects_until_reset() {
        let mut bytes = encode_frame_header(8).to_vec();
        bytes.extend_from_slice(b"half"); // 4 of 8 body bytes, then reset by peer
        let mut framer = Framer::bound(Script::new(vec![Step::Data(bytes), Step::Fail]));

        assert!(framer.read_frame().is_none());
        assert!(!framer.is_connected());
        assert!(framer.read_frame().is_none());
        assert!(framer.read_frame().is_none());

        // Rearm with a fresh source: header parsing starts from zero bytes,
        // the half-read body is gone.
        framer.reset(Some(Script::new(vec![Step::Data(frame_bytes(b"fresh"))])));
        assert!(framer.is_connected());
        assert_eq!(framer.read_frame().unwrap().payload(), b"fresh");
    }

    #[test]
    fn peer_close_mid_header_disconnects() {
        // Three header bytes then EOF.
        let mut framer =
            Framer::bound(Script::new(vec![Step::Data(vec![0, 0, 0])]));
        assert!(framer.read_frame().is_none()); // partial header buffered
        assert!(framer.is_connected());
        assert!(framer.read_frame().is_none()); // EOF -> disconnect
        assert!(!framer.is_connected());
    }

    #[test]
    fn reset_table() {
        // reset(None) from any state yields Disconnected.
        let mut framer: Framer<Script> = Framer::bound(Script::new(vec![]));
        assert!(framer.is_connected());
        framer.reset(None);
        assert!(!framer.is_connected());
        assert!(framer.read_frame().is_none());

        // reset(Some) from Disconnected yields a clean header phase.
        framer.reset(Some(Script::new(vec![Step::Data(frame_bytes(b"x"))])));
        assert!(framer.is_connected());
        assert_eq!(framer.read_frame().unwrap().payload(), b"x");

        // reset(Some) mid-body discards the partial frame entirely.
        let mut partial = encode_frame_header(100).to_vec();
        partial.extend_from_slice(&[1, 2, 3]);
        let mut framer = Framer::bound(Script::new(vec![Step::Data(partial), Step::Stall]));
        assert!(framer.read_frame().is_none());
        framer.reset(Some(Script::new(vec![Step::Data(frame_bytes(b"clean"))])));
        assert_eq!(framer.read_frame().unwrap().payload(), b"clean");
    }

    #[test]
    fn stall_is_not_a_state_change() {
        let source = Script::new(vec![
            Step::Stall,
            Step::Data(frame_bytes(b"late")),
        ]);
        let mut framer = Framer::bound(source);
        assert!(framer.read_frame().is_none());
        assert!(framer.is_connected());
        assert_eq!(framer.read_frame().unwrap().payload(), b"late");
    }
}
