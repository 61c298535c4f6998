//! End-to-end framing over real loopback sockets.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use pulsescope::transport::{Frame, Framer};
use pulsescope_common::wire::encode_frame_header;

fn frame_bytes(payload: &[u8]) -> Vec<u8> {
    let mut bytes = encode_frame_header(payload.len() as u64).to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// Drive the framer until it emits a frame or disconnects.
fn next_frame<S: std::io::Read>(framer: &mut Framer<S>) -> Option<Frame> {
    loop {
        if let Some(frame) = framer.read_frame() {
            return Some(frame);
        }
        if !framer.is_connected() {
            return None;
        }
    }
}

#[test]
fn frames_survive_arbitrary_tcp_chunking() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let sender = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        let payload: Vec<u8> = (0u16..3000).map(|i| (i % 251) as u8).collect();
        // Dribble the frame out in small odd-sized chunks.
        for chunk in frame_bytes(&payload).chunks(7) {
            stream.write_all(chunk).unwrap();
        }
        payload
    });

    let (stream, _) = listener.accept().unwrap();
    let mut framer = Framer::bound(stream);
    let frame = next_frame(&mut framer).expect("sender delivered a complete frame");
    let payload = sender.join().unwrap();
    assert_eq!(frame.payload(), &payload[..]);
}

#[test]
fn borrowed_stream_leaves_ownership_with_caller() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let sender = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(&frame_bytes(b"borrowed")).unwrap();
        stream.write_all(&frame_bytes(b"")).unwrap();
        // Closing the stream ends the session.
    });

    let (stream, _) = listener.accept().unwrap();
    // The framer only borrows; the stream stays usable by the caller after.
    let mut framer = Framer::bound(&stream);
    assert_eq!(next_frame(&mut framer).unwrap().payload(), b"borrowed");
    assert!(next_frame(&mut framer).unwrap().is_empty());
    // Peer closed: the framer parks itself instead of erroring repeatedly.
    assert!(next_frame(&mut framer).is_none());
    assert!(!framer.is_connected());
    assert!(framer.read_frame().is_none());

    sender.join().unwrap();
    drop(stream);
}

#[test]
fn nonblocking_stall_is_absorbed_silently() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (go_tx, go_rx) = mpsc::channel::<()>();

    let sender = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        // Hold off writing until the collector has observed the stall.
        go_rx.recv().unwrap();
        stream.write_all(&frame_bytes(b"eventually")).unwrap();
        stream
    });

    let (stream, _) = listener.accept().unwrap();
    stream.set_nonblocking(true).unwrap();
    let mut framer = Framer::bound(stream);

    // Nothing sent yet: WouldBlock must read as "try later", not an error.
    assert!(framer.read_frame().is_none());
    assert!(framer.is_connected());

    go_tx.send(()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    let frame = loop {
        if let Some(frame) = framer.read_frame() {
            break frame;
        }
        assert!(framer.is_connected(), "stall escalated to disconnect");
        assert!(Instant::now() < deadline, "frame never arrived");
        thread::sleep(Duration::from_millis(5));
    };
    assert_eq!(frame.payload(), b"eventually");
    sender.join().unwrap();
}
