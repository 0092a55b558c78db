//! Per-connection session.
//!
//! Each accepted TCP stream runs on its own thread through the states
//! `Connecting -> Registered -> (Processing)* -> Closing -> Closed`:
//!
//! - On connect the client gets a random label and a delivery channel, a writer thread
//!   is started for the channel, and the connection is registered.
//! - While registered the session blocks on the next inbound line; only this thread
//!   waits, the registry and other sessions are untouched.
//! - On EOF, a read error, or invalid UTF-8 the `Registration` guard is dropped, which
//!   unregisters the connection on every exit path, and the writer drains and exits.
//! - A client whose bounded outbound queue fills up is evicted by the registry, which
//!   shuts its socket down and so ends the read loop as well.
use crate::dispatcher::{BroadcastServer, Outcome};
use crate::model::label::next_label;
use crate::model::registry::{Connection, OUTBOUND_CAPACITY};
use crossbeam_channel::{Receiver, bounded};
use log::{debug, error, info};
use rates_common::{RatesError, Result};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;

/// Writer loop for a single client.
///
/// Forwards every queued line to `stream`, newline-terminated, until the channel
/// closes (all handles dropped) or a write fails. A failed write drops `lines`, so
/// later broadcasts to this client fail fast and evict it.
pub fn write_loop<W: Write>(stream: W, lines: Receiver<String>) -> Result<()> {
    let mut out = BufWriter::new(stream);
    for line in lines.iter() {
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        if lines.is_empty() {
            out.flush()?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Strip the line terminator, nothing else.
fn trim_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Serve one client until it disconnects.
pub fn run_session(stream: TcpStream, server: Arc<BroadcastServer>) -> Result<()> {
    let peer = stream.peer_addr()?;
    let label = next_label();
    let (tx, rx) = bounded::<String>(OUTBOUND_CAPACITY);

    let write_half = stream.try_clone()?;
    let writer_label = label.clone();
    let writer = thread::Builder::new()
        .name(format!("writer-{peer}"))
        .spawn(move || {
            if let Err(e) = write_loop(write_half, rx) {
                error!("Write to {} failed: {}", writer_label, e);
            }
        })?;

    let conn = server
        .registry()
        .connection(label.clone(), Some(peer), tx)
        .with_stream(stream.try_clone()?);
    let registration = server.registry().enter(conn.clone());
    info!("{} connected from {}", label, peer);

    let result = read_loop(&stream, &conn, &server);

    drop(registration);
    // Last live sender for this client; the writer stops once the queue is drained.
    drop(conn);
    if writer.join().is_err() {
        error!("Writer thread for {} panicked", label);
    }
    let _ = stream.shutdown(Shutdown::Both);
    match &result {
        Ok(()) => info!("{} disconnected", label),
        Err(e) => info!("{} dropped: {}", label, e),
    }
    result
}

fn read_loop(
    stream: &TcpStream,
    conn: &Connection,
    server: &BroadcastServer,
) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8(std::mem::take(&mut buf)).map_err(RatesError::from)?;
        let message = trim_terminator(&line);
        match server.handle(conn, message) {
            Outcome::Broadcast { lines, recipients } => {
                debug!("{} -> {} line(s) to {} client(s)", conn.label(), lines, recipients)
            }
            Outcome::Replied | Outcome::Ignored => {}
        }
    }
}
