//! Line I/O with the rates server.
//!
//! `CommandSender` writes one command per line; `receive_loop` prints whatever the
//! server pushes until the connection closes.
use log::{debug, info};
use rates_common::Result;
use std::io::{BufRead, BufReader, Read, Write};

/// Helper type for sending commands to the server.
pub struct CommandSender;

impl CommandSender {
    /// Send `line` newline-terminated. Blank lines are skipped.
    pub fn send_line<W: Write>(stream: &mut W, line: &str) -> Result<bool> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Ok(false);
        }
        debug!("Sending command: {}", line);
        stream.write_all(line.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(true)
    }

    /// Forward every line of `input` to `stream` until `input` ends.
    pub fn forward<R: BufRead, W: Write>(input: R, stream: &mut W) -> Result<usize> {
        let mut sent = 0;
        for line in input.lines() {
            if Self::send_line(stream, &line?)? {
                sent += 1;
            }
        }
        Ok(sent)
    }
}

/// Copy server lines from `stream` to `out` until the server closes the connection.
pub fn receive_loop<R: Read, W: Write>(stream: R, out: &mut W) -> Result<usize> {
    let mut received = 0;
    for line in BufReader::new(stream).lines() {
        writeln!(out, "{}", line?)?;
        out.flush()?;
        received += 1;
    }
    info!("Server closed the connection after {} line(s)", received);
    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn forwards_non_blank_lines() {
        let mut wire = Vec::new();
        let sent = CommandSender::forward(Cursor::new("exchange\n\necd 3\r\n"), &mut wire).unwrap();
        assert_eq!(sent, 2);
        assert_eq!(wire, b"exchange\necd 3\n");
    }

    #[test]
    fn prints_received_lines() {
        let mut out = Vec::new();
        let received = receive_loop(Cursor::new("a\nb\n"), &mut out).unwrap();
        assert_eq!(received, 2);
        assert_eq!(out, b"a\nb\n");
    }
}
