//! Carriage-return line framing
//!
//! Reassembles protocol lines from an arbitrarily chunked byte stream. Chunk
//! boundaries carry no meaning; a line is complete only once its `\r`
//! terminator arrives.

use crate::command::TERMINATOR;

/// Unterminated bytes tolerated before the buffer is discarded
const MAX_BUFFERED: usize = 1024;

/// Streaming line framer
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Dropping the rest of an overlong line until its terminator
    discarding: bool,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(128),
            discarding: false,
        }
    }

    /// Push raw bytes into the framer's buffer
    ///
    /// An unterminated run longer than the buffer limit is dropped whole,
    /// along with everything up to its eventual terminator, so no fragment of
    /// it is ever returned as a line.
    pub fn push_bytes(&mut self, data: &[u8]) {
        let data = if self.discarding {
            match data.iter().position(|&b| b == TERMINATOR) {
                Some(pos) => {
                    self.discarding = false;
                    &data[pos + 1..]
                }
                None => return,
            }
        } else {
            data
        };

        self.buffer.extend_from_slice(data);

        if self.buffer.len() > MAX_BUFFERED && !self.buffer.contains(&TERMINATOR) {
            tracing::warn!("Discarding {} unterminated bytes", self.buffer.len());
            self.buffer.clear();
            self.discarding = true;
        }
    }

    /// Take the next complete line, without its terminator
    pub fn next_line(&mut self) -> Option<String> {
        self.next_line_with_bytes().map(|(line, _)| line)
    }

    /// Take the next complete line along with the raw bytes it was framed from
    pub fn next_line_with_bytes(&mut self) -> Option<(String, Vec<u8>)> {
        let term_pos = self.buffer.iter().position(|&b| b == TERMINATOR)?;
        let raw: Vec<u8> = self.buffer.drain(..=term_pos).collect();

        // A `\n` after the previous `\r` belongs to a CRLF terminator
        let body = &raw[..raw.len() - 1];
        let body = body.strip_prefix(b"\n").unwrap_or(body);

        Some((String::from_utf8_lossy(body).into_owned(), raw))
    }

    /// Bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all buffered bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_chunks() {
        let mut framer = LineFramer::new();

        framer.push_bytes(b"PWR0\rMU");
        assert_eq!(framer.next_line().as_deref(), Some("PWR0"));
        assert!(framer.next_line().is_none());

        framer.push_bytes(b"T0\r");
        assert_eq!(framer.next_line().as_deref(), Some("MUT0"));
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_partial_fragment_held_back() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"VOL1");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.pending(), 4);

        framer.push_bytes(b"21\r");
        assert_eq!(framer.next_line().as_deref(), Some("VOL121"));
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_crlf_terminators() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"PWR0\r\nMUT1\r\n");
        assert_eq!(framer.next_line().as_deref(), Some("PWR0"));
        assert_eq!(framer.next_line().as_deref(), Some("MUT1"));
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_empty_lines() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"\r\r");
        assert_eq!(framer.next_line().as_deref(), Some(""));
        assert_eq!(framer.next_line().as_deref(), Some(""));
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_raw_bytes_include_terminator() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"FN04\r");
        let (line, raw) = framer.next_line_with_bytes().unwrap();
        assert_eq!(line, "FN04");
        assert_eq!(raw, b"FN04\r");
    }

    #[test]
    fn test_clear_resets_state() {
        let mut framer = LineFramer::new();
        framer.push_bytes(b"PWR");
        framer.clear();
        framer.push_bytes(b"MUT0\r");
        assert_eq!(framer.next_line().as_deref(), Some("MUT0"));
    }

    #[test]
    fn test_overflow_drops_whole_line() {
        let mut framer = LineFramer::new();
        framer.push_bytes(&vec![b'X'; MAX_BUFFERED + 10]);
        assert_eq!(framer.pending(), 0);

        framer.push_bytes(b"\rPWR1\r");
        assert_eq!(framer.next_line().as_deref(), Some("PWR1"));
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_overflow_tail_never_decoded() {
        let mut framer = LineFramer::new();
        let mut junk = vec![b'X'; MAX_BUFFERED];
        junk.extend_from_slice(b"PWR0");
        framer.push_bytes(&junk);

        // Rest of the overlong line, which looks like a status line on its own
        framer.push_bytes(b"PWR0PWR0");
        assert_eq!(framer.pending(), 0);

        framer.push_bytes(b"PWR0\r\nMUT1\r");
        assert_eq!(framer.next_line().as_deref(), Some("MUT1"));
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_clear_stops_discarding() {
        let mut framer = LineFramer::new();
        framer.push_bytes(&vec![b'X'; MAX_BUFFERED + 1]);
        framer.clear();

        framer.push_bytes(b"FN04\r");
        assert_eq!(framer.next_line().as_deref(), Some("FN04"));
    }
}
