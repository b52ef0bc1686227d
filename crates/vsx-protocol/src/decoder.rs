//! Status line classification and decoding
//!
//! Lines are classified by prefix against [`DISPATCH_TABLE`], which is
//! checked top to bottom. Zone-prefixed forms sit above any entry they could
//! otherwise be confused with.
//!
//! # Payload layout
//!
//! | Prefix  | Payload              | Event                      |
//! |---------|----------------------|----------------------------|
//! | `PWR`   | char 3               | `PowerChanged`             |
//! | `APR`   | char 3               | `ZonePowerChanged`         |
//! | `ZV`    | chars 2..5           | `ZoneVolumeChanged`        |
//! | `VOL`   | chars 3..6           | `VolumeChanged`            |
//! | `Z2MUT` | last char            | `ZoneMuteChanged`          |
//! | `MUT`   | last char            | `MuteChanged`              |
//! | `FN`    | chars 2..4           | `InputChanged`             |
//! | `Z2F`   | chars 3..5           | `ZoneInputChanged`         |
//! | `SR`    | chars 2..            | `ListeningModeCommandEcho` |
//! | `LM`    | chars 2.. (hex)      | `ListeningModeDisplay`     |
//! | `RGB`   | id 3..5, name 6..    | `InputNameLearned`         |
//!
//! Fixed-width slices are truncated at the end of the line rather than
//! rejected, so `ZV81` yields the payload `81`.

use std::collections::HashMap;

use crate::error::ParseError;
use crate::event::DecodedEvent;
use crate::framer::LineFramer;
use crate::tables;

/// How a classified line is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Power,
    ZonePower,
    ZoneVolume,
    Volume,
    ZoneMute,
    Mute,
    Input,
    ZoneInput,
    ListeningModeSet,
    ListeningModeDisplay,
    InputName,
    /// Recognized but carries nothing consumers act on
    Informational,
}

/// Prefix dispatch table, in priority order
pub const DISPATCH_TABLE: &[(&str, LineKind)] = &[
    ("PWR", LineKind::Power),
    ("APR", LineKind::ZonePower),
    ("ZV", LineKind::ZoneVolume),
    ("VOL", LineKind::Volume),
    ("Z2MUT", LineKind::ZoneMute),
    ("MUT", LineKind::Mute),
    ("FN", LineKind::Input),
    ("Z2F", LineKind::ZoneInput),
    ("SSA", LineKind::Informational),
    ("BPR", LineKind::Informational),
    ("SR", LineKind::ListeningModeSet),
    ("LM", LineKind::ListeningModeDisplay),
    ("FL", LineKind::Informational),
    ("RGB", LineKind::InputName),
    ("RGC", LineKind::Informational),
    ("RGF", LineKind::Informational),
];

/// Find the first dispatch entry whose prefix starts the line
pub fn classify(line: &str) -> Option<(&'static str, LineKind)> {
    DISPATCH_TABLE
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))
        .copied()
}

/// Display names the receiver reported for its input slots
///
/// Only written by decoding `RGB` lines; lives as long as the decoder that
/// owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnedInputNames {
    names: HashMap<u8, String>,
}

impl LearnedInputNames {
    /// Display name for an input, if the receiver has reported one
    pub fn get(&self, input: u8) -> Option<&str> {
        self.names.get(&input).map(String::as_str)
    }

    /// Number of inputs with a learned name
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no names have been learned yet
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over learned `(input, name)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    fn insert(&mut self, input: u8, name: String) {
        self.names.insert(input, name);
    }
}

/// Stateful status line decoder
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    learned: LearnedInputNames,
}

impl ResponseDecoder {
    /// Create a decoder with no learned input names
    pub fn new() -> Self {
        Self::default()
    }

    /// Input names learned so far
    pub fn learned_names(&self) -> &LearnedInputNames {
        &self.learned
    }

    /// Decode one framed line
    ///
    /// Returns `None` for empty lines, informational lines, and name reports
    /// for inputs that are not in the input table. Lines that match a prefix
    /// but fail to parse come back as `Unclassified`.
    pub fn decode(&mut self, line: &str) -> Option<DecodedEvent> {
        let Some((prefix, kind)) = classify(line) else {
            if line.is_empty() {
                return None;
            }
            tracing::debug!("Unclassified line: {:?}", line);
            return Some(DecodedEvent::Unclassified {
                line: line.to_string(),
            });
        };

        match self.decode_kind(prefix, kind, line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Failed to decode receiver line: {}", e);
                Some(DecodedEvent::Unclassified {
                    line: line.to_string(),
                })
            }
        }
    }

    fn decode_kind(
        &mut self,
        prefix: &'static str,
        kind: LineKind,
        line: &str,
    ) -> Result<Option<DecodedEvent>, ParseError> {
        let event = match kind {
            LineKind::Power => DecodedEvent::PowerChanged {
                on: line.as_bytes().get(3) == Some(&b'0'),
            },
            LineKind::ZonePower => DecodedEvent::ZonePowerChanged {
                on: line.as_bytes().get(3) == Some(&b'0'),
            },
            LineKind::ZoneVolume => {
                let level: i16 = parse_decimal(prefix, substr(line, 2, 3))?;
                DecodedEvent::ZoneVolumeChanged { db: level - 81 }
            }
            LineKind::Volume => {
                let level: i16 = parse_decimal(prefix, substr(line, 3, 3))?;
                DecodedEvent::VolumeChanged {
                    db: f64::from(level - 161) / 2.0,
                }
            }
            LineKind::ZoneMute => DecodedEvent::ZoneMuteChanged {
                on: line.ends_with('0'),
            },
            LineKind::Mute => DecodedEvent::MuteChanged {
                on: line.ends_with('0'),
            },
            LineKind::Input => {
                let input: u8 = parse_decimal(prefix, substr(line, 2, 2))?;
                DecodedEvent::InputChanged {
                    input,
                    name: self.learned.get(input).map(str::to_string),
                }
            }
            LineKind::ZoneInput => {
                let input: u8 = parse_decimal(prefix, substr(line, 3, 2))?;
                DecodedEvent::ZoneInputChanged {
                    input,
                    name: self.learned.get(input).map(str::to_string),
                }
            }
            LineKind::ListeningModeSet => {
                let mode: u16 = parse_decimal(prefix, substr(line, 2, usize::MAX))?;
                tracing::debug!("Listening mode set from remote: {}", mode);
                DecodedEvent::ListeningModeCommandEcho { mode }
            }
            LineKind::ListeningModeDisplay => {
                let payload = substr(line, 2, usize::MAX);
                let mode = match u16::from_str_radix(payload, 16) {
                    Ok(code) => {
                        let mode = tables::lookup_display_code(code);
                        match tables::listening_mode(mode) {
                            Some(m) if mode != tables::UNKNOWN_LISTENING_MODE => {
                                tracing::debug!(
                                    "Decoded display mode 0x{:x} into {} ({})",
                                    code,
                                    mode,
                                    m.name
                                );
                            }
                            _ => tracing::debug!("Unable to decode display mode 0x{:x}", code),
                        }
                        mode
                    }
                    Err(_) => {
                        tracing::debug!("Unable to decode display mode {:?}", payload);
                        tables::UNKNOWN_LISTENING_MODE
                    }
                };
                DecodedEvent::ListeningModeDisplay { mode }
            }
            LineKind::InputName => return Ok(self.learn_input_name(line)),
            LineKind::Informational => {
                tracing::trace!("Informational {} line: {:?}", prefix, line);
                return Ok(None);
            }
        };

        Ok(Some(event))
    }

    fn learn_input_name(&mut self, line: &str) -> Option<DecodedEvent> {
        let input = substr(line, 3, 2).parse::<u8>().ok()?;
        if !tables::is_known_input(input) {
            tracing::trace!("Ignoring name for unknown input {}", input);
            return None;
        }

        let name = substr(line, 6, usize::MAX).to_string();
        tracing::debug!("Learned name for input {}: {:?}", input, name);
        self.learned.insert(input, name.clone());
        Some(DecodedEvent::InputNameLearned { input, name })
    }
}

/// Framer and decoder combined into a single streaming codec
#[derive(Debug, Default)]
pub struct ReceiverCodec {
    framer: LineFramer,
    decoder: ResponseDecoder,
}

impl ReceiverCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self::default()
    }

    /// Push raw bytes received from the receiver
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.framer.push_bytes(data);
    }

    /// Decode the next complete line that produces an event
    pub fn next_event(&mut self) -> Option<DecodedEvent> {
        self.next_event_with_line().map(|(event, _)| event)
    }

    /// Decode the next event along with the line it came from
    ///
    /// Lines that decode to nothing are consumed and skipped.
    pub fn next_event_with_line(&mut self) -> Option<(DecodedEvent, String)> {
        while let Some(line) = self.framer.next_line() {
            if let Some(event) = self.decoder.decode(&line) {
                return Some((event, line));
            }
        }
        None
    }

    /// Input names learned so far
    pub fn learned_names(&self) -> &LearnedInputNames {
        self.decoder.learned_names()
    }

    /// Discard partially framed bytes; learned names are kept
    pub fn clear(&mut self) {
        self.framer.clear();
    }
}

/// Up to `len` characters starting at byte offset `start`, truncated at the
/// end of the line
fn substr(line: &str, start: usize, len: usize) -> &str {
    let Some(rest) = line.get(start..) else {
        return "";
    };
    match rest.char_indices().nth(len) {
        Some((end, _)) => &rest[..end],
        None => rest,
    }
}

fn parse_decimal<T: std::str::FromStr>(prefix: &'static str, payload: &str) -> Result<T, ParseError> {
    if payload.is_empty() {
        return Err(ParseError::MissingPayload { prefix });
    }
    payload.parse::<T>().map_err(|_| ParseError::InvalidNumber {
        prefix,
        payload: payload.to_string(),
    })
}
