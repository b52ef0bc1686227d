//! Decoded receiver status events

use std::fmt;

use crate::command::Query;
use crate::tables;

/// A status line from the receiver, decoded into a typed event
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodedEvent {
    /// Main zone power state (`PWR`)
    PowerChanged { on: bool },
    /// Zone 2 power state (`APR`)
    ZonePowerChanged { on: bool },
    /// Main zone volume in dB, in half-dB steps (`VOL`)
    VolumeChanged { db: f64 },
    /// Zone 2 volume in whole dB (`ZV`)
    ZoneVolumeChanged { db: i16 },
    /// Main zone mute state (`MUT`)
    MuteChanged { on: bool },
    /// Zone 2 mute state (`Z2MUT`)
    ZoneMuteChanged { on: bool },
    /// Main zone input, with the receiver's display name if already learned (`FN`)
    InputChanged { input: u8, name: Option<String> },
    /// Zone 2 input, with the receiver's display name if already learned (`Z2F`)
    ZoneInputChanged { input: u8, name: Option<String> },
    /// The receiver reported a display name for an input slot (`RGB`)
    InputNameLearned { input: u8, name: String },
    /// Echo of a listening mode set from the remote (`SR`)
    ListeningModeCommandEcho { mode: u16 },
    /// The listening mode currently shown on the display (`LM`)
    ///
    /// `mode` is [`UNKNOWN_LISTENING_MODE`](tables::UNKNOWN_LISTENING_MODE)
    /// when the display code is not in the table.
    ListeningModeDisplay { mode: u16 },
    /// Any non-empty line that is not a recognized status line
    Unclassified { line: String },
}

impl DecodedEvent {
    /// Observer name this event is published under
    pub fn name(&self) -> EventName {
        match self {
            DecodedEvent::PowerChanged { .. } => EventName::Power,
            DecodedEvent::ZonePowerChanged { .. } => EventName::ZonePower,
            DecodedEvent::VolumeChanged { .. } => EventName::Volume,
            DecodedEvent::ZoneVolumeChanged { .. } => EventName::ZoneVolume,
            DecodedEvent::MuteChanged { .. } => EventName::Mute,
            DecodedEvent::ZoneMuteChanged { .. } => EventName::ZoneMute,
            DecodedEvent::InputChanged { .. } => EventName::Input,
            DecodedEvent::ZoneInputChanged { .. } => EventName::ZoneInput,
            DecodedEvent::InputNameLearned { .. } => EventName::InputName,
            DecodedEvent::ListeningModeCommandEcho { .. } => EventName::ListeningModeSet,
            DecodedEvent::ListeningModeDisplay { .. } => EventName::ListeningModeDisplay,
            DecodedEvent::Unclassified { .. } => EventName::Data,
        }
    }

    /// Query the session must send after publishing this event
    ///
    /// An `SR` line only echoes a remote key press, so the display mode has
    /// to be asked for again to learn what the receiver actually selected.
    pub fn follow_up(&self) -> Option<Query> {
        match self {
            DecodedEvent::ListeningModeCommandEcho { .. } => Some(Query::ListeningModeDisplay),
            _ => None,
        }
    }

    /// Listening mode name for `SR`/`LM` events, if the ordinal is known
    pub fn listening_mode_name(&self) -> Option<&'static str> {
        match self {
            DecodedEvent::ListeningModeCommandEcho { mode }
            | DecodedEvent::ListeningModeDisplay { mode } => {
                tables::listening_mode(*mode).map(|m| m.name)
            }
            _ => None,
        }
    }
}

/// Names observers subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventName {
    /// Transport connected and initial status requested
    Connect,
    /// Transport closed by the peer
    End,
    /// Transport failure
    Error,
    Power,
    ZonePower,
    Volume,
    ZoneVolume,
    Mute,
    ZoneMute,
    Input,
    ZoneInput,
    InputName,
    ListeningModeSet,
    ListeningModeDisplay,
    /// Unclassified line
    Data,
}

impl EventName {
    /// Wire-facing name, as used by existing consumers
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Connect => "connect",
            EventName::End => "end",
            EventName::Error => "error",
            EventName::Power => "power",
            EventName::ZonePower => "zpower",
            EventName::Volume => "volume",
            EventName::ZoneVolume => "zvolume",
            EventName::Mute => "mute",
            EventName::ZoneMute => "zmute",
            EventName::Input => "input",
            EventName::ZoneInput => "zinput",
            EventName::InputName => "inputName",
            EventName::ListeningModeSet => "listening_mode_set",
            EventName::ListeningModeDisplay => "listening_mode_display",
            EventName::Data => "data",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
