//! Command intents and their wire encoding
//!
//! A [`CommandIntent`] is what a caller wants the receiver to do. Encoding is
//! pure and never fails: out-of-range numeric values are clamped to the
//! nearest valid wire value.

use crate::tables::{HmgButton, INPUTS};
use crate::EncodeCommand;

/// Line terminator for both directions
pub const TERMINATOR: u8 = b'\r';

/// Lowest main-zone volume in dB that still encodes above mute level
pub const VOLUME_MIN_DB: f64 = -80.0;
/// Highest main-zone volume in dB
pub const VOLUME_MAX_DB: f64 = 12.0;
/// Highest main-zone wire level (+12 dB)
pub const VOLUME_MAX_LEVEL: u8 = 185;
/// Highest zone 2 volume in dB
pub const ZONE_VOLUME_MAX_DB: f64 = 0.0;
/// Highest zone 2 wire level (0 dB)
pub const ZONE_VOLUME_MAX_LEVEL: u8 = 81;

/// Volume step direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// One step louder
    Up,
    /// One step quieter
    Down,
}

/// Status queries the receiver answers with a single status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Query {
    /// `?P` - main zone power
    Power,
    /// `?V` - main zone volume
    Volume,
    /// `?ZV` - zone 2 volume
    ZoneVolume,
    /// `?AP` - zone 2 power
    ZonePower,
    /// `?M` - main zone mute
    Mute,
    /// `?Z2M` - zone 2 mute
    ZoneMute,
    /// `?F` - selected input
    Input,
    /// `?L` - display listening mode
    ListeningModeDisplay,
    /// `?RGBnn` - display name of an input slot
    InputName(u8),
}

/// Queries issued by a bulk status refresh, in wire order
pub const STATUS_QUERIES: [Query; 8] = [
    Query::Power,
    Query::Volume,
    Query::ZoneVolume,
    Query::ZonePower,
    Query::Mute,
    Query::ZoneMute,
    Query::Input,
    Query::ListeningModeDisplay,
];

impl Query {
    fn as_line(&self) -> String {
        match self {
            Query::Power => "?P".to_string(),
            Query::Volume => "?V".to_string(),
            Query::ZoneVolume => "?ZV".to_string(),
            Query::ZonePower => "?AP".to_string(),
            Query::Mute => "?M".to_string(),
            Query::ZoneMute => "?Z2M".to_string(),
            Query::Input => "?F".to_string(),
            Query::ListeningModeDisplay => "?L".to_string(),
            Query::InputName(id) => format!("?RGB{:02}", id),
        }
    }
}

impl EncodeCommand for Query {
    fn encode(&self) -> Vec<u8> {
        terminated(self.as_line())
    }
}

impl EncodeCommand for HmgButton {
    fn encode(&self) -> Vec<u8> {
        terminated(format!("{:02}NW", self.code()))
    }
}

/// A high-level request to the receiver
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandIntent {
    /// Main zone power on/off
    PowerSet { on: bool },
    /// Zone 2 power on/off
    ZonePowerSet { on: bool },
    /// Main zone mute on/off
    MuteSet { on: bool },
    /// Zone 2 mute on/off
    ZoneMuteSet { on: bool },
    /// Main zone volume in dB (-80..=+12); `None` encodes the minimum level
    VolumeSet { db: Option<f64> },
    /// Zone 2 volume in dB (-80..=0); `None` encodes the minimum level
    ZoneVolumeSet { db: Option<f64> },
    /// Step main zone volume
    VolumeStep { direction: Direction },
    /// Step zone 2 volume
    ZoneVolumeStep { direction: Direction },
    /// Select main zone input
    InputSelect { input: u8 },
    /// Select zone 2 input
    ZoneInputSelect { input: u8 },
    /// Select a listening mode by ordinal
    ListeningModeSelect { mode: u16 },
    /// Ask for an input's display name
    InputNameQuery { input: u8 },
    /// Press a home media gallery button
    HmgButton { button: HmgButton },
    /// Refresh every status value and all input names
    BulkStatusQuery,
    /// A single status query
    Query(Query),
}

/// Wire lines produced by encoding one [`CommandIntent`]
///
/// `lines` are written immediately and in order. `staggered` lines must be
/// spread out in time by the sender so the receiver's command buffer is not
/// flooded; only a bulk status query produces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedCommand {
    /// Lines to write now, each terminated
    pub lines: Vec<Vec<u8>>,
    /// Lines to write one interval apart, each terminated
    pub staggered: Vec<Vec<u8>>,
}

impl EncodedCommand {
    fn single(line: Vec<u8>) -> Self {
        Self {
            lines: vec![line],
            staggered: Vec::new(),
        }
    }
}

impl CommandIntent {
    /// Encode this intent into wire lines
    pub fn encode(&self) -> EncodedCommand {
        match self {
            CommandIntent::PowerSet { on } => toggle(*on, "PO", "PF"),
            CommandIntent::ZonePowerSet { on } => toggle(*on, "APO", "APF"),
            CommandIntent::MuteSet { on } => toggle(*on, "MO", "MF"),
            CommandIntent::ZoneMuteSet { on } => toggle(*on, "Z2MO", "Z2MF"),
            CommandIntent::VolumeSet { db } => {
                EncodedCommand::single(terminated(format!("{:03}VL", volume_level(*db))))
            }
            CommandIntent::ZoneVolumeSet { db } => {
                EncodedCommand::single(terminated(format!("{:02}ZV", zone_volume_level(*db))))
            }
            CommandIntent::VolumeStep { direction } => match direction {
                Direction::Up => EncodedCommand::single(terminated("VU")),
                Direction::Down => EncodedCommand::single(terminated("VD")),
            },
            CommandIntent::ZoneVolumeStep { direction } => match direction {
                Direction::Up => EncodedCommand::single(terminated("ZU")),
                Direction::Down => EncodedCommand::single(terminated("ZD")),
            },
            CommandIntent::InputSelect { input } => {
                EncodedCommand::single(terminated(format!("{:02}FN", input)))
            }
            CommandIntent::ZoneInputSelect { input } => {
                EncodedCommand::single(terminated(format!("{}ZS", input)))
            }
            CommandIntent::ListeningModeSelect { mode } => {
                EncodedCommand::single(terminated(format!("{:04}SR", mode)))
            }
            CommandIntent::InputNameQuery { input } => {
                EncodedCommand::single(Query::InputName(*input).encode())
            }
            CommandIntent::HmgButton { button } => EncodedCommand::single(button.encode()),
            CommandIntent::BulkStatusQuery => EncodedCommand {
                lines: STATUS_QUERIES.iter().map(|query| query.encode()).collect(),
                staggered: INPUTS
                    .iter()
                    .map(|input| Query::InputName(input.id).encode())
                    .collect(),
            },
            CommandIntent::Query(query) => EncodedCommand::single(query.encode()),
        }
    }
}

/// Main zone wire level for a dB value: `round(db * 2 + 161)` within 0..=185
///
/// Values below -80 dB and missing values map to 0, values above +12 dB to 185.
pub fn volume_level(db: Option<f64>) -> u8 {
    match db {
        None => 0,
        Some(db) if db.is_nan() || db < VOLUME_MIN_DB => 0,
        Some(db) if db > VOLUME_MAX_DB => VOLUME_MAX_LEVEL,
        Some(db) => (db * 2.0 + 161.0).round() as u8,
    }
}

/// Zone 2 wire level for a dB value: `round(db + 81)` within 0..=81
///
/// Values below -80 dB and missing values map to 0, values above 0 dB to 81.
pub fn zone_volume_level(db: Option<f64>) -> u8 {
    match db {
        None => 0,
        Some(db) if db.is_nan() || db < VOLUME_MIN_DB => 0,
        Some(db) if db > ZONE_VOLUME_MAX_DB => ZONE_VOLUME_MAX_LEVEL,
        Some(db) => (db + 81.0).round() as u8,
    }
}

fn toggle(on: bool, on_token: &str, off_token: &str) -> EncodedCommand {
    EncodedCommand::single(terminated(if on { on_token } else { off_token }))
}

fn terminated(line: impl Into<String>) -> Vec<u8> {
    let mut bytes = line.into().into_bytes();
    bytes.push(TERMINATOR);
    bytes
}
