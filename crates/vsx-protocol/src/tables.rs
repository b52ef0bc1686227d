//! Receiver lookup tables
//!
//! Static descriptive data about the receiver: the input slots it exposes,
//! the listening modes it can report, and the home media gallery (HMG)
//! remote buttons. Every table is immutable for the lifetime of the process.

/// Listening mode ordinal reported when a display code matches no table entry
pub const UNKNOWN_LISTENING_MODE: u16 = 999;

/// A physical or network input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    /// Symbolic input name
    pub name: &'static str,
    /// Numeric input id used on the wire (0-99)
    pub id: u8,
}

/// A surround-processing algorithm the receiver can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListeningMode {
    /// Ordinal used with the `SR` set command
    pub ordinal: u16,
    /// Human-readable mode name
    pub name: &'static str,
    /// Hex display codes the receiver reports in `LM` lines for this mode
    pub display_codes: &'static [u16],
}

/// Known input slots, in the order they are queried for names
pub static INPUTS: &[Input] = &[
    Input { name: "dvd", id: 4 },
    Input { name: "bd", id: 25 },
    Input { name: "tv_sat", id: 5 },
    Input { name: "kabel", id: 6 },
    Input { name: "dvr_bdr", id: 15 },
    Input { name: "video_1", id: 10 },
    Input { name: "video_2", id: 14 },
    Input { name: "hdmi_1", id: 19 },
    Input { name: "hdmi_2", id: 20 },
    Input { name: "hdmi_3", id: 21 },
    Input { name: "hdmi_4", id: 22 },
    Input { name: "hdmi_5", id: 23 },
    Input { name: "media", id: 26 },
    Input { name: "ipod_usb", id: 17 },
    Input { name: "xm_radio", id: 18 },
    Input { name: "cd", id: 1 },
    Input { name: "cdr_tape", id: 3 },
    Input { name: "tuner", id: 2 },
    Input { name: "phono", id: 0 },
    Input { name: "multi_ch", id: 12 },
    Input { name: "adapter_port", id: 33 },
    Input { name: "sirius", id: 27 },
    Input { name: "MediaServer/Airplay", id: 44 },
];

/// Known listening modes, scanned in order when decoding display codes
pub static LISTENING_MODES: &[ListeningMode] = &[
    ListeningMode {
        ordinal: 152,
        name: "OPTIMUM SURROUND",
        display_codes: &[0x881],
    },
    ListeningMode {
        ordinal: 151,
        name: "Auto Level Control (Straight Decode)",
        display_codes: &[0x501, 0x505],
    },
    ListeningMode {
        ordinal: 8,
        name: "PURE DIRECT",
        display_codes: &[0x701, 0x705],
    },
    ListeningMode {
        ordinal: 4,
        name: "Front Stage Surround Advance Wide",
        display_codes: &[0x210],
    },
    ListeningMode {
        ordinal: 112,
        name: "EXTENDED STEREO",
        display_codes: &[0x20d],
    },
    ListeningMode {
        ordinal: 116,
        name: "TV Surround",
        display_codes: &[0x207],
    },
    ListeningMode {
        ordinal: UNKNOWN_LISTENING_MODE,
        name: "Unknown",
        display_codes: &[0xFFF],
    },
];

/// Look up an input by its numeric id
pub fn input_by_id(id: u8) -> Option<&'static Input> {
    INPUTS.iter().find(|input| input.id == id)
}

/// Look up an input by its symbolic name
pub fn input_by_name(name: &str) -> Option<&'static Input> {
    INPUTS.iter().find(|input| input.name == name)
}

/// Returns true if the id belongs to a known input slot
pub fn is_known_input(id: u8) -> bool {
    input_by_id(id).is_some()
}

/// Look up a listening mode by its ordinal
pub fn listening_mode(ordinal: u16) -> Option<&'static ListeningMode> {
    LISTENING_MODES.iter().find(|mode| mode.ordinal == ordinal)
}

/// Listening modes a caller can select (the unknown sentinel excluded)
pub fn selectable_listening_modes() -> impl Iterator<Item = &'static ListeningMode> {
    LISTENING_MODES
        .iter()
        .filter(|mode| mode.ordinal != UNKNOWN_LISTENING_MODE)
}

/// Map a receiver display code to a listening mode ordinal
///
/// The first table entry claiming the code wins. Codes no entry claims map to
/// [`UNKNOWN_LISTENING_MODE`].
pub fn lookup_display_code(code: u16) -> u16 {
    LISTENING_MODES
        .iter()
        .find(|mode| mode.display_codes.contains(&code))
        .map(|mode| mode.ordinal)
        .unwrap_or(UNKNOWN_LISTENING_MODE)
}

/// Home media gallery remote buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HmgButton {
    /// Play
    Play,
    /// Stop
    Stop,
    /// Cursor up
    Up,
    /// Cursor down
    Down,
    /// Enter
    Enter,
    /// Return
    Return,
    /// Numeric key 1
    Digit1,
}

impl HmgButton {
    /// Two-digit wire code sent with the `NW` suffix
    pub fn code(&self) -> u8 {
        match self {
            HmgButton::Play => 10,
            HmgButton::Stop => 20,
            HmgButton::Up => 26,
            HmgButton::Down => 27,
            HmgButton::Enter => 30,
            HmgButton::Return => 31,
            HmgButton::Digit1 => 1,
        }
    }
}
