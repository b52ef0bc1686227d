//! Virtual receiver simulation
//!
//! Provides a simulated receiver that applies wire commands to its state and
//! answers with the status lines real hardware would send.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vsx_protocol::tables::{self, INPUTS};

/// Error reply for a command the receiver does not understand
pub const ERR_UNKNOWN_COMMAND: &str = "E04";
/// Error reply for a request naming an input slot that does not exist
pub const ERR_UNKNOWN_INPUT: &str = "E06";

/// Configuration for creating a virtual receiver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualReceiverConfig {
    /// Display name/identifier
    pub id: String,
    /// Main zone powered on at start
    pub powered_on: bool,
    /// Initial main zone volume level (0-185)
    pub volume_level: u8,
    /// Initial main zone input
    pub input: u8,
    /// Initial listening mode ordinal
    pub listening_mode: u16,
}

impl Default for VirtualReceiverConfig {
    fn default() -> Self {
        Self {
            id: "Virtual VSX".to_string(),
            powered_on: true,
            volume_level: 121, // -20 dB
            input: 4,
            listening_mode: 152,
        }
    }
}

/// A simulated receiver
#[derive(Debug)]
pub struct VirtualReceiver {
    id: String,
    power: bool,
    zone_power: bool,
    volume_level: u8,
    zone_volume_level: u8,
    mute: bool,
    zone_mute: bool,
    input: u8,
    zone_input: u8,
    listening_mode: u16,
    input_names: HashMap<u8, String>,
    /// Command lines received (for test verification)
    received_lines: Vec<String>,
}

impl VirtualReceiver {
    /// Create a virtual receiver with default settings
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(VirtualReceiverConfig {
            id: id.into(),
            ..Default::default()
        })
    }

    /// Create a virtual receiver from configuration
    pub fn from_config(config: VirtualReceiverConfig) -> Self {
        let input_names = INPUTS
            .iter()
            .map(|input| (input.id, input.name.to_uppercase()))
            .collect();

        Self {
            id: config.id,
            power: config.powered_on,
            zone_power: false,
            volume_level: config.volume_level.min(vsx_protocol::command::VOLUME_MAX_LEVEL),
            zone_volume_level: 41,
            mute: false,
            zone_mute: false,
            input: config.input,
            zone_input: config.input,
            listening_mode: config.listening_mode,
            input_names,
            received_lines: Vec::new(),
        }
    }

    /// Get the identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Main zone power state
    pub fn power(&self) -> bool {
        self.power
    }

    /// Zone 2 power state
    pub fn zone_power(&self) -> bool {
        self.zone_power
    }

    /// Main zone volume wire level
    pub fn volume_level(&self) -> u8 {
        self.volume_level
    }

    /// Zone 2 volume wire level
    pub fn zone_volume_level(&self) -> u8 {
        self.zone_volume_level
    }

    /// Main zone mute state
    pub fn mute(&self) -> bool {
        self.mute
    }

    /// Zone 2 mute state
    pub fn zone_mute(&self) -> bool {
        self.zone_mute
    }

    /// Main zone input
    pub fn input(&self) -> u8 {
        self.input
    }

    /// Zone 2 input
    pub fn zone_input(&self) -> u8 {
        self.zone_input
    }

    /// Current listening mode ordinal
    pub fn listening_mode(&self) -> u16 {
        self.listening_mode
    }

    /// Display name the receiver reports for an input
    pub fn input_name(&self, input: u8) -> Option<&str> {
        self.input_names.get(&input).map(String::as_str)
    }

    /// Give an input a custom display name
    pub fn rename_input(&mut self, input: u8, name: impl Into<String>) {
        if tables::is_known_input(input) {
            self.input_names.insert(input, name.into());
        } else {
            warn!("Virtual receiver {} has no input {}", self.id, input);
        }
    }

    /// Command lines received so far
    pub fn received_lines(&self) -> &[String] {
        &self.received_lines
    }

    /// Apply one command line and return the status lines sent in reply
    pub fn process_line(&mut self, line: &str) -> Vec<String> {
        if line.is_empty() {
            // Wake line
            return Vec::new();
        }
        self.received_lines.push(line.to_string());

        let replies = match line {
            "PO" => self.set_power(true),
            "PF" => self.set_power(false),
            "APO" => self.set_zone_power(true),
            "APF" => self.set_zone_power(false),
            "MO" => self.set_mute(true),
            "MF" => self.set_mute(false),
            "Z2MO" => self.set_zone_mute(true),
            "Z2MF" => self.set_zone_mute(false),
            "VU" => self.set_volume(self.volume_level.saturating_add(1)),
            "VD" => self.set_volume(self.volume_level.saturating_sub(1)),
            "ZU" => self.set_zone_volume(self.zone_volume_level.saturating_add(1)),
            "ZD" => self.set_zone_volume(self.zone_volume_level.saturating_sub(1)),
            _ if line.starts_with('?') => self.answer_query(&line[1..]),
            _ => self.apply_parameterized(line),
        };

        debug!(
            "Virtual receiver {} handled {:?} -> {:?}",
            self.id, line, replies
        );
        replies
    }

    fn answer_query(&self, query: &str) -> Vec<String> {
        let reply = match query {
            "P" => self.power_status(),
            "AP" => self.zone_power_status(),
            "V" => self.volume_status(),
            "ZV" => self.zone_volume_status(),
            "M" => self.mute_status(),
            "Z2M" => self.zone_mute_status(),
            "F" => self.input_status(),
            "L" => self.display_mode_status(),
            _ => match query.strip_prefix("RGB").and_then(|id| id.parse::<u8>().ok()) {
                Some(input) => match self.input_names.get(&input) {
                    Some(name) => format!("RGB{:02}0{}", input, name),
                    None => ERR_UNKNOWN_INPUT.to_string(),
                },
                None => ERR_UNKNOWN_COMMAND.to_string(),
            },
        };
        vec![reply]
    }

    fn apply_parameterized(&mut self, line: &str) -> Vec<String> {
        let Some(split) = line.find(|c: char| !c.is_ascii_digit()) else {
            return vec![ERR_UNKNOWN_COMMAND.to_string()];
        };
        let (digits, suffix) = line.split_at(split);
        let Ok(value) = digits.parse::<u16>() else {
            return vec![ERR_UNKNOWN_COMMAND.to_string()];
        };

        match suffix {
            "VL" => self.set_volume(value.min(185) as u8),
            "ZV" => self.set_zone_volume(value.min(81) as u8),
            "FN" => match u8::try_from(value).ok().filter(|id| tables::is_known_input(*id)) {
                Some(input) => {
                    self.input = input;
                    vec![self.input_status()]
                }
                None => vec![ERR_UNKNOWN_INPUT.to_string()],
            },
            "ZS" => match u8::try_from(value).ok().filter(|id| tables::is_known_input(*id)) {
                Some(input) => {
                    self.zone_input = input;
                    vec![format!("Z2F{:02}", input)]
                }
                None => vec![ERR_UNKNOWN_INPUT.to_string()],
            },
            "SR" => {
                self.listening_mode = value;
                vec![format!("SR{:04}", value)]
            }
            // HMG button presses only move the on-screen cursor
            "NW" => Vec::new(),
            _ => vec![ERR_UNKNOWN_COMMAND.to_string()],
        }
    }

    fn set_power(&mut self, on: bool) -> Vec<String> {
        self.power = on;
        vec![self.power_status()]
    }

    fn set_zone_power(&mut self, on: bool) -> Vec<String> {
        self.zone_power = on;
        vec![self.zone_power_status()]
    }

    fn set_mute(&mut self, on: bool) -> Vec<String> {
        self.mute = on;
        vec![self.mute_status()]
    }

    fn set_zone_mute(&mut self, on: bool) -> Vec<String> {
        self.zone_mute = on;
        vec![self.zone_mute_status()]
    }

    fn set_volume(&mut self, level: u8) -> Vec<String> {
        self.volume_level = level.min(185);
        vec![self.volume_status()]
    }

    fn set_zone_volume(&mut self, level: u8) -> Vec<String> {
        self.zone_volume_level = level.min(81);
        vec![self.zone_volume_status()]
    }

    fn power_status(&self) -> String {
        format!("PWR{}", if self.power { 0 } else { 1 })
    }

    fn zone_power_status(&self) -> String {
        format!("APR{}", if self.zone_power { 0 } else { 1 })
    }

    fn mute_status(&self) -> String {
        format!("MUT{}", if self.mute { 0 } else { 1 })
    }

    fn zone_mute_status(&self) -> String {
        format!("Z2MUT{}", if self.zone_mute { 0 } else { 1 })
    }

    fn volume_status(&self) -> String {
        format!("VOL{:03}", self.volume_level)
    }

    fn zone_volume_status(&self) -> String {
        format!("ZV{:02}", self.zone_volume_level)
    }

    fn input_status(&self) -> String {
        format!("FN{:02}", self.input)
    }

    fn display_mode_status(&self) -> String {
        let code = tables::listening_mode(self.listening_mode)
            .and_then(|mode| mode.display_codes.first().copied())
            .unwrap_or(0xFFF);
        format!("LM{:04X}", code)
    }
}
