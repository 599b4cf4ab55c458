//! Radio settings block.
//!
//! The block is the node's operator-visible configuration: the LoRa
//! channel parameters plus the mesh `Mode` string.  It is loaded from flash
//! at boot, mutated one key at a time by `Put Setting`, written back after
//! every mutation, and mirrored wholesale in every `Settings` response.
//!
//! Each key has one fixed type for its whole lifetime: `Mode` is a short
//! string, everything else is an integer.

use serde::{Deserialize, Serialize};

use crate::app::ports::SettingsError;

/// Longest accepted `Mode` value, in bytes.
pub const MODE_MAX_LEN: usize = 16;

pub type ModeString = heapless::String<MODE_MAX_LEN>;

/// Persisted radio configuration.
///
/// Field renames are the wire names used in `Settings` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsBlock {
    /// Carrier frequency in Hz.
    #[serde(rename = "Frequency")]
    pub frequency: u32,
    /// LoRa spreading factor.
    #[serde(rename = "SF")]
    pub spreading_factor: u8,
    /// LoRa bandwidth in kHz.
    #[serde(rename = "BW")]
    pub bandwidth: u16,
    /// LoRa coding rate denominator index.
    #[serde(rename = "CR")]
    pub coding_rate: u8,
    /// Mesh operating mode.
    #[serde(rename = "Mode")]
    pub mode: ModeString,
}

impl Default for SettingsBlock {
    fn default() -> Self {
        let mut mode = ModeString::new();
        let _ = mode.push_str("MESH");
        Self {
            frequency: 915_000_000,
            spreading_factor: 9,
            bandwidth: 125,
            coding_rate: 5,
            mode,
        }
    }
}

/// The closed set of keys carried by [`SettingsBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Frequency,
    SpreadingFactor,
    Bandwidth,
    CodingRate,
    Mode,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        Self::Frequency,
        Self::SpreadingFactor,
        Self::Bandwidth,
        Self::CodingRate,
        Self::Mode,
    ];

    /// Look a key up by its wire name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Frequency => "Frequency",
            Self::SpreadingFactor => "SF",
            Self::Bandwidth => "BW",
            Self::CodingRate => "CR",
            Self::Mode => "Mode",
        }
    }
}

/// A single typed mutation produced by parsing `Put Setting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    Frequency(u32),
    SpreadingFactor(u8),
    Bandwidth(u16),
    CodingRate(u8),
    Mode(ModeString),
}

impl SettingUpdate {
    pub fn key(&self) -> SettingKey {
        match self {
            Self::Frequency(_) => SettingKey::Frequency,
            Self::SpreadingFactor(_) => SettingKey::SpreadingFactor,
            Self::Bandwidth(_) => SettingKey::Bandwidth,
            Self::CodingRate(_) => SettingKey::CodingRate,
            Self::Mode(_) => SettingKey::Mode,
        }
    }
}

impl SettingsBlock {
    /// Apply one update in place.
    pub fn apply(&mut self, update: SettingUpdate) {
        match update {
            SettingUpdate::Frequency(v) => self.frequency = v,
            SettingUpdate::SpreadingFactor(v) => self.spreading_factor = v,
            SettingUpdate::Bandwidth(v) => self.bandwidth = v,
            SettingUpdate::CodingRate(v) => self.coding_rate = v,
            SettingUpdate::Mode(v) => self.mode = v,
        }
    }

    /// Read one key as its JSON wire value.
    pub fn get(&self, key: SettingKey) -> serde_json::Value {
        match key {
            SettingKey::Frequency => self.frequency.into(),
            SettingKey::SpreadingFactor => self.spreading_factor.into(),
            SettingKey::Bandwidth => self.bandwidth.into(),
            SettingKey::CodingRate => self.coding_rate.into(),
            SettingKey::Mode => self.mode.as_str().into(),
        }
    }

    /// Range-check every field.  Called before anything reaches flash.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.frequency == 0 {
            return Err(SettingsError::ValidationFailed("Frequency must be non-zero"));
        }
        if !(5..=12).contains(&self.spreading_factor) {
            return Err(SettingsError::ValidationFailed("SF must be 5 to 12"));
        }
        if self.bandwidth == 0 {
            return Err(SettingsError::ValidationFailed("BW must be non-zero"));
        }
        if !(1..=8).contains(&self.coding_rate) {
            return Err(SettingsError::ValidationFailed("CR must be 1 to 8"));
        }
        if self.mode.is_empty() {
            return Err(SettingsError::ValidationFailed("Mode must not be empty"));
        }
        Ok(())
    }
}
