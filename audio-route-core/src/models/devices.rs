use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// Set of logical devices, tagged as input or output.
///
/// Bit values follow the platform audio-policy layout, so masks received from
/// the policy layer can be wrapped directly with [`DeviceMask::from_bits`].
/// Input masks carry [`DeviceMask::BIT_IN`]; output masks never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMask(u32);

impl DeviceMask {
    pub const NONE: Self = Self(0);
    pub const BIT_IN: Self = Self(0x8000_0000);

    // Output devices.
    pub const OUT_EARPIECE: Self = Self(0x1);
    pub const OUT_SPEAKER: Self = Self(0x2);
    pub const OUT_WIRED_HEADSET: Self = Self(0x4);
    pub const OUT_WIRED_HEADPHONE: Self = Self(0x8);
    pub const OUT_BLUETOOTH_SCO: Self = Self(0x10);
    pub const OUT_BLUETOOTH_SCO_HEADSET: Self = Self(0x20);
    pub const OUT_BLUETOOTH_SCO_CARKIT: Self = Self(0x40);
    pub const OUT_AUX_DIGITAL: Self = Self(0x400);
    pub const OUT_ALL_SCO: Self = Self(0x10 | 0x20 | 0x40);

    // Input devices.
    pub const IN_COMMUNICATION: Self = Self(0x8000_0001);
    pub const IN_AMBIENT: Self = Self(0x8000_0002);
    pub const IN_BUILTIN_MIC: Self = Self(0x8000_0004);
    pub const IN_BLUETOOTH_SCO_HEADSET: Self = Self(0x8000_0008);
    pub const IN_WIRED_HEADSET: Self = Self(0x8000_0010);
    pub const IN_AUX_DIGITAL: Self = Self(0x8000_0020);
    pub const IN_VOICE_CALL: Self = Self(0x8000_0040);
    pub const IN_BACK_MIC: Self = Self(0x8000_0080);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn is_input(self) -> bool {
        self.0 & Self::BIT_IN.0 != 0
    }

    /// The device bits with the input tag removed.
    pub const fn device_bits(self) -> u32 {
        self.0 & !Self::BIT_IN.0
    }

    /// Number of distinct devices in the mask, ignoring the input tag.
    pub const fn device_count(self) -> u32 {
        self.device_bits().count_ones()
    }

    /// True when the two masks share at least one device bit.
    ///
    /// The input tag is ignored on both sides, so `IN_BUILTIN_MIC` intersects
    /// `IN_BUILTIN_MIC | IN_BACK_MIC` but not `IN_VOICE_CALL`.
    pub const fn intersects(self, other: Self) -> bool {
        self.device_bits() & other.device_bits() != 0
    }

    /// True when every device bit of `other` is present in `self`.
    pub const fn contains(self, other: Self) -> bool {
        let wanted = other.device_bits();
        wanted != 0 && self.device_bits() & wanted == wanted
    }

    /// Removes the device bits of `other`, keeping the direction tag.
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.device_bits())
    }
}

impl BitOr for DeviceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DeviceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DeviceMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for DeviceMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for DeviceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Audio source requested by a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// No active input, or the caller did not specify one.
    #[default]
    Default,
    Mic,
    VoiceUplink,
    VoiceDownlink,
    VoiceCall,
    Camcorder,
    VoiceRecognition,
    VoiceCommunication,
}

/// Telephony mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    #[default]
    Normal,
    Ringtone,
    InCall,
    InCommunication,
}

impl AudioMode {
    pub fn is_in_call(self) -> bool {
        matches!(self, Self::InCall)
    }
}

/// Input channel layout requested by a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMask {
    #[default]
    Mono,
    Stereo,
}

impl ChannelMask {
    pub fn channel_count(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}
