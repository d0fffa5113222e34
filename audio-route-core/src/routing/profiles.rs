//! PCM profile registry: which hardware endpoint, at which transport
//! parameters, serves a usecase class on a set of devices.

use serde::Serialize;

use crate::models::devices::DeviceMask;
use crate::models::error::RouteError;
use crate::models::usecase::{CaptureLatency, UsecaseClass};

pub const PLAYBACK_PERIOD_SIZE: u32 = 240;
pub const PLAYBACK_PERIOD_COUNT: u32 = 2;
pub const SCO_PERIOD_SIZE: u32 = 240;
pub const SCO_PERIOD_COUNT: u32 = 2;
pub const CAPTURE_PERIOD_SIZE: u32 = 320;
pub const CAPTURE_PERIOD_SIZE_LOW_LATENCY: u32 = 240;
pub const CAPTURE_PERIOD_COUNT: u32 = 2;
pub const VOICE_PERIOD_SIZE: u32 = 320;
pub const VOICE_PERIOD_COUNT: u32 = 2;
pub const HDMI_PERIOD_SIZE: u32 = 336;
pub const HDMI_PERIOD_COUNT: u32 = 8;

/// Capture sample rates a stream may request.
pub const SUPPORTED_INPUT_RATES: [u32; 9] =
    [8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

/// Transport parameters of one PCM endpoint. 16-bit little-endian samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PcmConfig {
    pub channels: u16,
    pub rate: u32,
    pub period_size: u32,
    pub period_count: u32,
    pub start_threshold: u32,
    pub stop_threshold: u32,
    pub avail_min: u32,
}

impl PcmConfig {
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * 2
    }

    pub fn period_bytes(&self) -> usize {
        self.period_size as usize * self.frame_bytes()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcmProfile {
    pub name: &'static str,
    pub card: u32,
    pub device: u32,
    pub class: UsecaseClass,
    pub devices: DeviceMask,
    pub config: PcmConfig,
}

const fn mask(bits: &[DeviceMask]) -> DeviceMask {
    let mut acc = 0;
    let mut i = 0;
    while i < bits.len() {
        acc |= bits[i].bits();
        i += 1;
    }
    DeviceMask::from_bits(acc)
}

const CAPTURE_MICS: DeviceMask = mask(&[
    DeviceMask::IN_BUILTIN_MIC,
    DeviceMask::IN_WIRED_HEADSET,
    DeviceMask::IN_BACK_MIC,
]);

const PLAYBACK: PcmProfile = PcmProfile {
    name: "playback",
    card: 0,
    device: 0,
    class: UsecaseClass::Playback,
    devices: mask(&[
        DeviceMask::OUT_WIRED_HEADSET,
        DeviceMask::OUT_WIRED_HEADPHONE,
        DeviceMask::OUT_SPEAKER,
        DeviceMask::OUT_EARPIECE,
    ]),
    config: PcmConfig {
        channels: 2,
        rate: 48000,
        period_size: PLAYBACK_PERIOD_SIZE,
        period_count: PLAYBACK_PERIOD_COUNT,
        start_threshold: PLAYBACK_PERIOD_SIZE * PLAYBACK_PERIOD_COUNT - 1,
        stop_threshold: PLAYBACK_PERIOD_SIZE * (PLAYBACK_PERIOD_COUNT + 2),
        avail_min: 1,
    },
};

const PLAYBACK_SCO: PcmProfile = PcmProfile {
    name: "playback-sco",
    card: 0,
    device: 2,
    class: UsecaseClass::Playback,
    devices: DeviceMask::OUT_ALL_SCO,
    config: PcmConfig {
        channels: 2,
        rate: 8000,
        period_size: SCO_PERIOD_SIZE,
        period_count: SCO_PERIOD_COUNT,
        start_threshold: 335,
        stop_threshold: 336,
        avail_min: 1,
    },
};

const PLAYBACK_HDMI: PcmProfile = PcmProfile {
    name: "playback-hdmi",
    card: 1,
    device: 0,
    class: UsecaseClass::Playback,
    devices: DeviceMask::OUT_AUX_DIGITAL,
    config: PcmConfig {
        channels: 6,
        rate: 48000,
        period_size: HDMI_PERIOD_SIZE,
        period_count: HDMI_PERIOD_COUNT,
        start_threshold: 1,
        stop_threshold: 0,
        avail_min: 0,
    },
};

const CAPTURE: PcmProfile = PcmProfile {
    name: "capture",
    card: 0,
    device: 0,
    class: UsecaseClass::Capture(CaptureLatency::Normal),
    devices: CAPTURE_MICS,
    config: PcmConfig {
        channels: 2,
        rate: 48000,
        period_size: CAPTURE_PERIOD_SIZE,
        period_count: CAPTURE_PERIOD_COUNT,
        start_threshold: 1,
        stop_threshold: 0,
        avail_min: 0,
    },
};

const CAPTURE_LOW_LATENCY: PcmProfile = PcmProfile {
    name: "capture-low-latency",
    card: 0,
    device: 0,
    class: UsecaseClass::Capture(CaptureLatency::Low),
    devices: CAPTURE_MICS,
    config: PcmConfig {
        channels: 2,
        rate: 48000,
        period_size: CAPTURE_PERIOD_SIZE_LOW_LATENCY,
        period_count: CAPTURE_PERIOD_COUNT,
        start_threshold: 1,
        stop_threshold: 0,
        avail_min: 0,
    },
};

const CAPTURE_SCO: PcmProfile = PcmProfile {
    name: "capture-sco",
    card: 0,
    device: 2,
    class: UsecaseClass::Capture(CaptureLatency::Normal),
    devices: DeviceMask::IN_BLUETOOTH_SCO_HEADSET,
    config: PcmConfig {
        channels: 2,
        rate: 8000,
        period_size: SCO_PERIOD_SIZE,
        period_count: SCO_PERIOD_COUNT,
        start_threshold: 1,
        stop_threshold: 0,
        avail_min: 0,
    },
};

const VOICE: PcmProfile = PcmProfile {
    name: "voice",
    card: 0,
    device: 1,
    class: UsecaseClass::VoiceCall,
    devices: CAPTURE_MICS,
    config: PcmConfig {
        channels: 2,
        rate: 8000,
        period_size: VOICE_PERIOD_SIZE,
        period_count: VOICE_PERIOD_COUNT,
        start_threshold: 1,
        stop_threshold: 0,
        avail_min: 0,
    },
};

const VOICE_WIDEBAND: PcmProfile = PcmProfile {
    name: "voice-wideband",
    config: PcmConfig {
        rate: 16000,
        ..VOICE.config
    },
    ..VOICE
};

/// Lookup table of PCM profiles. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PcmProfileRegistry {
    profiles: Vec<PcmProfile>,
    voice: PcmProfile,
    voice_wideband: PcmProfile,
}

impl PcmProfileRegistry {
    pub fn new(profiles: Vec<PcmProfile>, voice: PcmProfile, voice_wideband: PcmProfile) -> Self {
        Self {
            profiles,
            voice,
            voice_wideband,
        }
    }

    /// The profile table of the reference board.
    pub fn builtin() -> Self {
        Self::new(
            vec![
                PLAYBACK,
                PLAYBACK_SCO,
                PLAYBACK_HDMI,
                CAPTURE,
                CAPTURE_LOW_LATENCY,
                CAPTURE_SCO,
            ],
            VOICE,
            VOICE_WIDEBAND,
        )
    }

    /// First profile of `class` serving any device in `devices`.
    pub fn find(&self, class: UsecaseClass, devices: DeviceMask) -> Option<&PcmProfile> {
        self.profiles
            .iter()
            .find(|p| p.class == class && p.devices.intersects(devices))
    }

    /// Profiles covering as many devices of `devices` as possible, one
    /// endpoint per profile, in table order of discovery.
    pub fn select_all(&self, class: UsecaseClass, devices: DeviceMask) -> Vec<&PcmProfile> {
        let mut remaining = devices;
        let mut selected = Vec::new();
        while let Some(profile) = self.find(class, remaining) {
            remaining = remaining.without(profile.devices);
            selected.push(profile);
        }
        selected
    }

    /// Modem link profile for a voice call.
    pub fn voice(&self, wideband: bool) -> &PcmProfile {
        if wideband {
            &self.voice_wideband
        } else {
            &self.voice
        }
    }

    /// Buffer size in bytes a capture stream should use, accounting for
    /// resampling from the profile rate. Rounded up to a multiple of 16
    /// frames. Returns 0 when the request is unsupported.
    pub fn input_buffer_size(
        &self,
        sample_rate: u32,
        channels: u16,
        class: UsecaseClass,
        devices: DeviceMask,
    ) -> usize {
        if check_input_parameters(sample_rate, channels).is_err() {
            return 0;
        }
        let Some(profile) = self.find(class, devices) else {
            return 0;
        };

        let frames = (profile.config.period_size as usize * sample_rate as usize)
            / profile.config.rate as usize;
        let frames = frames.div_ceil(16) * 16;
        frames * channels as usize * 2
    }
}

impl Default for PcmProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Validates a capture request: 1–2 channels at a standard rate.
pub fn check_input_parameters(sample_rate: u32, channels: u16) -> Result<(), RouteError> {
    if !(1..=2).contains(&channels) {
        return Err(RouteError::InvalidStreamConfig(format!(
            "unsupported channel count: {}",
            channels
        )));
    }
    if !SUPPORTED_INPUT_RATES.contains(&sample_rate) {
        return Err(RouteError::InvalidStreamConfig(format!(
            "unsupported sample rate: {}",
            sample_rate
        )));
    }
    Ok(())
}
