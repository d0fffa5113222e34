use std::fmt;

use serde::Serialize;

use super::devices::{AudioSource, ChannelMask, DeviceMask};
use crate::routing::catalog::Route;

/// Handle of an open stream, assigned by the device when the stream opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StreamId(pub u32);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// Identity of a usecase. At most one usecase per id is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsecaseId {
    Playback,
    PlaybackDeepBuffer,
    PlaybackMultiChannel,
    Capture,
    CaptureLowLatency,
    VoiceCall,
}

impl UsecaseId {
    pub fn name(self) -> &'static str {
        match self {
            Self::Playback => "playback",
            Self::PlaybackDeepBuffer => "playback deep-buffer",
            Self::PlaybackMultiChannel => "playback multi-channel",
            Self::Capture => "capture",
            Self::CaptureLowLatency => "capture low-latency",
            Self::VoiceCall => "voice-call",
        }
    }

    /// The class every usecase with this id belongs to.
    pub fn class(self) -> UsecaseClass {
        match self {
            Self::Playback | Self::PlaybackDeepBuffer | Self::PlaybackMultiChannel => {
                UsecaseClass::Playback
            }
            Self::Capture => UsecaseClass::Capture(CaptureLatency::Normal),
            Self::CaptureLowLatency => UsecaseClass::Capture(CaptureLatency::Low),
            Self::VoiceCall => UsecaseClass::VoiceCall,
        }
    }
}

impl fmt::Display for UsecaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Latency subtype of a capture usecase. Only affects transport profile lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureLatency {
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsecaseClass {
    Playback,
    Capture(CaptureLatency),
    VoiceCall,
}

impl UsecaseClass {
    fn bit(self) -> u8 {
        match self {
            Self::Playback => 0b001,
            Self::Capture(_) => 0b010,
            Self::VoiceCall => 0b100,
        }
    }
}

/// Set of usecase classes, used to look up "the" usecase of some kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSet(u8);

impl ClassSet {
    pub const CAPTURE: Self = Self(0b010);
    /// Usecases that can supply the active-input context.
    pub const INPUT_CONTEXT: Self = Self(0b110);

    pub fn contains(self, class: UsecaseClass) -> bool {
        self.0 & class.bit() != 0
    }
}

/// Input and output routes currently applied for one usecase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoutePair {
    pub input: Option<Route>,
    pub output: Option<Route>,
}

impl RoutePair {
    pub const NONE: Self = Self {
        input: None,
        output: None,
    };

    pub fn new(input: Option<Route>, output: Option<Route>) -> Self {
        Self { input, output }
    }
}

/// One concurrently active audio activity.
///
/// Owned by the usecase registry. `routes` only changes after the routes have
/// been applied to hardware.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Usecase {
    pub id: UsecaseId,
    pub class: UsecaseClass,
    pub devices: DeviceMask,
    /// Stream the usecase was created for. For the voice call this is the
    /// primary output stream.
    pub stream: StreamId,
    /// Capture source; [`AudioSource::Default`] for playback.
    pub source: AudioSource,
    pub channel_mask: ChannelMask,
    pub routes: RoutePair,
}

impl Usecase {
    pub fn new(id: UsecaseId, stream: StreamId, devices: DeviceMask) -> Self {
        Self {
            id,
            class: id.class(),
            devices,
            stream,
            source: AudioSource::Default,
            channel_mask: ChannelMask::Mono,
            routes: RoutePair::NONE,
        }
    }

    pub fn with_source(mut self, source: AudioSource, channel_mask: ChannelMask) -> Self {
        self.source = source;
        self.channel_mask = channel_mask;
        self
    }

    pub fn is_playback(&self) -> bool {
        matches!(self.class, UsecaseClass::Playback)
    }

    pub fn is_voice_call(&self) -> bool {
        matches!(self.class, UsecaseClass::VoiceCall)
    }
}
