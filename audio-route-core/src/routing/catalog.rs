//! Static catalog of symbolic sound-device routes.
//!
//! A route names one physical signal path on the codec mixer. The name is
//! what the path applier receives. Combo routes stand for two simple routes
//! engaged together and are never handed to the applier themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signal direction of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Output,
    Input,
}

/// One symbolic sound-device route.
///
/// "No route" is expressed as `Option<Route>::None` throughout the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Route {
    // Playback
    Earpiece,
    Speaker,
    Headphones,
    SpeakerAndHeadphones,
    VoiceEarpiece,
    VoiceEarpieceWb,
    VoiceSpeaker,
    VoiceSpeakerWb,
    VoiceHeadphones,
    VoiceHeadphonesWb,
    Hdmi,
    SpeakerAndHdmi,
    BtSco,

    // Capture
    EarpieceMic,
    SpeakerMic,
    HeadsetMic,
    HandsetMic,
    EarpieceMicAec,
    SpeakerMicAec,
    HeadsetMicAec,
    VoiceEarpieceMic,
    VoiceSpeakerMic,
    VoiceHeadsetMic,
    HdmiMic,
    BtScoMic,
    CamcorderMic,
    VoiceRecHeadsetMic,
    VoiceRecMic,
}

impl Route {
    /// Every route in catalog order.
    pub const ALL: [Route; 28] = [
        Route::Earpiece,
        Route::Speaker,
        Route::Headphones,
        Route::SpeakerAndHeadphones,
        Route::VoiceEarpiece,
        Route::VoiceEarpieceWb,
        Route::VoiceSpeaker,
        Route::VoiceSpeakerWb,
        Route::VoiceHeadphones,
        Route::VoiceHeadphonesWb,
        Route::Hdmi,
        Route::SpeakerAndHdmi,
        Route::BtSco,
        Route::EarpieceMic,
        Route::SpeakerMic,
        Route::HeadsetMic,
        Route::HandsetMic,
        Route::EarpieceMicAec,
        Route::SpeakerMicAec,
        Route::HeadsetMicAec,
        Route::VoiceEarpieceMic,
        Route::VoiceSpeakerMic,
        Route::VoiceHeadsetMic,
        Route::HdmiMic,
        Route::BtScoMic,
        Route::CamcorderMic,
        Route::VoiceRecHeadsetMic,
        Route::VoiceRecMic,
    ];

    /// Mixer path name of the route.
    pub fn name(self) -> &'static str {
        match self {
            Route::Earpiece => "earpiece",
            Route::Speaker => "speaker",
            Route::Headphones => "headphones",
            Route::SpeakerAndHeadphones => "speaker-and-headphones",
            Route::VoiceEarpiece => "voice-earpiece",
            Route::VoiceEarpieceWb => "voice-earpiece-wb",
            Route::VoiceSpeaker => "voice-speaker",
            Route::VoiceSpeakerWb => "voice-speaker-wb",
            Route::VoiceHeadphones => "voice-headphones",
            Route::VoiceHeadphonesWb => "voice-headphones-wb",
            Route::Hdmi => "hdmi",
            Route::SpeakerAndHdmi => "speaker-and-hdmi",
            Route::BtSco => "bt-sco-headset",
            Route::EarpieceMic => "earpiece-mic",
            Route::SpeakerMic => "speaker-mic",
            Route::HeadsetMic => "headset-mic",
            Route::HandsetMic => "handset-mic",
            Route::EarpieceMicAec => "earpiece-mic-aec",
            Route::SpeakerMicAec => "speaker-mic-aec",
            Route::HeadsetMicAec => "headset-mic-aec",
            Route::VoiceEarpieceMic => "voice-earpiece-mic",
            Route::VoiceSpeakerMic => "voice-speaker-mic",
            Route::VoiceHeadsetMic => "voice-headset-mic",
            Route::HdmiMic => "hdmi-mic",
            Route::BtScoMic => "bt-sco-mic",
            Route::CamcorderMic => "camcorder-mic",
            Route::VoiceRecHeadsetMic => "voice-rec-headset-mic",
            Route::VoiceRecMic => "voice-rec-mic",
        }
    }

    /// Reverse lookup of [`Route::name`].
    pub fn from_name(name: &str) -> Option<Route> {
        Route::ALL.iter().copied().find(|route| route.name() == name)
    }

    pub fn direction(self) -> Direction {
        if self >= Route::EarpieceMic {
            Direction::Input
        } else {
            Direction::Output
        }
    }

    /// The two simple routes a combo route decomposes into.
    pub fn combo_parts(self) -> Option<(Route, Route)> {
        match self {
            Route::SpeakerAndHeadphones => Some((Route::Speaker, Route::Headphones)),
            Route::SpeakerAndHdmi => Some((Route::Speaker, Route::Hdmi)),
            _ => None,
        }
    }

    pub fn is_combo(self) -> bool {
        self.combo_parts().is_some()
    }

    /// Dense index, usable for per-route tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Route> for &'static str {
    fn from(route: Route) -> Self {
        route.name()
    }
}

impl TryFrom<String> for Route {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Route::from_name(&name).ok_or_else(|| format!("unknown route: {}", name))
    }
}

/// Display name for an optional route, as written to logs.
pub fn display_name(route: Option<Route>) -> &'static str {
    route.map(Route::name).unwrap_or("none")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_name(route.name()), Some(route));
        }
        assert_eq!(Route::from_name("not-a-route"), None);
    }

    #[test]
    fn index_matches_catalog_order() {
        for (i, route) in Route::ALL.iter().enumerate() {
            assert_eq!(route.index(), i);
        }
    }

    #[test]
    fn directions_split_at_first_mic() {
        assert_eq!(Route::BtSco.direction(), Direction::Output);
        assert_eq!(Route::EarpieceMic.direction(), Direction::Input);
        assert_eq!(Route::VoiceRecMic.direction(), Direction::Input);
    }

    #[test]
    fn combos_decompose_into_simple_routes() {
        let (a, b) = Route::SpeakerAndHeadphones.combo_parts().unwrap();
        assert_eq!((a, b), (Route::Speaker, Route::Headphones));
        assert!(!a.is_combo() && !b.is_combo());

        assert_eq!(
            Route::SpeakerAndHdmi.combo_parts(),
            Some((Route::Speaker, Route::Hdmi))
        );
        assert!(!Route::Speaker.is_combo());
    }

    #[test]
    fn wideband_variants_have_distinct_names() {
        assert_ne!(Route::VoiceEarpiece.name(), Route::VoiceEarpieceWb.name());
        assert_eq!(Route::VoiceHeadphonesWb.name(), "voice-headphones-wb");
    }

    #[test]
    fn display_name_of_none() {
        assert_eq!(display_name(None), "none");
        assert_eq!(display_name(Some(Route::Speaker)), "speaker");
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&Route::VoiceSpeakerWb).unwrap();
        assert_eq!(json, "\"voice-speaker-wb\"");
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Route::VoiceSpeakerWb);
    }
}
