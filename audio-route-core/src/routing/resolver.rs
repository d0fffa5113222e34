//! Maps requested logical devices onto catalog routes.
//!
//! Both resolvers are pure: they read no shared state and never fail. A
//! request that cannot be honoured resolves to `None` (or, for capture, a
//! best-effort default) and is logged.

use crate::models::devices::{AudioMode, AudioSource, ChannelMask, DeviceMask};
use crate::routing::catalog::{display_name, Route};

const HEADPHONE_OR_HEADSET: DeviceMask =
    DeviceMask::from_bits(DeviceMask::OUT_WIRED_HEADPHONE.bits() | DeviceMask::OUT_WIRED_HEADSET.bits());

/// Capture context seen by the input resolver: the source, devices and
/// channel layout of the active input, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub source: AudioSource,
    pub devices: DeviceMask,
    pub channel_mask: ChannelMask,
}

impl InputContext {
    /// No active input.
    pub const NONE: Self = Self {
        source: AudioSource::Default,
        devices: DeviceMask::NONE,
        channel_mask: ChannelMask::Mono,
    };

    pub fn new(source: AudioSource, devices: DeviceMask, channel_mask: ChannelMask) -> Self {
        Self {
            source,
            devices,
            channel_mask,
        }
    }
}

fn wideband_variant(wideband: bool, narrow: Route, wide: Route) -> Route {
    if wideband {
        wide
    } else {
        narrow
    }
}

/// Resolves the output route for `devices` under `mode`.
pub fn resolve_output(devices: DeviceMask, mode: AudioMode, wideband: bool) -> Option<Route> {
    log::debug!("resolve_output: devices {}, mode {:?}", devices, mode);

    let route = resolve_output_inner(devices, mode, wideband);

    log::debug!("resolve_output: {}", display_name(route));
    route
}

fn resolve_output_inner(devices: DeviceMask, mode: AudioMode, wideband: bool) -> Option<Route> {
    if devices.is_none() || devices.is_input() {
        log::debug!("Invalid output devices {}", devices);
        return None;
    }

    if mode.is_in_call() {
        let call_route = if devices.intersects(HEADPHONE_OR_HEADSET) {
            Some(wideband_variant(wideband, Route::VoiceHeadphones, Route::VoiceHeadphonesWb))
        } else if devices.intersects(DeviceMask::OUT_SPEAKER) {
            Some(wideband_variant(wideband, Route::VoiceSpeaker, Route::VoiceSpeakerWb))
        } else if devices.intersects(DeviceMask::OUT_EARPIECE) {
            Some(wideband_variant(wideband, Route::VoiceEarpiece, Route::VoiceEarpieceWb))
        } else if devices.intersects(DeviceMask::OUT_ALL_SCO) {
            Some(Route::BtSco)
        } else {
            None
        };
        if call_route.is_some() {
            return call_route;
        }
    }

    match devices.device_count() {
        2 => {
            if devices == DeviceMask::OUT_WIRED_HEADPHONE | DeviceMask::OUT_SPEAKER
                || devices == DeviceMask::OUT_WIRED_HEADSET | DeviceMask::OUT_SPEAKER
            {
                Some(Route::SpeakerAndHeadphones)
            } else {
                log::error!("Invalid combo device {}", devices);
                None
            }
        }
        1 => {
            if devices.intersects(HEADPHONE_OR_HEADSET) {
                Some(Route::Headphones)
            } else if devices.intersects(DeviceMask::OUT_SPEAKER) {
                Some(Route::Speaker)
            } else if devices.intersects(DeviceMask::OUT_EARPIECE) {
                Some(Route::Earpiece)
            } else if devices.intersects(DeviceMask::OUT_ALL_SCO) {
                Some(Route::BtSco)
            } else {
                log::error!("Unknown output device {}", devices);
                None
            }
        }
        _ => {
            log::error!("Invalid output devices {}", devices);
            None
        }
    }
}

/// Resolves the input route given the related output devices and the
/// active input context.
pub fn resolve_input(out_devices: DeviceMask, mode: AudioMode, input: &InputContext) -> Option<Route> {
    log::debug!(
        "resolve_input: out {}, in {}, source {:?}",
        out_devices,
        input.devices,
        input.source
    );

    let route = resolve_input_inner(out_devices, mode, input);

    log::debug!("resolve_input: {}", display_name(route));
    route
}

fn resolve_input_inner(out_devices: DeviceMask, mode: AudioMode, input: &InputContext) -> Option<Route> {
    let mut in_devices = input.devices;

    if mode.is_in_call() {
        if out_devices.is_none() {
            log::error!("No output device set for voice call");
            return None;
        }
        let route = if out_devices.intersects(DeviceMask::OUT_EARPIECE | DeviceMask::OUT_WIRED_HEADPHONE) {
            Some(Route::EarpieceMic)
        } else if out_devices.intersects(DeviceMask::OUT_WIRED_HEADSET) {
            Some(Route::VoiceHeadsetMic)
        } else if out_devices.intersects(DeviceMask::OUT_SPEAKER) {
            Some(Route::VoiceSpeakerMic)
        } else if out_devices.intersects(DeviceMask::OUT_ALL_SCO) {
            Some(Route::BtScoMic)
        } else {
            None
        };
        if route.is_none() {
            log::error!("No input route for voice call on output {}", out_devices);
        }
        return route;
    }

    match input.source {
        AudioSource::Camcorder => {
            if in_devices.intersects(DeviceMask::IN_BUILTIN_MIC | DeviceMask::IN_BACK_MIC) {
                return Some(Route::CamcorderMic);
            }
        }
        AudioSource::VoiceCommunication | AudioSource::Mic => {
            if out_devices.intersects(DeviceMask::OUT_SPEAKER) {
                in_devices = DeviceMask::IN_BACK_MIC;
            }
        }
        AudioSource::Default => return None,
        _ => {}
    }

    let reserved = DeviceMask::IN_VOICE_CALL | DeviceMask::IN_COMMUNICATION;
    if in_devices.device_bits() != 0 && !in_devices.intersects(reserved) {
        if in_devices.intersects(DeviceMask::IN_BUILTIN_MIC) {
            Some(Route::EarpieceMic)
        } else if in_devices.intersects(DeviceMask::IN_BACK_MIC) {
            Some(Route::SpeakerMic)
        } else if in_devices.intersects(DeviceMask::IN_WIRED_HEADSET) {
            Some(Route::HeadsetMic)
        } else if in_devices.intersects(DeviceMask::IN_BLUETOOTH_SCO_HEADSET) {
            Some(Route::BtScoMic)
        } else if in_devices.intersects(DeviceMask::IN_AUX_DIGITAL) {
            Some(Route::HdmiMic)
        } else {
            log::warn!("Unknown input devices {}, using handset-mic", in_devices);
            Some(Route::HandsetMic)
        }
    } else if out_devices.intersects(DeviceMask::OUT_EARPIECE) {
        Some(Route::EarpieceMic)
    } else if out_devices.intersects(DeviceMask::OUT_WIRED_HEADSET) {
        Some(Route::HeadsetMic)
    } else if out_devices.intersects(DeviceMask::OUT_SPEAKER) {
        Some(Route::SpeakerMic)
    } else if out_devices.intersects(DeviceMask::OUT_WIRED_HEADPHONE) {
        Some(Route::HandsetMic)
    } else if out_devices.intersects(DeviceMask::OUT_BLUETOOTH_SCO_HEADSET) {
        Some(Route::BtScoMic)
    } else {
        log::warn!("Unknown output devices {}, using handset-mic", out_devices);
        Some(Route::HandsetMic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT_BITS: [DeviceMask; 8] = [
        DeviceMask::OUT_EARPIECE,
        DeviceMask::OUT_SPEAKER,
        DeviceMask::OUT_WIRED_HEADSET,
        DeviceMask::OUT_WIRED_HEADPHONE,
        DeviceMask::OUT_BLUETOOTH_SCO,
        DeviceMask::OUT_BLUETOOTH_SCO_HEADSET,
        DeviceMask::OUT_BLUETOOTH_SCO_CARKIT,
        DeviceMask::OUT_AUX_DIGITAL,
    ];

    fn mic(source: AudioSource, devices: DeviceMask) -> InputContext {
        InputContext::new(source, devices, ChannelMask::Mono)
    }

    #[test]
    fn single_output_bits_map_directly() {
        let expected = [
            Some(Route::Earpiece),
            Some(Route::Speaker),
            Some(Route::Headphones),
            Some(Route::Headphones),
            Some(Route::BtSco),
            Some(Route::BtSco),
            Some(Route::BtSco),
            None,
        ];

        for (bit, want) in OUTPUT_BITS.iter().zip(expected) {
            for mode in [AudioMode::Normal, AudioMode::Ringtone, AudioMode::InCommunication] {
                assert_eq!(resolve_output(*bit, mode, false), want, "{} {:?}", bit, mode);
                assert_eq!(resolve_output(*bit, mode, true), want);
            }
        }
    }

    #[test]
    fn only_speaker_headphone_pairs_resolve_to_combo() {
        for (i, a) in OUTPUT_BITS.iter().enumerate() {
            for b in &OUTPUT_BITS[i + 1..] {
                let pair = *a | *b;
                let route = resolve_output(pair, AudioMode::Normal, false);
                let is_combo_pair = pair == DeviceMask::OUT_SPEAKER | DeviceMask::OUT_WIRED_HEADPHONE
                    || pair == DeviceMask::OUT_SPEAKER | DeviceMask::OUT_WIRED_HEADSET;

                if is_combo_pair {
                    assert_eq!(route, Some(Route::SpeakerAndHeadphones));
                } else {
                    assert_eq!(route, None, "{}", pair);
                }
            }
        }
    }

    #[test]
    fn invalid_output_masks_resolve_to_none() {
        assert_eq!(resolve_output(DeviceMask::NONE, AudioMode::Normal, false), None);
        assert_eq!(resolve_output(DeviceMask::IN_BUILTIN_MIC, AudioMode::InCall, false), None);
        let three = DeviceMask::OUT_SPEAKER | DeviceMask::OUT_EARPIECE | DeviceMask::OUT_WIRED_HEADSET;
        assert_eq!(resolve_output(three, AudioMode::Normal, false), None);
    }

    #[test]
    fn in_call_output_prefers_headset_then_speaker() {
        let all = DeviceMask::OUT_WIRED_HEADSET | DeviceMask::OUT_SPEAKER | DeviceMask::OUT_EARPIECE;
        assert_eq!(resolve_output(all, AudioMode::InCall, false), Some(Route::VoiceHeadphones));
        assert_eq!(resolve_output(all, AudioMode::InCall, true), Some(Route::VoiceHeadphonesWb));

        let speaker = DeviceMask::OUT_SPEAKER | DeviceMask::OUT_EARPIECE;
        assert_eq!(resolve_output(speaker, AudioMode::InCall, true), Some(Route::VoiceSpeakerWb));
        assert_eq!(
            resolve_output(DeviceMask::OUT_EARPIECE, AudioMode::InCall, false),
            Some(Route::VoiceEarpiece)
        );
        assert_eq!(
            resolve_output(DeviceMask::OUT_BLUETOOTH_SCO_CARKIT, AudioMode::InCall, true),
            Some(Route::BtSco)
        );
    }

    #[test]
    fn in_call_without_call_route_falls_through() {
        assert_eq!(
            resolve_output(DeviceMask::OUT_AUX_DIGITAL, AudioMode::InCall, false),
            None
        );
    }

    #[test]
    fn in_call_input_follows_output_device() {
        let ctx = InputContext::NONE;
        let cases = [
            (DeviceMask::OUT_EARPIECE, Some(Route::EarpieceMic)),
            (DeviceMask::OUT_WIRED_HEADPHONE, Some(Route::EarpieceMic)),
            (DeviceMask::OUT_WIRED_HEADSET, Some(Route::VoiceHeadsetMic)),
            (DeviceMask::OUT_SPEAKER, Some(Route::VoiceSpeakerMic)),
            (DeviceMask::OUT_BLUETOOTH_SCO, Some(Route::BtScoMic)),
            (DeviceMask::OUT_AUX_DIGITAL, None),
            (DeviceMask::NONE, None),
        ];

        for (out, want) in cases {
            assert_eq!(resolve_input(out, AudioMode::InCall, &ctx), want, "{}", out);
        }
    }

    #[test]
    fn camcorder_uses_camcorder_mic_on_builtin_or_back() {
        let ctx = mic(AudioSource::Camcorder, DeviceMask::IN_BACK_MIC);
        assert_eq!(
            resolve_input(DeviceMask::NONE, AudioMode::Normal, &ctx),
            Some(Route::CamcorderMic)
        );

        let headset = mic(AudioSource::Camcorder, DeviceMask::IN_WIRED_HEADSET);
        assert_eq!(
            resolve_input(DeviceMask::NONE, AudioMode::Normal, &headset),
            Some(Route::HeadsetMic)
        );
    }

    #[test]
    fn communication_on_speaker_forces_back_mic() {
        let ctx = mic(AudioSource::VoiceCommunication, DeviceMask::IN_BUILTIN_MIC);

        assert_eq!(
            resolve_input(DeviceMask::OUT_SPEAKER, AudioMode::InCommunication, &ctx),
            Some(Route::SpeakerMic)
        );
        assert_eq!(
            resolve_input(DeviceMask::OUT_EARPIECE, AudioMode::InCommunication, &ctx),
            Some(Route::EarpieceMic)
        );
    }

    #[test]
    fn no_active_input_resolves_to_none() {
        assert_eq!(
            resolve_input(DeviceMask::OUT_SPEAKER, AudioMode::Normal, &InputContext::NONE),
            None
        );
    }

    #[test]
    fn input_devices_map_directly() {
        let cases = [
            (DeviceMask::IN_BUILTIN_MIC, Route::EarpieceMic),
            (DeviceMask::IN_BACK_MIC, Route::SpeakerMic),
            (DeviceMask::IN_WIRED_HEADSET, Route::HeadsetMic),
            (DeviceMask::IN_BLUETOOTH_SCO_HEADSET, Route::BtScoMic),
            (DeviceMask::IN_AUX_DIGITAL, Route::HdmiMic),
            (DeviceMask::IN_AMBIENT, Route::HandsetMic),
        ];

        for (devices, want) in cases {
            let ctx = mic(AudioSource::VoiceRecognition, devices);
            assert_eq!(resolve_input(DeviceMask::NONE, AudioMode::Normal, &ctx), Some(want));
        }
    }

    #[test]
    fn reserved_input_bits_fall_back_to_output_device() {
        let ctx = mic(AudioSource::VoiceRecognition, DeviceMask::IN_VOICE_CALL);
        let cases = [
            (DeviceMask::OUT_EARPIECE, Route::EarpieceMic),
            (DeviceMask::OUT_WIRED_HEADSET, Route::HeadsetMic),
            (DeviceMask::OUT_SPEAKER, Route::SpeakerMic),
            (DeviceMask::OUT_WIRED_HEADPHONE, Route::HandsetMic),
            (DeviceMask::OUT_BLUETOOTH_SCO_HEADSET, Route::BtScoMic),
            (DeviceMask::NONE, Route::HandsetMic),
        ];

        for (out, want) in cases {
            assert_eq!(resolve_input(out, AudioMode::Normal, &ctx), Some(want), "{}", out);
        }
    }
}
