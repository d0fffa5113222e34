use serde::Serialize;

/// Call audio path as understood by the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallAudioPath {
    Handset,
    Headset,
    Speaker,
    Bluetooth,
    Headphone,
}

/// Volume category used by the modem for call volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundType {
    Voice,
    Speaker,
    Headset,
    BtVoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockSync {
    Start,
    Stop,
}

/// Modem-side collaborator for voice calls.
///
/// Every method is invoked with the device lock held and must return in
/// bounded time.
pub trait Telephony: Send {
    fn set_call_audio_path(&mut self, path: CallAudioPath);

    fn set_call_volume(&mut self, sound_type: SoundType, volume: f32);

    fn set_clock_sync(&mut self, sync: ClockSync);

    fn set_two_mic_control(&mut self, enabled: bool);

    fn set_muted(&mut self, muted: bool);
}

/// Telephony stand-in for devices without a modem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTelephony;

impl Telephony for NoTelephony {
    fn set_call_audio_path(&mut self, _path: CallAudioPath) {}

    fn set_call_volume(&mut self, _sound_type: SoundType, _volume: f32) {}

    fn set_clock_sync(&mut self, _sync: ClockSync) {}

    fn set_two_mic_control(&mut self, _enabled: bool) {}

    fn set_muted(&mut self, _muted: bool) {}
}
