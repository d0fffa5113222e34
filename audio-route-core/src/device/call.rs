//! Voice call lifecycle and the modem-facing controls.

use crate::models::devices::{AudioMode, DeviceMask};
use crate::models::error::RouteError;
use crate::models::usecase::UsecaseId;
use crate::routing::catalog::Direction;
use crate::traits::telephony::{CallAudioPath, ClockSync, SoundType};

use super::state::DeviceState;

/// Modem audio path for the exact output device set of the call.
pub fn call_audio_path(devices: DeviceMask) -> CallAudioPath {
    match devices {
        DeviceMask::OUT_SPEAKER => CallAudioPath::Speaker,
        DeviceMask::OUT_EARPIECE => CallAudioPath::Handset,
        DeviceMask::OUT_WIRED_HEADSET => CallAudioPath::Headset,
        DeviceMask::OUT_WIRED_HEADPHONE => CallAudioPath::Headphone,
        DeviceMask::OUT_BLUETOOTH_SCO
        | DeviceMask::OUT_BLUETOOTH_SCO_HEADSET
        | DeviceMask::OUT_BLUETOOTH_SCO_CARKIT => CallAudioPath::Bluetooth,
        _ => CallAudioPath::Handset,
    }
}

/// Volume category for the exact output device set of the call.
pub fn call_sound_type(devices: DeviceMask) -> SoundType {
    match devices {
        DeviceMask::OUT_EARPIECE => SoundType::Voice,
        DeviceMask::OUT_SPEAKER => SoundType::Speaker,
        DeviceMask::OUT_WIRED_HEADSET | DeviceMask::OUT_WIRED_HEADPHONE => SoundType::Headset,
        DeviceMask::OUT_BLUETOOTH_SCO
        | DeviceMask::OUT_BLUETOOTH_SCO_HEADSET
        | DeviceMask::OUT_BLUETOOTH_SCO_CARKIT => SoundType::BtVoice,
        _ => SoundType::Voice,
    }
}

impl DeviceState {
    /// Switches telephony mode. Entering in-call starts the call, leaving it
    /// stops the call.
    pub fn set_mode(&mut self, mode: AudioMode) -> Result<(), RouteError> {
        if self.mode == mode {
            return Ok(());
        }
        log::info!("Mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;

        if mode.is_in_call() {
            self.start_call()
        } else {
            self.stop_call()
        }
    }

    pub fn start_call(&mut self) -> Result<(), RouteError> {
        if self.call_active() {
            return Ok(());
        }
        let stream = self.primary_output.ok_or(RouteError::NoPrimaryOutput)?;

        let mut devices = self.call_output_devices();
        if devices.is_none() {
            log::debug!("No output device selected, using earpiece for the call");
            devices = DeviceMask::OUT_EARPIECE;
        }

        log::info!("Starting voice call on {}", devices);
        self.usecases.create(UsecaseId::VoiceCall, stream, devices)?;

        if let Err(e) = self.select_devices(UsecaseId::VoiceCall) {
            log::error!("Failed to route voice call: {}", e);
            self.abort_call();
            return Err(e);
        }
        if let Err(e) = self.open_call_link() {
            log::error!("Failed to open modem link: {}", e);
            self.abort_call();
            return Err(e);
        }

        self.apply_voice_volume();
        Ok(())
    }

    /// Ends the modem side of the call. The call usecase is only torn down
    /// once the mode has left in-call.
    pub fn stop_call(&mut self) -> Result<(), RouteError> {
        if !self.call_active() {
            return Ok(());
        }

        log::info!("Stopping voice call");
        self.telephony.set_clock_sync(ClockSync::Stop);
        self.call_link.clear();

        if self.mode.is_in_call() {
            return Ok(());
        }

        self.teardown_usecase(UsecaseId::VoiceCall)?;
        let remaining = self.usecases.ids();
        self.select_many(remaining)
    }

    /// Tears a half-started call back down, leaving the other usecases on
    /// their own routes.
    fn abort_call(&mut self) {
        self.call_link.clear();
        if let Err(e) = self.teardown_usecase(UsecaseId::VoiceCall) {
            log::error!("Failed to tear down voice call: {}", e);
        }
        let remaining = self.usecases.ids();
        if let Err(e) = self.select_many(remaining) {
            log::error!("Failed to restore routes after call failure: {}", e);
        }
    }

    fn open_call_link(&mut self) -> Result<(), RouteError> {
        self.call_link.clear();
        let profile = self.profiles.voice(self.wideband).clone();
        log::debug!("Opening modem link at {} Hz", profile.config.rate);
        let rx = self.transport.open(&profile, Direction::Output)?;
        let tx = self.transport.open(&profile, Direction::Input)?;
        self.call_link = vec![rx, tx];
        Ok(())
    }

    /// Tells the modem where the call audio goes and starts the call clock.
    pub(crate) fn setup_call_path(&mut self) {
        let devices = self.call_output_devices();
        let two_mic = devices == DeviceMask::OUT_EARPIECE || devices == DeviceMask::OUT_SPEAKER;
        log::debug!("Call path for {}: two-mic {}", devices, two_mic);

        self.telephony.set_two_mic_control(two_mic);
        self.telephony.set_call_audio_path(call_audio_path(devices));
        self.apply_voice_volume();
        self.telephony.set_clock_sync(ClockSync::Start);
    }

    fn apply_voice_volume(&mut self) {
        if !self.mode.is_in_call() {
            return;
        }
        let sound_type = call_sound_type(self.call_output_devices());
        self.telephony.set_call_volume(sound_type, self.voice_volume);
    }

    pub fn set_voice_volume(&mut self, volume: f32) -> Result<(), RouteError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(RouteError::InvalidConfiguration(format!(
                "voice volume out of range: {}",
                volume
            )));
        }
        self.voice_volume = volume;
        self.apply_voice_volume();
        Ok(())
    }

    /// Forwards the mute state to the modem while a call is up.
    pub fn apply_mic_mute(&mut self, muted: bool) {
        if self.call_active() {
            self.telephony.set_muted(muted);
        }
    }

    /// Changes the wideband flag. During a call the call routes switch to the
    /// matching variants and the modem link is reopened at the new rate.
    pub fn set_wideband(&mut self, wideband: bool) -> Result<(), RouteError> {
        if self.wideband == wideband {
            return Ok(());
        }
        log::info!("Wideband voice {}", if wideband { "on" } else { "off" });
        self.wideband = wideband;

        if !self.call_active() {
            return Ok(());
        }
        self.select_devices(UsecaseId::VoiceCall)?;
        self.open_call_link()
    }
}
