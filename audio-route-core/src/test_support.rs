//! Recording fakes for the collaborator traits.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::models::error::RouteError;
use crate::routing::catalog::Direction;
use crate::routing::profiles::PcmProfile;
use crate::traits::path_applier::PathApplier;
use crate::traits::telephony::{CallAudioPath, ClockSync, SoundType, Telephony};
use crate::traits::transport::{PcmEndpoint, PcmTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEvent {
    Apply(String),
    Unapply(String),
}

/// Path applier that records every call with its time.
#[derive(Clone, Default)]
pub struct RecordingApplier {
    log: Arc<Mutex<Vec<(PathEvent, Instant)>>>,
}

impl RecordingApplier {
    pub fn events(&self) -> Vec<PathEvent> {
        self.log.lock().iter().map(|(event, _)| event.clone()).collect()
    }

    pub fn timestamps(&self) -> Vec<Instant> {
        self.log.lock().iter().map(|(_, at)| *at).collect()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl PathApplier for RecordingApplier {
    fn apply(&mut self, route_name: &str) {
        self.log
            .lock()
            .push((PathEvent::Apply(route_name.to_string()), Instant::now()));
    }

    fn unapply(&mut self, route_name: &str) {
        self.log
            .lock()
            .push((PathEvent::Unapply(route_name.to_string()), Instant::now()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelephonyEvent {
    AudioPath(CallAudioPath),
    Volume(SoundType, f32),
    ClockSync(ClockSync),
    TwoMic(bool),
    Muted(bool),
}

#[derive(Clone, Default)]
pub struct RecordingTelephony {
    log: Arc<Mutex<Vec<TelephonyEvent>>>,
}

impl RecordingTelephony {
    pub fn events(&self) -> Vec<TelephonyEvent> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Telephony for RecordingTelephony {
    fn set_call_audio_path(&mut self, path: CallAudioPath) {
        self.log.lock().push(TelephonyEvent::AudioPath(path));
    }

    fn set_call_volume(&mut self, sound_type: SoundType, volume: f32) {
        self.log.lock().push(TelephonyEvent::Volume(sound_type, volume));
    }

    fn set_clock_sync(&mut self, sync: ClockSync) {
        self.log.lock().push(TelephonyEvent::ClockSync(sync));
    }

    fn set_two_mic_control(&mut self, enabled: bool) {
        self.log.lock().push(TelephonyEvent::TwoMic(enabled));
    }

    fn set_muted(&mut self, muted: bool) {
        self.log.lock().push(TelephonyEvent::Muted(muted));
    }
}

#[derive(Default)]
struct TransportLog {
    opened: Vec<(&'static str, Direction, u32)>,
    open_endpoints: usize,
    bytes_written: usize,
    fail_opens: bool,
}

/// Transport whose endpoints swallow writes and fill reads with a marker.
#[derive(Clone, Default)]
pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    /// (profile name, direction, rate) of every successful open.
    pub fn opened(&self) -> Vec<(&'static str, Direction, u32)> {
        self.log.lock().opened.clone()
    }

    pub fn open_endpoints(&self) -> usize {
        self.log.lock().open_endpoints
    }

    pub fn bytes_written(&self) -> usize {
        self.log.lock().bytes_written
    }

    pub fn fail_opens(&self, fail: bool) {
        self.log.lock().fail_opens = fail;
    }
}

impl PcmTransport for FakeTransport {
    fn open(&self, profile: &PcmProfile, direction: Direction) -> Result<Box<dyn PcmEndpoint>, RouteError> {
        let mut log = self.log.lock();
        if log.fail_opens {
            return Err(RouteError::Transport(format!("cannot open {}", profile.name)));
        }
        log.opened.push((profile.name, direction, profile.config.rate));
        log.open_endpoints += 1;
        Ok(Box::new(FakeEndpoint {
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeEndpoint {
    log: Arc<Mutex<TransportLog>>,
}

impl PcmEndpoint for FakeEndpoint {
    fn write(&mut self, data: &[u8]) -> Result<(), RouteError> {
        self.log.lock().bytes_written += data.len();
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<(), RouteError> {
        data.fill(0x5a);
        Ok(())
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        self.log.lock().open_endpoints -= 1;
    }
}
