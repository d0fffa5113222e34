//! Output and input stream handles.
//!
//! Lock order, outermost first: outputs list, output stream locks in open
//! order, device lock. Input stream locks are only ever combined with the
//! device lock.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::models::devices::{AudioSource, ChannelMask, DeviceMask};
use crate::models::error::RouteError;
use crate::models::usecase::{StreamId, Usecase, UsecaseClass, UsecaseId};
use crate::routing::catalog::Direction;
use crate::traits::transport::PcmEndpoint;

use super::audio_device::Shared;
use super::lock::StreamLock;
use super::state::DeviceState;

/// Which playback path an output stream feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// The main mixer output. The first one opened becomes the primary
    /// output the voice call follows.
    Primary,
    DeepBuffer,
    MultiChannel,
}

impl OutputKind {
    pub fn usecase(self) -> UsecaseId {
        match self {
            Self::Primary => UsecaseId::Playback,
            Self::DeepBuffer => UsecaseId::PlaybackDeepBuffer,
            Self::MultiChannel => UsecaseId::PlaybackMultiChannel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub kind: OutputKind,
    pub devices: DeviceMask,
    pub sample_rate: u32,
    pub channels: u16,
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.devices.is_input() {
            return Err(RouteError::InvalidDeviceMask(self.devices));
        }
        if self.sample_rate == 0 {
            return Err(RouteError::InvalidStreamConfig("sample rate must be positive".into()));
        }
        if !(1..=8).contains(&self.channels) {
            return Err(RouteError::InvalidStreamConfig(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        Ok(())
    }

    fn frame_bytes(&self) -> usize {
        self.channels as usize * 2
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: OutputKind::Primary,
            devices: DeviceMask::OUT_SPEAKER,
            sample_rate: 48000,
            channels: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    pub devices: DeviceMask,
    pub source: AudioSource,
    pub sample_rate: u32,
    pub channel_mask: ChannelMask,
    pub low_latency: bool,
}

impl InputConfig {
    pub fn usecase(&self) -> UsecaseId {
        if self.low_latency {
            UsecaseId::CaptureLowLatency
        } else {
            UsecaseId::Capture
        }
    }

    fn frame_bytes(&self) -> usize {
        self.channel_mask.channel_count() as usize * 2
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            devices: DeviceMask::IN_BUILTIN_MIC,
            source: AudioSource::Mic,
            sample_rate: 48000,
            channel_mask: ChannelMask::Mono,
            low_latency: false,
        }
    }
}

/// Transport endpoints of an active stream, one per PCM profile covering
/// its devices.
#[derive(Default)]
struct EndpointSet {
    profiles: Vec<&'static str>,
    endpoints: Vec<Box<dyn PcmEndpoint>>,
}

impl EndpointSet {
    fn profile_names(device: &DeviceState, class: UsecaseClass, devices: DeviceMask) -> Vec<&'static str> {
        device
            .profiles
            .select_all(class, devices)
            .iter()
            .map(|profile| profile.name)
            .collect()
    }

    fn open(
        device: &DeviceState,
        class: UsecaseClass,
        devices: DeviceMask,
        direction: Direction,
    ) -> Result<Self, RouteError> {
        let profiles = device.profiles.select_all(class, devices);
        if profiles.is_empty() {
            return Err(RouteError::NoPcmProfile { class, devices });
        }

        let mut set = Self::default();
        for profile in profiles {
            log::debug!("Opening pcm {} ({} Hz)", profile.name, profile.config.rate);
            set.endpoints.push(device.transport.open(profile, direction)?);
            set.profiles.push(profile.name);
        }
        Ok(set)
    }

    fn close(&mut self) {
        self.endpoints.clear();
        self.profiles.clear();
    }
}

pub(crate) struct OutputState {
    standby: bool,
    devices: DeviceMask,
    link: EndpointSet,
    frames_written: u64,
}

pub(crate) struct OutputInner {
    pub(crate) id: StreamId,
    pub(crate) config: OutputConfig,
    pub(crate) state: StreamLock<OutputState>,
}

impl OutputInner {
    pub(crate) fn new(id: StreamId, config: OutputConfig) -> Self {
        Self {
            id,
            config,
            state: StreamLock::new(OutputState {
                standby: true,
                devices: config.devices,
                link: EndpointSet::default(),
                frames_written: 0,
            }),
        }
    }

    fn usecase(&self) -> UsecaseId {
        self.config.kind.usecase()
    }

    /// Registers the usecase, routes it and opens the transport. Any failure
    /// leaves the stream in standby with no usecase.
    fn start(&self, state: &mut OutputState, device: &mut DeviceState) -> Result<(), RouteError> {
        let usecase = self.usecase();
        log::debug!("{}: leaving standby on {}", self.id, state.devices);

        device.update_output(self.id, |out| out.standby = false);
        match self.bring_up(state.devices, device) {
            Ok(link) => {
                state.link = link;
                state.standby = false;
                Ok(())
            }
            Err(e) => {
                log::error!("{}: failed to start: {}", self.id, e);
                device.update_output(self.id, |out| out.standby = true);
                let owned = device
                    .usecases
                    .find_by_id(usecase)
                    .is_some_and(|uc| uc.stream == self.id);
                if owned {
                    if let Err(teardown) = device.teardown_usecase(usecase) {
                        log::error!("{}: failed to release routes: {}", self.id, teardown);
                    }
                }
                Err(e)
            }
        }
    }

    fn bring_up(&self, devices: DeviceMask, device: &mut DeviceState) -> Result<EndpointSet, RouteError> {
        let usecase = self.usecase();
        device.usecases.create(usecase, self.id, devices)?;
        device.select_devices(usecase)?;
        EndpointSet::open(device, UsecaseClass::Playback, devices, Direction::Output)
    }

    fn stop(&self, state: &mut OutputState, device: &mut DeviceState) -> Result<(), RouteError> {
        if state.standby {
            return Ok(());
        }
        log::debug!("{}: entering standby", self.id);
        state.link.close();
        state.standby = true;
        device.update_output(self.id, |out| out.standby = true);
        device.teardown_usecase(self.usecase())
    }

    fn reroute(&self, state: &mut OutputState, device: &mut DeviceState, devices: DeviceMask) -> Result<(), RouteError> {
        state.devices = devices;
        device.update_output(self.id, |out| out.devices = devices);

        if device.primary_output == Some(self.id) && device.call_active() {
            device.select_devices(UsecaseId::VoiceCall)?;
        }
        if state.standby {
            return Ok(());
        }

        let usecase = self.usecase();
        if let Some(uc) = device.usecases.find_by_id_mut(usecase) {
            uc.devices = devices;
        }
        device.select_devices(usecase)?;

        if EndpointSet::profile_names(device, UsecaseClass::Playback, devices) != state.link.profiles {
            state.link.close();
            match EndpointSet::open(device, UsecaseClass::Playback, devices, Direction::Output) {
                Ok(link) => state.link = link,
                Err(e) => {
                    log::error!("{}: failed to reopen pcm: {}", self.id, e);
                    self.stop(state, device)?;
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Handle to an open output stream.
pub struct OutputStream {
    pub(crate) inner: Arc<OutputInner>,
    pub(crate) shared: Arc<Shared>,
}

impl OutputStream {
    pub fn id(&self) -> StreamId {
        self.inner.id
    }

    pub fn config(&self) -> OutputConfig {
        self.inner.config
    }

    pub fn devices(&self) -> DeviceMask {
        self.inner.state.lock().devices
    }

    pub fn is_standby(&self) -> bool {
        self.inner.state.lock().standby
    }

    /// Frames written since the stream was opened, across standby cycles.
    pub fn frames_written(&self) -> u64 {
        self.inner.state.lock().frames_written
    }

    /// Writes interleaved 16-bit frames, leaving standby first if needed.
    pub fn write(&self, data: &[u8]) -> Result<usize, RouteError> {
        let mut state = self.inner.state.lock();
        if state.standby {
            let mut device = self.shared.device.lock();
            self.inner.start(&mut state, &mut device)?;
        }

        for endpoint in state.link.endpoints.iter_mut() {
            endpoint.write(data)?;
        }
        state.frames_written += (data.len() / self.inner.config.frame_bytes()) as u64;
        Ok(data.len())
    }

    pub fn standby(&self) -> Result<(), RouteError> {
        let id = self.inner.id;
        self.shared.with_outputs_frozen(|outputs, device| match outputs.get_mut(&id) {
            Some(state) => self.inner.stop(state, device),
            None => Err(RouteError::UnknownStream(id)),
        })
    }

    /// Moves the stream to `devices`. An empty mask is ignored.
    pub fn set_routing(&self, devices: DeviceMask) -> Result<(), RouteError> {
        if devices.is_input() {
            return Err(RouteError::InvalidDeviceMask(devices));
        }
        if devices.is_none() {
            log::debug!("{}: ignoring empty routing", self.inner.id);
            return Ok(());
        }

        let id = self.inner.id;
        self.shared.with_outputs_frozen(|outputs, device| match outputs.get_mut(&id) {
            Some(state) if state.devices == devices => Ok(()),
            Some(state) => {
                log::info!("{}: routing {} -> {}", id, state.devices, devices);
                self.inner.reroute(state, device, devices)
            }
            None => Err(RouteError::UnknownStream(id)),
        })
    }
}

pub(crate) struct InputState {
    standby: bool,
    devices: DeviceMask,
    source: AudioSource,
    link: EndpointSet,
    frames_read: u64,
}

pub(crate) struct InputInner {
    pub(crate) id: StreamId,
    pub(crate) config: InputConfig,
    state: StreamLock<InputState>,
}

impl InputInner {
    pub(crate) fn new(id: StreamId, config: InputConfig) -> Self {
        Self {
            id,
            config,
            state: StreamLock::new(InputState {
                standby: true,
                devices: config.devices,
                source: config.source,
                link: EndpointSet::default(),
                frames_read: 0,
            }),
        }
    }

    fn usecase(&self) -> UsecaseId {
        self.config.usecase()
    }

    fn start(&self, state: &mut InputState, device: &mut DeviceState) -> Result<(), RouteError> {
        let usecase = self.usecase();
        log::debug!("{}: leaving standby on {}", self.id, state.devices);

        match self.bring_up(state, device) {
            Ok(link) => {
                state.link = link;
                state.standby = false;
                Ok(())
            }
            Err(e) => {
                log::error!("{}: failed to start: {}", self.id, e);
                let owned = device
                    .usecases
                    .find_by_id(usecase)
                    .is_some_and(|uc| uc.stream == self.id);
                if owned {
                    if let Err(teardown) = device.teardown_usecase(usecase) {
                        log::error!("{}: failed to release routes: {}", self.id, teardown);
                    }
                }
                Err(e)
            }
        }
    }

    fn bring_up(&self, state: &InputState, device: &mut DeviceState) -> Result<EndpointSet, RouteError> {
        let usecase = self.usecase();
        let record = Usecase::new(usecase, self.id, state.devices)
            .with_source(state.source, self.config.channel_mask);
        device.usecases.insert(record)?;
        device.select_devices(usecase)?;
        EndpointSet::open(device, usecase.class(), state.devices, Direction::Input)
    }

    fn stop(&self, state: &mut InputState, device: &mut DeviceState) -> Result<(), RouteError> {
        if state.standby {
            return Ok(());
        }
        log::debug!("{}: entering standby", self.id);
        state.link.close();
        state.standby = true;
        device.teardown_usecase(self.usecase())
    }
}

/// Handle to an open input stream.
pub struct InputStream {
    pub(crate) inner: Arc<InputInner>,
    pub(crate) shared: Arc<Shared>,
}

impl InputStream {
    pub fn id(&self) -> StreamId {
        self.inner.id
    }

    pub fn config(&self) -> InputConfig {
        self.inner.config
    }

    pub fn devices(&self) -> DeviceMask {
        self.inner.state.lock().devices
    }

    pub fn source(&self) -> AudioSource {
        self.inner.state.lock().source
    }

    pub fn is_standby(&self) -> bool {
        self.inner.state.lock().standby
    }

    /// Frames read since the stream was opened, across standby cycles.
    pub fn frames_read(&self) -> u64 {
        self.inner.state.lock().frames_read
    }

    /// Fills `buf` with captured frames. Silence while the mic is muted.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, RouteError> {
        let mut state = self.inner.state.lock();
        if state.standby {
            let mut device = self.shared.device.lock();
            self.inner.start(&mut state, &mut device)?;
        }

        if let Some(endpoint) = state.link.endpoints.first_mut() {
            endpoint.read(buf)?;
        }
        if self.shared.mic_mute.load(Ordering::Relaxed) {
            buf.fill(0);
        }
        state.frames_read += (buf.len() / self.inner.config.frame_bytes()) as u64;
        Ok(buf.len())
    }

    pub fn standby(&self) -> Result<(), RouteError> {
        let mut state = self.inner.state.lock();
        let mut device = self.shared.device.lock();
        self.inner.stop(&mut state, &mut device)
    }

    /// Changes the capture source; an active stream is re-routed.
    pub fn set_input_source(&self, source: AudioSource) -> Result<(), RouteError> {
        let mut state = self.inner.state.lock();
        if state.source == source {
            return Ok(());
        }
        let mut device = self.shared.device.lock();
        log::info!("{}: source {:?} -> {:?}", self.inner.id, state.source, source);
        state.source = source;
        if state.standby {
            return Ok(());
        }

        let usecase = self.inner.usecase();
        if let Some(uc) = device.usecases.find_by_id_mut(usecase) {
            uc.source = source;
        }
        device.select_devices(usecase)
    }

    /// Moves the stream to the input `devices`. An empty mask is ignored.
    pub fn set_routing(&self, devices: DeviceMask) -> Result<(), RouteError> {
        if devices.is_none() {
            log::debug!("{}: ignoring empty routing", self.inner.id);
            return Ok(());
        }
        if !devices.is_input() {
            return Err(RouteError::InvalidDeviceMask(devices));
        }

        let mut state = self.inner.state.lock();
        if state.devices == devices {
            return Ok(());
        }
        let mut device = self.shared.device.lock();
        log::info!("{}: routing {} -> {}", self.inner.id, state.devices, devices);
        state.devices = devices;
        if state.standby {
            return Ok(());
        }

        let usecase = self.inner.usecase();
        let class = usecase.class();
        if let Some(uc) = device.usecases.find_by_id_mut(usecase) {
            uc.devices = devices;
        }
        device.select_devices(usecase)?;

        if EndpointSet::profile_names(&device, class, devices) != state.link.profiles {
            state.link.close();
            match EndpointSet::open(&device, class, devices, Direction::Input) {
                Ok(link) => state.link = link,
                Err(e) => {
                    log::error!("{}: failed to reopen pcm: {}", self.inner.id, e);
                    self.inner.stop(&mut state, &mut device)?;
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
