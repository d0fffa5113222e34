use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::models::config::EngineConfig;
use crate::models::devices::AudioMode;
use crate::models::error::RouteError;
use crate::models::snapshot::{DeviceSnapshot, RouteRefs};
use crate::models::usecase::StreamId;
use crate::routing::profiles::{check_input_parameters, PcmProfileRegistry};
use crate::traits::path_applier::PathApplier;
use crate::traits::telephony::Telephony;
use crate::traits::transport::PcmTransport;

use super::call::call_audio_path;
use super::state::DeviceState;
use super::stream::{InputConfig, InputInner, InputStream, OutputConfig, OutputInner, OutputKind, OutputState, OutputStream};

/// State shared between the device and its stream handles.
pub(crate) struct Shared {
    pub(crate) device: Mutex<DeviceState>,
    /// Open outputs in open order, which is also the order their locks are
    /// taken in.
    outputs: Mutex<Vec<Arc<OutputInner>>>,
    inputs: Mutex<Vec<Arc<InputInner>>>,
    pub(crate) mic_mute: AtomicBool,
    profiles: Arc<PcmProfileRegistry>,
    next_stream: AtomicU32,
}

impl Shared {
    /// Runs `f` with every output stream frozen: outputs list, each output
    /// lock in open order, then the device lock.
    pub(crate) fn with_outputs_frozen<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<StreamId, MutexGuard<'_, OutputState>>, &mut DeviceState) -> R,
    ) -> R {
        let list = self.outputs.lock();
        let streams: Vec<Arc<OutputInner>> = list.clone();
        let mut guards: BTreeMap<StreamId, MutexGuard<'_, OutputState>> = streams
            .iter()
            .map(|stream| (stream.id, stream.state.lock()))
            .collect();
        let mut device = self.device.lock();
        let result = f(&mut guards, &mut device);
        drop(device);
        drop(guards);
        drop(list);
        result
    }

    fn next_stream_id(&self) -> StreamId {
        StreamId(self.next_stream.fetch_add(1, Ordering::Relaxed))
    }
}

/// The audio device: owns routing state and hands out stream handles.
///
/// ```text
/// AudioDevice
/// ├── device lock    → DeviceState (usecases, route refcounts, telephony)
/// ├── outputs lock   → open OutputStreams, each behind a StreamLock
/// └── inputs lock    → open InputStreams, each behind a StreamLock
/// ```
pub struct AudioDevice {
    shared: Arc<Shared>,
}

impl AudioDevice {
    pub fn new(
        config: EngineConfig,
        applier: Box<dyn PathApplier>,
        telephony: Box<dyn Telephony>,
        transport: Arc<dyn PcmTransport>,
    ) -> Result<Self, RouteError> {
        config.validate().map_err(RouteError::InvalidConfiguration)?;

        let profiles = Arc::new(PcmProfileRegistry::builtin());
        let device = DeviceState::new(&config, applier, telephony, transport, Arc::clone(&profiles));
        log::info!(
            "Audio device ready (debounce {}ms, wideband {})",
            config.debounce_ms,
            config.wideband
        );

        Ok(Self {
            shared: Arc::new(Shared {
                device: Mutex::new(device),
                outputs: Mutex::new(Vec::new()),
                inputs: Mutex::new(Vec::new()),
                mic_mute: AtomicBool::new(false),
                profiles,
                next_stream: AtomicU32::new(1),
            }),
        })
    }

    pub fn open_output_stream(&self, config: OutputConfig) -> Result<OutputStream, RouteError> {
        config.validate()?;

        let mut outputs = self.shared.outputs.lock();
        if outputs.iter().any(|out| out.config.kind == config.kind) {
            return Err(RouteError::InvalidStreamConfig(format!(
                "{} output already open",
                config.kind.usecase()
            )));
        }

        let id = self.shared.next_stream_id();
        let inner = Arc::new(OutputInner::new(id, config));
        outputs.push(Arc::clone(&inner));
        self.shared
            .device
            .lock()
            .register_output(id, config.devices, config.kind == OutputKind::Primary);
        log::debug!("Opened output {} ({:?} on {})", id, config.kind, config.devices);

        Ok(OutputStream {
            inner,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Puts the stream in standby and forgets it.
    pub fn close_output_stream(&self, stream: OutputStream) -> Result<(), RouteError> {
        let id = stream.id();
        let result = stream.standby();
        if let Err(e) = &result {
            log::error!("Failed to stop {} while closing: {}", id, e);
        }

        let mut outputs = self.shared.outputs.lock();
        outputs.retain(|out| out.id != id);
        self.shared.device.lock().unregister_output(id);
        log::debug!("Closed output {}", id);
        result
    }

    pub fn open_input_stream(&self, config: InputConfig) -> Result<InputStream, RouteError> {
        if !config.devices.is_input() {
            return Err(RouteError::InvalidDeviceMask(config.devices));
        }
        check_input_parameters(config.sample_rate, config.channel_mask.channel_count())?;

        // One capture at a time: the input resolver has a single active-input
        // context.
        let mut inputs = self.shared.inputs.lock();
        if let Some(open) = inputs.first() {
            return Err(RouteError::InvalidStreamConfig(format!(
                "input {} already open",
                open.id
            )));
        }

        let id = self.shared.next_stream_id();
        let inner = Arc::new(InputInner::new(id, config));
        inputs.push(Arc::clone(&inner));
        log::debug!("Opened input {} ({:?} on {})", id, config.source, config.devices);

        Ok(InputStream {
            inner,
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn close_input_stream(&self, stream: InputStream) -> Result<(), RouteError> {
        let id = stream.id();
        let result = stream.standby();
        if let Err(e) = &result {
            log::error!("Failed to stop {} while closing: {}", id, e);
        }

        self.shared.inputs.lock().retain(|input| input.id != id);
        log::debug!("Closed input {}", id);
        result
    }

    /// Capture buffer size in bytes for `config`, or 0 if unsupported.
    pub fn input_buffer_size(&self, config: &InputConfig) -> usize {
        self.shared.profiles.input_buffer_size(
            config.sample_rate,
            config.channel_mask.channel_count(),
            config.usecase().class(),
            config.devices,
        )
    }

    pub fn mode(&self) -> AudioMode {
        self.shared.device.lock().mode()
    }

    pub fn set_mode(&self, mode: AudioMode) -> Result<(), RouteError> {
        self.shared.device.lock().set_mode(mode)
    }

    pub fn set_voice_volume(&self, volume: f32) -> Result<(), RouteError> {
        self.shared.device.lock().set_voice_volume(volume)
    }

    pub fn set_mic_mute(&self, muted: bool) {
        let mut device = self.shared.device.lock();
        log::debug!("Mic mute {}", muted);
        device.apply_mic_mute(muted);
        self.shared.mic_mute.store(muted, Ordering::Relaxed);
    }

    pub fn mic_mute(&self) -> bool {
        self.shared.mic_mute.load(Ordering::Relaxed)
    }

    pub fn set_wideband(&self, wideband: bool) -> Result<(), RouteError> {
        self.shared.device.lock().set_wideband(wideband)
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        let device = self.shared.device.lock();
        DeviceSnapshot {
            taken_at: chrono::Utc::now().to_rfc3339(),
            mode: device.mode,
            wideband: device.wideband,
            mic_mute: self.mic_mute(),
            voice_volume: device.voice_volume,
            call_path: device
                .call_active()
                .then(|| call_audio_path(device.call_output_devices())),
            primary_output: device.primary_output,
            output_devices: device.active_output_devices(),
            usecases: device.usecases().iter().cloned().collect(),
            active_routes: device
                .activation()
                .active_routes()
                .into_iter()
                .map(|(route, refs)| RouteRefs { route, refs })
                .collect(),
        }
    }
}
