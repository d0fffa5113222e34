use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::activation::RouteActivation;
use crate::engine::registry::UsecaseRegistry;
use crate::models::config::EngineConfig;
use crate::models::devices::{AudioMode, AudioSource, ChannelMask, DeviceMask};
use crate::models::usecase::{ClassSet, StreamId, UsecaseId};
use crate::routing::profiles::PcmProfileRegistry;
use crate::routing::resolver::InputContext;
use crate::traits::path_applier::PathApplier;
use crate::traits::telephony::Telephony;
use crate::traits::transport::{PcmEndpoint, PcmTransport};

/// Routing attributes of an open output stream, mirrored here so routing
/// decisions never need to take a stream lock while the device lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRouting {
    pub devices: DeviceMask,
    pub standby: bool,
}

/// Everything the device lock protects.
pub struct DeviceState {
    pub(crate) mode: AudioMode,
    pub(crate) wideband: bool,
    pub(crate) voice_volume: f32,
    pub(crate) usecases: UsecaseRegistry,
    pub(crate) activation: RouteActivation,
    pub(crate) telephony: Box<dyn Telephony>,
    pub(crate) transport: Arc<dyn PcmTransport>,
    pub(crate) profiles: Arc<PcmProfileRegistry>,
    pub(crate) primary_output: Option<StreamId>,
    pub(crate) outputs: BTreeMap<StreamId, OutputRouting>,
    /// Modem link endpoints (rx, tx), open while a call is up.
    pub(crate) call_link: Vec<Box<dyn PcmEndpoint>>,
}

impl DeviceState {
    pub fn new(
        config: &EngineConfig,
        applier: Box<dyn PathApplier>,
        telephony: Box<dyn Telephony>,
        transport: Arc<dyn PcmTransport>,
        profiles: Arc<PcmProfileRegistry>,
    ) -> Self {
        Self {
            mode: AudioMode::Normal,
            wideband: config.wideband,
            voice_volume: config.voice_volume,
            usecases: UsecaseRegistry::new(),
            activation: RouteActivation::new(applier, config.debounce()),
            telephony,
            transport,
            profiles,
            primary_output: None,
            outputs: BTreeMap::new(),
            call_link: Vec::new(),
        }
    }

    pub fn mode(&self) -> AudioMode {
        self.mode
    }

    pub fn usecases(&self) -> &UsecaseRegistry {
        &self.usecases
    }

    pub fn activation(&self) -> &RouteActivation {
        &self.activation
    }

    pub fn call_active(&self) -> bool {
        self.usecases.contains(UsecaseId::VoiceCall)
    }

    /// Devices of every output that is not in standby.
    pub fn active_output_devices(&self) -> DeviceMask {
        self.outputs
            .values()
            .filter(|out| !out.standby)
            .fold(DeviceMask::NONE, |acc, out| acc | out.devices)
    }

    /// Output devices the call is routed to: the call usecase's mask, or the
    /// primary output's mask before the call is set up.
    pub(crate) fn call_output_devices(&self) -> DeviceMask {
        if let Some(call) = self.usecases.find_by_id(UsecaseId::VoiceCall) {
            return call.devices;
        }
        self.primary_output
            .and_then(|id| self.outputs.get(&id))
            .map(|out| out.devices)
            .unwrap_or(DeviceMask::NONE)
    }

    /// Source, devices and channels of the active capture or call.
    pub(crate) fn input_context(&self) -> InputContext {
        match self.usecases.find_by_class(ClassSet::INPUT_CONTEXT) {
            Some(uc) if uc.is_voice_call() => {
                InputContext::new(AudioSource::VoiceCall, DeviceMask::IN_VOICE_CALL, ChannelMask::Mono)
            }
            Some(uc) => InputContext::new(uc.source, uc.devices, uc.channel_mask),
            None => InputContext::NONE,
        }
    }

    /// Devices of the primary output when it is open and out of standby.
    pub(crate) fn active_primary_devices(&self) -> Option<DeviceMask> {
        let id = self.primary_output?;
        self.outputs
            .get(&id)
            .filter(|out| !out.standby)
            .map(|out| out.devices)
    }

    pub(crate) fn register_output(&mut self, id: StreamId, devices: DeviceMask, primary: bool) {
        self.outputs.insert(
            id,
            OutputRouting {
                devices,
                standby: true,
            },
        );
        if primary && self.primary_output.is_none() {
            log::info!("{} is the primary output", id);
            self.primary_output = Some(id);
            if let Some(call) = self.usecases.find_by_id_mut(UsecaseId::VoiceCall) {
                log::debug!("Voice call follows {}", id);
                call.stream = id;
            }
        }
    }

    pub(crate) fn unregister_output(&mut self, id: StreamId) {
        self.outputs.remove(&id);
        if self.primary_output == Some(id) {
            self.primary_output = None;
        }
    }

    pub(crate) fn update_output(&mut self, id: StreamId, update: impl FnOnce(&mut OutputRouting)) {
        if let Some(out) = self.outputs.get_mut(&id) {
            update(out);
        }
    }
}
