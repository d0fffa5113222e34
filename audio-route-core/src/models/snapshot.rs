use serde::Serialize;

use super::devices::{AudioMode, DeviceMask};
use super::usecase::{StreamId, Usecase};
use crate::routing::catalog::Route;
use crate::traits::telephony::CallAudioPath;

/// A simple route that is physically engaged, with its reference count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRefs {
    pub route: Route,
    pub refs: u32,
}

/// Point-in-time view of the routing state, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    /// RFC 3339 time the snapshot was taken.
    pub taken_at: String,
    pub mode: AudioMode,
    pub wideband: bool,
    pub mic_mute: bool,
    pub voice_volume: f32,
    /// Modem audio path while a call is up.
    pub call_path: Option<CallAudioPath>,
    pub primary_output: Option<StreamId>,
    /// Devices of every output not in standby.
    pub output_devices: DeviceMask,
    pub usecases: Vec<Usecase>,
    pub active_routes: Vec<RouteRefs>,
}

impl DeviceSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
