//! # audio-route-core
//!
//! Audio routing and usecase lifecycle engine.
//!
//! Decides which physical mixer paths ("routes") must be engaged for every
//! concurrently active playback stream, capture stream and voice call, and
//! keeps them engaged exactly as long as something needs them. Mixer access,
//! the modem and the PCM transport are collaborators behind traits.
//!
//! ## Architecture
//!
//! ```text
//! audio-route-core (this crate)
//! ├── traits/    ← PathApplier, Telephony, PcmTransport / PcmEndpoint
//! ├── models/    ← DeviceMask, Usecase, RouteError, EngineConfig, DeviceSnapshot
//! ├── routing/   ← Route catalog, PCM profile registry, output/input resolvers
//! ├── engine/    ← RouteActivation (refcounts, debounce), UsecaseRegistry
//! └── device/    ← DeviceState, select_devices, voice call, AudioDevice + streams
//! ```

pub mod device;
pub mod engine;
pub mod models;
pub mod routing;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use device::audio_device::AudioDevice;
pub use device::lock::StreamLock;
pub use device::state::DeviceState;
pub use device::stream::{InputConfig, InputStream, OutputConfig, OutputKind, OutputStream};
pub use engine::activation::RouteActivation;
pub use engine::registry::UsecaseRegistry;
pub use models::config::EngineConfig;
pub use models::devices::{AudioMode, AudioSource, ChannelMask, DeviceMask};
pub use models::error::RouteError;
pub use models::snapshot::{DeviceSnapshot, RouteRefs};
pub use models::usecase::{CaptureLatency, ClassSet, RoutePair, StreamId, Usecase, UsecaseClass, UsecaseId};
pub use routing::catalog::{Direction, Route};
pub use routing::profiles::{PcmConfig, PcmProfile, PcmProfileRegistry};
pub use routing::resolver::{resolve_input, resolve_output, InputContext};
pub use traits::path_applier::PathApplier;
pub use traits::telephony::{CallAudioPath, ClockSync, NoTelephony, SoundType, Telephony};
pub use traits::transport::{PcmEndpoint, PcmTransport};
