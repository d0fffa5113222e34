//! # audio-route-mixer
//!
//! Mixer path backend for audio-route-core.
//!
//! Provides:
//! - `MixerPaths`: control declarations and per-route control settings, loaded from JSON
//! - `SoftMixer`: in-memory control table
//! - `MixerPathApplier`: `PathApplier` that engages and resets named paths
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use audio_route_core::{AudioDevice, EngineConfig, NoTelephony};
//! use audio_route_mixer::{MixerPathApplier, MixerPaths};
//!
//! let applier = MixerPathApplier::new(MixerPaths::load("mixer_paths.json")?);
//! let device = AudioDevice::new(EngineConfig::default(), Box::new(applier), Box::new(NoTelephony), transport)?;
//! ```

pub mod applier;
pub mod error;
pub mod paths;
pub mod soft_mixer;

pub use applier::MixerPathApplier;
pub use error::MixerError;
pub use paths::{ControlSetting, MixerPaths};
pub use soft_mixer::SoftMixer;
