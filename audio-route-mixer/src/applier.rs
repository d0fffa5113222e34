use std::sync::Arc;

use parking_lot::Mutex;

use audio_route_core::traits::path_applier::PathApplier;

use crate::error::MixerError;
use crate::paths::MixerPaths;
use crate::soft_mixer::SoftMixer;

/// Applies named mixer paths to a [`SoftMixer`].
///
/// Several active paths may set the same control. Unapplying a path puts
/// each of its controls back to the value of the most recently applied path
/// that is still active, or to the declared default.
pub struct MixerPathApplier {
    paths: MixerPaths,
    mixer: Arc<Mutex<SoftMixer>>,
    active: Vec<String>,
}

impl MixerPathApplier {
    pub fn new(paths: MixerPaths) -> Self {
        let mixer = SoftMixer::new(&paths.controls);
        Self {
            paths,
            mixer: Arc::new(Mutex::new(mixer)),
            active: Vec::new(),
        }
    }

    /// Handle to the control table, for inspection while the applier is
    /// owned by the routing engine.
    pub fn mixer(&self) -> Arc<Mutex<SoftMixer>> {
        Arc::clone(&self.mixer)
    }

    pub fn active_paths(&self) -> &[String] {
        &self.active
    }

    fn try_apply(&mut self, name: &str) -> Result<(), MixerError> {
        let settings = self
            .paths
            .path(name)
            .ok_or_else(|| MixerError::UnknownPath(name.to_string()))?;

        let mut mixer = self.mixer.lock();
        for setting in settings {
            mixer.set(&setting.control, setting.value)?;
        }
        drop(mixer);

        self.active.retain(|active| active != name);
        self.active.push(name.to_string());
        Ok(())
    }

    fn try_unapply(&mut self, name: &str) -> Result<(), MixerError> {
        let settings = self
            .paths
            .path(name)
            .ok_or_else(|| MixerError::UnknownPath(name.to_string()))?;
        self.active.retain(|active| active != name);

        let mut mixer = self.mixer.lock();
        for setting in settings {
            let value = self
                .active
                .iter()
                .rev()
                .filter_map(|active| self.paths.path(active))
                .flat_map(|other| other.iter())
                .find(|other| other.control == setting.control)
                .map(|other| other.value)
                .or_else(|| self.paths.controls.get(&setting.control).copied())
                .ok_or_else(|| MixerError::NoSuchControl(setting.control.clone()))?;
            mixer.set(&setting.control, value)?;
        }
        Ok(())
    }
}

impl PathApplier for MixerPathApplier {
    fn apply(&mut self, route_name: &str) {
        log::debug!("Applying mixer path {}", route_name);
        if let Err(e) = self.try_apply(route_name) {
            log::error!("Failed to apply mixer path {}: {}", route_name, e);
        }
    }

    fn unapply(&mut self, route_name: &str) {
        log::debug!("Resetting mixer path {}", route_name);
        if let Err(e) = self.try_unapply(route_name) {
            log::error!("Failed to reset mixer path {}: {}", route_name, e);
        }
    }
}
