//! Mixer path descriptions.
//!
//! A description declares every control with its default value and, per
//! route name, the ordered control settings that engage the route:
//!
//! ```json
//! {
//!   "controls": { "SPKOUTL Switch": 0 },
//!   "paths": { "speaker": [ { "control": "SPKOUTL Switch", "value": 1 } ] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use audio_route_core::models::error::RouteError;
use audio_route_core::routing::catalog::Route;

use crate::error::MixerError;

const DEFAULT_PATHS: &str = include_str!("../paths/default.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSetting {
    pub control: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MixerPaths {
    pub controls: BTreeMap<String, i32>,
    #[serde(default)]
    pub paths: BTreeMap<String, Vec<ControlSetting>>,
}

impl MixerPaths {
    /// Parses and validates a JSON description.
    pub fn from_json(json: &str) -> Result<Self, MixerError> {
        let paths: Self = serde_json::from_str(json).map_err(|e| MixerError::Parse(e.to_string()))?;
        paths.validate()?;
        Ok(paths)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MixerError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| MixerError::Io(format!("{}: {}", path.display(), e)))?;
        log::info!("Loading mixer paths from {}", path.display());
        Self::from_json(&json)
    }

    /// Paths for the reference codec, covering every simple route.
    pub fn builtin() -> Result<Self, MixerError> {
        Self::from_json(DEFAULT_PATHS)
    }

    /// Every setting must name a declared control. Paths that match no
    /// catalog route are allowed but never used, so they are only logged.
    pub fn validate(&self) -> Result<(), MixerError> {
        for (name, settings) in &self.paths {
            if Route::from_name(name).is_none() {
                log::warn!("Mixer path {} matches no route", name);
            }
            for setting in settings {
                if !self.controls.contains_key(&setting.control) {
                    return Err(MixerError::UnknownControl {
                        path: name.clone(),
                        control: setting.control.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn path(&self, name: &str) -> Option<&[ControlSetting]> {
        self.paths.get(name).map(Vec::as_slice)
    }

    /// Simple routes the description has no path for. Combo routes never
    /// reach the mixer and are not reported.
    pub fn missing_routes(&self) -> Vec<Route> {
        Route::ALL
            .iter()
            .copied()
            .filter(|route| !route.is_combo() && !self.paths.contains_key(route.name()))
            .collect()
    }
}

impl From<MixerError> for RouteError {
    fn from(e: MixerError) -> Self {
        RouteError::InvalidConfiguration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_simple_route() {
        let paths = MixerPaths::builtin().unwrap();
        assert!(paths.missing_routes().is_empty(), "{:?}", paths.missing_routes());
        assert!(paths.path("speaker-and-headphones").is_none());
    }

    #[test]
    fn rejects_undeclared_control() {
        let json = r#"{
            "controls": { "A": 0 },
            "paths": { "speaker": [ { "control": "B", "value": 1 } ] }
        }"#;

        assert_eq!(
            MixerPaths::from_json(json).unwrap_err(),
            MixerError::UnknownControl {
                path: "speaker".into(),
                control: "B".into()
            }
        );
    }

    #[test]
    fn unknown_path_names_are_tolerated() {
        let json = r#"{
            "controls": { "A": 0 },
            "paths": { "line-out": [ { "control": "A", "value": 1 } ] }
        }"#;

        let paths = MixerPaths::from_json(json).unwrap();
        assert_eq!(paths.path("line-out").unwrap().len(), 1);
        assert!(paths.missing_routes().contains(&Route::Speaker));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            MixerPaths::from_json("{ \"controls\": [] }"),
            Err(MixerError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            MixerPaths::load("/nonexistent/mixer_paths.json"),
            Err(MixerError::Io(_))
        ));
    }

    #[test]
    fn converts_into_route_error() {
        let err: RouteError = MixerError::UnknownPath("x".into()).into();
        assert!(matches!(err, RouteError::InvalidConfiguration(_)));
    }
}
