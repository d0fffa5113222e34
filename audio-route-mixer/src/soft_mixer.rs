use std::collections::BTreeMap;

use crate::error::MixerError;

/// In-memory mixer control table.
///
/// Stands in for the codec's control interface: holds the current value of
/// every declared control and counts writes that changed something.
#[derive(Debug, Clone, Default)]
pub struct SoftMixer {
    values: BTreeMap<String, i32>,
    writes: usize,
}

impl SoftMixer {
    /// Creates a table with every control at its default.
    pub fn new(defaults: &BTreeMap<String, i32>) -> Self {
        Self {
            values: defaults.clone(),
            writes: 0,
        }
    }

    pub fn get(&self, control: &str) -> Option<i32> {
        self.values.get(control).copied()
    }

    pub fn set(&mut self, control: &str, value: i32) -> Result<(), MixerError> {
        let slot = self
            .values
            .get_mut(control)
            .ok_or_else(|| MixerError::NoSuchControl(control.to_string()))?;
        if *slot != value {
            log::debug!("mixer: {} = {}", control, value);
            *slot = value;
            self.writes += 1;
        }
        Ok(())
    }

    /// Number of writes that changed a control value.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn values(&self) -> &BTreeMap<String, i32> {
        &self.values
    }
}
