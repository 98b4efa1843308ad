//! Ordered device collection with an optional current selection.

use crate::core::errors::{RegistryError, Result};
use crate::device::Device;

/// Owns every registered device. Devices are appended and never removed.
#[derive(Debug, Default)]
pub struct Registry {
    devices: Vec<Device>,
    current: Option<usize>,
    limit: Option<usize>,
}

impl Registry {
    /// Empty registry without a device limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses additions past `limit` devices. Zero means unlimited.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
            ..Self::default()
        }
    }

    /// Fail early when another device would exceed the limit.
    pub fn ensure_capacity(&self) -> Result<()> {
        match self.limit {
            Some(limit) if self.devices.len() >= limit => {
                Err(RegistryError::DeviceLimit { limit })
            }
            _ => Ok(()),
        }
    }

    /// Append a device and make it the current selection. Returns its index.
    pub fn add(&mut self, device: Device) -> Result<usize> {
        self.ensure_capacity()?;
        self.devices.push(device);
        let index = self.devices.len() - 1;
        self.current = Some(index);
        Ok(index)
    }

    /// Select by 1-based position. Any out-of-range position clears the selection.
    pub fn select(&mut self, position: i64) -> Option<usize> {
        self.current = usize::try_from(position)
            .ok()
            .filter(|p| (1..=self.devices.len()).contains(p))
            .map(|p| p - 1);
        self.current
    }

    /// Index of the selected device, 0-based.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The selected device and its index, or `NoSelection`.
    pub fn current_mut(&mut self) -> Result<(usize, &mut Device)> {
        let index = self.current.ok_or(RegistryError::NoSelection)?;
        self.devices
            .get_mut(index)
            .map(|device| (index, device))
            .ok_or(RegistryError::NoSelection)
    }

    /// Device at a 0-based index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device was added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }
}
