//! Measurement device model: a shared base record plus variant data.
//!
//! Behavior layers the way the variants nest: every device has the base
//! fields, temperature devices add a reading and scale, advanced devices add
//! a calibration offset on top of that. Reports are assembled base-first.

pub mod registry;

use std::fmt::{self, Write as _};

use crate::core::errors::{Capability, RegistryError, Result};

/// Delimiter framing the base section of a device report.
pub const REPORT_RULE: &str = "============";

/// Housing material of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Material {
    /// Menu choice 1.
    #[default]
    Plastic,
    /// Menu choice 2.
    Metal,
    /// Menu choice 3.
    Glass,
}

impl Material {
    /// Map a 1-based menu choice.
    #[must_use]
    pub const fn from_choice(choice: i64) -> Option<Self> {
        match choice {
            1 => Some(Self::Plastic),
            2 => Some(Self::Metal),
            3 => Some(Self::Glass),
            _ => None,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plastic => f.write_str("Plastic"),
            Self::Metal => f.write_str("Metal"),
            Self::Glass => f.write_str("Glass"),
        }
    }
}

/// Scale a temperature reading is expressed in. Values are never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureScale {
    /// Menu choice 1.
    #[default]
    Celsius,
    /// Menu choice 2.
    Fahrenheit,
    /// Menu choice 3.
    Kelvin,
}

impl TemperatureScale {
    /// Map a 1-based menu choice.
    #[must_use]
    pub const fn from_choice(choice: i64) -> Option<Self> {
        match choice {
            1 => Some(Self::Celsius),
            2 => Some(Self::Fahrenheit),
            3 => Some(Self::Kelvin),
            _ => None,
        }
    }
}

impl fmt::Display for TemperatureScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => f.write_str("Celsius"),
            Self::Fahrenheit => f.write_str("Fahrenheit"),
            Self::Kelvin => f.write_str("Kelvin"),
        }
    }
}

/// Instantiable device variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Reading plus scale.
    Temperature,
    /// Reading plus scale plus calibration offset.
    AdvancedTemperature,
}

impl DeviceType {
    /// Map a 1-based menu choice.
    #[must_use]
    pub const fn from_choice(choice: i64) -> Option<Self> {
        match choice {
            1 => Some(Self::Temperature),
            2 => Some(Self::AdvancedTemperature),
            _ => None,
        }
    }

    /// Stable snake_case label used in the activity log.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::AdvancedTemperature => "advanced_temperature",
        }
    }
}

/// Fields every device carries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceBase {
    /// Free-form display name, may contain spaces.
    pub name: String,
    /// Free-form unit label; not tied to the temperature scale.
    pub unit: String,
    /// Lower bound of accepted readings, inclusive.
    pub min_value: f64,
    /// Upper bound of accepted readings, inclusive.
    pub max_value: f64,
    /// Housing material.
    pub material: Material,
    active: bool,
}

/// Reading state of a temperature device.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureState {
    /// Last accepted reading; 0 until one is set.
    pub current: f64,
    /// Scale label shown next to the reading.
    pub scale: TemperatureScale,
}

/// Variant-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceKind {
    /// Plain temperature device.
    Temperature(TemperatureState),
    /// Temperature device with a calibration offset.
    AdvancedTemperature {
        /// Reading state, same as the plain variant.
        temperature: TemperatureState,
        /// Offset announced after each reading; never applied to it.
        calibration_offset: f64,
    },
}

/// One registered measurement device.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Fields shared by every variant.
    pub base: DeviceBase,
    kind: DeviceKind,
}

impl Device {
    /// Fresh, inactive device of the given type with zeroed readings.
    #[must_use]
    pub fn new(device_type: DeviceType) -> Self {
        let temperature = TemperatureState::default();
        let kind = match device_type {
            DeviceType::Temperature => DeviceKind::Temperature(temperature),
            DeviceType::AdvancedTemperature => DeviceKind::AdvancedTemperature {
                temperature,
                calibration_offset: 0.0,
            },
        };
        Self {
            base: DeviceBase::default(),
            kind,
        }
    }

    /// Variant data.
    #[must_use]
    pub const fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Variant tag, as chosen when the device was added.
    #[must_use]
    pub const fn device_type(&self) -> DeviceType {
        match self.kind {
            DeviceKind::Temperature(_) => DeviceType::Temperature,
            DeviceKind::AdvancedTemperature { .. } => DeviceType::AdvancedTemperature,
        }
    }

    /// Whether readings are currently accepted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.base.active
    }

    /// Activate measuring. Returns `false` when already active.
    pub fn start_measuring(&mut self) -> bool {
        let transitioned = !self.base.active;
        self.base.active = true;
        transitioned
    }

    /// Deactivate measuring. Returns `false` when already inactive.
    pub fn stop_measuring(&mut self) -> bool {
        let transitioned = self.base.active;
        self.base.active = false;
        transitioned
    }

    /// Whether this variant carries the data a capability-gated command needs.
    #[must_use]
    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            // Every variant measures temperature.
            Capability::TemperatureScale => true,
            Capability::CalibrationOffset => self.calibration_offset().is_some(),
        }
    }

    /// Reading state shared by every variant.
    #[must_use]
    pub const fn temperature(&self) -> &TemperatureState {
        match &self.kind {
            DeviceKind::Temperature(temperature)
            | DeviceKind::AdvancedTemperature { temperature, .. } => temperature,
        }
    }

    /// Mutable reading state shared by every variant.
    pub fn temperature_mut(&mut self) -> &mut TemperatureState {
        match &mut self.kind {
            DeviceKind::Temperature(temperature)
            | DeviceKind::AdvancedTemperature { temperature, .. } => temperature,
        }
    }

    /// Calibration offset, `None` for plain temperature devices.
    #[must_use]
    pub const fn calibration_offset(&self) -> Option<f64> {
        match &self.kind {
            DeviceKind::AdvancedTemperature {
                calibration_offset, ..
            } => Some(*calibration_offset),
            DeviceKind::Temperature(_) => None,
        }
    }

    /// Calibration offset slot, or `Unsupported` for plain temperature devices.
    pub fn calibration_offset_mut(&mut self) -> Result<&mut f64> {
        match &mut self.kind {
            DeviceKind::AdvancedTemperature {
                calibration_offset, ..
            } => Ok(calibration_offset),
            DeviceKind::Temperature(_) => Err(RegistryError::Unsupported {
                capability: Capability::CalibrationOffset,
            }),
        }
    }

    /// Check that a new reading can be taken at all: active, with a non-empty range.
    pub fn ensure_measurable(&self) -> Result<()> {
        if !self.base.active {
            return Err(RegistryError::Inactive);
        }
        let (min, max) = (self.base.min_value, self.base.max_value);
        if min > max {
            return Err(RegistryError::EmptyRange { min, max });
        }
        Ok(())
    }

    /// Store a new current temperature. Bounds are inclusive.
    pub fn set_current_temperature(&mut self, value: f64) -> Result<()> {
        self.ensure_measurable()?;
        let (min, max) = (self.base.min_value, self.base.max_value);
        if !(min..=max).contains(&value) {
            return Err(RegistryError::OutOfRange { value, min, max });
        }
        self.temperature_mut().current = value;
        Ok(())
    }

    /// Full human-readable report, base section first then each variant layer.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let base = &self.base;
        let _ = writeln!(out, "{REPORT_RULE}");
        let _ = writeln!(out, "Name: {}", base.name);
        let _ = writeln!(out, "Unit: {}", base.unit);
        let _ = writeln!(out, "Min Value: {}", base.min_value);
        let _ = writeln!(out, "Max Value: {}", base.max_value);
        let _ = writeln!(out, "Material: {}", base.material);
        let _ = writeln!(out, "{REPORT_RULE}");

        let temperature = self.temperature();
        let _ = writeln!(
            out,
            "Current Temperature: {} {}",
            temperature.current, temperature.scale
        );
        if let Some(offset) = self.calibration_offset() {
            let _ = writeln!(out, "Calibration Offset: {offset}");
        }
        out
    }
}
