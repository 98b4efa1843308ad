//! Interactive device operations: prompt, mutate, report.
//!
//! Each operation runs the base layer first and then the layers the device's
//! variant adds, matching how reports and prompts accumulate.

#![allow(missing_docs)]

use std::fmt;
use std::io::{BufRead, Write};

use crate::console::prompt::Prompter;
use crate::core::errors::{Capability, RegistryError, Result};
use crate::device::{Device, DeviceKind, DeviceType, Material, TemperatureScale};

const MATERIAL_PROMPT: &str = "Enter material (1 for Plastic, 2 for Metal, 3 for Glass): ";
const SCALE_PROMPT: &str =
    "Enter temperature scale (1 for Celsius, 2 for Fahrenheit, 3 for Kelvin): ";

/// How min/max entry treats an inverted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Accept any bounds.
    #[default]
    Permissive,
    /// Re-prompt when max would fall below min.
    Strict,
}

/// Editable device attributes, numbered as in the attribute menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Name,
    Unit,
    MinValue,
    MaxValue,
    Material,
    TemperatureScale,
    CalibrationOffset,
}

impl Attribute {
    #[must_use]
    pub const fn from_choice(choice: i64) -> Option<Self> {
        match choice {
            1 => Some(Self::Name),
            2 => Some(Self::Unit),
            3 => Some(Self::MinValue),
            4 => Some(Self::MaxValue),
            5 => Some(Self::Material),
            6 => Some(Self::TemperatureScale),
            7 => Some(Self::CalibrationOffset),
            _ => None,
        }
    }

    /// Capability the selected device must have for this edit.
    #[must_use]
    pub const fn required_capability(self) -> Option<Capability> {
        match self {
            Self::TemperatureScale => Some(Capability::TemperatureScale),
            Self::CalibrationOffset => Some(Capability::CalibrationOffset),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Unit => "unit",
            Self::MinValue => "min_value",
            Self::MaxValue => "max_value",
            Self::Material => "material",
            Self::TemperatureScale => "temperature_scale",
            Self::CalibrationOffset => "calibration_offset",
        })
    }
}

/// Result of a set-measurement attempt.
#[derive(Debug)]
pub enum MeasurementOutcome {
    /// Reading stored.
    Stored(f64),
    /// Reading refused before prompting.
    Rejected(RegistryError),
}

/// Build a device of `device_type` from a full round of prompts.
pub fn initialize<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    device_type: DeviceType,
    policy: RangePolicy,
) -> Result<Device> {
    let mut device = Device::new(device_type);
    let base = &mut device.base;
    base.name = p.ask_text("Enter device name: ")?;
    base.unit = p.ask_text("Enter unit: ")?;
    base.min_value = p.ask_number("Enter min value: ")?;
    base.max_value = ask_max(p, "Enter max value: ", base.min_value, policy)?;
    base.material = ask_material(p)?;

    device.temperature_mut().scale = ask_scale(p)?;
    if let Ok(offset) = device.calibration_offset_mut() {
        *offset = p.ask_number("Enter calibration offset: ")?;
    }
    Ok(device)
}

pub fn start_measuring<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    device: &mut Device,
) -> Result<bool> {
    let started = device.start_measuring();
    if started {
        p.say("")?;
        p.say("Start of measurement")?;
    }
    p.say("Temperature measurement started")?;
    Ok(started)
}

pub fn stop_measuring<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    device: &mut Device,
) -> Result<bool> {
    let stopped = device.stop_measuring();
    if stopped {
        p.say("End of measurement")?;
        p.say("")?;
    }
    p.say("Temperature measurement stopped")?;
    Ok(stopped)
}

pub fn print<R: BufRead, W: Write>(p: &mut Prompter<R, W>, device: &Device) -> Result<()> {
    p.block(&device.report())
}

/// Prompt for a reading within the device range, then reprint.
///
/// Advanced devices follow up with the calibration notice while active; the
/// offset itself is not applied to the stored reading.
pub fn set_measurement<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    device: &mut Device,
) -> Result<MeasurementOutcome> {
    let outcome = match device.ensure_measurable() {
        Err(RegistryError::Inactive) => {
            p.warn("Device is not ACTIVE!!!")?;
            MeasurementOutcome::Rejected(RegistryError::Inactive)
        }
        Err(err @ RegistryError::EmptyRange { .. }) => {
            p.warn("Measurement range is empty (min > max).")?;
            MeasurementOutcome::Rejected(err)
        }
        Err(other) => return Err(other),
        Ok(()) => read_temperature(p, device)?,
    };

    print(p, device)?;

    if let DeviceKind::AdvancedTemperature {
        calibration_offset, ..
    } = device.kind()
        && device.is_active()
    {
        p.say(&format!("Applying calibration offset: {calibration_offset}"))?;
    }
    Ok(outcome)
}

fn read_temperature<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    device: &mut Device,
) -> Result<MeasurementOutcome> {
    let (min, max) = (device.base.min_value, device.base.max_value);
    let prompt = format!("Enter current temperature ({min} - {max}): ");
    loop {
        let value = p.ask_number(&prompt)?;
        match device.set_current_temperature(value) {
            Ok(()) => return Ok(MeasurementOutcome::Stored(value)),
            Err(RegistryError::OutOfRange { .. }) => p.warn(&format!(
                "Temperature out of range. Please enter a value between {min} and {max}."
            ))?,
            Err(other) => return Err(other),
        }
    }
}

/// Prompt for one attribute and reprint the device.
///
/// Capability-gated attributes fail with `Unsupported` before any prompt.
pub fn edit_attribute<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    device: &mut Device,
    attribute: Attribute,
    policy: RangePolicy,
) -> Result<()> {
    if let Some(capability) = attribute.required_capability()
        && !device.supports(capability)
    {
        return Err(RegistryError::Unsupported { capability });
    }

    match attribute {
        Attribute::Name => device.base.name = p.ask_text("Enter new device name: ")?,
        Attribute::Unit => device.base.unit = p.ask_text("Enter new unit: ")?,
        Attribute::MinValue => {
            device.base.min_value = ask_min(p, device.base.max_value, policy)?;
        }
        Attribute::MaxValue => {
            device.base.max_value =
                ask_max(p, "Enter new max value: ", device.base.min_value, policy)?;
        }
        Attribute::Material => device.base.material = ask_material(p)?,
        Attribute::TemperatureScale => {
            let scale = ask_scale(p)?;
            device.temperature_mut().scale = scale;
        }
        Attribute::CalibrationOffset => {
            let offset = p.ask_number("Enter new calibration offset: ")?;
            *device.calibration_offset_mut()? = offset;
        }
    }
    print(p, device)
}

fn ask_material<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<Material> {
    p.ask_choice(MATERIAL_PROMPT, Material::from_choice)
}

fn ask_scale<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<TemperatureScale> {
    p.ask_choice(SCALE_PROMPT, TemperatureScale::from_choice)
}

fn ask_max<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    prompt: &str,
    min: f64,
    policy: RangePolicy,
) -> Result<f64> {
    loop {
        let max = p.ask_number(prompt)?;
        if policy == RangePolicy::Permissive || max >= min {
            return Ok(max);
        }
        p.warn("Max value must not be less than min value.")?;
    }
}

fn ask_min<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    max: f64,
    policy: RangePolicy,
) -> Result<f64> {
    loop {
        let min = p.ask_number("Enter new min value: ")?;
        if policy == RangePolicy::Permissive || min <= max {
            return Ok(min);
        }
        p.warn("Min value must not exceed max value.")?;
    }
}
