use std::fmt;

use serde::Serialize;

use crate::error::AppError;

/// Brightness in percent. Always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: u8 = 3;
    pub const MAX: u8 = 100;
    pub const STEP: i32 = 5;
    pub const DEFAULT: Brightness = Brightness(50);

    /// Validate an explicit value. Out-of-range input is rejected, not clamped.
    pub fn new(value: i64) -> Result<Self, AppError> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(AppError::InvalidInput(format!(
                "Brightness must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self::clamped(value))
    }

    pub fn clamped(value: i64) -> Self {
        let v = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Brightness(u8::try_from(v).unwrap_or(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn offset(self, delta: i32) -> Self {
        Self::clamped(i64::from(self.0) + i64::from(delta))
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Colour temperature in Kelvin. Always within `MIN..=MAX`.
///
/// The device speaks an inverted reciprocal scale (see [`Kelvin::to_wire`]).
/// The conversion is lossy: a Kelvin value sent and read back can move by up
/// to half a wire step, which is about 25K at the cool end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Kelvin(u16);

impl Kelvin {
    pub const MIN: u16 = 2900;
    pub const MAX: u16 = 7000;
    pub const STEP: i32 = 200;
    pub const DEFAULT: Kelvin = Kelvin(4000);

    pub fn new(value: i64) -> Result<Self, AppError> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(AppError::InvalidInput(format!(
                "Temperature must be between {}K and {}K",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self::clamped(value))
    }

    pub fn clamped(value: i64) -> Self {
        let v = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Kelvin(u16::try_from(v).unwrap_or(Self::MAX))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn offset(self, delta: i32) -> Self {
        Self::clamped(i64::from(self.0) + i64::from(delta))
    }

    /// `round(1_000_000 / kelvin)`.
    pub fn to_wire(self) -> u16 {
        let k = u32::from(self.0);
        let wire = (1_000_000 + k / 2) / k;
        u16::try_from(wire).unwrap_or(u16::MAX)
    }

    /// `round(1_000_000 / wire)`, clamped into range. Non-positive wire values
    /// map to the cool end.
    pub fn from_wire(wire: i64) -> Self {
        if wire <= 0 {
            return Kelvin(Self::MAX);
        }
        Self::clamped((1_000_000 + wire / 2) / wire)
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K", self.0)
    }
}

/// Live state of one fixture. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    pub on: bool,
    pub brightness: Brightness,
    pub temperature: Kelvin,
}

/// Partial update. Only fields that are `Some` go on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightPatch {
    pub on: Option<bool>,
    pub brightness: Option<Brightness>,
    pub temperature: Option<Kelvin>,
}

impl LightPatch {
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Self::default()
        }
    }

    pub fn brightness(brightness: Brightness) -> Self {
        Self {
            brightness: Some(brightness),
            ..Self::default()
        }
    }

    pub fn temperature(temperature: Kelvin) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}
