//! The seam between the protocol endpoint and the node's devices.
//!
//! Handlers never talk to hardware; they look devices up in a [`Registry`]
//! and read or write [`Value`]s. What a handle *is* and how a read happens
//! is the platform's business.

/// Classes of device a [`Registry`] can hold.
///
/// Codes follow the actuator/sensor split of embedded device registries:
/// actuators sit below `0x80`, sensors at or above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
  /// Binary on/off actuator
  Switch,
  /// Tri-channel color actuator
  RgbLed,
  /// Temperature sensor (centidegrees C)
  Temp,
  /// Relative humidity sensor (centipercent)
  Hum,
  /// Illuminance sensor (lux)
  Light,
  /// 3-axis accelerometer
  Accel,
  /// Barometric pressure sensor (Pa)
  Press,
}

impl Kind {
  /// The numeric type code reported by device enumeration
  pub fn code(&self) -> u8 {
    match self {
      | Kind::Switch => 0x41,
      | Kind::RgbLed => 0x42,
      | Kind::Temp => 0x82,
      | Kind::Hum => 0x83,
      | Kind::Light => 0x84,
      | Kind::Accel => 0x85,
      | Kind::Press => 0x88,
    }
  }
}

/// A reading or setting with up to 3 channels.
///
/// Scalar devices use channel 0 and leave the rest zero; the accelerometer
/// uses all three (x, y, z), the RGB actuator likewise (r, g, b).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Value(pub [i16; 3]);

impl Value {
  /// A single-channel value
  pub fn scalar(v: i16) -> Self {
    Value([v, 0, 0])
  }
}

/// The device exists but the operation on it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// Read failed
  Read,
  /// Write failed or was rejected by the device
  Write,
}

/// A registry of the node's devices.
///
/// Lookups are cheap and repeatable; handles stay valid for the life of the
/// registry. Enumeration visits devices in registration order.
pub trait Registry {
  /// Opaque device handle
  type Handle: Copy + core::fmt::Debug;

  /// Find the first device of `kind`
  fn find_by_kind(&self, kind: Kind) -> Option<Self::Handle>;

  /// Find a device by its registered name (exact match)
  fn find_by_name(&self, name: &str) -> Option<Self::Handle>;

  /// Read the device's current value
  fn read(&self, dev: Self::Handle) -> Result<Value, Error>;

  /// Write a value to the device
  fn write(&mut self, dev: Self::Handle, val: Value) -> Result<(), Error>;

  /// Visit every registered device in registration order
  fn devices<F>(&self, f: F)
    where F: FnMut(Option<&str>, Kind);
}
