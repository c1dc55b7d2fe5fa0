//! Device namespaces and per-device LED geometry.
//!
//! A device byte only has meaning together with its [`DeviceType`]: `0` is a
//! Chroma Link strip in the 1-D namespace and a keyboard in the 2-D one.

use std::fmt;

/// Shape of the LED layout a device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceType {
    /// A strip of LEDs addressed by index.
    OneD = 1,
    /// A grid of LEDs addressed by row and column.
    TwoD = 2,
}

impl DeviceType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(DeviceType::OneD),
            2 => Some(DeviceType::TwoD),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Devices in the 1-D namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device1D {
    ChromaLink,
    Headset,
    Mousepad,
    /// A device byte with no known layout. Kept so files round-trip.
    Other(u8),
}

impl Device1D {
    pub const CHROMA_LINK_MAX_LEDS: usize = 5;
    pub const HEADSET_MAX_LEDS: usize = 5;
    pub const MOUSEPAD_MAX_LEDS: usize = 15;

    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Device1D::ChromaLink,
            1 => Device1D::Headset,
            2 => Device1D::Mousepad,
            other => Device1D::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Device1D::ChromaLink => 0,
            Device1D::Headset => 1,
            Device1D::Mousepad => 2,
            Device1D::Other(v) => v,
        }
    }

    /// Number of LEDs on the strip, 0 for unknown devices.
    pub fn max_leds(self) -> usize {
        match self {
            Device1D::ChromaLink => Self::CHROMA_LINK_MAX_LEDS,
            Device1D::Headset => Self::HEADSET_MAX_LEDS,
            Device1D::Mousepad => Self::MOUSEPAD_MAX_LEDS,
            Device1D::Other(_) => 0,
        }
    }
}

/// Devices in the 2-D namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device2D {
    Keyboard,
    Keypad,
    Mouse,
    /// A device byte with no known layout. Kept so files round-trip.
    Other(u8),
}

impl Device2D {
    pub const KEYBOARD_SIZE: (usize, usize) = (6, 22);
    pub const KEYPAD_SIZE: (usize, usize) = (4, 5);
    pub const MOUSE_SIZE: (usize, usize) = (9, 7);

    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Device2D::Keyboard,
            1 => Device2D::Keypad,
            2 => Device2D::Mouse,
            other => Device2D::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Device2D::Keyboard => 0,
            Device2D::Keypad => 1,
            Device2D::Mouse => 2,
            Device2D::Other(v) => v,
        }
    }

    /// Grid size as `(rows, columns)`, `(0, 0)` for unknown devices.
    pub fn size(self) -> (usize, usize) {
        match self {
            Device2D::Keyboard => Self::KEYBOARD_SIZE,
            Device2D::Keypad => Self::KEYPAD_SIZE,
            Device2D::Mouse => Self::MOUSE_SIZE,
            Device2D::Other(_) => (0, 0),
        }
    }

    pub fn max_row(self) -> usize {
        self.size().0
    }

    pub fn max_column(self) -> usize {
        self.size().1
    }
}

/// A physical device together with its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    OneD(Device1D),
    TwoD(Device2D),
}

impl Device {
    /// Build a device from the raw `(device_type, device)` byte pair.
    pub fn from_raw(device_type: DeviceType, device: u8) -> Self {
        match device_type {
            DeviceType::OneD => Device::OneD(Device1D::from_u8(device)),
            DeviceType::TwoD => Device::TwoD(Device2D::from_u8(device)),
        }
    }

    pub fn device_type(self) -> DeviceType {
        match self {
            Device::OneD(_) => DeviceType::OneD,
            Device::TwoD(_) => DeviceType::TwoD,
        }
    }

    /// Raw device byte within its namespace.
    pub fn id(self) -> u8 {
        match self {
            Device::OneD(d) => d.to_u8(),
            Device::TwoD(d) => d.to_u8(),
        }
    }

    /// Total number of addressable LEDs.
    pub fn led_count(self) -> usize {
        match self {
            Device::OneD(d) => d.max_leds(),
            Device::TwoD(d) => {
                let (rows, columns) = d.size();
                rows * columns
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::OneD(Device1D::Other(v)) => write!(f, "1D device #{}", v),
            Device::TwoD(Device2D::Other(v)) => write!(f, "2D device #{}", v),
            Device::OneD(d) => write!(f, "{:?}", d),
            Device::TwoD(d) => write!(f, "{:?}", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_bytes() {
        assert_eq!(DeviceType::from_u8(1), Some(DeviceType::OneD));
        assert_eq!(DeviceType::from_u8(2), Some(DeviceType::TwoD));
        assert_eq!(DeviceType::from_u8(0), None);
        assert_eq!(DeviceType::from_u8(3), None);
        assert_eq!(DeviceType::TwoD.to_u8(), 2);
    }

    #[test]
    fn test_namespaces_share_raw_values() {
        let strip = Device::from_raw(DeviceType::OneD, 0);
        let grid = Device::from_raw(DeviceType::TwoD, 0);
        assert_eq!(strip, Device::OneD(Device1D::ChromaLink));
        assert_eq!(grid, Device::TwoD(Device2D::Keyboard));
        assert_ne!(strip, grid);
        assert_eq!(strip.id(), grid.id());
    }

    #[test]
    fn test_geometry() {
        assert_eq!(Device1D::Mousepad.max_leds(), 15);
        assert_eq!(Device2D::Keyboard.size(), (6, 22));
        assert_eq!(Device::TwoD(Device2D::Mouse).led_count(), 63);
    }

    #[test]
    fn test_unknown_device_has_no_leds() {
        let d = Device1D::from_u8(42);
        assert_eq!(d, Device1D::Other(42));
        assert_eq!(d.max_leds(), 0);
        assert_eq!(d.to_u8(), 42);

        let d = Device2D::from_u8(7);
        assert_eq!(d.size(), (0, 0));
        assert_eq!(d.to_u8(), 7);
    }
}
