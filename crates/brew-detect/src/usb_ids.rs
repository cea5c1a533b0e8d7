//! USB Vendor/Product ID database for known flashable boards
//!
//! This module contains VID/PID pairs for the USB-to-serial bridges and
//! native USB interfaces found on common ESP32, ESP8266 and AVR boards.

/// Label reported for ports that are not in the table
pub const UNKNOWN_DEVICE: &str = "Unknown";

/// USB Vendor ID / Product ID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl UsbId {
    pub const fn new(vid: u16, pid: u16) -> Self {
        Self { vid, pid }
    }
}

/// Silicon Labs CP210x
pub mod cp210x {
    use super::UsbId;

    pub const VID: u16 = 0x10C4;

    pub const CP2102: UsbId = UsbId::new(VID, 0xEA60);
    pub const CP2105: UsbId = UsbId::new(VID, 0xEA70);
}

/// WCH CH340/CH341/CH9102
pub mod wch {
    use super::UsbId;

    pub const VID: u16 = 0x1A86;

    pub const CH340: UsbId = UsbId::new(VID, 0x7523);
    pub const CH341: UsbId = UsbId::new(VID, 0x5523);
    pub const CH9102: UsbId = UsbId::new(VID, 0x55D4);
}

/// FTDI (Future Technology Devices International)
pub mod ftdi {
    use super::UsbId;

    pub const VID: u16 = 0x0403;

    pub const FT232R: UsbId = UsbId::new(VID, 0x6001);
    pub const FT231X: UsbId = UsbId::new(VID, 0x6015);
}

/// Prolific PL2303
pub mod prolific {
    use super::UsbId;

    pub const VID: u16 = 0x067B;

    pub const PL2303: UsbId = UsbId::new(VID, 0x2303);
}

/// Espressif native USB interfaces
pub mod espressif {
    use super::UsbId;

    pub const VID: u16 = 0x303A;

    /// ESP32-S2 native USB CDC in ROM download mode
    pub const ESP32_S2_CDC: UsbId = UsbId::new(VID, 0x0002);
    /// USB-Serial-JTAG peripheral (ESP32-C3, ESP32-S3)
    pub const USB_SERIAL_JTAG: UsbId = UsbId::new(VID, 0x1001);
}

/// Arduino boards with native or 16U2 USB
pub mod arduino {
    use super::UsbId;

    pub const VID: u16 = 0x2341;

    pub const UNO: UsbId = UsbId::new(VID, 0x0043);
    pub const UNO_R3: UsbId = UsbId::new(VID, 0x0001);
    pub const MEGA_2560: UsbId = UsbId::new(VID, 0x0042);
    pub const LEONARDO: UsbId = UsbId::new(VID, 0x8036);
}

/// Table of known devices and their display names
const KNOWN_DEVICES: &[(UsbId, &str)] = &[
    (cp210x::CP2102, "CP210x USB to UART bridge (ESP32/ESP8266 board)"),
    (cp210x::CP2105, "CP2105 dual USB to UART bridge"),
    (wch::CH340, "CH340 USB to serial (NodeMCU/Wemos/Arduino clone)"),
    (wch::CH341, "CH341 USB to serial"),
    (wch::CH9102, "CH9102 USB to serial (ESP32 board)"),
    (ftdi::FT232R, "FTDI FT232R USB UART"),
    (ftdi::FT231X, "FTDI FT231X USB UART"),
    (prolific::PL2303, "Prolific PL2303 USB to serial"),
    (espressif::ESP32_S2_CDC, "ESP32-S2 native USB"),
    (espressif::USB_SERIAL_JTAG, "Espressif USB Serial/JTAG (ESP32-C3/S3)"),
    (arduino::UNO, "Arduino Uno"),
    (arduino::UNO_R3, "Arduino Uno"),
    (arduino::MEGA_2560, "Arduino Mega 2560"),
    (arduino::LEONARDO, "Arduino Leonardo"),
];

/// Look up the display name of a known VID/PID
pub fn known_device_name(vid: u16, pid: u16) -> Option<&'static str> {
    let id = UsbId::new(vid, pid);
    KNOWN_DEVICES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| *name)
}

/// Display name for a port's USB IDs, [`UNKNOWN_DEVICE`] on a miss
pub fn device_label(vid: Option<u16>, pid: Option<u16>) -> &'static str {
    match (vid, pid) {
        (Some(v), Some(p)) => known_device_name(v, p).unwrap_or(UNKNOWN_DEVICE),
        _ => UNKNOWN_DEVICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_device_lookup() {
        assert_eq!(known_device_name(0x2341, 0x0043), Some("Arduino Uno"));
        assert_eq!(
            device_label(Some(0x303A), Some(0x1001)),
            "Espressif USB Serial/JTAG (ESP32-C3/S3)"
        );
    }

    #[test]
    fn test_lookup_miss_is_unknown() {
        assert_eq!(known_device_name(0xDEAD, 0xBEEF), None);
        assert_eq!(device_label(Some(0xDEAD), Some(0xBEEF)), UNKNOWN_DEVICE);
        assert_eq!(device_label(None, None), UNKNOWN_DEVICE);
        assert_eq!(device_label(Some(0x10C4), None), UNKNOWN_DEVICE);
    }
}
