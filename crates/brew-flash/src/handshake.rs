//! Low-baud bootloader handshake
//!
//! Some boards (e.g. native-USB AVRs) enter their bootloader when the port
//! is opened at 1200 bps and closed again. The port is released before
//! [`HandshakePort::pulse`] returns.

use std::thread::sleep;

use brew_plan::HandshakeConfig;
use tracing::info;

/// Performs the open/hold/close pulse on a serial port
pub trait HandshakePort {
    fn pulse(&self, port: &str, config: &HandshakeConfig) -> Result<(), serialport::Error>;
}

/// Pulses a real serial port
#[derive(Debug, Default)]
pub struct SerialHandshake;

impl HandshakePort for SerialHandshake {
    fn pulse(&self, port: &str, config: &HandshakeConfig) -> Result<(), serialport::Error> {
        sleep(config.pre_delay());
        info!("Performing {} bps touch on {}", config.baud_rate, port);

        let serial = serialport::new(port, config.baud_rate)
            .timeout(config.timeout())
            .open()?;
        sleep(config.settle());
        drop(serial);

        info!("...done");
        Ok(())
    }
}
