//! CLI argument parsing

use brew_plan::{FlasherConfig, ValidationError};
use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "brewflash")]
#[command(
    author,
    version,
    about = "Flash BrewPi, Fermentrack and TiltBridge firmware",
    long_about = None
)]
pub struct Cli {
    /// Firmware ID to skip firmware selection
    #[arg(short, long)]
    pub firmware: Option<u32>,

    /// Serial port to skip device detection
    #[arg(short = 'p', long)]
    pub serial_port: Option<String>,

    /// Baud rate to flash at
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Erase the device's flash completely before writing
    #[arg(short, long)]
    pub erase_flash: bool,

    /// Do not erase the device's flash before writing
    #[arg(short = 'n', long)]
    pub dont_erase_flash: bool,

    /// Catalog URL or JSON file (overrides settings.json)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Only offer esptool-flashed firmware
    #[arg(long)]
    pub esptool_only: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Reject flag combinations before anything is loaded
    pub fn validate(&self, config: &FlasherConfig) -> Result<(), ValidationError> {
        if self.erase_flash && self.dont_erase_flash {
            return Err(ValidationError::ConflictingEraseFlags);
        }
        if let Some(baud) = self.baud {
            if !config.is_supported_baud(baud) {
                return Err(ValidationError::UnsupportedBaud(baud));
            }
        }
        if matches!(&self.serial_port, Some(port) if port.trim().is_empty()) {
            return Err(ValidationError::MissingPort);
        }
        Ok(())
    }

    /// Erase choice made on the command line, if any
    pub fn erase_choice(&self) -> Option<bool> {
        match (self.erase_flash, self.dont_erase_flash) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("brewflash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&["-f", "12", "-p", "/dev/ttyUSB0", "-b", "115200", "-e"]);
        assert_eq!(cli.firmware, Some(12));
        assert_eq!(cli.serial_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.baud, Some(115200));
        assert_eq!(cli.erase_choice(), Some(true));
        assert!(cli.validate(&FlasherConfig::default()).is_ok());
    }

    #[test]
    fn test_both_erase_flags_rejected() {
        let cli = parse(&["--erase-flash", "--dont-erase-flash"]);
        assert_eq!(
            cli.validate(&FlasherConfig::default()),
            Err(ValidationError::ConflictingEraseFlags)
        );
    }

    #[test]
    fn test_unsupported_baud_rejected() {
        let cli = parse(&["--baud", "500000"]);
        assert_eq!(
            cli.validate(&FlasherConfig::default()),
            Err(ValidationError::UnsupportedBaud(500000))
        );
    }

    #[test]
    fn test_no_erase_flag_means_ask() {
        assert_eq!(parse(&[]).erase_choice(), None);
        assert_eq!(parse(&["-n"]).erase_choice(), Some(false));
    }
}
