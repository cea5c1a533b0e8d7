//! One interactive flashing session

use std::io::{BufRead, Write};

use anyhow::{anyhow, Context};
use brew_catalog::{Catalog, CatalogSource, Selection};
use brew_detect::{DeviceDiscovery, Discovery, PortEnumerator};
use brew_flash::{ArtifactFetcher, Backends, FlashExecutor, FlashReport, HandshakePort};
use brew_plan::{avr, FlashMethod, FlashOptions, FlasherConfig, PlanBuilder};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::prompt::Prompt;

/// How a session ended without an error
#[derive(Debug)]
pub enum Outcome {
    Flashed(FlashReport),
    /// User answered no to a confirmation
    Declined,
    /// Discovery found no new serial port
    NoDevice,
}

/// External collaborators used by a session
pub struct Toolkit<'a> {
    pub catalog: &'a dyn CatalogSource,
    pub fetcher: &'a dyn ArtifactFetcher,
    pub handshake: &'a dyn HandshakePort,
    pub ports: &'a dyn PortEnumerator,
    pub backends: Backends,
}

pub struct Session<'a, R, W> {
    config: &'a FlasherConfig,
    args: &'a Cli,
    prompt: Prompt<R, W>,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(config: &'a FlasherConfig, args: &'a Cli, prompt: Prompt<R, W>) -> Self {
        Self {
            config,
            args,
            prompt,
        }
    }

    pub fn run(&mut self, toolkit: Toolkit<'_>) -> anyhow::Result<Outcome> {
        let args = self.args;
        let config = self.config;
        args.validate(config)?;

        self.prompt.say("Loading firmware list...")?;
        let catalog = toolkit
            .catalog
            .load()
            .context("Failed to load the firmware list")?;

        let selection = self.select_firmware(&catalog)?;
        let method = FlashMethod::from_catalog(&selection.family.flash_method)?;

        let (baud, erase_before_flash) = match method {
            FlashMethod::Avrdude => {
                toolkit.backends.get(method).ensure_available()?;
                self.prompt
                    .say("avrdude found on the path - Arduino installations can proceed.")?;
                (avr::BAUD, false)
            }
            FlashMethod::Esptool => (self.select_baud()?, self.select_erase()?),
        };

        self.prompt.say(format_args!(
            "\nYou've selected the following firmware:\n{}\n",
            selection.firmware
        ))?;
        let erase = if erase_before_flash {
            "erasing flash first"
        } else {
            "not erasing flash first"
        };
        let question = format!("Do you want to flash this firmware at {baud}bps, {erase}?");
        if !self.prompt.confirm(&question)? {
            self.prompt.say("Acknowledged. Exiting.")?;
            return Ok(Outcome::Declined);
        }

        let port = match &args.serial_port {
            Some(port) => port.clone(),
            None => match self.discover(toolkit.ports)? {
                Some(port) => port,
                None => return Ok(Outcome::NoDevice),
            },
        };
        self.prompt.say(format_args!("You've selected device: {port}"))?;
        let question = format!("Do you want to flash device {port} with {}?", selection.firmware);
        if !self.prompt.confirm(&question)? {
            self.prompt.say("Acknowledged. Exiting.")?;
            return Ok(Outcome::Declined);
        }

        let plan = PlanBuilder::new(config).build(
            &selection.family,
            &selection.firmware,
            &FlashOptions {
                port,
                baud,
                erase_before_flash,
            },
        )?;
        debug!("Plan: {} {}", plan.method(), plan.arguments().join(" "));

        let mut executor = FlashExecutor::new(
            config,
            toolkit.catalog,
            toolkit.fetcher,
            toolkit.handshake,
            toolkit.backends,
        );
        let report = executor.run(&selection, &plan)?;
        self.prompt.say(
            "\nFirmware successfully flashed. Reset device to switch back to normal boot mode.",
        )?;
        Ok(Outcome::Flashed(report))
    }

    fn select_firmware(&mut self, catalog: &Catalog) -> anyhow::Result<Selection> {
        if let Some(id) = self.args.firmware {
            return catalog
                .find_firmware(id)
                .ok_or_else(|| anyhow!("Failed to find firmware {id} in the firmware list"));
        }

        let projects = catalog.projects();
        let project = &projects[self.prompt.choose("Select a Project:", projects)?];

        let families = catalog.families(project.id)?;
        let family = &families[self.prompt.choose("Select a Device Family:", families)?];

        let firmware = catalog.firmware(project.id, family.id)?;
        let firmware = &firmware[self.prompt.choose("Select a Firmware:", firmware)?];

        info!("Selected {} for {}", firmware, family);
        Ok(Selection {
            family: family.clone(),
            firmware: firmware.clone(),
        })
    }

    fn select_baud(&mut self) -> anyhow::Result<u32> {
        if let Some(baud) = self.args.baud {
            return Ok(baud);
        }
        let title = format!(
            "Select baud rate (speed) to flash at. \
             Recommended to try {} first, and 115200 if that fails:",
            self.config.recommended_baud
        );
        let config = self.config;
        let bauds = config.supported_bauds.as_slice();
        let baud = bauds[self.prompt.choose(&title, bauds)?];
        self.prompt.say(format_args!("Selected: {baud}"))?;
        Ok(baud)
    }

    fn select_erase(&mut self) -> anyhow::Result<bool> {
        let erase = match self.args.erase_choice() {
            Some(erase) => erase,
            None => self.prompt.confirm(
                "Do you want to erase the flash on the device completely \
                 before writing the firmware",
            )?,
        };
        if erase {
            self.prompt.say("Flash WILL be erased before writing firmware")?;
        } else {
            self.prompt.say("Flash will not be erased before writing firmware")?;
        }
        Ok(erase)
    }

    fn discover(&mut self, ports: &dyn PortEnumerator) -> anyhow::Result<Option<String>> {
        let discovery = DeviceDiscovery::new(ports).discover(&mut self.prompt)?;
        let port = match discovery {
            Discovery::NoNewDevices => {
                self.prompt.say(
                    "No new devices detected. Please reattempt detection, or specify the device \
                     using the --serial-port flag on the command line.",
                )?;
                None
            }
            Discovery::Found(device) => {
                self.prompt.say(format_args!("\nNew device detected:\n{device}"))?;
                Some(device.port().to_string())
            }
            Discovery::Ambiguous(devices) => {
                let idx = self.prompt.choose("New devices detected:", &devices[..])?;
                Some(devices[idx].port().to_string())
            }
        };
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brew_catalog::CatalogSource;
    use brew_detect::{DetectError, PortDescriptor};
    use brew_flash::FlashError;
    use brew_plan::ValidationError;
    use brew_sim::fixture::ids;
    use brew_sim::{SampleCatalog, SimBackend, SimCatalog, SimFetcher, SimHandshake, SimPorts};

    struct Harness {
        _dir: tempfile::TempDir,
        config: FlasherConfig,
        catalog: SimCatalog,
        fetcher: SimFetcher,
        handshake: SimHandshake,
        ports: SimPorts,
        esptool: SimBackend,
        avrdude: SimBackend,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = FlasherConfig {
                cache_dir: dir.path().to_path_buf(),
                ..Default::default()
            };
            let sample = SampleCatalog::new();
            Self {
                config,
                catalog: SimCatalog::new(sample.catalog().unwrap()),
                fetcher: sample.fetcher(),
                handshake: SimHandshake::new(),
                ports: SimPorts::new()
                    .then([])
                    .then([PortDescriptor::usb("/dev/ttyACM0", 0x2341, 0x0043)]),
                esptool: SimBackend::new("esptool.py"),
                avrdude: SimBackend::new("avrdude"),
                _dir: dir,
            }
        }

        fn run(&self, args: &Cli, input: &str) -> anyhow::Result<Outcome> {
            self.run_with_transcript(args, input).0
        }

        /// Run a session, also returning everything it printed
        fn run_with_transcript(
            &self,
            args: &Cli,
            input: &str,
        ) -> (anyhow::Result<Outcome>, String) {
            let mut output = Vec::new();
            let toolkit = Toolkit {
                catalog: &self.catalog,
                fetcher: &self.fetcher,
                handshake: &self.handshake,
                ports: &self.ports,
                backends: Backends::new(self.esptool.boxed(), self.avrdude.boxed()),
            };
            let prompt = Prompt::new(input.as_bytes(), &mut output);
            let outcome = Session::new(&self.config, args, prompt).run(toolkit);
            (outcome, String::from_utf8(output).unwrap())
        }
    }

    fn esp_args() -> Cli {
        Cli {
            firmware: Some(ids::ESP8266_BREWPI),
            serial_port: Some("/dev/ttyUSB0".into()),
            baud: Some(115200),
            erase_flash: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_skip_menus() {
        let harness = Harness::new();
        let outcome = harness.run(&esp_args(), "y\ny\n").unwrap();

        assert!(matches!(outcome, Outcome::Flashed(_)));
        let args = &harness.esptool.invocations()[0];
        assert!(args.contains(&"115200".to_string()));
        assert!(args.contains(&"--erase-all".to_string()));
        assert_eq!(harness.ports.remaining(), 2);
    }

    #[test]
    fn test_interactive_avrdude_session() {
        let harness = Harness::new();
        // project, family, firmware, confirm, disconnect, connect, confirm device
        let outcome = harness.run(&Cli::default(), "2\n2\n1\ny\n\n\ny\n").unwrap();

        match outcome {
            Outcome::Flashed(report) => {
                assert_eq!(report.method, FlashMethod::Avrdude);
                assert_eq!(report.port, "/dev/ttyACM0");
            }
            other => panic!("expected flashed, got {other:?}"),
        }
        assert!(harness.avrdude.invoked());
        assert!(!harness.esptool.invoked());
    }

    #[test]
    fn test_interactive_esptool_prompts_for_baud_and_erase() {
        let harness = Harness::new();
        let args = Cli {
            serial_port: Some("/dev/ttyUSB0".into()),
            ..Default::default()
        };
        // Fermentrack, ESP32, firmware, 460800, no erase, confirm, confirm device
        let outcome = harness.run(&args, "1\n1\n1\n6\nn\ny\ny\n").unwrap();

        assert!(matches!(outcome, Outcome::Flashed(_)));
        let invocation = &harness.esptool.invocations()[0];
        assert!(invocation.contains(&"460800".to_string()));
        assert!(!invocation.contains(&"--erase-all".to_string()));
    }

    #[test]
    fn test_declined_firmware_confirmation() {
        let harness = Harness::new();
        let outcome = harness.run(&esp_args(), "n\n").unwrap();

        assert!(matches!(outcome, Outcome::Declined));
        assert!(!harness.esptool.invoked());
        assert!(harness.fetcher.requests().is_empty());
    }

    #[test]
    fn test_no_new_device() {
        let mut harness = Harness::new();
        harness.ports = SimPorts::new().then([PortDescriptor::bare("COM1")]);
        let args = Cli {
            serial_port: None,
            ..esp_args()
        };

        let outcome = harness.run(&args, "y\n\n\n").unwrap();
        assert!(matches!(outcome, Outcome::NoDevice));
    }

    #[test]
    fn test_closed_input_during_discovery() {
        let harness = Harness::new();
        let args = Cli {
            serial_port: None,
            ..esp_args()
        };

        let err = harness.run(&args, "y\n").unwrap_err();
        assert!(matches!(err.downcast_ref::<DetectError>(), Some(DetectError::Aborted(_))));
    }

    #[test]
    fn test_conflicting_erase_flags_rejected_before_loading() {
        let harness = Harness::new();
        let args = Cli {
            dont_erase_flash: true,
            ..esp_args()
        };

        let err = harness.run(&args, "").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::ConflictingEraseFlags)
        );
        assert_eq!(harness.catalog.loads(), 0);
    }

    #[test]
    fn test_unknown_firmware_id() {
        let harness = Harness::new();
        let args = Cli {
            firmware: Some(9999),
            ..esp_args()
        };
        assert!(harness.run(&args, "y\ny\n").is_err());
    }

    #[test]
    fn test_missing_avrdude_detected_before_confirmation() {
        let mut harness = Harness::new();
        harness.avrdude = SimBackend::new("avrdude").uninstalled();
        let args = Cli {
            firmware: Some(ids::ARDUINO_BREWPI),
            ..esp_args()
        };

        let err = harness.run(&args, "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FlashError>(),
            Some(FlashError::MissingToolchain { .. })
        ));
        assert_eq!(harness.catalog.loads(), 1);
    }

    #[test]
    fn test_confirmations_name_baud_erase_and_device() {
        let harness = Harness::new();
        let (outcome, transcript) = harness.run_with_transcript(&esp_args(), "y\ny\n");

        assert!(matches!(outcome.unwrap(), Outcome::Flashed(_)));
        assert!(transcript.contains(
            "Do you want to flash this firmware at 115200bps, erasing flash first? (y/n): "
        ));
        let firmware = harness.catalog.load().unwrap().find_firmware(ids::ESP8266_BREWPI);
        let expected = format!(
            "Do you want to flash device /dev/ttyUSB0 with {}? (y/n): ",
            firmware.unwrap().firmware
        );
        assert!(transcript.contains(&expected));
    }

    #[test]
    fn test_avrdude_confirmation_uses_fixed_baud() {
        let harness = Harness::new();
        let args = Cli {
            firmware: Some(ids::ARDUINO_BREWPI),
            baud: None,
            erase_flash: false,
            ..esp_args()
        };
        let (outcome, transcript) = harness.run_with_transcript(&args, "n\n");

        assert!(matches!(outcome.unwrap(), Outcome::Declined));
        assert!(transcript.contains(&format!(
            "Do you want to flash this firmware at {}bps, not erasing flash first?",
            avr::BAUD
        )));
        assert!(!harness.avrdude.invoked());
    }
}
