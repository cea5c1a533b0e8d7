//! Flashing backends
//!
//! Backends are opaque external tools. Only their invocation contract
//! matters here: they receive the plan's argument vector and report
//! success, a serial communication error, or some other failure.

use std::env;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use brew_plan::{FlashMethod, FlasherConfig};
use tracing::{debug, info};

use crate::error::{BackendError, FlashError};

/// Guidance when esptool is missing
pub const ESPTOOL_REMEDIATION: &str = "Install esptool (e.g. `pip install esptool`) \
and make sure it is on the PATH, or set esptool_program in settings.json.";

/// Guidance when avrdude is missing
pub const AVRDUDE_REMEDIATION: &str = "Please check the avrdude documentation \
(https://github.com/avrdudes/avrdude/) for your operating system and install it.";

/// Backend output that means the device could not be reached over serial
const SERIAL_ERROR_MARKERS: &[&str] = &[
    "SerialException",
    "could not open port",
    "Could not open",
    "ser_open()",
    "can't open device",
];

/// An external flashing tool
pub trait FlashBackend {
    /// Tool name used in messages
    fn tool(&self) -> &str;

    /// Check the tool is installed before any device is touched
    fn ensure_available(&self) -> Result<(), FlashError>;

    /// Run the tool with the given arguments
    fn invoke(&mut self, args: &[String]) -> Result<(), BackendError>;
}

/// Search `PATH` for an executable
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path).find_map(|dir| {
        let exact = dir.join(program);
        if exact.is_file() {
            return Some(exact);
        }
        let exe = dir.join(format!("{program}.exe"));
        exe.is_file().then_some(exe)
    })
}

/// Decide whether backend output describes a serial failure
pub fn is_serial_failure(output: &str) -> bool {
    SERIAL_ERROR_MARKERS
        .iter()
        .any(|marker| output.contains(marker))
}

/// Backend that runs a command-line tool
pub struct CommandBackend {
    program: String,
    remediation: &'static str,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, remediation: &'static str) -> Self {
        Self {
            program: program.into(),
            remediation,
        }
    }

    pub fn esptool(config: &FlasherConfig) -> Self {
        Self::new(&config.esptool_program, ESPTOOL_REMEDIATION)
    }

    pub fn avrdude(config: &FlasherConfig) -> Self {
        Self::new(&config.avrdude_program, AVRDUDE_REMEDIATION)
    }
}

impl FlashBackend for CommandBackend {
    fn tool(&self) -> &str {
        &self.program
    }

    fn ensure_available(&self) -> Result<(), FlashError> {
        match find_program(&self.program) {
            Some(path) => {
                info!("{} found at {}", self.program, path.display());
                Ok(())
            }
            None => Err(FlashError::MissingToolchain {
                tool: self.program.clone(),
                remediation: self.remediation,
            }),
        }
    }

    fn invoke(&mut self, args: &[String]) -> Result<(), BackendError> {
        info!("{} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BackendError::Failed(format!("failed to start {}: {}", self.program, e)))?;

        // Echo stderr while keeping a copy to classify failures
        let mut diagnostics = String::new();
        if let Some(stderr) = child.stderr.take() {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                eprintln!("{line}");
                diagnostics.push_str(&line);
                diagnostics.push('\n');
            }
        }

        let status = child
            .wait()
            .map_err(|e| BackendError::Failed(e.to_string()))?;
        debug!("{} exited with {}", self.program, status);

        if status.success() {
            Ok(())
        } else if is_serial_failure(&diagnostics) {
            Err(BackendError::Serial(last_line(&diagnostics, &status.to_string())))
        } else {
            Err(BackendError::Failed(last_line(&diagnostics, &status.to_string())))
        }
    }
}

fn last_line(output: &str, fallback: &str) -> String {
    output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or(fallback)
        .trim()
        .to_string()
}

/// One backend per flash method
pub struct Backends {
    esptool: Box<dyn FlashBackend>,
    avrdude: Box<dyn FlashBackend>,
}

impl Backends {
    pub fn new(esptool: Box<dyn FlashBackend>, avrdude: Box<dyn FlashBackend>) -> Self {
        Self { esptool, avrdude }
    }

    /// Command-line backends named in the configuration
    pub fn from_config(config: &FlasherConfig) -> Self {
        Self::new(
            Box::new(CommandBackend::esptool(config)),
            Box::new(CommandBackend::avrdude(config)),
        )
    }

    pub fn get(&self, method: FlashMethod) -> &dyn FlashBackend {
        match method {
            FlashMethod::Esptool => self.esptool.as_ref(),
            FlashMethod::Avrdude => self.avrdude.as_ref(),
        }
    }

    pub fn get_mut(&mut self, method: FlashMethod) -> &mut dyn FlashBackend {
        match method {
            FlashMethod::Esptool => self.esptool.as_mut(),
            FlashMethod::Avrdude => self.avrdude.as_mut(),
        }
    }
}
