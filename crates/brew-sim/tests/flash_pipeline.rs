//! Integration tests for the flashing pipeline
//!
//! These tests drive discovery, plan building and the executor against
//! simulated collaborators and verify:
//! - State sequences for successful and failed attempts
//! - Handshake failures never reach the backend
//! - Checksum mismatches leave nothing in the cache
//! - Stale catalog selections are rejected before downloading
//! - Backend failure classification and cache eviction

use std::path::Path;

use brew_catalog::{Catalog, CatalogSource, Selection};
use brew_detect::{DeviceDiscovery, Discovery, DiscoveryStep, PortDescriptor};
use brew_flash::{
    Backends, ExecutorState, FlashError, FlashExecutor, FlashReport, MANUAL_FLASH_HINT,
    RETRY_HINT,
};
use brew_plan::{FlashMethod, FlashOptions, FlashPlan, FlasherConfig, PlanBuilder};
use brew_sim::fixture::ids;
use brew_sim::{
    SampleCatalog, SimBackend, SimCatalog, SimFetcher, SimHandshake, SimOutcome, SimPorts,
    SimSignal,
};

use ExecutorState::*;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Everything one attempt needs, backed by simulations
    pub struct Bench {
        _dir: tempfile::TempDir,
        pub config: FlasherConfig,
        pub catalog: SimCatalog,
        pub fetcher: SimFetcher,
        pub handshake: SimHandshake,
        pub esptool: SimBackend,
        pub avrdude: SimBackend,
    }

    impl Bench {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = FlasherConfig {
                cache_dir: dir.path().join("cache"),
                ..Default::default()
            };
            let sample = SampleCatalog::new();
            Self {
                config,
                catalog: SimCatalog::new(sample.catalog().unwrap()),
                fetcher: sample.fetcher(),
                handshake: SimHandshake::new(),
                esptool: SimBackend::new("esptool.py"),
                avrdude: SimBackend::new("avrdude"),
                _dir: dir,
            }
        }

        pub fn select(&self, firmware_id: u32) -> Selection {
            self.catalog
                .load()
                .unwrap()
                .find_firmware(firmware_id)
                .unwrap()
        }

        pub fn plan(&self, selection: &Selection) -> FlashPlan {
            PlanBuilder::new(&self.config)
                .build(
                    &selection.family,
                    &selection.firmware,
                    &FlashOptions {
                        port: "/dev/ttyUSB0".to_string(),
                        baud: 460800,
                        erase_before_flash: false,
                    },
                )
                .unwrap()
        }

        /// Run one attempt, returning the outcome and the state history
        pub fn run(
            &self,
            firmware_id: u32,
        ) -> (Result<FlashReport, FlashError>, Vec<ExecutorState>) {
            let selection = self.select(firmware_id);
            let plan = self.plan(&selection);
            self.run_plan(&selection, &plan)
        }

        pub fn run_plan(
            &self,
            selection: &Selection,
            plan: &FlashPlan,
        ) -> (Result<FlashReport, FlashError>, Vec<ExecutorState>) {
            let mut executor = self.executor();
            let result = executor.run(selection, plan);
            (result, executor.history().to_vec())
        }

        pub fn executor(&self) -> FlashExecutor<'_> {
            FlashExecutor::new(
                &self.config,
                &self.catalog,
                &self.fetcher,
                &self.handshake,
                Backends::new(self.esptool.boxed(), self.avrdude.boxed()),
            )
        }

        pub fn cached_files(&self) -> usize {
            count_files(&self.config.cache_dir)
        }
    }

    pub fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }
}

use helpers::*;

// ============================================================================
// Successful Attempts
// ============================================================================

#[test]
fn test_esp32_success_path() {
    let bench = Bench::new();
    let (result, states) = bench.run(ids::ESP32_FERMENTRACK);

    let report = result.unwrap();
    assert_eq!(states, [Idle, Verifying, Downloading, Invoking, Done]);
    assert_eq!(report.method, FlashMethod::Esptool);
    assert_eq!(report.segments, 5);
    assert_eq!(report.evicted, 5);

    let invocations = bench.esptool.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(
        invocations[0][..6],
        ["--port", "/dev/ttyUSB0", "--chip", "esp32", "--baud", "460800"]
    );
    assert!(!bench.avrdude.invoked());
    assert!(bench.handshake.pulses().is_empty());
}

#[test]
fn test_cache_is_evicted_after_success() {
    let bench = Bench::new();
    let (result, _) = bench.run(ids::ESP8266_BREWPI);

    assert!(result.is_ok());
    assert_eq!(bench.cached_files(), 0);
}

#[test]
fn test_handshake_runs_before_backend() {
    let bench = Bench::new();
    let (result, states) = bench.run(ids::ESP32_S2_TILTBRIDGE);

    assert!(result.is_ok());
    assert_eq!(
        states,
        [Idle, Verifying, Downloading, HandshakePulse, Invoking, Done]
    );
    assert_eq!(
        bench.handshake.pulses(),
        [("/dev/ttyUSB0".to_string(), 1200)]
    );
}

#[test]
fn test_avrdude_uses_fixed_template() {
    let bench = Bench::new();
    let (result, _) = bench.run(ids::ARDUINO_BREWPI);

    assert_eq!(result.unwrap().method, FlashMethod::Avrdude);
    let args = &bench.avrdude.invocations()[0];
    assert_eq!(args[..6], ["-p", "atmega328p", "-c", "arduino", "-P", "/dev/ttyUSB0"]);
    assert!(args.iter().all(|a| a != "460800"));
    assert!(!bench.esptool.invoked());
}

#[test]
fn test_only_plan_artifacts_are_fetched() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP32_C3_TILTBRIDGE);
    let plan = bench.plan(&selection);

    let (result, _) = bench.run_plan(&selection, &plan);
    assert!(result.is_ok());

    let expected: Vec<String> = plan.segments().iter().map(|s| s.source.url.clone()).collect();
    assert_eq!(bench.fetcher.requests(), expected);
}

#[test]
fn test_executor_runs_only_once() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP8266_BREWPI);
    let plan = bench.plan(&selection);
    let mut executor = bench.executor();

    assert!(executor.run(&selection, &plan).is_ok());
    let requests = bench.fetcher.requests().len();

    let err = executor.run(&selection, &plan).unwrap_err();
    assert!(matches!(err, FlashError::AlreadyRan { state: Done }));
    assert!(err.is_fatal());
    assert_eq!(executor.state(), Done);
    assert_eq!(executor.history(), [Idle, Verifying, Downloading, Invoking, Done]);
    assert_eq!(bench.esptool.invocations().len(), 1);
    assert_eq!(bench.fetcher.requests().len(), requests);
}

#[test]
fn test_failed_executor_is_not_rerun() {
    let mut bench = Bench::new();
    bench.esptool = SimBackend::new("esptool.py")
        .with_outcome(SimOutcome::Failure("exit status 2".into()));
    let selection = bench.select(ids::ESP8266_BREWPI);
    let plan = bench.plan(&selection);
    let mut executor = bench.executor();

    assert!(executor.run(&selection, &plan).is_err());
    let err = executor.run(&selection, &plan).unwrap_err();
    assert!(matches!(err, FlashError::AlreadyRan { state: Failed }));
    assert_eq!(bench.esptool.invocations().len(), 1);
    assert_eq!(executor.history().last(), Some(&Failed));
}

// ============================================================================
// Handshake Failures
// ============================================================================

#[test]
fn test_handshake_failure_never_invokes_backend() {
    let mut bench = Bench::new();
    bench.handshake = SimHandshake::failing();

    let (result, states) = bench.run(ids::LEONARDO_BREWPI);

    assert_eq!(states, [Idle, Verifying, Downloading, HandshakePulse, Failed]);
    match result.unwrap_err() {
        FlashError::Handshake {
            port,
            baud,
            remediation,
            ..
        } => {
            assert_eq!(port, "/dev/ttyUSB0");
            assert_eq!(baud, 1200);
            assert!(remediation.contains("manualflash"));
        }
        other => panic!("expected handshake error, got {other:?}"),
    }
    assert!(!bench.avrdude.invoked());
    assert_eq!(bench.cached_files(), 0);
}

// ============================================================================
// Download Failures
// ============================================================================

#[test]
fn test_checksum_mismatch_aborts_before_invocation() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP32_FERMENTRACK);
    let plan = bench.plan(&selection);
    let corrupted = &plan.segments()[1];
    assert!(bench.fetcher.corrupt(&corrupted.source.url));

    let (result, states) = bench.run_plan(&selection, &plan);

    assert!(matches!(
        result,
        Err(FlashError::ChecksumMismatch { artifact, .. }) if artifact == corrupted.kind
    ));
    assert_eq!(states, [Idle, Verifying, Downloading, Failed]);
    assert!(!bench.esptool.invoked());
    assert!(!corrupted.path.exists());
    assert_eq!(bench.cached_files(), 0);
}

#[test]
fn test_missing_artifact_is_download_error() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP8266_BREWPI);
    let plan = bench.plan(&selection);
    bench.fetcher.remove(&selection.firmware.firmware.url);

    let (result, _) = bench.run_plan(&selection, &plan);

    assert!(matches!(result, Err(FlashError::Download { .. })));
    assert!(!bench.esptool.invoked());
}

#[test]
fn test_untrusted_file_at_cache_path_is_replaced() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP8266_BREWPI);
    let plan = bench.plan(&selection);
    let target = &plan.segments()[0].path;
    std::fs::create_dir_all(&bench.config.cache_dir).unwrap();
    std::fs::write(target, b"stale bytes").unwrap();

    bench.fetcher.corrupt(&selection.firmware.firmware.url);
    let (result, _) = bench.run_plan(&selection, &plan);

    assert!(matches!(result, Err(FlashError::ChecksumMismatch { .. })));
    assert!(!target.exists());
}

// ============================================================================
// Catalog Verification
// ============================================================================

#[test]
fn test_stale_catalog_is_rejected_before_download() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP32_FERMENTRACK);
    let plan = bench.plan(&selection);

    bench.catalog.update(|catalog| {
        let mut projects = catalog.projects().to_vec();
        projects[0].families[0].firmware[0].version = "0.9.3".to_string();
        *catalog = Catalog::new(projects).unwrap();
    });

    let (result, states) = bench.run_plan(&selection, &plan);

    assert!(matches!(
        result,
        Err(FlashError::CatalogStale { firmware, .. }) if firmware == ids::ESP32_FERMENTRACK
    ));
    assert_eq!(states, [Idle, Verifying, Failed]);
    assert!(bench.fetcher.requests().is_empty());
}

#[test]
fn test_removed_firmware_is_stale() {
    let bench = Bench::new();
    let selection = bench.select(ids::ARDUINO_BREWPI);
    let plan = bench.plan(&selection);
    bench.catalog.replace(Catalog::default());

    let (result, _) = bench.run_plan(&selection, &plan);
    assert!(matches!(result, Err(FlashError::CatalogStale { .. })));
}

#[test]
fn test_unreachable_catalog_fails_verification() {
    let bench = Bench::new();
    let selection = bench.select(ids::ESP8266_BREWPI);
    let plan = bench.plan(&selection);
    bench.catalog.set_unreachable(true);

    let (result, _) = bench.run_plan(&selection, &plan);
    assert!(matches!(result, Err(FlashError::Catalog(_))));
}

// ============================================================================
// Backend Failures
// ============================================================================

#[test]
fn test_backend_failure_is_not_fatal() {
    let mut bench = Bench::new();
    bench.esptool = SimBackend::new("esptool.py")
        .with_outcome(SimOutcome::Failure("Invalid head of packet (0x1B)".into()));

    let (result, states) = bench.run(ids::ESP32_FERMENTRACK);

    let err = result.unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(err, FlashError::BackendInvocation { .. }));
    assert_eq!(err.remediation(), [RETRY_HINT]);
    assert_eq!(states.last(), Some(&Failed));
    assert_eq!(bench.cached_files(), 0);
}

#[test]
fn test_backend_failure_after_handshake_suggests_manual_mode() {
    let mut bench = Bench::new();
    bench.esptool = SimBackend::new("esptool.py")
        .with_outcome(SimOutcome::Failure("Failed to connect".into()));

    let (result, _) = bench.run(ids::ESP32_S2_TILTBRIDGE);

    assert_eq!(
        result.unwrap_err().remediation(),
        [RETRY_HINT, MANUAL_FLASH_HINT]
    );
}

#[test]
fn test_backend_serial_error_is_fatal() {
    let mut bench = Bench::new();
    bench.esptool = SimBackend::new("esptool.py")
        .with_outcome(SimOutcome::SerialError("could not open port".into()));

    let (result, _) = bench.run(ids::ESP8266_BREWPI);

    let err = result.unwrap_err();
    assert!(matches!(err, FlashError::BackendSerial { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_missing_toolchain_detected_before_device_interaction() {
    let mut bench = Bench::new();
    bench.avrdude = SimBackend::new("avrdude").uninstalled();

    let (result, states) = bench.run(ids::LEONARDO_BREWPI);

    assert!(matches!(result, Err(FlashError::MissingToolchain { .. })));
    assert_eq!(states, [Idle, Failed]);
    assert!(bench.handshake.pulses().is_empty());
    assert!(bench.fetcher.requests().is_empty());
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discovery_finds_new_board() {
    let ports = SimPorts::new()
        .then([PortDescriptor::bare("/dev/ttyS0")])
        .then([
            PortDescriptor::bare("/dev/ttyS0"),
            PortDescriptor::usb("/dev/ttyUSB0", 0x10C4, 0xEA60),
        ]);
    let mut signal = SimSignal::new();

    let discovery = DeviceDiscovery::new(&ports).discover(&mut signal).unwrap();

    assert_eq!(signal.steps(), [DiscoveryStep::Disconnect, DiscoveryStep::Connect]);
    match discovery {
        Discovery::Found(device) => assert_eq!(device.port(), "/dev/ttyUSB0"),
        other => panic!("expected one device, got {other:?}"),
    }
}

#[test]
fn test_discovery_with_no_new_board() {
    let ports = SimPorts::new().then([PortDescriptor::bare("COM1")]);
    let discovery = DeviceDiscovery::new(&ports)
        .discover(&mut SimSignal::new())
        .unwrap();
    assert_eq!(discovery, Discovery::NoNewDevices);
}

#[test]
fn test_discovery_declined() {
    let ports = SimPorts::new();
    let result = DeviceDiscovery::new(&ports)
        .discover(&mut SimSignal::abort_at(DiscoveryStep::Disconnect));
    assert!(result.is_err());
    assert_eq!(ports.remaining(), 0);
}

#[test]
fn test_discovered_port_feeds_plan() {
    let bench = Bench::new();
    let ports = SimPorts::new()
        .then([])
        .then([PortDescriptor::usb("/dev/ttyACM0", 0x2341, 0x8036)]);
    let Discovery::Found(device) = DeviceDiscovery::new(&ports)
        .discover(&mut SimSignal::new())
        .unwrap()
    else {
        panic!("expected one device");
    };

    let selection = bench.select(ids::LEONARDO_BREWPI);
    let plan = PlanBuilder::new(&bench.config)
        .build(
            &selection.family,
            &selection.firmware,
            &FlashOptions {
                port: device.port().to_string(),
                baud: 115200,
                erase_before_flash: true,
            },
        )
        .unwrap();
    let (result, _) = bench.run_plan(&selection, &plan);

    assert!(result.is_ok());
    assert_eq!(bench.handshake.pulses()[0].0, "/dev/ttyACM0");
    assert!(bench.avrdude.invocations()[0].contains(&"/dev/ttyACM0".to_string()));
}

// ============================================================================
// Property Tests
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    const ALL_FIRMWARE: [u32; 6] = [
        ids::ESP32_FERMENTRACK,
        ids::ESP32_S2_TILTBRIDGE,
        ids::ESP32_C3_TILTBRIDGE,
        ids::ESP8266_BREWPI,
        ids::ARDUINO_BREWPI,
        ids::LEONARDO_BREWPI,
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn corrupted_artifact_never_reaches_backend(
            firmware in prop::sample::select(ALL_FIRMWARE.to_vec()),
            pick in any::<prop::sample::Index>(),
        ) {
            let bench = Bench::new();
            let selection = bench.select(firmware);
            let plan = bench.plan(&selection);
            let corrupted = &plan.segments()[pick.index(plan.segments().len())];
            bench.fetcher.corrupt(&corrupted.source.url);

            let (result, states) = bench.run_plan(&selection, &plan);

            let is_mismatch = matches!(result, Err(FlashError::ChecksumMismatch { .. }));
            prop_assert!(is_mismatch);
            prop_assert!(!states.contains(&Invoking));
            prop_assert!(!bench.esptool.invoked() && !bench.avrdude.invoked());
            prop_assert_eq!(bench.cached_files(), 0);
        }

        #[test]
        fn every_attempt_ends_in_a_terminal_state(
            firmware in prop::sample::select(ALL_FIRMWARE.to_vec()),
            failing_handshake in any::<bool>(),
        ) {
            let mut bench = Bench::new();
            if failing_handshake {
                bench.handshake = SimHandshake::failing();
            }

            let (result, states) = bench.run(firmware);

            let last = *states.last().unwrap();
            prop_assert!(last.is_terminal());
            prop_assert_eq!(result.is_ok(), last == Done);
            prop_assert_eq!(bench.cached_files(), 0);
        }
    }
}
