use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fibertrace::logger;
use fibertrace::sorting::{
    open_still, probe_camera, ActuatorDriver, ActuatorState, CameraConfig, CommandCaptureSource,
    FrameSource, Indicator, JsonFileStore, LoggingDriver, ScanOutcome, SessionReport,
    SessionStats, SnapshotStore, SorterConfig, SortingEngine,
};
use tracing::{debug, error, info, warn};

/// How long a result stays on the indicators before the gate returns to rest.
const HOLD: Duration = Duration::from_secs(1);
const SELFTEST_STEP: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "fibertrace", version, about = "Cotton purity sorter for textile recycling")]
struct Cli {
    #[command(flatten)]
    sorter: SorterArgs,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SorterArgs {
    /// Gate angle for pure items, degrees
    #[arg(long, env = "FIBERTRACE_GOOD_ANGLE")]
    good_angle: Option<u16>,

    /// Gate angle for blends, degrees
    #[arg(long, env = "FIBERTRACE_BAD_ANGLE")]
    bad_angle: Option<u16>,

    /// Resting gate angle, degrees
    #[arg(long, env = "FIBERTRACE_CENTER_ANGLE")]
    center_angle: Option<u16>,

    #[arg(long, env = "FIBERTRACE_BLUE_THRESHOLD")]
    blue_threshold: Option<f64>,

    /// Session snapshot file
    #[arg(long, env = "FIBERTRACE_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// V4L2 camera device
    #[arg(long, env = "FIBERTRACE_DEVICE", default_value = "/dev/video0")]
    device: String,

    /// GPIO chip carrying the indicator LEDs
    #[arg(long, env = "FIBERTRACE_GPIO_CHIP", default_value = "gpiochip0")]
    gpio_chip: String,

    /// Green LED line offset
    #[arg(long, env = "FIBERTRACE_GREEN_LINE", default_value_t = 17)]
    green_line: u32,

    /// Red LED line offset
    #[arg(long, env = "FIBERTRACE_RED_LINE", default_value_t = 27)]
    red_line: u32,

    /// Root of the sysfs PWM class driving the gate servo
    #[arg(long, env = "FIBERTRACE_PWM_ROOT", default_value = "/sys/class/pwm")]
    pwm_root: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive loop: press ENTER to scan the item under the camera
    Run {
        /// Scan this still image instead of the camera
        #[arg(long)]
        image: Option<PathBuf>,
        /// Log actuator commands instead of driving GPIO/PWM
        #[arg(long)]
        dry_run: bool,
    },
    /// Scan a single still image
    Scan {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the session dashboard from the snapshot
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Zero the session statistics
    Reset,
    /// Report which camera source is usable
    Probe,
    /// Capture a test frame, flash the indicators and sweep the gate
    Selftest {
        #[arg(long)]
        dry_run: bool,
    },
}

impl SorterArgs {
    fn config(&self) -> Result<SorterConfig> {
        let mut builder = SorterConfig::builder();
        if let Some(angle) = self.good_angle {
            builder = builder.good_angle(angle);
        }
        if let Some(angle) = self.bad_angle {
            builder = builder.bad_angle(angle);
        }
        if let Some(angle) = self.center_angle {
            builder = builder.center_angle(angle);
        }
        if let Some(threshold) = self.blue_threshold {
            builder = builder.blue_threshold(threshold);
        }
        if let Some(path) = &self.data_file {
            builder = builder.snapshot_path(path);
        }
        builder.build().context("Invalid sorter configuration")
    }

    fn camera(&self) -> Result<Box<dyn FrameSource>> {
        let camera = CameraConfig {
            device_path: self.device.clone(),
            ..CameraConfig::default()
        };
        let fallback = CommandCaptureSource::default().with_device(&self.device);
        probe_camera(&camera, fallback).context("No camera available")
    }

    fn source(&self, image: Option<&Path>) -> Result<Box<dyn FrameSource>> {
        match image {
            Some(path) => Ok(open_still(path)),
            None => self.camera(),
        }
    }

    fn driver(&self, dry_run: bool) -> Result<Box<dyn ActuatorDriver>> {
        if dry_run {
            return Ok(Box::new(LoggingDriver::new()));
        }
        self.hardware_driver()
    }

    #[cfg(target_os = "linux")]
    fn hardware_driver(&self) -> Result<Box<dyn ActuatorDriver>> {
        use fibertrace::sorting::{GpiodIndicators, HardwareDriver, IndicatorConfig, ServoConfig};

        let indicators = GpiodIndicators::open(&IndicatorConfig {
            chip: self.gpio_chip.clone(),
            green_line: self.green_line,
            red_line: self.red_line,
        })
        .context("Failed to request indicator GPIO lines (use --dry-run without hardware)")?;
        let servo = ServoConfig {
            pwm_root: self.pwm_root.clone(),
            ..ServoConfig::default()
        };
        let driver = HardwareDriver::open(indicators, servo)
            .context("Failed to set up the gate servo PWM (use --dry-run without hardware)")?;
        Ok(Box::new(driver))
    }

    #[cfg(not(target_os = "linux"))]
    fn hardware_driver(&self) -> Result<Box<dyn ActuatorDriver>> {
        anyhow::bail!("GPIO and PWM actuators need Linux; use --dry-run")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(if cli.verbose { "debug" } else { "info" });

    let config = cli.sorter.config()?;
    info!(
        good = config.angles.good,
        bad = config.angles.bad,
        center = config.angles.center,
        threshold = config.blue_threshold,
        data_file = %config.snapshot_path.display(),
        "Starting FiberTrace"
    );

    match &cli.command {
        Command::Run { image, dry_run } => {
            let engine = SortingEngine::new(config);
            let mut source = cli.sorter.source(image.as_deref())?;
            let mut driver = cli.sorter.driver(*dry_run)?;

            let result = run_loop(&engine, source.as_mut(), driver.as_mut());
            release_after(driver.as_mut(), &engine.rest_state(), result)
        }
        Command::Scan { image, dry_run } => {
            let engine = SortingEngine::new(config);
            let mut source = open_still(image);
            let mut driver = cli.sorter.driver(*dry_run)?;

            let result = scan_once(&engine, source.as_mut(), driver.as_mut());
            if result.is_ok() {
                thread::sleep(HOLD);
            }
            release_after(driver.as_mut(), &engine.rest_state(), result).map(|_| ())
        }
        Command::Stats { json } => {
            let stats = JsonFileStore::new(&config.snapshot_path)
                .load()
                .context("Failed to read session snapshot")?
                .unwrap_or_default();
            print_stats(&stats, *json)
        }
        Command::Reset => {
            let engine = SortingEngine::new(config);
            engine
                .stats()
                .reset()
                .into_result()
                .context("Failed to persist reset")?;
            println!("Session statistics reset.");
            Ok(())
        }
        Command::Probe => {
            let source = cli.sorter.camera()?;
            println!("Camera ready: {}", source.name());
            Ok(())
        }
        Command::Selftest { dry_run } => selftest(&cli.sorter, &config, *dry_run),
    }
}

/// Returns the actuators to rest. A release failure is logged and never
/// replaces `result`.
fn release_after<T>(
    driver: &mut dyn ActuatorDriver,
    rest: &ActuatorState,
    result: Result<T>,
) -> Result<T> {
    if let Err(e) = driver.release(rest) {
        warn!("Failed to release actuators: {}", e);
    }
    result
}

fn run_loop(
    engine: &SortingEngine,
    source: &mut dyn FrameSource,
    driver: &mut dyn ActuatorDriver,
) -> Result<()> {
    let rest = engine.rest_state();
    driver.apply(&rest).context("Failed to move actuators to rest")?;

    println!("{}", SessionReport::from(&engine.stats().current_stats()));
    info!("Scanning from {}", source.name());

    let mut lines = io::stdin().lock().lines();
    loop {
        print!("\nPlace an item and press ENTER to scan (q to quit): ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        if matches!(line?.trim(), "q" | "quit" | "exit") {
            break;
        }

        if let Err(e) = scan_once(engine, source, driver) {
            error!("Scan failed: {:#}", e);
            continue;
        }

        thread::sleep(HOLD);
        if let Err(e) = driver.apply(&rest) {
            error!("Failed to return actuators to rest: {}", e);
        }
    }

    info!("Stopping");
    Ok(())
}

fn scan_once(
    engine: &SortingEngine,
    source: &mut dyn FrameSource,
    driver: &mut dyn ActuatorDriver,
) -> Result<ScanOutcome> {
    let frame = source
        .capture()
        .with_context(|| format!("Capture from {} failed", source.name()))?;
    let (outcome, timings) = engine.scan_with_timings(&frame).context("Frame rejected")?;
    debug!("\n{}", timings);

    driver
        .apply(&outcome.actuator)
        .context("Failed to drive actuators")?;

    println!(
        "\n{} -> {} ({:.1}% cotton)",
        outcome.result.category, outcome.result.composition_label, outcome.result.purity_percent
    );
    if let Some(e) = &outcome.persist_error {
        println!("Warning: statistics not saved ({})", e);
    }
    println!("{}", SessionReport::from(&outcome.stats));
    Ok(outcome)
}

fn print_stats(stats: &SessionStats, json: bool) -> Result<()> {
    let report = SessionReport::from(stats);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn selftest(args: &SorterArgs, config: &SorterConfig, dry_run: bool) -> Result<()> {
    let mut failures = 0;

    println!("Camera:");
    match args.camera().and_then(|mut source| {
        let frame = source.capture()?;
        Ok((source.name().to_string(), frame))
    }) {
        Ok((name, frame)) => {
            println!("  OK    {} captured {}x{}", name, frame.width(), frame.height())
        }
        Err(e) => {
            failures += 1;
            println!("  FAIL  {:#}", e);
        }
    }

    println!("Actuators:");
    let mut driver = args.driver(dry_run)?;
    let angles = config.angles;
    let mut steps = vec![
        ("green indicator", Some(Indicator::Green), angles.center),
        ("red indicator", Some(Indicator::Red), angles.center),
    ];
    for (label, angle) in [
        ("gate center", angles.center),
        ("gate good", angles.good),
        ("gate bad", angles.bad),
        ("gate center", angles.center),
    ] {
        steps.push((label, None, angle));
    }

    for (label, indicator, gate_angle_degrees) in steps {
        let state = ActuatorState {
            indicator,
            gate_angle_degrees,
        };
        match driver.apply(&state) {
            Ok(()) => println!("  OK    {} ({} deg)", label, gate_angle_degrees),
            Err(e) => {
                failures += 1;
                println!("  FAIL  {}: {}", label, e);
            }
        }
        thread::sleep(SELFTEST_STEP);
    }

    let rest = ActuatorState {
        indicator: None,
        gate_angle_degrees: angles.center,
    };
    driver.release(&rest)?;

    if failures > 0 {
        anyhow::bail!("Self-test finished with {} failure(s)", failures);
    }
    println!("Self-test passed.");
    Ok(())
}
