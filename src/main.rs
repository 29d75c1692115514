use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

mod app_metrics;
mod application_state;
mod config;
mod diagnostics;
mod frame_filter;
mod interpolator;
mod performance;
mod polar;
mod polar_store;
mod publisher;
mod sensor_monitor;
mod telemetry;
mod utilities;
mod web;

use app_metrics::{AppMetrics, MetricsLogger};
use application_state::ApplicationState;
use config::Config;
use diagnostics::RateLimitedWarner;
use frame_filter::should_process_message;
use performance::{SensorSnapshot, compute_performance};
use polar_store::PolarStore;
use publisher::{Delta, output_values};
use sensor_monitor::SensorMonitor;
use telemetry::H5000Emitter;

// Import from nmea2k crate
use nmea2k::{MessageHandler, N2kMessage, RawMessage};

const RESULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

// ========== Logging Setup ==========

fn init_logging(log_config: &config::LogConfig) -> Result<(), Box<dyn Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
    use tracing_appender::rolling;

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_config.directory)?;

    // Local time when the offset can be determined, UTC otherwise
    let timer = fmt::time::OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
        fmt::time::OffsetTime::new(time::UtcOffset::UTC, time::format_description::well_known::Rfc3339)
    });

    // Create daily rolling file appender
    let file_appender = rolling::daily(&log_config.directory, &log_config.file_prefix);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_timer(timer.clone());

    // stdout carries the published values, so console logging goes to stderr
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer);

    // Parse log level from config
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ========== Command Line ==========

#[derive(Debug, PartialEq)]
struct CliArgs {
    config_path: String,
    validate_only: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> CliArgs {
    let has = |flag: &str| args.iter().any(|a| a == flag);
    let config_path = args
        .iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "config.json".to_string());

    CliArgs {
        config_path,
        validate_only: has("--validate-config") || has("--validate") || has("-v"),
        help: has("--help") || has("-h"),
    }
}

fn print_help() {
    println!("Sailing Performance Calculator");
    println!();
    println!("Reads NMEA2000 messages in canboat plain format from stdin and writes");
    println!("performance values as JSON deltas to stdout.");
    println!();
    println!("USAGE:");
    println!("    sail_performance [OPTIONS] < messages.log");
    println!();
    println!("OPTIONS:");
    println!("    --config, -c <path>                  Configuration file (default: config.json)");
    println!("    --validate-config, --validate, -v    Validate configuration and exit");
    println!("    --help, -h                           Show this help message");
}

// ========== Calculation Loop ==========

/// Decides when to calculate and where results go
struct Calculator {
    state: Arc<ApplicationState>,
    emitter: Option<H5000Emitter>,
    min_interval: Duration,
    last_run: Option<Instant>,
    last_snapshot: Option<SensorSnapshot>,
    last_result_log: Instant,
}

impl Calculator {
    fn new(state: Arc<ApplicationState>, emitter: Option<H5000Emitter>) -> Self {
        let min_interval = state.config.performance.min_interval();
        Self {
            state,
            emitter,
            min_interval,
            last_run: None,
            last_snapshot: None,
            last_result_log: Instant::now(),
        }
    }

    /// Run one cycle if the interval has passed and the inputs changed
    fn on_wind_update<W: Write>(
        &mut self,
        monitor: &SensorMonitor,
        out: &mut W,
        metrics: &mut AppMetrics,
    ) -> Result<(), Box<dyn Error>> {
        let now = Instant::now();
        if self.last_run.is_some_and(|last| now.duration_since(last) < self.min_interval) {
            return Ok(());
        }
        let snapshot = monitor.snapshot_at(now);
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            return Ok(());
        }
        self.last_run = Some(now);

        let table = self.state.polar.current();
        match compute_performance(&snapshot, &table) {
            Some(result) => {
                metrics.computed_cycles += 1;
                let timestamp = Utc::now();
                let delta = Delta::new(timestamp, output_values(&result));
                writeln!(out, "{}", serde_json::to_string(&delta)?)?;
                out.flush()?;

                if let Some(emitter) = self.emitter.as_mut() {
                    match emitter.emit_result(&result) {
                        Ok(frames) => metrics.telemetry_frames += frames as u64,
                        Err(e) => warn!("[H5000] Failed to write telemetry: {}", e),
                    }
                }

                if self.last_result_log.elapsed() >= RESULT_LOG_INTERVAL {
                    debug!(?result, "Performance output");
                    self.last_result_log = Instant::now();
                }
                self.state.update_result(result, timestamp);
            }
            None => {
                metrics.skipped_cycles += 1;
                debug!(engine_running = snapshot.engine_running, "No performance result this cycle");
            }
        }
        self.last_snapshot = Some(snapshot);
        Ok(())
    }
}

/// Feed canboat lines to the monitor until the input closes.
/// Lines that are not valid UTF-8 are decoded lossily and fail parsing like any other bad line.
fn process_input<R: BufRead, W: Write>(
    mut input: R,
    out: &mut W,
    config: &Config,
    monitor: &mut SensorMonitor,
    calculator: &mut Calculator,
    metrics: &mut AppMetrics,
) -> Result<(), Box<dyn Error>> {
    let mut metrics_logger = MetricsLogger::new(Duration::from_secs(60));
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if input.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buffer);
        if line.trim().is_empty() {
            continue;
        }
        metrics.input_lines += 1;

        let raw: RawMessage = match line.trim().parse() {
            Ok(raw) => raw,
            Err(e) => {
                metrics.decode_errors += 1;
                warn!("Skipping malformed line: {}", e);
                continue;
            }
        };
        if !should_process_message(config, &raw) {
            metrics.filtered_messages += 1;
            continue;
        }

        let message = N2kMessage::from_pgn(raw.pgn, &raw.data);
        monitor.handle_message(&message);
        if monitor.take_wind_update() {
            calculator.on_wind_update(monitor, out, metrics)?;
        }

        // Log metrics periodically
        metrics_logger.check_and_log(metrics);
    }
}

// ========== Main Application ==========

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args);

    if cli.help {
        print_help();
        std::process::exit(0);
    }

    // Load configuration
    let config = match Config::from_file(&cli.config_path) {
        Ok(cfg) => {
            if cli.validate_only {
                println!("✓ Configuration validation successful");
                println!("  Polar file: {}", cfg.polar_file);
                println!("  Leeway: k={}, max={}°", cfg.performance.leeway_coefficient, cfg.performance.max_leeway_degrees);
                println!("  Calibration: STW offset={} m/s, heel factor={}",
                    cfg.calibration.speed_through_water_offset,
                    cfg.calibration.heel_correction_factor);
                println!("  Telemetry: {} (source {})",
                    if cfg.telemetry.enabled { "enabled" } else { "disabled" },
                    cfg.telemetry.source_address);
                println!("  Web server: {} (port {})",
                    if cfg.web.enabled { "enabled" } else { "disabled" },
                    cfg.web.port);
                println!("  PGN source filters: {} entries", cfg.source_filter.pgn_source_map.len());
                std::process::exit(0);
            }
            cfg
        }
        Err(e) => {
            if cli.validate_only {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
            eprintln!("Warning: Could not load {}: {}", cli.config_path, e);
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Sailing performance calculator starting...");

    let polar = PolarStore::open(&config.polar_file, Arc::new(RateLimitedWarner::default()));
    let state = Arc::new(ApplicationState::new(config.clone(), polar));

    // Web API on a background runtime; the calculation loop stays on this thread
    let _runtime = if config.web.enabled {
        let runtime = tokio::runtime::Runtime::new()?;
        let app = state.clone();
        let port = config.web.port;
        let static_dir = config.web.static_dir.clone();
        runtime.spawn(async move {
            if let Err(e) = web::start_web_server(app, port, static_dir).await {
                error!("Web server stopped: {}", e);
            }
        });
        Some(runtime)
    } else {
        None
    };

    let emitter = if config.telemetry.enabled {
        match H5000Emitter::open(config.telemetry.output_file.as_deref(), config.telemetry.source_address) {
            Ok(emitter) => {
                info!("H5000 telemetry enabled, source address {}", config.telemetry.source_address);
                Some(emitter)
            }
            Err(e) => {
                warn!("Failed to open telemetry output: {}", e);
                warn!("Continuing without telemetry...");
                None
            }
        }
    } else {
        None
    };

    let mut monitor = SensorMonitor::new(config.calibration.clone(), config.performance.clone());
    let mut calculator = Calculator::new(state.clone(), emitter);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    info!("Reading NMEA2000 messages from stdin");
    let mut metrics = AppMetrics::new();
    process_input(io::stdin().lock(), &mut out, &config, &mut monitor, &mut calculator, &mut metrics)?;

    metrics.log();
    info!("Input closed, exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polar::tests::test_table;
    use nmea2k::pgns::WindData;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let cli = parse_args(&args(&["sail_performance"]));
        assert_eq!(cli.config_path, "config.json");
        assert!(!cli.validate_only);
        assert!(!cli.help);
    }

    #[test]
    fn test_parse_args_flags() {
        let cli = parse_args(&args(&["sail_performance", "--config", "/etc/boat.json", "--validate-config"]));
        assert_eq!(cli.config_path, "/etc/boat.json");
        assert!(cli.validate_only);
        assert!(parse_args(&args(&["sail_performance", "-h"])).help);
        // missing value keeps the default
        assert_eq!(parse_args(&args(&["sail_performance", "--config"])).config_path, "config.json");
    }

    fn calculator(min_interval_ms: u64) -> Calculator {
        let mut config = Config::default();
        config.performance.min_interval_ms = min_interval_ms;
        let diagnostics = Arc::new(RateLimitedWarner::default());
        let state = ApplicationState::new(config, PolarStore::new(test_table(), None, diagnostics));
        Calculator::new(Arc::new(state), None)
    }

    fn monitor_with_wind(angle: f64) -> SensorMonitor {
        let config = Config::default();
        let mut monitor = SensorMonitor::new(config.calibration, config.performance);
        monitor.handle_message(&N2kMessage::WindData(WindData::new_apparent(7.0, angle)));
        monitor
    }

    #[test]
    fn test_cycle_writes_delta_and_updates_state() {
        let mut calculator = calculator(0);
        let mut metrics = AppMetrics::new();
        let mut out = Vec::new();

        calculator.on_wind_update(&monitor_with_wind(0.8), &mut out, &mut metrics).unwrap();

        let text = String::from_utf8(out).unwrap();
        let delta: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        let paths: Vec<&str> = delta["values"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["path"].as_str().unwrap())
            .collect();
        assert!(paths.contains(&"environment.wind.speedTrue"));
        assert!(paths.contains(&"performance.polarSpeed"));
        assert_eq!(metrics.computed_cycles, 1);
        assert!(calculator.state.last_result().is_some());
    }

    #[test]
    fn test_unchanged_input_is_not_recomputed() {
        let mut calculator = calculator(0);
        let mut metrics = AppMetrics::new();
        let mut out = Vec::new();
        let monitor = monitor_with_wind(0.8);

        calculator.on_wind_update(&monitor, &mut out, &mut metrics).unwrap();
        calculator.on_wind_update(&monitor, &mut out, &mut metrics).unwrap();
        assert_eq!(metrics.computed_cycles, 1);

        calculator.on_wind_update(&monitor_with_wind(0.9), &mut out, &mut metrics).unwrap();
        assert_eq!(metrics.computed_cycles, 2);
    }

    #[test]
    fn test_cycles_are_throttled() {
        let mut calculator = calculator(60_000);
        let mut metrics = AppMetrics::new();
        let mut out = Vec::new();

        calculator.on_wind_update(&monitor_with_wind(0.8), &mut out, &mut metrics).unwrap();
        calculator.on_wind_update(&monitor_with_wind(0.9), &mut out, &mut metrics).unwrap();
        assert_eq!(metrics.computed_cycles, 1);
    }

    #[test]
    fn test_engine_running_skips_cycle() {
        let mut calculator = calculator(0);
        let mut metrics = AppMetrics::new();
        let mut out = Vec::new();
        let mut monitor = monitor_with_wind(0.8);
        monitor.process_engine_at(&nmea2k::pgns::EngineRapidUpdate::new(0, Some(1500.0)), Instant::now());

        calculator.on_wind_update(&monitor, &mut out, &mut metrics).unwrap();
        assert_eq!(metrics.skipped_cycles, 1);
        assert!(out.is_empty());
        assert!(calculator.state.last_result().is_none());
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut calculator = calculator(0);
        let mut metrics = AppMetrics::new();
        let mut out = Vec::new();
        let config = Config::default();
        let mut monitor = SensorMonitor::new(config.calibration.clone(), config.performance.clone());

        let mut input = Vec::new();
        input.extend_from_slice(b"2024-06-01T10:00:00.000Z,2,130306,105,255,8,00,20,03,ec,0a,02,ff,ff\n");
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"2024-06-01T10:00:00.100Z,2,130306,105,255,8,00,20,03,ec,0b,02,ff,ff\n");

        process_input(&input[..], &mut out, &config, &mut monitor, &mut calculator, &mut metrics).unwrap();

        assert_eq!(metrics.input_lines, 3);
        assert_eq!(metrics.decode_errors, 1);
        assert_eq!(metrics.computed_cycles, 2);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }
}
