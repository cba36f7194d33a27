mod capture;
mod command;
mod engine;
mod main_player;
mod metrics;
mod sink;

use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;

use dps_common::config::EngineConfig;
use dps_engine::{Catalog, CommandSource, MetricsSink, SnapshotSink};

use crate::capture::TcpCaptureSource;
use crate::command::StdinCommandSource;
use crate::engine::Engine;
use crate::main_player::NullMainPlayerDetector;
use crate::sink::{StdoutMetricsSink, StdoutSnapshotSink};

/// Real-time DPS telemetry engine: passively captures TCP flows, decodes
/// combat events, and emits periodic combat statistics.
#[derive(Parser, Debug)]
#[command(name = "dps-runner", version, about)]
struct Args {
    /// Path to the TOML configuration file. Falls back to defaults if absent.
    #[arg(long)]
    config: Option<String>,

    /// Address the capture source listens on.
    #[arg(long, default_value = "127.0.0.1:28008")]
    listen: String,

    /// Print the default configuration as TOML and exit, the same
    /// bootstrapping convenience the teacher ships as a `gamerunner_config`
    /// companion binary.
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_config {
        match EngineConfig::default().to_toml_string() {
            Ok(toml) => {
                println!("{toml}");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                eprintln!("failed to generate default configuration: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load configuration from {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let log = dps_common::logging::init(&config.logging);

    let catalog = match &config.skill_catalog_path {
        Some(path) => match Catalog::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                slog::warn!(log, "failed to load skill catalog, continuing without it"; "path" => path, "error" => %err);
                Catalog::empty()
            }
        },
        None => Catalog::empty(),
    };

    let capture_log = dps_common::logging::component(&log, "capture");
    let packet_source = match TcpCaptureSource::bind(&args.listen, capture_log) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to bind capture listener on {}: {err}", args.listen);
            return ExitCode::FAILURE;
        }
    };

    let snapshot_sink: Arc<Mutex<Box<dyn SnapshotSink>>> = Arc::new(Mutex::new(Box::new(
        StdoutSnapshotSink::new(dps_common::logging::component(&log, "aggregator")),
    )));
    let metrics_sink: Box<dyn MetricsSink> = Box::new(StdoutMetricsSink::new(
        dps_common::logging::component(&log, "metrics"),
    ));
    let command_source: Box<dyn CommandSource> = Box::new(StdinCommandSource::spawn());

    slog::info!(log, "dps-runner starting"; "listen" => &args.listen);

    let mut engine = Engine::new(config, catalog, log.clone());
    engine.run(
        Box::new(packet_source),
        snapshot_sink,
        metrics_sink,
        Box::new(NullMainPlayerDetector),
    );

    engine.drive_commands(command_source);
    engine.join();

    slog::info!(log, "dps-runner stopped");
    ExitCode::SUCCESS
}
