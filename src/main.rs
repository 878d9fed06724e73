//! VarnaNav binary: run one sorting scenario on the simulated board.
//!
//! Real robots bind the hardware traits to their transport; this entry
//! point exists to exercise the full navigation loop without hardware and
//! to serve as the wiring reference for deployments.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use varna_nav::hardware::LogIndicator;
use varna_nav::hardware::sim::{BoardLayout, SimulatedBoard};
use varna_nav::status::WriterSink;
use varna_nav::{CancelToken, RunLoop, RunOutcome, Scenario, VarnaConfig};

#[derive(Parser, Debug)]
#[command(name = "varna-nav", version, about = "Zone navigation controller")]
struct Cli {
    /// Command string selecting the scenario (e.g. RECYCLING_OK, LANDFILL,
    /// URGENT_INSPECTION)
    command: String,

    /// Path to a TOML configuration file (default: varna.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Place an obstacle on the simulated board (mm from the strip head)
    #[arg(long)]
    obstacle_mm: Option<f32>,

    /// Simulated zone length (mm)
    #[arg(long, default_value_t = 300.0)]
    zone_length_mm: f32,

    /// Simulation noise seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("varna_nav=info".parse().expect("static directive")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> varna_nav::Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    let Some(scenario) =
        Scenario::resolve(&cli.command, config.board.unknown_command_policy)
    else {
        // Reject policy: the run is simply not started.
        warn!("command {:?} not recognized, run not started", cli.command);
        return Ok(ExitCode::FAILURE);
    };

    info!("VarnaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "scenario {} -> target {}",
        scenario,
        scenario.target_zone(&config.board.order)
    );

    let board = SimulatedBoard::new(
        BoardLayout {
            order: config.board.order,
            zone_length_mm: cli.zone_length_mm,
            start_mm: cli.zone_length_mm / 2.0,
            obstacle_mm: cli.obstacle_mm,
            reflectance: config
                .calibration
                .zones
                .iter()
                .map(|r| (r.zone, r.reflectance))
                .collect(),
        },
        cli.seed,
    );

    let cancel = CancelToken::new();
    let ctrlc_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, cancelling run");
        ctrlc_cancel.cancel();
    })
    .map_err(|e| varna_nav::VarnaError::Hardware(format!("signal handler: {e}")))?;

    let mut sensor = board.sensor();
    let mut motors = board.drive();
    let mut indicator = LogIndicator;
    let mut sink = WriterSink::new(std::io::stdout());

    let outcome = RunLoop::new(
        scenario,
        &config,
        &mut sensor,
        &mut motors,
        &mut indicator,
        &mut sink,
    )?
    .run(&cancel)?;

    match outcome {
        RunOutcome::Completed { zone } => {
            info!(
                "stopped on {} at {:.0}mm along the strip",
                zone,
                board.position_mm()
            );
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Cancelled => {
            info!("run cancelled");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> varna_nav::Result<VarnaConfig> {
    match path {
        Some(p) => {
            info!("Loading configuration from {:?}", p);
            VarnaConfig::load(p)
        }
        None => {
            let default_path = std::path::Path::new("varna.toml");
            if default_path.exists() {
                info!("Loading configuration from varna.toml");
                VarnaConfig::load(default_path)
            } else {
                info!("Using default configuration");
                Ok(VarnaConfig::default())
            }
        }
    }
}
