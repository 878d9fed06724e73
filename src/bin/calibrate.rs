//! Calibration helper: stream reflectance readings for tuning the
//! per-zone calibration constants.
//!
//! Park the sensor over each zone and note the stable smoothed value, then
//! copy the numbers into the `[calibration]` section of the config.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use varna_nav::filter::ReflectanceFilter;
use varna_nav::hardware::ZoneSensor;
use varna_nav::hardware::sim::{BoardLayout, SimulatedBoard};
use varna_nav::{VarnaConfig, VarnaError};

#[derive(Parser, Debug)]
#[command(name = "varna-cal", version, about = "Reflectance calibration helper")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Readings to take (0 = until interrupted)
    #[arg(short = 'n', long, default_value_t = 0)]
    count: u32,

    /// Period between readings (ms)
    #[arg(long, default_value_t = 200)]
    period_ms: u64,

    /// Park the simulated sensor at this strip position (mm)
    #[arg(long, default_value_t = 150.0)]
    position_mm: f32,
}

fn main() -> varna_nav::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(p) => VarnaConfig::load(p)?,
        None => VarnaConfig::default(),
    };

    // The helper observes the simulated board; a deployment swaps in its
    // real sensor behind the same trait.
    let board = SimulatedBoard::new(
        BoardLayout {
            order: config.board.order,
            zone_length_mm: 300.0,
            start_mm: cli.position_mm,
            obstacle_mm: None,
            reflectance: config
                .calibration
                .zones
                .iter()
                .map(|r| (r.zone, r.reflectance))
                .collect(),
        },
        0,
    );
    let mut sensor = board.sensor();

    println!("Starting color calibration...");

    let mut filter: Option<ReflectanceFilter> = None;
    let mut taken = 0u32;
    loop {
        let reading = sensor.read();
        let raw = reading
            .reflectance
            .ok_or_else(|| VarnaError::Hardware("no reflectance reading".to_string()))?;
        let smoothed = filter
            .get_or_insert_with(|| ReflectanceFilter::new(raw))
            .push(raw);

        println!(
            "REF = {:>3}  AVG = {:>5.1}  COLOR = {:?}",
            raw, smoothed, reading.color
        );

        taken += 1;
        if cli.count != 0 && taken >= cli.count {
            break;
        }
        std::thread::sleep(Duration::from_millis(cli.period_ms));
    }

    Ok(())
}
