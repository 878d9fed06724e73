//! Hardware abstraction for the sorting robot.
//!
//! The navigation core consumes these traits only; real deployments bind
//! them to BLE or serial transports, tests bind them to the mocks in
//! [`mock`], and the demo binary to the closed-loop simulation in [`sim`].

pub mod mock;
pub mod sim;

use crate::error::Result;
use crate::zone::DiscreteColor;

/// Which drive side a positional command addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Display glyphs the indicator can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    /// "GO" at drive start
    Go,
    /// "OK" on completion
    Ok,
    /// Hazard high-phase icon
    Square,
    /// Hazard low-phase icon
    Cross,
}

/// A beep request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tone {
    pub freq_hz: u32,
    pub duration_ms: u32,
}

impl Tone {
    pub fn new(freq_hz: u32, duration_ms: u32) -> Self {
        Self {
            freq_hz,
            duration_ms,
        }
    }
}

/// One raw reading of all sensors, pulled fresh each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorReading {
    pub color: Option<DiscreteColor>,
    pub reflectance: Option<i32>,
    pub distance_mm: Option<i32>,
}

/// Downward color sensor plus forward distance sensor.
pub trait ZoneSensor: Send {
    /// Discrete color detected by the sensor firmware, if confident.
    fn read_color(&mut self) -> Option<DiscreteColor>;

    /// Raw reflectance intensity, if available.
    fn read_reflection(&mut self) -> Option<i32>;

    /// Forward distance in millimeters, if available.
    fn read_distance_mm(&mut self) -> Option<i32>;

    /// Pull one complete reading. Reads color, then reflectance, then
    /// distance; implementations that snapshot per tick may override.
    fn read(&mut self) -> SensorReading {
        SensorReading {
            color: self.read_color(),
            reflectance: self.read_reflection(),
            distance_mm: self.read_distance_mm(),
        }
    }
}

/// Differential drive with continuous and positional commands.
pub trait DriveMotors: Send {
    /// Run both sides continuously at the given speeds (deg/s).
    fn run_continuous(&mut self, left_speed: i32, right_speed: i32) -> Result<()>;

    /// Run one side for a fixed angle.
    ///
    /// # Arguments
    /// * `side` - Which motor to run
    /// * `speed` - Signed speed in deg/s (negative reverses)
    /// * `degrees` - Rotation amount in degrees
    /// * `brake` - Brake at completion instead of coasting
    /// * `wait` - Block until the rotation completes
    fn run_for_angle(
        &mut self,
        side: Side,
        speed: i32,
        degrees: i32,
        brake: bool,
        wait: bool,
    ) -> Result<()>;

    /// Stop all motors immediately.
    fn stop_all(&mut self) -> Result<()>;
}

/// Audio/visual cue surface.
///
/// Cues never affect navigation correctness, so the methods default to
/// no-ops for robots without a speaker or display.
pub trait Indicator: Send {
    fn set_volume(&mut self, _percent: u8) {}
    fn beep(&mut self, _tone: Tone) {}
    fn show(&mut self, _glyph: Glyph) {}
}

/// Indicator for robots without any cue hardware.
pub struct NullIndicator;

impl Indicator for NullIndicator {}

/// Indicator that reports cues through the tracing diagnostics channel.
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn set_volume(&mut self, percent: u8) {
        tracing::debug!("volume {}%", percent);
    }

    fn beep(&mut self, tone: Tone) {
        tracing::info!("beep {}Hz for {}ms", tone.freq_hz, tone.duration_ms);
    }

    fn show(&mut self, glyph: Glyph) {
        tracing::info!("display {:?}", glyph);
    }
}
