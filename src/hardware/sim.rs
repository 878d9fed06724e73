//! Closed-loop board simulation for hardware-free runs.
//!
//! Drive commands integrate a one-dimensional position along a strip of
//! colored zones; sensor readings derive from the zone currently under the
//! robot. Good enough to exercise the full navigation loop end-to-end, not
//! a physics model.

use super::{DriveMotors, SensorReading, Side, ZoneSensor};
use crate::error::Result;
use crate::zone::{DiscreteColor, Zone, ZoneOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Wheel travel per motor degree (56 mm wheel, ~176 mm circumference).
const MM_PER_DEGREE: f32 = 0.49;

/// Reflectance reported off the ends of the strip, where no zone matches.
const BACKGROUND_REFLECTANCE: f32 = 22.0;

/// Static description of the simulated strip.
#[derive(Clone, Debug)]
pub struct BoardLayout {
    /// Zones in board order, laid out head to tail from position 0.
    pub order: ZoneOrder,
    /// Length of each zone along the strip (mm).
    pub zone_length_mm: f32,
    /// Robot start position (mm from the head of the first zone).
    pub start_mm: f32,
    /// Optional obstacle position; distance readings decrease toward it.
    pub obstacle_mm: Option<f32>,
    /// Reference reflectance per zone (the sensor reports this plus noise).
    pub reflectance: Vec<(Zone, f32)>,
}

impl BoardLayout {
    fn zone_at(&self, position_mm: f32) -> Option<Zone> {
        if position_mm < 0.0 {
            return None;
        }
        let index = (position_mm / self.zone_length_mm) as usize;
        self.order.zones().get(index).copied()
    }

    fn reflectance_of(&self, zone: Zone) -> f32 {
        self.reflectance
            .iter()
            .find(|(z, _)| *z == zone)
            .map(|(_, r)| *r)
            .unwrap_or(BACKGROUND_REFLECTANCE)
    }

    /// Fraction [0, 1) of the way through the zone under `position_mm`.
    fn zone_fraction(&self, position_mm: f32) -> f32 {
        (position_mm.rem_euclid(self.zone_length_mm)) / self.zone_length_mm
    }
}

struct SimState {
    layout: BoardLayout,
    position_mm: f32,
    /// +1 driving up the strip, -1 after a turn-around.
    direction: f32,
    /// Current continuous speed (deg/s), zero when stopped.
    speed_deg_s: f32,
    last_update: Instant,
    /// First half of a pending two-sided positional maneuver.
    pending_half: Option<(Side, i32, i32)>,
    rng: StdRng,
}

impl SimState {
    /// Advance position from elapsed wall time at the current speed.
    fn integrate(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;
        self.position_mm += self.direction * self.speed_deg_s * MM_PER_DEGREE * dt;
    }

    /// Resolve a completed two-sided maneuver: equal signs translate the
    /// robot, opposite signs spin it in place.
    fn apply_maneuver(&mut self, speed_a: i32, speed_b: i32, degrees: i32) {
        if (speed_a >= 0) == (speed_b >= 0) {
            let sign = if speed_a >= 0 { 1.0 } else { -1.0 };
            self.position_mm += self.direction * sign * degrees.abs() as f32 * MM_PER_DEGREE;
        } else {
            self.direction = -self.direction;
        }
    }
}

/// Shared simulation world; hand out [`SimSensor`] and [`SimDrive`] views.
#[derive(Clone)]
pub struct SimulatedBoard {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBoard {
    pub fn new(layout: BoardLayout, seed: u64) -> Self {
        let position = layout.start_mm;
        Self {
            state: Arc::new(Mutex::new(SimState {
                layout,
                position_mm: position,
                direction: 1.0,
                speed_deg_s: 0.0,
                last_update: Instant::now(),
                pending_half: None,
                rng: StdRng::seed_from_u64(seed),
            })),
        }
    }

    pub fn sensor(&self) -> SimSensor {
        SimSensor {
            state: Arc::clone(&self.state),
        }
    }

    pub fn drive(&self) -> SimDrive {
        SimDrive {
            state: Arc::clone(&self.state),
        }
    }

    /// Current position along the strip (mm), for demo reporting.
    pub fn position_mm(&self) -> f32 {
        self.state.lock().unwrap().position_mm
    }
}

/// Sensor view of the simulated board.
pub struct SimSensor {
    state: Arc<Mutex<SimState>>,
}

impl SimSensor {
    fn snapshot(&self) -> SensorReading {
        let mut state = self.state.lock().unwrap();
        state.integrate();

        let zone = state.layout.zone_at(state.position_mm);
        let reflectance = match zone {
            Some(z) => state.layout.reflectance_of(z),
            None => BACKGROUND_REFLECTANCE,
        };
        let noise: f32 = state.rng.random_range(-0.8..0.8);

        // The firmware only commits to a discrete color near a zone center.
        let fraction = state.layout.zone_fraction(state.position_mm);
        let color = zone
            .filter(|_| (0.2..0.8).contains(&fraction))
            .map(|z| match z {
                Zone::Green => DiscreteColor::Green,
                Zone::Yellow => DiscreteColor::Yellow,
                Zone::Blue => DiscreteColor::Blue,
                Zone::Red => DiscreteColor::Red,
            });

        let distance_mm = state.layout.obstacle_mm.map(|obstacle| {
            if state.direction > 0.0 {
                (obstacle - state.position_mm).max(0.0) as i32
            } else {
                i32::MAX / 2
            }
        });

        SensorReading {
            color,
            reflectance: Some((reflectance + noise).round() as i32),
            distance_mm,
        }
    }
}

impl ZoneSensor for SimSensor {
    fn read_color(&mut self) -> Option<DiscreteColor> {
        self.snapshot().color
    }

    fn read_reflection(&mut self) -> Option<i32> {
        self.snapshot().reflectance
    }

    fn read_distance_mm(&mut self) -> Option<i32> {
        self.snapshot().distance_mm
    }

    fn read(&mut self) -> SensorReading {
        self.snapshot()
    }
}

/// Drive view of the simulated board.
pub struct SimDrive {
    state: Arc<Mutex<SimState>>,
}

impl DriveMotors for SimDrive {
    fn run_continuous(&mut self, left_speed: i32, right_speed: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.integrate();
        // Straight-line strip: average the two sides.
        state.speed_deg_s = (left_speed + right_speed) as f32 / 2.0;
        Ok(())
    }

    fn run_for_angle(
        &mut self,
        side: Side,
        speed: i32,
        degrees: i32,
        brake: bool,
        wait: bool,
    ) -> Result<()> {
        let _ = brake;
        let sleep_for = {
            let mut state = self.state.lock().unwrap();
            state.integrate();
            state.speed_deg_s = 0.0;

            match state.pending_half.take() {
                Some((other_side, other_speed, _)) if other_side != side => {
                    state.apply_maneuver(other_speed, speed, degrees);
                }
                _ => {
                    state.pending_half = Some((side, speed, degrees));
                }
            }

            if wait && speed != 0 {
                Some(std::time::Duration::from_secs_f32(
                    degrees.abs() as f32 / speed.abs() as f32,
                ))
            } else {
                None
            }
        };

        if let Some(duration) = sleep_for {
            std::thread::sleep(duration.min(std::time::Duration::from_secs(3)));
        }
        Ok(())
    }

    fn stop_all(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.integrate();
        state.speed_deg_s = 0.0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BoardLayout {
        BoardLayout {
            order: ZoneOrder::default(),
            zone_length_mm: 300.0,
            start_mm: 50.0,
            obstacle_mm: None,
            reflectance: vec![(Zone::Green, 13.0), (Zone::Yellow, 16.0), (Zone::Red, 6.0)],
        }
    }

    #[test]
    fn zones_are_laid_out_in_board_order() {
        let layout = layout();
        assert_eq!(layout.zone_at(50.0), Some(Zone::Green));
        assert_eq!(layout.zone_at(350.0), Some(Zone::Yellow));
        assert_eq!(layout.zone_at(650.0), Some(Zone::Red));
        assert_eq!(layout.zone_at(1000.0), None);
        assert_eq!(layout.zone_at(-10.0), None);
    }

    #[test]
    fn opposed_maneuver_flips_direction() {
        let board = SimulatedBoard::new(layout(), 7);
        let mut drive = board.drive();
        drive.run_for_angle(Side::Left, 300, 360, true, false).unwrap();
        drive.run_for_angle(Side::Right, -300, 360, true, false).unwrap();

        let state = board.state.lock().unwrap();
        assert_eq!(state.direction, -1.0);
    }

    #[test]
    fn matched_maneuver_translates() {
        let board = SimulatedBoard::new(layout(), 7);
        let mut drive = board.drive();
        let before = board.position_mm();
        drive.run_for_angle(Side::Left, 200, 250, true, false).unwrap();
        drive.run_for_angle(Side::Right, 200, 250, true, false).unwrap();

        let after = board.position_mm();
        assert!((after - before - 250.0 * MM_PER_DEGREE).abs() < 1e-3);
    }

    #[test]
    fn sensor_reads_zone_reflectance() {
        let board = SimulatedBoard::new(layout(), 7);
        let mut sensor = board.sensor();
        let reading = sensor.read();
        // Start is 50mm into GREEN (reference 13), noise within +/-0.8.
        let reflectance = reading.reflectance.unwrap();
        assert!((12..=14).contains(&reflectance));
    }
}
