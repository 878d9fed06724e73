//! Mock hardware for testing
//!
//! `ScriptedSensor` replays a prepared sequence of readings; the recording
//! drive and indicator expose everything the run asked of them.

use super::{DriveMotors, Glyph, Indicator, SensorReading, Side, Tone, ZoneSensor};
use crate::error::Result;
use crate::zone::DiscreteColor;
use std::sync::{Arc, Mutex};

/// Sensor that replays a scripted sequence of readings.
///
/// One reading is consumed per [`ZoneSensor::read`] call; after the script
/// runs out, the final reading repeats forever.
pub struct ScriptedSensor {
    script: Vec<SensorReading>,
    pos: usize,
    current: SensorReading,
}

impl ScriptedSensor {
    pub fn new(script: Vec<SensorReading>) -> Self {
        Self {
            script,
            pos: 0,
            current: SensorReading::default(),
        }
    }

    /// Number of scripted readings consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl ZoneSensor for ScriptedSensor {
    fn read_color(&mut self) -> Option<DiscreteColor> {
        self.current.color
    }

    fn read_reflection(&mut self) -> Option<i32> {
        self.current.reflectance
    }

    fn read_distance_mm(&mut self) -> Option<i32> {
        self.current.distance_mm
    }

    fn read(&mut self) -> SensorReading {
        if let Some(next) = self.script.get(self.pos) {
            self.current = *next;
        }
        self.pos = self.pos.saturating_add(1);
        self.current
    }
}

/// One drive call as the motors saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveCommand {
    RunContinuous {
        left: i32,
        right: i32,
    },
    RunForAngle {
        side: Side,
        speed: i32,
        degrees: i32,
        brake: bool,
        wait: bool,
    },
    StopAll,
}

/// Drive that records every command.
#[derive(Clone, Default)]
pub struct RecordingDrive {
    commands: Arc<Mutex<Vec<DriveCommand>>>,
}

impl RecordingDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything the run commanded, in order.
    pub fn commands(&self) -> Vec<DriveCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl DriveMotors for RecordingDrive {
    fn run_continuous(&mut self, left_speed: i32, right_speed: i32) -> Result<()> {
        self.commands.lock().unwrap().push(DriveCommand::RunContinuous {
            left: left_speed,
            right: right_speed,
        });
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
        self.commands.lock().unwrap().push(DriveCommand::RunForAngle {
            side,
            speed,
            degrees,
            brake,
            wait,
        });
        Ok(())
    }

    fn stop_all(&mut self) -> Result<()> {
        self.commands.lock().unwrap().push(DriveCommand::StopAll);
        Ok(())
    }
}

/// One indicator call as the cue surface saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorEvent {
    Volume(u8),
    Beep(Tone),
    Show(Glyph),
}

/// Indicator that records every cue.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    events: Arc<Mutex<Vec<IndicatorEvent>>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<IndicatorEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Indicator for RecordingIndicator {
    fn set_volume(&mut self, percent: u8) {
        self.events.lock().unwrap().push(IndicatorEvent::Volume(percent));
    }

    fn beep(&mut self, tone: Tone) {
        self.events.lock().unwrap().push(IndicatorEvent::Beep(tone));
    }

    fn show(&mut self, glyph: Glyph) {
        self.events.lock().unwrap().push(IndicatorEvent::Show(glyph));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::DiscreteColor;

    fn reading(color: Option<DiscreteColor>) -> SensorReading {
        SensorReading {
            color,
            reflectance: Some(10),
            distance_mm: Some(500),
        }
    }

    #[test]
    fn scripted_sensor_replays_then_holds_last() {
        let mut sensor = ScriptedSensor::new(vec![
            reading(Some(DiscreteColor::Green)),
            reading(Some(DiscreteColor::Red)),
        ]);

        assert_eq!(sensor.read().color, Some(DiscreteColor::Green));
        assert_eq!(sensor.read().color, Some(DiscreteColor::Red));
        // Script exhausted: the last reading sticks.
        assert_eq!(sensor.read().color, Some(DiscreteColor::Red));
        assert_eq!(sensor.read_reflection(), Some(10));
    }

    #[test]
    fn recording_drive_captures_commands_in_order() {
        let mut drive = RecordingDrive::new();
        drive.run_continuous(200, 200).unwrap();
        drive.stop_all().unwrap();

        assert_eq!(
            drive.commands(),
            vec![
                DriveCommand::RunContinuous { left: 200, right: 200 },
                DriveCommand::StopAll,
            ]
        );
    }
}
