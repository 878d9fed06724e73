//! Sampling loop and action execution.
//!
//! The run loop owns the hardware handles for the duration of one run: it
//! pulls a reading every sampling period, feeds the navigator, executes the
//! returned actions in order, and services the hazard effects between
//! ticks. The deliberate pauses (turn-around, final push) block to
//! completion; the robot must not sample mid-maneuver.

use crate::config::VarnaConfig;
use crate::effects::{EffectPhase, EffectsController};
use crate::error::Result;
use crate::hardware::{DriveMotors, Glyph, Indicator, Side, Tone, ZoneSensor};
use crate::navigator::{Action, Navigator, Phase};
use crate::scenario::Scenario;
use crate::status::{StatusSink, StatusToken};
use crate::zone::Zone;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Cooperative cancellation signal, checked at the top of every tick.
///
/// A bridge holds a clone and raises it to abort the active run before
/// starting a new one; the binary wires it to Ctrl-C.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The robot stopped on the target zone.
    Completed { zone: Zone },
    /// The cancel token was raised mid-run; motors are stopped.
    Cancelled,
}

/// One run of the robot over one scenario.
pub struct RunLoop<'a> {
    navigator: Navigator,
    sensor: &'a mut dyn ZoneSensor,
    motors: &'a mut dyn DriveMotors,
    indicator: &'a mut dyn Indicator,
    sink: &'a mut dyn StatusSink,
    effects: Option<EffectsController>,
    high_blip: Tone,
    low_blip: Tone,
    sample_period: Duration,
    settle: Duration,
    turn_speed: i32,
    turn_angle_deg: i32,
    turn_settle: Duration,
    final_angle_deg: i32,
    volume_percent: u8,
}

impl<'a> RunLoop<'a> {
    pub fn new(
        scenario: Scenario,
        config: &VarnaConfig,
        sensor: &'a mut dyn ZoneSensor,
        motors: &'a mut dyn DriveMotors,
        indicator: &'a mut dyn Indicator,
        sink: &'a mut dyn StatusSink,
    ) -> Result<Self> {
        let navigator = Navigator::new(scenario, config)?;
        let effects = navigator
            .hazard_mode()
            .then(|| EffectsController::new(Duration::from_millis(config.effects.phase_ms)));

        Ok(Self {
            navigator,
            sensor,
            motors,
            indicator,
            sink,
            effects,
            high_blip: Tone::new(config.effects.high_beep_hz, config.effects.blip_ms),
            low_blip: Tone::new(config.effects.low_beep_hz, config.effects.blip_ms),
            sample_period: Duration::from_millis(config.navigation.sample_ms),
            settle: Duration::from_millis(config.navigation.settle_ms),
            turn_speed: config.drive.turn_speed,
            turn_angle_deg: config.drive.turn_angle_deg,
            turn_settle: Duration::from_millis(config.drive.turn_settle_ms),
            final_angle_deg: config.drive.final_drive_angle_deg,
            volume_percent: config.effects.volume_percent,
        })
    }

    /// Drive the run to completion or cancellation.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunOutcome> {
        let scenario = self.navigator.scenario();
        let target = self.navigator.target();

        self.sink.emit(StatusToken::Start { scenario });
        self.sink.emit(StatusToken::TargetColor(target));
        self.indicator.set_volume(self.volume_percent);
        if self.navigator.hazard_mode() {
            tracing::info!("hazard mode active, turbo speed engaged");
        }

        // Sensor stabilization before the first real reading.
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }

        let mut effects_armed = false;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("run cancelled, stopping motors");
                self.motors.stop_all()?;
                return Ok(RunOutcome::Cancelled);
            }

            self.service_effects();

            let reading = self.sensor.read();
            let outcome = self.navigator.step(&reading);
            self.execute(&outcome.actions)?;

            if outcome.phase == Phase::Done {
                tracing::info!("run complete on {}", target);
                return Ok(RunOutcome::Completed { zone: target });
            }

            // Effects start when driving begins, so the cue cycle is
            // aligned with motion.
            if !effects_armed && outcome.phase == Phase::Warmup {
                if let Some(fx) = &mut self.effects {
                    fx.reset();
                }
                effects_armed = true;
            }

            if !self.sample_period.is_zero() {
                std::thread::sleep(self.sample_period);
            }
        }
    }

    /// Hazard cue edge, if any. Runs between ticks and never blocks the
    /// sampling cadence beyond one short blip.
    fn service_effects(&mut self) {
        if !matches!(self.navigator.phase(), Phase::Warmup | Phase::Searching) {
            return;
        }
        if let Some(fx) = &mut self.effects
            && let Some(phase) = fx.update()
        {
            match phase {
                EffectPhase::High => {
                    self.indicator.show(Glyph::Square);
                    self.indicator.beep(self.high_blip);
                }
                EffectPhase::Low => {
                    self.indicator.show(Glyph::Cross);
                    self.indicator.beep(self.low_blip);
                }
            }
        }
    }

    fn execute(&mut self, actions: &[Action]) -> Result<()> {
        for action in actions {
            match action {
                Action::Drive { speed } => {
                    self.motors.run_continuous(*speed, *speed)?;
                }
                Action::StopAll => {
                    self.motors.stop_all()?;
                }
                Action::TurnAround => {
                    // Asymmetric run: left forward, right reverse, braked.
                    self.motors.run_for_angle(
                        Side::Left,
                        self.turn_speed,
                        self.turn_angle_deg,
                        true,
                        false,
                    )?;
                    self.motors.run_for_angle(
                        Side::Right,
                        -self.turn_speed,
                        self.turn_angle_deg,
                        true,
                        true,
                    )?;
                    if !self.turn_settle.is_zero() {
                        std::thread::sleep(self.turn_settle);
                    }
                }
                Action::FinalPush { speed } => {
                    self.motors.run_for_angle(
                        Side::Left,
                        *speed,
                        self.final_angle_deg,
                        true,
                        false,
                    )?;
                    self.motors.run_for_angle(
                        Side::Right,
                        *speed,
                        self.final_angle_deg,
                        true,
                        true,
                    )?;
                }
                Action::Emit(token) => {
                    self.sink.emit(*token);
                }
                Action::Beep(tone) => {
                    self.indicator.beep(*tone);
                }
                Action::Show(glyph) => {
                    self.indicator.show(*glyph);
                }
            }
        }
        Ok(())
    }
}
