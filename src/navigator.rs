//! Navigation state machine.
//!
//! One `step` call per sampling tick: the navigator fuses the reading into a
//! classification, updates its run state, and returns the phase plus the
//! side-effect actions the run loop must execute. It never touches hardware
//! and no anomaly escapes as an error; everything maps to a transition.

use crate::classifier::ZoneClassifier;
use crate::config::VarnaConfig;
use crate::error::Result;
use crate::filter::ReflectanceFilter;
use crate::guard::ObstacleGuard;
use crate::hardware::{Glyph, SensorReading, Tone};
use crate::scenario::Scenario;
use crate::status::StatusToken;
use crate::zone::{DiscreteColor, Zone, ZoneOrder};
use std::collections::HashSet;

/// Drive phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for sensor stabilization; pre-check on the first sample.
    Init,
    /// Driving, classification ignored while leaving the start zone.
    Warmup,
    /// Driving and classifying toward the target.
    Searching,
    /// Obstacle forced a stop; turn-around pending.
    ObstacleRecovery,
    /// Overshoot detected; turn-around pending.
    WrongWayRecovery,
    /// Target confirmed; final push issued.
    Arrived,
    /// Terminal.
    Done,
}

/// One sample enriched with the smoothed reflectance, produced fresh every
/// tick and not retained.
#[derive(Clone, Copy, Debug)]
pub struct SensorSample {
    pub raw_reflectance: i32,
    pub smoothed_reflectance: f32,
    pub discrete_color: Option<DiscreteColor>,
    pub distance_mm: Option<i32>,
}

/// Side-effect request, executed in order by the run loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Both wheels continuous at `speed` deg/s.
    Drive { speed: i32 },
    StopAll,
    /// Blocking in-place 180 degree turn.
    TurnAround,
    /// Blocking final drive into the zone.
    FinalPush { speed: i32 },
    Emit(StatusToken),
    Beep(Tone),
    Show(Glyph),
}

/// Result of one tick.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub phase: Phase,
    pub actions: Vec<Action>,
    pub sample: SensorSample,
}

/// Mutable per-run state, owned exclusively by one navigator.
#[derive(Clone, Debug)]
pub struct RunState {
    pub phase: Phase,
    pub visited: HashSet<Zone>,
    pub consecutive_hits: u32,
    pub sample_counter: u32,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: Phase::Init,
            visited: HashSet::new(),
            consecutive_hits: 0,
            sample_counter: 0,
        }
    }
}

/// The navigation state machine for a single run.
pub struct Navigator {
    classifier: ZoneClassifier,
    guard: ObstacleGuard,
    filter: Option<ReflectanceFilter>,
    state: RunState,
    scenario: Scenario,
    target: Zone,
    order: ZoneOrder,
    speed: i32,
    hazard: bool,
    hits_needed: u32,
    warmup_samples: u32,
    alert_tone: Tone,
    confirm_tone: Tone,
}

impl Navigator {
    /// Build a navigator for one run of the given scenario.
    pub fn new(scenario: Scenario, config: &VarnaConfig) -> Result<Self> {
        let order = config.board.order;
        let classifier = ZoneClassifier::new(
            config.calibration_table()?,
            config.calibration.fallback_policy,
            order,
        );
        let hazard = scenario.hazard_mode();
        let speed = if hazard {
            config.drive.turbo_speed
        } else {
            config.drive.drive_speed
        };

        Ok(Self {
            classifier,
            guard: ObstacleGuard::new(config.navigation.stop_distance_mm),
            filter: None,
            state: RunState::new(),
            scenario,
            target: scenario.target_zone(&order),
            order,
            speed,
            hazard,
            hits_needed: config.navigation.consecutive_hits,
            warmup_samples: config.navigation.warmup_samples,
            alert_tone: Tone::new(config.effects.alert_beep_hz, config.effects.alert_ms),
            confirm_tone: Tone::new(config.effects.confirm_beep_hz, config.effects.confirm_ms),
        })
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn target(&self) -> Zone {
        self.target
    }

    /// Whether this run uses the hazard/turbo profile.
    pub fn hazard_mode(&self) -> bool {
        self.hazard
    }

    /// Process one sampling tick.
    pub fn step(&mut self, reading: &SensorReading) -> StepOutcome {
        let sample = self.ingest(reading);
        let actions = match self.state.phase {
            Phase::Init => self.step_init(&sample),
            Phase::Warmup | Phase::Searching => self.step_driving(&sample),
            Phase::ObstacleRecovery | Phase::WrongWayRecovery => self.step_recovery(),
            Phase::Arrived => self.step_arrived(),
            Phase::Done => Vec::new(),
        };
        StepOutcome {
            phase: self.state.phase,
            actions,
            sample,
        }
    }

    /// Fold a raw reading into the smoothing filter. The filter is created
    /// on the first reading so the window starts prefilled, not at zero.
    fn ingest(&mut self, reading: &SensorReading) -> SensorSample {
        let raw = reading.reflectance.unwrap_or(0);
        let filter = self.filter.get_or_insert_with(|| ReflectanceFilter::new(raw));
        let smoothed = filter.push(raw);
        SensorSample {
            raw_reflectance: raw,
            smoothed_reflectance: smoothed,
            discrete_color: reading.color,
            distance_mm: reading.distance_mm,
        }
    }

    /// Stationary pre-check: already sitting on the target means no drive
    /// at all, straight to the completion sequence.
    fn step_init(&mut self, sample: &SensorSample) -> Vec<Action> {
        let start_zone = self
            .classifier
            .classify(sample.discrete_color, sample.smoothed_reflectance);
        tracing::debug!(
            "pre-check: raw={} smoothed={:.1} zone={:?}",
            sample.raw_reflectance,
            sample.smoothed_reflectance,
            start_zone
        );

        if start_zone == Some(self.target) {
            tracing::info!("already on target {}, skipping drive", self.target);
            self.state.phase = Phase::Done;
            return vec![
                Action::Emit(StatusToken::Reached(self.target)),
                Action::Emit(StatusToken::ZoneOutcome(self.scenario)),
                Action::Show(Glyph::Ok),
                Action::Emit(StatusToken::Done),
                Action::Beep(self.confirm_tone),
            ];
        }

        self.state.phase = Phase::Warmup;
        let mut actions = Vec::new();
        if !self.hazard {
            actions.push(Action::Show(Glyph::Go));
        }
        actions.push(Action::Drive { speed: self.speed });
        actions
    }

    /// Warmup and Searching share a tick shape: obstacle check first, then
    /// either the warmup skip or full classification.
    fn step_driving(&mut self, sample: &SensorSample) -> Vec<Action> {
        self.state.sample_counter += 1;

        if self.guard.check(sample.distance_mm) {
            let distance_mm = sample.distance_mm.unwrap_or(0);
            tracing::info!("obstacle at {}mm, aborting pass", distance_mm);
            self.state.phase = Phase::ObstacleRecovery;
            return vec![
                Action::StopAll,
                Action::Emit(StatusToken::AbortObstacle { distance_mm }),
                Action::Beep(self.alert_tone),
            ];
        }

        if self.state.sample_counter < self.warmup_samples {
            self.state.consecutive_hits = 0;
            self.state.phase = Phase::Warmup;
            return Vec::new();
        }
        self.state.phase = Phase::Searching;

        let Some(zone) = self
            .classifier
            .classify(sample.discrete_color, sample.smoothed_reflectance)
        else {
            self.state.consecutive_hits = 0;
            return Vec::new();
        };

        self.state.visited.insert(zone);
        if zone == self.target {
            self.state.consecutive_hits += 1;
        } else {
            self.state.consecutive_hits = 0;
        }
        tracing::trace!(
            "zone={} target={} hits={}",
            zone,
            self.target,
            self.state.consecutive_hits
        );

        if self.state.consecutive_hits >= self.hits_needed {
            tracing::info!("sensor confirmed {}, seating robot in zone", zone);
            self.state.phase = Phase::Arrived;
            return vec![
                Action::FinalPush { speed: self.speed },
                Action::StopAll,
                Action::Emit(StatusToken::Reached(zone)),
                Action::Emit(StatusToken::ZoneOutcome(self.scenario)),
            ];
        }

        if self.wrong_way(zone) {
            tracing::info!("overshot past {}, turning back", self.target);
            self.state.phase = Phase::WrongWayRecovery;
            return vec![
                Action::StopAll,
                Action::Emit(StatusToken::WrongWayFor(self.target)),
            ];
        }

        Vec::new()
    }

    /// Crossing past the far edge without ever registering the target means
    /// the robot overshot and must turn back.
    fn wrong_way(&self, current: Zone) -> bool {
        let visited = |z: Zone| self.state.visited.contains(&z);
        let (first, middle, last) = (self.order.first(), self.order.middle(), self.order.last());

        if self.target == first {
            current == last && visited(middle) && !visited(first)
        } else if self.target == last {
            current == first && visited(middle) && !visited(last)
        } else {
            visited(first) && visited(last) && self.state.consecutive_hits == 0
        }
    }

    /// Both recovery flavors share the procedure: turn around, wipe all
    /// progress, re-enter a fresh warmup window.
    fn step_recovery(&mut self) -> Vec<Action> {
        self.state.visited.clear();
        self.state.consecutive_hits = 0;
        self.state.sample_counter = 0;
        self.state.phase = Phase::Warmup;
        vec![
            Action::Emit(StatusToken::TurnAround),
            Action::TurnAround,
            Action::Drive { speed: self.speed },
        ]
    }

    fn step_arrived(&mut self) -> Vec<Action> {
        self.state.phase = Phase::Done;
        vec![
            Action::Show(Glyph::Ok),
            Action::Emit(StatusToken::Done),
            Action::Beep(self.confirm_tone),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VarnaConfig;

    fn navigator(scenario: Scenario) -> Navigator {
        let mut config = VarnaConfig::default();
        config.navigation.warmup_samples = 3;
        config.navigation.consecutive_hits = 2;
        Navigator::new(scenario, &config).unwrap()
    }

    fn color_reading(color: DiscreteColor) -> SensorReading {
        SensorReading {
            color: Some(color),
            reflectance: Some(10),
            distance_mm: Some(800),
        }
    }

    fn blank_reading() -> SensorReading {
        SensorReading {
            color: None,
            // 9.5 sits in the tolerance gap: classifies as nothing.
            reflectance: Some(9),
            distance_mm: Some(800),
        }
    }

    /// Drive a fresh navigator through init and warmup so the next tick
    /// classifies.
    fn past_warmup(nav: &mut Navigator) {
        let start = nav.step(&blank_reading());
        assert_eq!(start.phase, Phase::Warmup);
        while nav.state().sample_counter + 1 < nav.warmup_samples {
            assert_eq!(nav.step(&blank_reading()).phase, Phase::Warmup);
        }
    }

    #[test]
    fn precheck_on_target_issues_no_drive() {
        let mut nav = navigator(Scenario::Contaminated);
        let outcome = nav.step(&color_reading(DiscreteColor::Red));

        assert_eq!(outcome.phase, Phase::Done);
        assert!(
            !outcome
                .actions
                .iter()
                .any(|a| matches!(a, Action::Drive { .. } | Action::FinalPush { .. })),
            "pre-check arrival must not move the robot"
        );
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::Reached(Zone::Red))));
        assert!(outcome.actions.contains(&Action::Emit(StatusToken::Done)));
    }

    #[test]
    fn precheck_off_target_starts_driving() {
        let mut nav = navigator(Scenario::Contaminated);
        let outcome = nav.step(&color_reading(DiscreteColor::Green));

        assert_eq!(outcome.phase, Phase::Warmup);
        assert!(outcome.actions.contains(&Action::Drive { speed: 500 }));
    }

    #[test]
    fn normal_scenario_drives_at_normal_speed() {
        let mut nav = navigator(Scenario::RecyclingOk);
        let outcome = nav.step(&blank_reading());
        assert!(outcome.actions.contains(&Action::Drive { speed: 200 }));
    }

    #[test]
    fn warmup_ignores_classification() {
        let mut nav = navigator(Scenario::Contaminated);
        nav.step(&blank_reading());

        // The target itself shows up during warmup: hits must stay zero.
        let outcome = nav.step(&color_reading(DiscreteColor::Red));
        assert_eq!(outcome.phase, Phase::Warmup);
        assert_eq!(nav.state().consecutive_hits, 0);
        assert!(nav.state().visited.is_empty());
    }

    #[test]
    fn consecutive_hits_confirm_arrival() {
        let mut nav = navigator(Scenario::Contaminated);
        past_warmup(&mut nav);

        assert_eq!(nav.step(&color_reading(DiscreteColor::Red)).phase, Phase::Searching);
        assert_eq!(nav.state().consecutive_hits, 1);

        let outcome = nav.step(&color_reading(DiscreteColor::Red));
        assert_eq!(outcome.phase, Phase::Arrived);
        assert!(outcome.actions.contains(&Action::FinalPush { speed: 500 }));
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::Reached(Zone::Red))));
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::ZoneOutcome(Scenario::Contaminated))));

        // The tick after arrival completes the run.
        let done = nav.step(&blank_reading());
        assert_eq!(done.phase, Phase::Done);
        assert!(done.actions.contains(&Action::Emit(StatusToken::Done)));
    }

    #[test]
    fn any_gap_resets_the_hit_counter() {
        let mut nav = navigator(Scenario::Contaminated);
        past_warmup(&mut nav);

        nav.step(&color_reading(DiscreteColor::Red));
        assert_eq!(nav.state().consecutive_hits, 1);

        // Unclassifiable sample: counter drops straight to zero.
        nav.step(&blank_reading());
        assert_eq!(nav.state().consecutive_hits, 0);

        // A non-target zone resets it too.
        nav.step(&color_reading(DiscreteColor::Red));
        nav.step(&color_reading(DiscreteColor::Yellow));
        assert_eq!(nav.state().consecutive_hits, 0);
    }

    #[test]
    fn obstacle_interrupts_and_recovers() {
        let mut nav = navigator(Scenario::Contaminated);
        past_warmup(&mut nav);
        nav.step(&color_reading(DiscreteColor::Yellow));
        assert!(!nav.state().visited.is_empty());

        let blocked = SensorReading {
            color: None,
            reflectance: Some(9),
            distance_mm: Some(120),
        };
        let outcome = nav.step(&blocked);
        assert_eq!(outcome.phase, Phase::ObstacleRecovery);
        assert_eq!(outcome.actions[0], Action::StopAll);
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::AbortObstacle { distance_mm: 120 })));

        // Next tick executes the turn and wipes all progress.
        let recovery = nav.step(&blank_reading());
        assert_eq!(recovery.phase, Phase::Warmup);
        assert_eq!(
            recovery.actions,
            vec![
                Action::Emit(StatusToken::TurnAround),
                Action::TurnAround,
                Action::Drive { speed: 500 },
            ]
        );
        assert!(nav.state().visited.is_empty());
        assert_eq!(nav.state().consecutive_hits, 0);
        assert_eq!(nav.state().sample_counter, 0);
    }

    #[test]
    fn obstacle_fires_during_warmup() {
        let mut nav = navigator(Scenario::RecyclingOk);
        nav.step(&blank_reading());

        let blocked = SensorReading {
            color: None,
            reflectance: Some(9),
            distance_mm: Some(50),
        };
        assert_eq!(nav.step(&blocked).phase, Phase::ObstacleRecovery);
    }

    #[test]
    fn wrong_way_for_last_zone_target() {
        // Target RED (last). Seeing GREEN after YELLOW without ever seeing
        // RED means the robot overshot.
        let mut nav = navigator(Scenario::Contaminated);
        past_warmup(&mut nav);

        nav.step(&color_reading(DiscreteColor::Yellow));
        let outcome = nav.step(&color_reading(DiscreteColor::Green));
        assert_eq!(outcome.phase, Phase::WrongWayRecovery);
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::WrongWayFor(Zone::Red))));
    }

    #[test]
    fn wrong_way_for_first_zone_target() {
        let mut nav = navigator(Scenario::RecyclingOk);
        past_warmup(&mut nav);

        nav.step(&color_reading(DiscreteColor::Yellow));
        let outcome = nav.step(&color_reading(DiscreteColor::Red));
        assert_eq!(outcome.phase, Phase::WrongWayRecovery);
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::WrongWayFor(Zone::Green))));
    }

    #[test]
    fn wrong_way_for_middle_target_needs_both_edges() {
        let mut nav = navigator(Scenario::Inspection);
        past_warmup(&mut nav);

        nav.step(&color_reading(DiscreteColor::Green));
        assert_eq!(nav.phase(), Phase::Searching);

        // Both edges seen, zero hits on YELLOW: overshot the middle.
        let outcome = nav.step(&color_reading(DiscreteColor::Red));
        assert_eq!(outcome.phase, Phase::WrongWayRecovery);
        assert!(outcome
            .actions
            .contains(&Action::Emit(StatusToken::WrongWayFor(Zone::Yellow))));
    }

    #[test]
    fn crossing_the_middle_alone_is_not_wrong_way() {
        let mut nav = navigator(Scenario::Contaminated);
        past_warmup(&mut nav);

        // YELLOW on the way to RED is expected traversal.
        let outcome = nav.step(&color_reading(DiscreteColor::Yellow));
        assert_eq!(outcome.phase, Phase::Searching);
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn recovery_reopens_the_warmup_window() {
        let mut nav = navigator(Scenario::Contaminated);
        past_warmup(&mut nav);

        nav.step(&color_reading(DiscreteColor::Yellow));
        nav.step(&color_reading(DiscreteColor::Green)); // wrong way
        nav.step(&blank_reading()); // recovery tick

        // Fresh warmup: the target is ignored again.
        let outcome = nav.step(&color_reading(DiscreteColor::Red));
        assert_eq!(outcome.phase, Phase::Warmup);
        assert_eq!(nav.state().consecutive_hits, 0);
    }
}
