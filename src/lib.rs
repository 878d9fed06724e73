//! VarnaNav - Zone navigation controller for a two-wheeled sorting robot
//!
//! Drives a small differential-drive robot across a board of ordered
//! colored zones and stops it on a caller-selected target zone, fusing two
//! independent color-sensing methods, recovering from overshoot and
//! obstacles, and reporting progress as line-oriented status tokens.
//!
//! ## Architecture
//!
//! A single fixed-period sampling loop drives everything:
//!
//! - [`navigator::Navigator`] is the pure state machine: one `step` per
//!   tick, raw reading in, phase + actions out. No hardware, no clock.
//! - [`runner::RunLoop`] executes the actions against the [`hardware`]
//!   traits and owns the tick cadence, blocking maneuvers, and hazard cues.
//! - [`status::StatusSink`] carries the lifecycle tokens the external
//!   bridge parses; it is a wire contract, distinct from diagnostics.
//!
//! Real deployments implement the hardware traits over their transport;
//! tests use the scripted mocks, the demo binary a simulated board.

pub mod classifier;
pub mod config;
pub mod effects;
pub mod error;
pub mod filter;
pub mod guard;
pub mod hardware;
pub mod navigator;
pub mod runner;
pub mod scenario;
pub mod status;
pub mod zone;

pub use config::VarnaConfig;
pub use error::{Result, VarnaError};
pub use navigator::{Action, Navigator, Phase, StepOutcome};
pub use runner::{CancelToken, RunLoop, RunOutcome};
pub use scenario::{Scenario, UnknownCommandPolicy};
pub use status::{StatusSink, StatusToken};
pub use zone::{DiscreteColor, Zone, ZoneOrder};
