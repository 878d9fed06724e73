//! Status token grammar and output sinks.
//!
//! The external bridge detects run progress by parsing newline-delimited
//! `STATUS:` lines; the token shapes here are a wire contract, not logging.

use crate::scenario::Scenario;
use crate::zone::Zone;
use std::fmt;
use std::io::Write;

/// Discrete lifecycle token emitted at every navigation transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusToken {
    /// Run accepted: `STATUS:START scenario=<NAME>`
    Start { scenario: Scenario },
    /// Target resolved: `STATUS:TARGET_COLOR=<ZONE>`
    TargetColor(Zone),
    /// 180 degree turn-around begins: `STATUS:TURN_AROUND`
    TurnAround,
    /// Obstacle forced a stop: `STATUS:ABORT_OBSTACLE distance_mm=<int>`
    AbortObstacle { distance_mm: i32 },
    /// Overshoot detected: `STATUS:WRONG_WAY_FOR_<ZONE>`
    WrongWayFor(Zone),
    /// Target zone confirmed: `STATUS:<ZONE>_REACHED`
    Reached(Zone),
    /// Scenario outcome for upstream: `STATUS:ZONE=<SCENARIO_NAME>`
    ZoneOutcome(Scenario),
    /// Run complete: `STATUS:DONE`
    Done,
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusToken::Start { scenario } => write!(f, "STATUS:START scenario={scenario}"),
            StatusToken::TargetColor(zone) => write!(f, "STATUS:TARGET_COLOR={zone}"),
            StatusToken::TurnAround => write!(f, "STATUS:TURN_AROUND"),
            StatusToken::AbortObstacle { distance_mm } => {
                write!(f, "STATUS:ABORT_OBSTACLE distance_mm={distance_mm}")
            }
            StatusToken::WrongWayFor(zone) => write!(f, "STATUS:WRONG_WAY_FOR_{zone}"),
            StatusToken::Reached(zone) => write!(f, "STATUS:{zone}_REACHED"),
            StatusToken::ZoneOutcome(scenario) => write!(f, "STATUS:ZONE={scenario}"),
            StatusToken::Done => write!(f, "STATUS:DONE"),
        }
    }
}

/// Side-effecting status output channel.
///
/// Emission must never abort the sampling loop: implementations log delivery
/// failures and carry on.
pub trait StatusSink: Send {
    fn emit(&mut self, token: StatusToken);
}

/// Line-oriented sink over any writer (stdout in the binary).
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> StatusSink for WriterSink<W> {
    fn emit(&mut self, token: StatusToken) {
        if let Err(e) = writeln!(self.writer, "{token}").and_then(|_| self.writer.flush()) {
            tracing::warn!("status write failed: {}", e);
        }
    }
}

/// Channel-backed sink for in-process consumers (bridges, tests).
#[derive(Clone)]
pub struct ChannelSink {
    tx: crossbeam_channel::Sender<StatusToken>,
}

impl ChannelSink {
    /// Create a sink plus the receiving end for the consumer.
    pub fn unbounded() -> (Self, crossbeam_channel::Receiver<StatusToken>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn emit(&mut self, token: StatusToken) {
        if self.tx.send(token).is_err() {
            tracing::warn!("status consumer disconnected, dropping {}", token);
        }
    }
}
