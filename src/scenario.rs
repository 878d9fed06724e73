//! Scenario selection from external command strings.
//!
//! The bridge upstream delivers free-form command tokens; each maps onto one
//! of three run scenarios, which in turn select a target zone by its position
//! in the board order.

use crate::zone::{Zone, ZoneOrder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Run scenario, selected once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    RecyclingOk,
    Contaminated,
    Inspection,
}

impl Scenario {
    /// Map a raw command string to a scenario.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Unknown commands return `None`; see [`UnknownCommandPolicy`] for how
    /// callers should treat that.
    pub fn from_command(raw: &str) -> Option<Scenario> {
        let cmd = raw.trim().to_ascii_uppercase();
        match cmd.as_str() {
            "RECYCLING_OK" | "OK" | "NORMAL" => Some(Scenario::RecyclingOk),
            "CONTAMINATED" | "LANDFILL" | "ROUTE_TO_LANDFILL" => Some(Scenario::Contaminated),
            "INSPECTION" | "URGENT_INSPECTION" | "URGENT_FIELD_INSPECTION"
            | "FIELD_INSPECTION" => Some(Scenario::Inspection),
            _ => None,
        }
    }

    /// Resolve a command under the configured unknown-command policy.
    pub fn resolve(raw: &str, policy: UnknownCommandPolicy) -> Option<Scenario> {
        match Scenario::from_command(raw) {
            Some(s) => Some(s),
            None => match policy {
                UnknownCommandPolicy::Reject => None,
                UnknownCommandPolicy::Default => {
                    tracing::warn!("unknown command {:?}, falling back to default zone", raw);
                    Some(Scenario::RecyclingOk)
                }
            },
        }
    }

    /// The target zone for this scenario on the given board.
    pub fn target_zone(self, order: &ZoneOrder) -> Zone {
        match self {
            Scenario::RecyclingOk => order.first(),
            Scenario::Contaminated => order.last(),
            Scenario::Inspection => order.middle(),
        }
    }

    /// Whether this scenario runs the hazard/turbo profile.
    pub fn hazard_mode(self) -> bool {
        matches!(self, Scenario::Contaminated)
    }

    /// Canonical scenario name as used in status output.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::RecyclingOk => "RECYCLING_OK",
            Scenario::Contaminated => "CONTAMINATED",
            Scenario::Inspection => "INSPECTION",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with a command string no scenario recognizes.
///
/// The source deployments disagreed: the bridge dropped unknown commands,
/// the on-robot program silently fell back to the first zone. This makes the
/// choice an explicit configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCommandPolicy {
    /// Refuse to start the run.
    Reject,
    /// Fall back to the first-zone scenario.
    Default,
}

impl Default for UnknownCommandPolicy {
    fn default() -> Self {
        UnknownCommandPolicy::Reject
    }
}
