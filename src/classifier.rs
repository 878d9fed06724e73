//! Two-stage fused zone classification.
//!
//! Stage one trusts the color sensor firmware: a discrete color that names a
//! board zone wins immediately. Stage two falls back to smoothed reflectance
//! compared against per-zone calibration constants, under one of two
//! deployment-selectable policies.

use crate::error::{Result, VarnaError};
use crate::zone::{DiscreteColor, Zone, ZoneOrder};
use serde::{Deserialize, Serialize};

/// Reflectance fallback policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Match iff the reading lies within the tolerance window of exactly one
    /// calibration value. Two simultaneous matches are ambiguous: no match.
    ToleranceWindow,
    /// Pick the calibration value with the minimum absolute distance.
    /// Ties resolve to the first-declared zone in table order.
    NearestNeighbor,
}

/// Per-zone reference reflectance values plus the shared validity window.
///
/// Supplied as configuration and never mutated at runtime. Entry order is
/// the declaration order from the config file and fixes the nearest-neighbor
/// tie-break.
#[derive(Clone, Debug)]
pub struct CalibrationTable {
    entries: Vec<(Zone, f32)>,
    tolerance: f32,
    valid_min: f32,
    valid_max: f32,
}

impl CalibrationTable {
    /// Build a table, checking it covers every zone on the board.
    pub fn new(
        entries: Vec<(Zone, f32)>,
        tolerance: f32,
        valid_min: f32,
        valid_max: f32,
        order: &ZoneOrder,
    ) -> Result<Self> {
        for zone in order.zones() {
            if !entries.iter().any(|(z, _)| *z == zone) {
                return Err(VarnaError::Config(format!(
                    "calibration table has no reference value for zone {zone}"
                )));
            }
        }
        if tolerance < 0.0 {
            return Err(VarnaError::Config(format!(
                "zone tolerance must be non-negative, got {tolerance}"
            )));
        }
        if valid_min > valid_max {
            return Err(VarnaError::Config(format!(
                "valid reflectance range is empty: [{valid_min}, {valid_max}]"
            )));
        }
        Ok(Self {
            entries,
            tolerance,
            valid_min,
            valid_max,
        })
    }

    fn in_valid_range(&self, value: f32) -> bool {
        value >= self.valid_min && value <= self.valid_max
    }
}

/// Fused classifier: discrete color first, reflectance fallback second.
#[derive(Clone, Debug)]
pub struct ZoneClassifier {
    table: CalibrationTable,
    policy: FallbackPolicy,
    order: ZoneOrder,
}

impl ZoneClassifier {
    pub fn new(table: CalibrationTable, policy: FallbackPolicy, order: ZoneOrder) -> Self {
        Self {
            table,
            policy,
            order,
        }
    }

    /// Classify one sample.
    ///
    /// A discrete color naming a zone on this board returns immediately,
    /// regardless of reflectance. Otherwise the smoothed reflectance decides
    /// under the configured fallback policy, or nothing matches.
    pub fn classify(
        &self,
        color: Option<DiscreteColor>,
        smoothed_reflectance: f32,
    ) -> Option<Zone> {
        if let Some(zone) = color.and_then(DiscreteColor::as_zone)
            && self.order.contains(zone)
        {
            return Some(zone);
        }
        self.classify_reflectance(smoothed_reflectance)
    }

    /// Reflectance-only fallback classification.
    pub fn classify_reflectance(&self, smoothed: f32) -> Option<Zone> {
        if !self.table.in_valid_range(smoothed) {
            return None;
        }

        match self.policy {
            FallbackPolicy::ToleranceWindow => {
                let mut matched = None;
                for (zone, reference) in &self.table.entries {
                    if (smoothed - reference).abs() <= self.table.tolerance {
                        if matched.is_some() {
                            // Two windows claim the reading: ambiguous.
                            return None;
                        }
                        matched = Some(*zone);
                    }
                }
                matched
            }
            FallbackPolicy::NearestNeighbor => {
                let mut best: Option<(Zone, f32)> = None;
                for (zone, reference) in &self.table.entries {
                    let dist = (smoothed - reference).abs();
                    match best {
                        Some((_, best_dist)) if dist >= best_dist => {}
                        _ => best = Some((*zone, dist)),
                    }
                }
                best.map(|(zone, _)| zone)
            }
        }
    }
}
