//! Zone and color types for the ordered board layout.
//!
//! A board is a strip of three colored zones in a fixed physical order.
//! The order drives both target selection (first/middle/last) and the
//! wrong-way overshoot rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A colored zone on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    Green,
    Yellow,
    Blue,
    Red,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Green => "GREEN",
            Zone::Yellow => "YELLOW",
            Zone::Blue => "BLUE",
            Zone::Red => "RED",
        };
        f.write_str(name)
    }
}

/// Discrete color reported by the color sensor firmware.
///
/// Only a subset maps onto board zones; the rest (and a missing reading)
/// fall through to the reflectance fallback path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscreteColor {
    Red,
    Green,
    Blue,
    Yellow,
    White,
    Black,
}

impl DiscreteColor {
    /// Map a high-confidence firmware color onto a zone, if it is one.
    pub fn as_zone(self) -> Option<Zone> {
        match self {
            DiscreteColor::Red => Some(Zone::Red),
            DiscreteColor::Green => Some(Zone::Green),
            DiscreteColor::Blue => Some(Zone::Blue),
            DiscreteColor::Yellow => Some(Zone::Yellow),
            DiscreteColor::White | DiscreteColor::Black => None,
        }
    }
}

/// Physical zone order on the board, e.g. GREEN -> YELLOW -> RED.
///
/// Exactly three distinct zones. Fixed per deployment; alternate boards
/// (GREEN -> BLUE -> RED) are a configuration value, not a code path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[Zone; 3]", into = "[Zone; 3]")]
pub struct ZoneOrder {
    zones: [Zone; 3],
}

impl ZoneOrder {
    /// Build an order from three distinct zones.
    pub fn new(first: Zone, middle: Zone, last: Zone) -> Result<Self, String> {
        if first == middle || middle == last || first == last {
            return Err(format!(
                "zone order must name three distinct zones, got {first}, {middle}, {last}"
            ));
        }
        Ok(Self {
            zones: [first, middle, last],
        })
    }

    /// First zone in board order.
    pub fn first(&self) -> Zone {
        self.zones[0]
    }

    /// Middle zone in board order.
    pub fn middle(&self) -> Zone {
        self.zones[1]
    }

    /// Last zone in board order.
    pub fn last(&self) -> Zone {
        self.zones[2]
    }

    /// All three zones in board order.
    pub fn zones(&self) -> [Zone; 3] {
        self.zones
    }

    /// Whether the given zone is part of this board.
    pub fn contains(&self, zone: Zone) -> bool {
        self.zones.contains(&zone)
    }
}

impl Default for ZoneOrder {
    fn default() -> Self {
        Self {
            zones: [Zone::Green, Zone::Yellow, Zone::Red],
        }
    }
}

impl TryFrom<[Zone; 3]> for ZoneOrder {
    type Error = String;

    fn try_from(zones: [Zone; 3]) -> Result<Self, String> {
        Self::new(zones[0], zones[1], zones[2])
    }
}

impl From<ZoneOrder> for [Zone; 3] {
    fn from(order: ZoneOrder) -> Self {
        order.zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_display_is_uppercase() {
        assert_eq!(Zone::Green.to_string(), "GREEN");
        assert_eq!(Zone::Red.to_string(), "RED");
    }

    #[test]
    fn discrete_color_maps_only_zone_colors() {
        assert_eq!(DiscreteColor::Red.as_zone(), Some(Zone::Red));
        assert_eq!(DiscreteColor::Yellow.as_zone(), Some(Zone::Yellow));
        assert_eq!(DiscreteColor::White.as_zone(), None);
        assert_eq!(DiscreteColor::Black.as_zone(), None);
    }

    #[test]
    fn order_rejects_duplicates() {
        assert!(ZoneOrder::new(Zone::Green, Zone::Green, Zone::Red).is_err());
        assert!(ZoneOrder::new(Zone::Green, Zone::Yellow, Zone::Red).is_ok());
    }

    #[test]
    fn order_accessors() {
        let order = ZoneOrder::new(Zone::Green, Zone::Blue, Zone::Red).unwrap();
        assert_eq!(order.first(), Zone::Green);
        assert_eq!(order.middle(), Zone::Blue);
        assert_eq!(order.last(), Zone::Red);
        assert!(order.contains(Zone::Blue));
        assert!(!order.contains(Zone::Yellow));
    }
}
