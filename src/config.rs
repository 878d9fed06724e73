//! Configuration loading for VarnaNav
//!
//! All tunables are externally supplied; the navigation core holds no
//! compile-time constants. Defaults reproduce the tuned values of the
//! reference deployment.

use crate::classifier::{CalibrationTable, FallbackPolicy};
use crate::error::{Result, VarnaError};
use crate::scenario::UnknownCommandPolicy;
use crate::zone::{Zone, ZoneOrder};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize, Default)]
pub struct VarnaConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
}

/// Board layout and command handling
#[derive(Clone, Debug, Deserialize)]
pub struct BoardConfig {
    /// Physical zone order on the board
    #[serde(default)]
    pub order: ZoneOrder,

    /// What to do with an unrecognized command string
    #[serde(default)]
    pub unknown_command_policy: UnknownCommandPolicy,
}

/// One calibration reference value
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneReference {
    pub zone: Zone,
    pub reflectance: f32,
}

/// Color calibration values and the fallback policy
#[derive(Clone, Debug, Deserialize)]
pub struct CalibrationConfig {
    /// Reference reflectance per zone, in declaration order
    #[serde(default = "default_zone_references")]
    pub zones: Vec<ZoneReference>,

    /// How close a smoothed reading must be to count (+/-)
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Readings below this are discarded as spurious
    #[serde(default = "default_valid_min")]
    pub valid_min: f32,

    /// Readings above this are discarded as spurious
    #[serde(default = "default_valid_max")]
    pub valid_max: f32,

    /// Reflectance fallback policy
    #[serde(default = "default_fallback_policy")]
    pub fallback_policy: FallbackPolicy,
}

/// Motor speeds and maneuver geometry
#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    /// Normal forward speed (deg/s)
    #[serde(default = "default_drive_speed")]
    pub drive_speed: i32,

    /// Hazard-mode forward speed (deg/s)
    #[serde(default = "default_turbo_speed")]
    pub turbo_speed: i32,

    /// Wheel speed during the in-place 180 degree turn (deg/s)
    #[serde(default = "default_turn_speed")]
    pub turn_speed: i32,

    /// Wheel angle for the in-place 180 degree turn (degrees)
    #[serde(default = "default_turn_angle")]
    pub turn_angle_deg: i32,

    /// Pause after the turn-around before resuming (ms)
    #[serde(default = "default_turn_settle_ms")]
    pub turn_settle_ms: u64,

    /// Final push into the zone after confirmation (degrees)
    #[serde(default = "default_final_drive_angle")]
    pub final_drive_angle_deg: i32,
}

/// Sampling loop and arrival thresholds
#[derive(Clone, Debug, Deserialize)]
pub struct NavigationConfig {
    /// Sensor sampling period (ms)
    #[serde(default = "default_sample_ms")]
    pub sample_ms: u64,

    /// Matches needed to confirm the target zone
    #[serde(default = "default_consecutive_hits")]
    pub consecutive_hits: u32,

    /// Samples ignored while driving off the start zone
    #[serde(default = "default_warmup_samples")]
    pub warmup_samples: u32,

    /// Obstacle stop distance (mm)
    #[serde(default = "default_stop_distance_mm")]
    pub stop_distance_mm: i32,

    /// Sensor stabilization wait before the first reading (ms)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Audio/visual cue tuning
#[derive(Clone, Debug, Deserialize)]
pub struct EffectsConfig {
    /// Speaker volume (0-100)
    #[serde(default = "default_volume_percent")]
    pub volume_percent: u8,

    /// Hazard square-wave half-cycle (ms)
    #[serde(default = "default_phase_ms")]
    pub phase_ms: u64,

    /// Hazard high-phase blip frequency (Hz)
    #[serde(default = "default_high_beep_hz")]
    pub high_beep_hz: u32,

    /// Hazard low-phase blip frequency (Hz)
    #[serde(default = "default_low_beep_hz")]
    pub low_beep_hz: u32,

    /// Hazard blip duration (ms)
    #[serde(default = "default_blip_ms")]
    pub blip_ms: u32,

    /// Obstacle alert beep frequency (Hz)
    #[serde(default = "default_alert_beep_hz")]
    pub alert_beep_hz: u32,

    /// Obstacle alert beep duration (ms)
    #[serde(default = "default_alert_ms")]
    pub alert_ms: u32,

    /// Completion beep frequency (Hz)
    #[serde(default = "default_confirm_beep_hz")]
    pub confirm_beep_hz: u32,

    /// Completion beep duration (ms)
    #[serde(default = "default_confirm_ms")]
    pub confirm_ms: u32,
}

// Default value functions
fn default_zone_references() -> Vec<ZoneReference> {
    vec![
        ZoneReference {
            zone: Zone::Red,
            reflectance: 6.0,
        },
        ZoneReference {
            zone: Zone::Green,
            reflectance: 13.0,
        },
        ZoneReference {
            zone: Zone::Yellow,
            reflectance: 16.0,
        },
    ]
}
fn default_tolerance() -> f32 {
    2.0
}
fn default_valid_min() -> f32 {
    0.0
}
fn default_valid_max() -> f32 {
    25.0
}
fn default_fallback_policy() -> FallbackPolicy {
    FallbackPolicy::ToleranceWindow
}
fn default_drive_speed() -> i32 {
    200
}
fn default_turbo_speed() -> i32 {
    500
}
fn default_turn_speed() -> i32 {
    300
}
fn default_turn_angle() -> i32 {
    360
}
fn default_turn_settle_ms() -> u64 {
    200
}
fn default_final_drive_angle() -> i32 {
    250
}
fn default_sample_ms() -> u64 {
    30
}
fn default_consecutive_hits() -> u32 {
    5
}
fn default_warmup_samples() -> u32 {
    40
}
fn default_stop_distance_mm() -> i32 {
    150
}
fn default_settle_ms() -> u64 {
    500
}
fn default_volume_percent() -> u8 {
    30
}
fn default_phase_ms() -> u64 {
    400
}
fn default_high_beep_hz() -> u32 {
    900
}
fn default_low_beep_hz() -> u32 {
    600
}
fn default_blip_ms() -> u32 {
    50
}
fn default_alert_beep_hz() -> u32 {
    400
}
fn default_alert_ms() -> u32 {
    250
}
fn default_confirm_beep_hz() -> u32 {
    1500
}
fn default_confirm_ms() -> u32 {
    400
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            order: ZoneOrder::default(),
            unknown_command_policy: UnknownCommandPolicy::default(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            zones: default_zone_references(),
            tolerance: default_tolerance(),
            valid_min: default_valid_min(),
            valid_max: default_valid_max(),
            fallback_policy: default_fallback_policy(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            drive_speed: default_drive_speed(),
            turbo_speed: default_turbo_speed(),
            turn_speed: default_turn_speed(),
            turn_angle_deg: default_turn_angle(),
            turn_settle_ms: default_turn_settle_ms(),
            final_drive_angle_deg: default_final_drive_angle(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            sample_ms: default_sample_ms(),
            consecutive_hits: default_consecutive_hits(),
            warmup_samples: default_warmup_samples(),
            stop_distance_mm: default_stop_distance_mm(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            volume_percent: default_volume_percent(),
            phase_ms: default_phase_ms(),
            high_beep_hz: default_high_beep_hz(),
            low_beep_hz: default_low_beep_hz(),
            blip_ms: default_blip_ms(),
            alert_beep_hz: default_alert_beep_hz(),
            alert_ms: default_alert_ms(),
            confirm_beep_hz: default_confirm_beep_hz(),
            confirm_ms: default_confirm_ms(),
        }
    }
}

impl VarnaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VarnaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: VarnaConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        self.calibration_table()?;
        if self.navigation.consecutive_hits == 0 {
            return Err(VarnaError::Config(
                "consecutive_hits must be at least 1".to_string(),
            ));
        }
        if self.drive.drive_speed <= 0 || self.drive.turbo_speed <= 0 {
            return Err(VarnaError::Config(
                "drive speeds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the runtime calibration table for this board.
    pub fn calibration_table(&self) -> Result<CalibrationTable> {
        CalibrationTable::new(
            self.calibration
                .zones
                .iter()
                .map(|r| (r.zone, r.reflectance))
                .collect(),
            self.calibration.tolerance,
            self.calibration.valid_min,
            self.calibration.valid_max,
            &self.board.order,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = VarnaConfig::default();
        assert_eq!(config.drive.drive_speed, 200);
        assert_eq!(config.drive.turbo_speed, 500);
        assert_eq!(config.navigation.sample_ms, 30);
        assert_eq!(config.navigation.consecutive_hits, 5);
        assert_eq!(config.navigation.warmup_samples, 40);
        assert_eq!(config.navigation.stop_distance_mm, 150);
        assert_eq!(config.board.order, ZoneOrder::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: VarnaConfig = toml::from_str(
            r#"
            [drive]
            turbo_speed = 700

            [navigation]
            consecutive_hits = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.drive.turbo_speed, 700);
        assert_eq!(config.drive.drive_speed, 200);
        assert_eq!(config.navigation.consecutive_hits, 3);
        assert_eq!(config.navigation.warmup_samples, 40);
    }

    #[test]
    fn load_round_trips_through_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [board]
            order = ["GREEN", "BLUE", "RED"]
            unknown_command_policy = "default"

            [calibration]
            tolerance = 1.0
            zones = [
                {{ zone = "RED", reflectance = 5.0 }},
                {{ zone = "GREEN", reflectance = 11.0 }},
                {{ zone = "BLUE", reflectance = 14.0 }},
            ]
            "#
        )
        .unwrap();

        let config = VarnaConfig::load(file.path()).unwrap();
        assert_eq!(config.board.order.middle(), Zone::Blue);
        assert_eq!(
            config.board.unknown_command_policy,
            UnknownCommandPolicy::Default
        );
        assert_eq!(config.calibration.tolerance, 1.0);
    }

    #[test]
    fn validation_rejects_incomplete_calibration() {
        let config: VarnaConfig = toml::from_str(
            r#"
            [calibration]
            zones = [{ zone = "RED", reflectance = 5.0 }]
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_hit_threshold() {
        let config: VarnaConfig = toml::from_str(
            r#"
            [navigation]
            consecutive_hits = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
