//! Forward obstacle detection.

/// Independent threshold check on the forward distance sensor.
///
/// A true verdict forces an immediate stop-and-recover from any driving
/// state; only the Arrived/Done terminal states outrank it.
#[derive(Clone, Copy, Debug)]
pub struct ObstacleGuard {
    stop_distance_mm: i32,
}

impl ObstacleGuard {
    pub fn new(stop_distance_mm: i32) -> Self {
        Self { stop_distance_mm }
    }

    /// Returns true (unsafe) iff a distance is available and at or inside
    /// the stop threshold. A missing reading is treated as clear.
    pub fn check(&self, distance_mm: Option<i32>) -> bool {
        matches!(distance_mm, Some(d) if d <= self.stop_distance_mm)
    }
}
