use crate::config::DetectionSettings;
use crate::pipeline::types::{FeatureVector, Point};

/// Relative position of the nearest threat and its horizontal velocity.
///
/// `distance_x` holds the sentinel whenever no actor/threat pair was seen.
/// Velocity is zero whenever either the current or previous distance is the
/// sentinel, so detection dropouts never read as a huge jump.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsState {
    pub distance_x: f32,
    pub distance_y: f32,
    pub previous_distance_x: f32,
    sentinel: f32,
}

impl PhysicsState {
    pub fn new(sentinel: f32) -> Self {
        Self {
            distance_x: sentinel,
            distance_y: 0.0,
            previous_distance_x: sentinel,
            sentinel,
        }
    }

    pub fn sentinel(&self) -> f32 {
        self.sentinel
    }

    /// Forget the last distance. Called on every resume.
    pub fn reset(&mut self) {
        self.previous_distance_x = self.sentinel;
    }

    /// Records this frame's `(actor, threat)` pair and returns the velocity.
    pub fn observe(&mut self, pair: Option<(Point, Point)>) -> f32 {
        match pair {
            Some((actor, threat)) => {
                self.distance_x = threat.x - actor.x;
                self.distance_y = threat.y - actor.y;
            }
            None => {
                self.distance_x = self.sentinel;
                self.distance_y = 0.0;
            }
        }

        let velocity = if self.distance_x == self.sentinel || self.previous_distance_x == self.sentinel {
            0.0
        } else {
            self.distance_x - self.previous_distance_x
        };
        self.previous_distance_x = self.distance_x;
        velocity
    }
}

/// Divisors the decision model was trained with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScale {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
}

impl FeatureScale {
    pub fn from_settings(settings: &DetectionSettings) -> Self {
        Self {
            x: settings.scale_x,
            y: settings.scale_y,
            velocity: settings.scale_velocity,
        }
    }

    pub fn normalize(&self, state: &PhysicsState, velocity: f32) -> FeatureVector {
        [
            state.distance_x / self.x,
            state.distance_y / self.y,
            velocity / self.velocity,
        ]
    }
}
