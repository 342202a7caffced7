use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One labelled box reported by a detection capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Actor and threat positions extracted from one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub actor: Option<Point>,
    pub threats: Vec<Point>,
}

impl DetectionResult {
    /// Keeps the most confident actor and every threat, in detection order.
    pub fn from_detections(detections: &[Detection], actor_label: &str, threat_label: &str) -> Self {
        let actor = detections
            .iter()
            .filter(|d| d.label == actor_label)
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|d| d.bbox.center());
        let threats = detections
            .iter()
            .filter(|d| d.label == threat_label)
            .map(|d| d.bbox.center())
            .collect();
        Self { actor, threats }
    }

    /// Threat closest to the actor; the first one wins ties.
    pub fn nearest_threat(&self) -> Option<(Point, Point)> {
        let actor = self.actor?;
        let mut nearest: Option<(Point, f32)> = None;
        for threat in &self.threats {
            let distance = threat.distance(&actor);
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((*threat, distance)),
            }
        }
        nearest.map(|(threat, _)| (actor, threat))
    }
}
