use crate::error::AppError;
use crate::input::KeyId;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "autopilot.toml";
const ENV_PREFIX: &str = "AUTOPILOT";

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineSettings,
    pub capture: CaptureSettings,
    pub controls: ControlSettings,
    pub timing: TimingSettings,
    pub detection: DetectionSettings,
    pub encoding: EncodingSettings,
    pub journal: JournalSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PipelineVariant {
    #[default]
    Detection,
    Encoding,
}

impl PipelineVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineVariant::Detection => "detection",
            PipelineVariant::Encoding => "encoding",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub variant: PipelineVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackend {
    #[default]
    Screen,
    Directory,
}

/// What happens to the current run when capture fails while Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFailurePolicy {
    #[default]
    Discard,
    LogAborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureRegion {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self {
            top: 299,
            left: 1,
            width: 719,
            height: 399,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub region: CaptureRegion,
    pub backend: CaptureBackend,
    pub directory: PathBuf,
    pub on_failure: CaptureFailurePolicy,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            region: CaptureRegion::default(),
            backend: CaptureBackend::Screen,
            directory: PathBuf::from("frames"),
            on_failure: CaptureFailurePolicy::Discard,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub toggle: String,
    pub quit: String,
    pub mark_lost: String,
    pub mark_won: String,
    /// Key pressed when the decision fires.
    pub action: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            toggle: "p".to_string(),
            quit: "q".to_string(),
            mark_lost: "1".to_string(),
            mark_won: "2".to_string(),
            action: "space".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub toggle_debounce_ms: u64,
    pub outcome_debounce_ms: u64,
    pub idle_poll_ms: u64,
    pub action_hold_ms: u64,
    pub listener_startup_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            toggle_debounce_ms: 100,
            outcome_debounce_ms: 300,
            idle_poll_ms: 100,
            action_hold_ms: 40,
            listener_startup_ms: 250,
        }
    }
}

impl TimingSettings {
    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    pub fn outcome_debounce(&self) -> Duration {
        Duration::from_millis(self.outcome_debounce_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn action_hold(&self) -> Duration {
        Duration::from_millis(self.action_hold_ms)
    }

    pub fn listener_startup(&self) -> Duration {
        Duration::from_millis(self.listener_startup_ms)
    }
}

/// Shape of one line in a variant's segment log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSchema {
    /// `<seconds>,<OUTCOME>`
    Duration,
    /// `<start_unix>,<end_unix>,<OUTCOME>`
    Interval,
    /// Lost runs as `Duration`, won runs as `Interval`.
    #[default]
    ByOutcome,
}

/// Inclusive RGB box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorRange {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorDetectorSettings {
    pub classes: IndexMap<String, ColorRange>,
    pub min_area: u32,
}

impl Default for ColorDetectorSettings {
    fn default() -> Self {
        let mut classes = IndexMap::new();
        classes.insert(
            "cuphead".to_string(),
            ColorRange {
                min: [180, 0, 0],
                max: [255, 70, 70],
            },
        );
        classes.insert(
            "projectile".to_string(),
            ColorRange {
                min: [200, 110, 170],
                max: [255, 190, 255],
            },
        );
        Self {
            classes,
            min_area: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub confidence_threshold: f32,
    pub decision_threshold: f32,
    pub sentinel_distance: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub scale_velocity: f32,
    pub actor_label: String,
    pub threat_label: String,
    pub model_path: PathBuf,
    pub segment_log: PathBuf,
    pub segment_schema: SegmentSchema,
    pub narrative_tag: Option<String>,
    pub detector: ColorDetectorSettings,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            // Low on purpose: fast projectiles score poorly.
            confidence_threshold: 0.13,
            decision_threshold: 0.78,
            sentinel_distance: 1280.0,
            scale_x: 1280.0,
            scale_y: 720.0,
            scale_velocity: 50.0,
            actor_label: "cuphead".to_string(),
            threat_label: "projectile".to_string(),
            model_path: PathBuf::from("models/potato_mlp_decision.json"),
            segment_log: PathBuf::from("yolo_segments.txt"),
            segment_schema: SegmentSchema::ByOutcome,
            narrative_tag: None,
            detector: ColorDetectorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    pub width: u32,
    pub height: u32,
    pub sequence_length: usize,
    pub decision_threshold: f32,
    pub encoder_path: PathBuf,
    pub classifier_path: PathBuf,
    pub segment_log: PathBuf,
    pub segment_schema: SegmentSchema,
    pub narrative_tag: Option<String>,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            width: 128,
            height: 72,
            sequence_length: 10,
            decision_threshold: 0.36,
            encoder_path: PathBuf::from("models/potato_encoder.json"),
            classifier_path: PathBuf::from("models/potato_gru.json"),
            segment_log: PathBuf::from("gru_segments.txt"),
            segment_schema: SegmentSchema::ByOutcome,
            narrative_tag: Some("GRU".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    pub narrative_log: PathBuf,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            narrative_log: PathBuf::from("game_log.txt"),
        }
    }
}

impl Settings {
    /// Layers the optional TOML file and `AUTOPILOT__*` environment
    /// variables over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => config::File::from(path.to_path_buf()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings: Settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let region = &self.capture.region;
        if region.width == 0 || region.height == 0 {
            return Err(AppError::InvalidConfig(format!(
                "capture region must be non-empty, got {}x{}",
                region.width, region.height
            )));
        }

        for (name, value) in [
            ("detection.confidence_threshold", self.detection.confidence_threshold),
            ("detection.decision_threshold", self.detection.decision_threshold),
            ("encoding.decision_threshold", self.encoding.decision_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::InvalidConfig(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }

        let detection = &self.detection;
        for (name, value) in [
            ("detection.scale_x", detection.scale_x),
            ("detection.scale_y", detection.scale_y),
            ("detection.scale_velocity", detection.scale_velocity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.encoding.sequence_length == 0 {
            return Err(AppError::InvalidConfig(
                "encoding.sequence_length must be at least 1".to_string(),
            ));
        }
        if self.encoding.width == 0 || self.encoding.height == 0 {
            return Err(AppError::InvalidConfig(
                "encoding resolution must be non-empty".to_string(),
            ));
        }

        let controls = &self.controls;
        let keys = [
            &controls.toggle,
            &controls.quit,
            &controls.mark_lost,
            &controls.mark_won,
            &controls.action,
        ];
        let distinct: HashSet<KeyId> = keys.iter().map(KeyId::new).collect();
        if distinct.len() != keys.len() {
            return Err(AppError::InvalidConfig(
                "control keys must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}
