use super::run_segment::{Outcome, RunSegment};
use crate::config::{PipelineVariant, SegmentSchema, Settings};
use crate::error::AppError;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Appends finished runs to the variant's segment log and to the shared
/// narrative log. Files are opened per write in append mode.
#[derive(Debug, Clone)]
pub struct OutcomeLogger {
    segment_log: PathBuf,
    schema: SegmentSchema,
    narrative_log: PathBuf,
    tag: Option<String>,
}

impl OutcomeLogger {
    pub fn new(
        segment_log: PathBuf,
        schema: SegmentSchema,
        narrative_log: PathBuf,
        tag: Option<String>,
    ) -> Self {
        Self {
            segment_log,
            schema,
            narrative_log,
            tag: tag.filter(|t| !t.is_empty()),
        }
    }

    pub fn for_variant(settings: &Settings, variant: PipelineVariant) -> Self {
        let narrative_log = settings.journal.narrative_log.clone();
        match variant {
            PipelineVariant::Detection => Self::new(
                settings.detection.segment_log.clone(),
                settings.detection.segment_schema,
                narrative_log,
                settings.detection.narrative_tag.clone(),
            ),
            PipelineVariant::Encoding => Self::new(
                settings.encoding.segment_log.clone(),
                settings.encoding.segment_schema,
                narrative_log,
                settings.encoding.narrative_tag.clone(),
            ),
        }
    }

    pub fn segment_log(&self) -> &Path {
        &self.segment_log
    }

    pub fn narrative_log(&self) -> &Path {
        &self.narrative_log
    }

    pub fn record_segment(&self, segment: &RunSegment) -> Result<(), AppError> {
        info!("[RESULT] Logged: {}. Pausing bot...", segment.outcome);
        if let Some(line) = self.segment_line(segment) {
            append_line(&self.segment_log, &line)?;
        }
        append_line(&self.narrative_log, &self.narrative_line(segment))?;
        info!("Survived: {:.2}s", segment.survived_secs());
        Ok(())
    }

    /// `None` for terminal events that had no active run.
    pub fn segment_line(&self, segment: &RunSegment) -> Option<String> {
        let started_at = segment.started_at?;
        let interval = match self.schema {
            SegmentSchema::Duration => false,
            SegmentSchema::Interval => true,
            SegmentSchema::ByOutcome => segment.outcome == Outcome::Won,
        };
        let line = if interval {
            format!(
                "{:.6},{:.6},{}",
                unix_seconds(&started_at),
                unix_seconds(&segment.ended_at),
                segment.outcome
            )
        } else {
            format!("{:.2},{}", segment.survived_secs(), segment.outcome)
        };
        Some(line)
    }

    pub fn narrative_line(&self, segment: &RunSegment) -> String {
        let outcome = match &self.tag {
            Some(tag) => format!("{} ({})", segment.outcome, tag),
            None => segment.outcome.to_string(),
        };
        format!(
            "{} - {} - Survived: {:.2}s",
            segment.ended_at.format("%Y-%m-%d %H:%M:%S"),
            outcome,
            segment.survived_secs()
        )
    }
}

fn unix_seconds(at: &DateTime<Local>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn append_line(path: &Path, line: &str) -> Result<(), AppError> {
    let to_error = |source| AppError::LogWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    writeln!(file, "{}", line).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn logger(dir: &Path, schema: SegmentSchema, tag: Option<&str>) -> OutcomeLogger {
        OutcomeLogger::new(
            dir.join("segments.txt"),
            schema,
            dir.join("game_log.txt"),
            tag.map(str::to_string),
        )
    }

    fn segment(outcome: Outcome, secs: f64) -> RunSegment {
        let start = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let duration = Duration::from_secs_f64(secs);
        let end = start + chrono::Duration::from_std(duration).unwrap();
        RunSegment::completed(outcome, start, end, duration)
    }

    #[test]
    fn lost_run_writes_duration_and_narrative() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(dir.path(), SegmentSchema::ByOutcome, None);
        logger.record_segment(&segment(Outcome::Lost, 12.5)).unwrap();

        let segments = std::fs::read_to_string(logger.segment_log()).unwrap();
        assert_eq!(segments, "12.50,LOST\n");
        let narrative = std::fs::read_to_string(logger.narrative_log()).unwrap();
        assert_eq!(narrative, "2024-03-01 12:00:12 - LOST - Survived: 12.50s\n");
    }

    #[test]
    fn won_run_writes_interval_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(dir.path(), SegmentSchema::ByOutcome, Some("GRU"));
        let run = segment(Outcome::Won, 3.0);
        let line = logger.segment_line(&run).unwrap();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2], "WON");
        let start: f64 = fields[0].parse().unwrap();
        let end: f64 = fields[1].parse().unwrap();
        assert!((end - start - 3.0).abs() < 1e-3);
        assert!(logger.narrative_line(&run).contains(" - WON (GRU) - Survived: 3.00s"));
    }

    #[test]
    fn fixed_schemas_ignore_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let duration = logger(dir.path(), SegmentSchema::Duration, None);
        assert_eq!(
            duration.segment_line(&segment(Outcome::Won, 1.0)).unwrap(),
            "1.00,WON"
        );
        let interval = logger(dir.path(), SegmentSchema::Interval, None);
        assert_eq!(
            interval
                .segment_line(&segment(Outcome::Lost, 1.0))
                .unwrap()
                .split(',')
                .count(),
            3
        );
    }

    #[test]
    fn inactive_run_reaches_narrative_log_only() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(dir.path(), SegmentSchema::ByOutcome, Some(""));
        let run = RunSegment::without_run(Outcome::Lost, Local::now());
        logger.record_segment(&run).unwrap();

        assert!(!logger.segment_log().exists());
        let narrative = std::fs::read_to_string(logger.narrative_log()).unwrap();
        assert!(narrative.ends_with(" - LOST - Survived: 0.00s\n"));
    }

    #[test]
    fn appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(dir.path(), SegmentSchema::Duration, None);
        logger.record_segment(&segment(Outcome::Lost, 1.0)).unwrap();
        logger.record_segment(&segment(Outcome::Aborted, 2.25)).unwrap();
        let segments = std::fs::read_to_string(logger.segment_log()).unwrap();
        assert_eq!(segments, "1.00,LOST\n2.25,ABORTED\n");
    }

    #[test]
    fn unwritable_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let logger = OutcomeLogger::new(
            dir.path().join("missing").join("segments.txt"),
            SegmentSchema::Duration,
            dir.path().join("game_log.txt"),
            None,
        );
        assert!(matches!(
            logger.record_segment(&segment(Outcome::Lost, 1.0)),
            Err(AppError::LogWrite { .. })
        ));
    }
}
