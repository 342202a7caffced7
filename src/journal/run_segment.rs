use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Lost,
    Won,
    /// Run cut short by a capture failure.
    Aborted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Lost => "LOST",
            Outcome::Won => "WON",
            Outcome::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished run. `started_at` is `None` when the terminal event arrived
/// with no active run, in which case the duration is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSegment {
    pub outcome: Outcome,
    pub started_at: Option<DateTime<Local>>,
    pub ended_at: DateTime<Local>,
    pub duration: Duration,
}

impl RunSegment {
    pub fn completed(
        outcome: Outcome,
        started_at: DateTime<Local>,
        ended_at: DateTime<Local>,
        duration: Duration,
    ) -> Self {
        Self {
            outcome,
            started_at: Some(started_at),
            ended_at,
            duration,
        }
    }

    pub fn without_run(outcome: Outcome, ended_at: DateTime<Local>) -> Self {
        Self {
            outcome,
            started_at: None,
            ended_at,
            duration: Duration::ZERO,
        }
    }

    pub fn was_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn survived_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Lost.to_string(), "LOST");
        assert_eq!(Outcome::Won.as_str(), "WON");
        assert_eq!(Outcome::Aborted.as_str(), "ABORTED");
    }

    #[test]
    fn segment_without_run_has_zero_duration() {
        let segment = RunSegment::without_run(Outcome::Won, Local::now());
        assert!(!segment.was_active());
        assert_eq!(segment.survived_secs(), 0.0);
    }
}
