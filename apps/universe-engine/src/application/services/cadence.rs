//! Evaluation Cadence
//!
//! The engine does not schedule itself. These helpers produce the strictly
//! increasing evaluation times a caller feeds into
//! [`UniverseService::run_cycle`](super::UniverseService::run_cycle).

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::shared::Timestamp;

/// How often a universe is re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationCadence {
    /// Every day at midnight UTC.
    Daily,
    /// Every Monday at midnight UTC.
    Weekly,
    /// First day of every month at midnight UTC.
    #[default]
    Monthly,
}

impl EvaluationCadence {
    /// Parse cadence from string. Unknown values fall back to monthly.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            _ => Self::Monthly,
        }
    }

    /// Get the cadence name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Start of the period containing `at`.
    #[must_use]
    pub fn period_start(&self, at: Timestamp) -> Timestamp {
        let date = at.as_datetime().date_naive();
        let start = match self {
            Self::Daily => date,
            Self::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Self::Monthly => date.with_day(1).unwrap_or(date),
        };
        midnight(start)
    }

    /// Start of the period following the one containing `at`.
    #[must_use]
    pub fn next_after(&self, at: Timestamp) -> Timestamp {
        let start = self.period_start(at).as_datetime().date_naive();
        let next = match self {
            Self::Daily => start + Duration::days(1),
            Self::Weekly => start + Duration::days(7),
            Self::Monthly => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
            }
        };
        midnight(next)
    }

    /// Evaluation times in `[start, end)`.
    #[must_use]
    pub fn schedule(&self, start: Timestamp, end: Timestamp) -> EvaluationSchedule {
        let first = if self.period_start(start) == start {
            start
        } else {
            self.next_after(start)
        };

        EvaluationSchedule {
            cadence: *self,
            next: Some(first),
            end,
        }
    }
}

fn midnight(date: NaiveDate) -> Timestamp {
    Timestamp::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Iterator over evaluation times produced by [`EvaluationCadence::schedule`].
#[derive(Debug, Clone)]
pub struct EvaluationSchedule {
    cadence: EvaluationCadence,
    next: Option<Timestamp>,
    end: Timestamp,
}

impl Iterator for EvaluationSchedule {
    type Item = Timestamp;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|t| *t < self.end)?;
        let following = self.cadence.next_after(current);
        // Guard against a non-advancing step at the end of the calendar.
        self.next = (following > current).then_some(following);
        Some(current)
    }
}
