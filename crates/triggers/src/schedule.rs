//! Parses the three schedule expression shapes a scheduled trigger accepts
//! into a single internal representation that can compute "seconds until
//! next fire" from the current wall-clock time.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use cron::Schedule;
use rex_core::ScheduledTrigger;

use crate::error::TriggerError;

#[derive(Clone)]
pub enum ScheduleKind {
    Cron(Schedule),
    Every(Duration),
    At(NaiveTime),
}

impl ScheduleKind {
    /// Builds a schedule from a rule's trigger config. Exactly one of the
    /// three fields is expected to be set (enforced by the loader); when
    /// none are, falls back to hourly per the component design's default.
    pub fn from_trigger(trigger: &ScheduledTrigger) -> Result<Self, TriggerError> {
        if let Some(expr) = &trigger.cron_expression {
            return Self::from_cron_expression(expr);
        }
        if let Some(token) = &trigger.run_every {
            return Self::from_run_every(token);
        }
        if let Some(token) = &trigger.run_at {
            return Self::from_run_at(token);
        }
        Self::from_cron_expression("0 0 * * * *")
    }

    fn from_cron_expression(expr: &str) -> Result<Self, TriggerError> {
        let field_count = expr.split_whitespace().count();
        let six_field = if field_count == 5 { format!("0 {expr}") } else { expr.to_string() };
        let schedule = Schedule::from_str(&six_field)
            .map_err(|e| TriggerError::InvalidCronExpression(expr.to_string(), e.to_string()))?;
        Ok(ScheduleKind::Cron(schedule))
    }

    fn from_run_every(token: &str) -> Result<Self, TriggerError> {
        let (digits, unit) = token.split_at(token.len().saturating_sub(1));
        let n: u64 = digits.parse().map_err(|_| TriggerError::InvalidRunEvery(token.to_string()))?;
        if n == 0 {
            return Err(TriggerError::InvalidRunEvery(token.to_string()));
        }
        let seconds = match unit {
            "m" => n * 60,
            "h" => n * 3600,
            _ => return Err(TriggerError::InvalidRunEvery(token.to_string())),
        };
        Ok(ScheduleKind::Every(Duration::from_secs(seconds)))
    }

    fn from_run_at(token: &str) -> Result<Self, TriggerError> {
        let (hour, minute) = token.split_once(':').ok_or_else(|| TriggerError::InvalidRunAt(token.to_string()))?;
        let hour: u32 = hour.parse().map_err(|_| TriggerError::InvalidRunAt(token.to_string()))?;
        let minute: u32 = minute.parse().map_err(|_| TriggerError::InvalidRunAt(token.to_string()))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| TriggerError::InvalidRunAt(token.to_string()))?;
        Ok(ScheduleKind::At(time))
    }

    /// Duration from `now` until the next tick, used to drive the sleep in
    /// the scheduled trigger's run loop.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match self {
            ScheduleKind::Cron(schedule) => schedule
                .after(&now)
                .next()
                .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO))
                .unwrap_or(Duration::from_secs(60)),
            ScheduleKind::Every(interval) => *interval,
            ScheduleKind::At(time) => {
                let today = now.date_naive().and_time(*time).and_utc();
                let next = if today > now { today } else { today + chrono::Duration::days(1) };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

/// True when `time` has no sub-minute precision, used only by tests to
/// sanity-check `run_at` parsing.
#[cfg(test)]
pub(crate) fn is_whole_minute(time: NaiveTime) -> bool {
    time.second() == 0
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
