use crate::error::{HeatmapError, Result};
use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;
const WEEK_SECS: i64 = 604_800;

/// Start instant of one calendar bucket. Only [`PeriodPolicy`] produces these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(DateTime<Utc>);

impl PeriodKey {
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Short label used for column headers.
    pub fn label(&self, policy: PeriodPolicy) -> String {
        let format = match policy {
            PeriodPolicy::Hourly => "%Y-%m-%d %H:00",
            PeriodPolicy::Daily | PeriodPolicy::Weekly => "%Y-%m-%d",
            PeriodPolicy::Monthly => "%Y-%m",
            PeriodPolicy::Quarterly => {
                return format!("{}-Q{}", self.0.year(), self.0.month0() / 3 + 1);
            }
            PeriodPolicy::Yearly => "%Y",
        };
        self.0.format(format).to_string()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Calendar granularity used to bucket commit timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodPolicy {
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl PeriodPolicy {
    pub const ALL: [PeriodPolicy; 6] = [
        PeriodPolicy::Hourly,
        PeriodPolicy::Daily,
        PeriodPolicy::Weekly,
        PeriodPolicy::Monthly,
        PeriodPolicy::Quarterly,
        PeriodPolicy::Yearly,
    ];

    /// Identifier accepted on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            PeriodPolicy::Hourly => "hourly",
            PeriodPolicy::Daily => "daily",
            PeriodPolicy::Weekly => "weekly",
            PeriodPolicy::Monthly => "monthly",
            PeriodPolicy::Quarterly => "quarterly",
            PeriodPolicy::Yearly => "yearly",
        }
    }

    /// Plural display name, e.g. "Weeks".
    pub fn name(&self) -> &'static str {
        match self {
            PeriodPolicy::Hourly => "Hours",
            PeriodPolicy::Daily => "Days",
            PeriodPolicy::Weekly => "Weeks",
            PeriodPolicy::Monthly => "Months",
            PeriodPolicy::Quarterly => "Quarters",
            PeriodPolicy::Yearly => "Years",
        }
    }

    pub fn key(&self, timestamp: DateTime<Utc>) -> Result<PeriodKey> {
        self.canonicalize(timestamp, 0)
    }

    /// Truncate `timestamp` to the start of its period in UTC, then move
    /// `offset` whole periods forward (or backward when negative).
    ///
    /// Hours, days and weeks advance by fixed durations from the anchor.
    /// Weeks are anchored on the preceding Sunday. Months, quarters and
    /// years advance through a zero-based month index so offsets roll over
    /// year boundaries.
    pub fn canonicalize(&self, timestamp: DateTime<Utc>, offset: i64) -> Result<PeriodKey> {
        let key = match self {
            PeriodPolicy::Hourly => {
                hour_anchor(timestamp).and_then(|anchor| advance(anchor, offset, HOUR_SECS))
            }
            PeriodPolicy::Daily => {
                day_anchor(timestamp).and_then(|anchor| advance(anchor, offset, DAY_SECS))
            }
            PeriodPolicy::Weekly => {
                let back = i64::from(timestamp.weekday().num_days_from_sunday());
                day_anchor(timestamp)
                    .and_then(|day| advance(day, -back, DAY_SECS))
                    .and_then(|anchor| advance(anchor, offset, WEEK_SECS))
            }
            PeriodPolicy::Monthly => calendar(timestamp.year(), timestamp.month0(), offset, 1),
            PeriodPolicy::Quarterly => {
                calendar(timestamp.year(), timestamp.month0() / 3 * 3, offset, 3)
            }
            PeriodPolicy::Yearly => calendar(timestamp.year(), 0, offset, 12),
        };

        key.map(PeriodKey).ok_or_else(|| {
            HeatmapError::PeriodOutOfRange(format!(
                "{} offset by {} {}",
                timestamp.to_rfc3339(),
                offset,
                self.name().to_lowercase()
            ))
        })
    }

    /// Every period key from the one containing `first` up to `last`.
    pub fn enumerate(&self, first: DateTime<Utc>, last: DateTime<Utc>) -> Periods {
        Periods {
            policy: *self,
            first,
            last,
            offset: 0,
            done: false,
        }
    }
}

impl fmt::Display for PeriodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PeriodPolicy {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        PeriodPolicy::ALL
            .into_iter()
            .find(|policy| policy.id() == wanted)
            .ok_or_else(|| HeatmapError::UnsupportedPeriod(s.to_string()))
    }
}

/// Lazy, restartable enumeration returned by [`PeriodPolicy::enumerate`].
#[derive(Debug, Clone)]
pub struct Periods {
    policy: PeriodPolicy,
    first: DateTime<Utc>,
    last: DateTime<Utc>,
    offset: i64,
    done: bool,
}

impl Iterator for Periods {
    type Item = PeriodKey;

    fn next(&mut self) -> Option<PeriodKey> {
        if self.done {
            return None;
        }
        match self.policy.canonicalize(self.first, self.offset) {
            Ok(key) if key.0 <= self.last => {
                self.offset += 1;
                Some(key)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for Periods {}

fn hour_anchor(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    t.with_nanosecond(0)?.with_second(0)?.with_minute(0)
}

fn day_anchor(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    t.date_naive().and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

fn advance(anchor: DateTime<Utc>, periods: i64, period_secs: i64) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::try_seconds(periods.checked_mul(period_secs)?)?;
    anchor.checked_add_signed(delta)
}

fn calendar(year: i32, month0: u32, offset: i64, step: i64) -> Option<DateTime<Utc>> {
    let index = i64::from(month0).checked_add(offset.checked_mul(step)?)?;
    let year = i64::from(year).checked_add(index.div_euclid(12))?;
    let month = u32::try_from(index.rem_euclid(12) + 1).ok()?;
    Utc.with_ymd_and_hms(i32::try_from(year).ok()?, month, 1, 0, 0, 0)
        .single()
}
