// File: ./src/model/recurrence.rs
use crate::model::reminder::RepeatRule;
use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDateTime, TimeZone};

#[derive(Debug, Clone, Copy)]
enum Period {
    Days(u32),
    Months(u32),
}

pub struct RecurrenceEngine;

impl RecurrenceEngine {
    /// First occurrence of `anchor` under `rule` that is at or after `now`.
    ///
    /// - `RepeatRule::None`: the anchor itself while it is still ahead of
    ///   `now`, `None` once it has passed.
    /// - Repeating rules: `anchor + k * period` for the smallest `k >= 0`
    ///   reaching `now`. Every candidate is computed from the anchor, so a
    ///   monthly reminder on the 31st lands on the last day of short months
    ///   and returns to the 31st afterwards.
    /// - `RepeatRule::Invalid`: always `None`.
    ///
    /// Arithmetic happens on the wall clock of `Tz`, which keeps the time of
    /// day stable across DST transitions.
    pub fn next_occurrence<Tz: TimeZone>(
        anchor: &DateTime<Tz>,
        rule: &RepeatRule,
        now: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let period = match rule {
            RepeatRule::None => return (anchor > now).then(|| anchor.clone()),
            RepeatRule::Daily => Period::Days(1),
            RepeatRule::Weekly => Period::Days(7),
            RepeatRule::Monthly => Period::Months(1),
            RepeatRule::Invalid(_) => return None,
        };

        if anchor >= now {
            return Some(anchor.clone());
        }

        let mut step = Self::skip_ahead(anchor, now, period);
        loop {
            let candidate = Self::shift(anchor, period, step)?;
            if candidate >= *now {
                return Some(candidate);
            }
            step = step.checked_add(1)?;
        }
    }

    /// Number of whole periods that certainly lie before `now`, minus one,
    /// so the stepping loop only runs a couple of times for old anchors.
    fn skip_ahead<Tz: TimeZone>(anchor: &DateTime<Tz>, now: &DateTime<Tz>, period: Period) -> u32 {
        let a = anchor.naive_local();
        let n = now.naive_local();
        let elapsed = match period {
            Period::Days(days) => (n - a).num_days() / i64::from(days),
            Period::Months(months) => {
                let diff = (i64::from(n.year()) - i64::from(a.year())) * 12
                    + i64::from(n.month())
                    - i64::from(a.month());
                diff / i64::from(months)
            }
        };
        (elapsed - 1).clamp(1, i64::from(u32::MAX)) as u32
    }

    fn shift<Tz: TimeZone>(anchor: &DateTime<Tz>, period: Period, steps: u32) -> Option<DateTime<Tz>> {
        let base = anchor.naive_local();
        let shifted = match period {
            Period::Days(days) => {
                base.checked_add_days(Days::new(u64::from(days) * u64::from(steps)))?
            }
            // chrono clamps to the last day of the target month.
            Period::Months(months) => base.checked_add_months(Months::new(months.checked_mul(steps)?))?,
        };
        Self::resolve_local(&anchor.timezone(), &shifted)
    }

    /// Maps a wall-clock time back into `tz`. Ambiguous times take the
    /// earlier instant, times inside a DST gap move one hour later.
    fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
        tz.from_local_datetime(naive).earliest().or_else(|| {
            let later = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&later).earliest()
        })
    }
}
