//! Ordered offset/truncation pipelines over zone-aware instants.
//!
//! A transformation pipeline is a sequence of steps applied left to right,
//! each step consuming the previous step's output. A step either shifts the
//! accumulator by a signed ISO-8601 duration ([`Offset`]) or snaps it to a
//! calendar boundary ([`Truncation`]). All arithmetic happens on the
//! wall clock of whatever timezone the input instant carries — the pipeline
//! itself assumes neither UTC nor a local zone.
//!
//! Offsets are calendar-aware: adding `P1M` to January 31 lands on the last
//! valid day of February, and day-level shifts preserve the local time of
//! day across DST transitions. A shift or truncation whose wall-clock result
//! does not exist (spring-forward gap) or is ambiguous (fall-back fold)
//! returns an error rather than picking a side.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::Serialize;

use crate::duration::{IsoDuration, Period};
use crate::error::{RangeError, Result};

// ── Transformation model ────────────────────────────────────────────────────

/// Whether an offset moves the accumulator forward or backward in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OffsetDirection {
    Add,
    Subtract,
}

/// Which edge of a calendar period a truncation snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TruncationEdge {
    /// The first instant of the period containing the input.
    StartOfPeriod,
    /// The last millisecond of the period containing the input.
    EndOfPeriod,
}

/// Shift the accumulator by a signed ISO-8601 duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offset {
    pub duration: String,
    pub direction: OffsetDirection,
}

/// Snap the accumulator to a calendar boundary of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub period: Period,
    pub edge: TruncationEdge,
}

/// One pipeline step. Order within a pipeline is semantically significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TimeTransform {
    Offset(Offset),
    Truncate(Truncation),
}

impl TimeTransform {
    /// An offset step that advances by `duration`.
    pub fn add(duration: &str) -> Self {
        TimeTransform::Offset(Offset {
            duration: duration.to_string(),
            direction: OffsetDirection::Add,
        })
    }

    /// An offset step that retreats by `duration`.
    pub fn subtract(duration: &str) -> Self {
        TimeTransform::Offset(Offset {
            duration: duration.to_string(),
            direction: OffsetDirection::Subtract,
        })
    }

    /// A truncation step snapping to the start of `period`.
    pub fn start_of(period: Period) -> Self {
        TimeTransform::Truncate(Truncation {
            period,
            edge: TruncationEdge::StartOfPeriod,
        })
    }

    /// A truncation step snapping to the last millisecond of `period`.
    pub fn end_of(period: Period) -> Self {
        TimeTransform::Truncate(Truncation {
            period,
            edge: TruncationEdge::EndOfPeriod,
        })
    }
}

// ── Pipeline application ────────────────────────────────────────────────────

/// Fold a transformation pipeline over `start`, left to right.
///
/// # Errors
///
/// Returns [`RangeError::InvalidDuration`] if an offset carries a malformed
/// duration, or [`RangeError::InvalidDatetime`] if a step produces a
/// wall-clock value that does not exist or is ambiguous in the zone.
pub fn apply_transforms(start: DateTime<Tz>, ops: &[TimeTransform]) -> Result<DateTime<Tz>> {
    ops.iter().try_fold(start, |acc, op| match op {
        TimeTransform::Offset(offset) => apply_offset(acc, &offset.duration, offset.direction),
        TimeTransform::Truncate(trunc) => match trunc.edge {
            TruncationEdge::StartOfPeriod => truncate_start(trunc.period, acc),
            TruncationEdge::EndOfPeriod => truncate_end(trunc.period, acc),
        },
    })
}

/// Shift `dt` by an ISO-8601 duration in the given direction.
pub fn apply_offset(
    dt: DateTime<Tz>,
    duration: &str,
    direction: OffsetDirection,
) -> Result<DateTime<Tz>> {
    let parsed = IsoDuration::parse(duration)?;
    let sign = match direction {
        OffsetDirection::Add => 1,
        OffsetDirection::Subtract => -1,
    };
    shift_by(dt, &parsed, sign)
}

/// Apply duration components to `dt` with `sign` = +1 or -1.
///
/// Year/month components use true calendar months (clamping to the last
/// valid day of the target month), week/day components move the wall-clock
/// date so the local time of day survives DST transitions, and sub-day
/// components are plain absolute-time arithmetic.
fn shift_by(dt: DateTime<Tz>, d: &IsoDuration, sign: i64) -> Result<DateTime<Tz>> {
    let months = sign * (d.years * 12 + d.months);
    let days = sign * (d.weeks * 7 + d.days);

    let shifted = if months != 0 || days != 0 {
        let mut date = dt.date_naive();
        if months != 0 {
            date = shift_months(date, months)?;
        }
        date = date
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| RangeError::InvalidDatetime(format!("date out of range: {date}")))?;
        from_local(&dt.timezone(), date.and_time(dt.time()))?
    } else {
        dt
    };

    let sub_day_seconds = sign * (d.hours * 3600 + d.minutes * 60 + d.seconds);
    Ok(shifted + Duration::seconds(sub_day_seconds))
}

fn shift_months(date: NaiveDate, months: i64) -> Result<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map_err(|_| RangeError::InvalidDuration(format!("month count out of range: {months}")))?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| RangeError::InvalidDatetime(format!("date out of range: {date}")))
}

// ── Truncation ──────────────────────────────────────────────────────────────

/// Snap `dt` to the first instant of the period containing it.
///
/// Weeks start on Monday (ISO 8601), regardless of locale. Quarters start
/// in January, April, July, and October.
pub fn truncate_start(period: Period, dt: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let date = dt.date_naive();
    let naive = match period {
        Period::Minute => date.and_hms_opt(dt.hour(), dt.minute(), 0),
        Period::Hour => date.and_hms_opt(dt.hour(), 0, 0),
        Period::Day => date.and_hms_opt(0, 0, 0),
        Period::Week => {
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.and_hms_opt(0, 0, 0)
        }
        Period::Month => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Period::Quarter => {
            let quarter_start_month = ((date.month() - 1) / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), quarter_start_month, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    }
    .ok_or_else(|| RangeError::InvalidDatetime(format!("cannot truncate {dt}")))?;

    from_local(&dt.timezone(), naive)
}

/// Snap `dt` to the last millisecond within the period containing it.
///
/// Computed as the start of the *next* period minus one millisecond, so the
/// result and the next period's start never overlap.
pub fn truncate_end(period: Period, dt: DateTime<Tz>) -> Result<DateTime<Tz>> {
    Ok(next_period_start(period, dt)? - Duration::milliseconds(1))
}

/// The first instant of the period after the one containing `dt`.
pub fn next_period_start(period: Period, dt: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let start = truncate_start(period, dt)?;
    shift_by(start, &one_unit(period), 1)
}

fn one_unit(period: Period) -> IsoDuration {
    let mut d = IsoDuration::default();
    match period {
        Period::Minute => d.minutes = 1,
        Period::Hour => d.hours = 1,
        Period::Day => d.days = 1,
        Period::Week => d.weeks = 1,
        Period::Month => d.months = 1,
        Period::Quarter => d.months = 3,
        Period::Year => d.years = 1,
    }
    d
}

/// Resolve a wall-clock value in a zone, failing on DST gaps and folds.
fn from_local(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    tz.from_local_datetime(&naive).single().ok_or_else(|| {
        RangeError::InvalidDatetime(format!(
            "ambiguous or nonexistent local time {naive} in {tz}"
        ))
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
