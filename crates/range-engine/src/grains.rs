//! Aggregation grain selection for resolved time ranges.
//!
//! Given the width of a `[start, end)` interval, these functions decide
//! which calendar bucket sizes produce a chart-usable number of points.
//! The policy: a grain is usable when the interval holds between
//! [`MIN_CHART_BUCKETS`] and [`MAX_CHART_BUCKETS`] buckets of it, and never
//! finer than the floor the data source imposes.
//!
//! Everything here compares approximate magnitudes (30-day months, 365-day
//! years); actual bucket boundaries are the business of [`crate::transform`].

use serde::Serialize;

use crate::duration::{Period, MILLIS_PER_DAY, MILLIS_PER_HOUR};
use crate::error::{RangeError, Result};

/// Fewest buckets a chart can usefully draw.
pub const MIN_CHART_BUCKETS: f64 = 2.0;
/// Most buckets a chart can usefully draw.
pub const MAX_CHART_BUCKETS: f64 = 2500.0;

/// One entry of a grain picker: a period and whether it is usable for the
/// current range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeGrainOption {
    pub grain: Period,
    pub enabled: bool,
}

/// Whether `a` covers strictly more time than `b` (approximate magnitudes).
pub fn is_grain_bigger(a: Period, b: Period) -> bool {
    a.approx_millis() > b.approx_millis()
}

/// The default aggregation grain for an interval of the given width.
///
/// A monotonic step function: wider intervals never get a finer grain.
pub fn default_grain(duration_ms: i64) -> Period {
    if duration_ms < 2 * MILLIS_PER_HOUR {
        Period::Minute
    } else if duration_ms < 7 * MILLIS_PER_DAY {
        Period::Hour
    } else if duration_ms < 90 * MILLIS_PER_DAY {
        Period::Day
    } else if duration_ms < 3 * 365 * MILLIS_PER_DAY {
        Period::Week
    } else {
        Period::Month
    }
}

/// The set of reasonable grains for an interval of the given width, for
/// populating a grain picker. Same bands as [`default_grain`]; each band's
/// set contains its default. Never empty.
pub fn allowed_grains(duration_ms: i64) -> Vec<Period> {
    if duration_ms < 2 * MILLIS_PER_HOUR {
        vec![Period::Minute]
    } else if duration_ms < 7 * MILLIS_PER_DAY {
        vec![Period::Minute, Period::Hour]
    } else if duration_ms < 90 * MILLIS_PER_DAY {
        vec![Period::Hour, Period::Day, Period::Week]
    } else if duration_ms < 3 * 365 * MILLIS_PER_DAY {
        vec![Period::Day, Period::Week, Period::Month]
    } else {
        vec![Period::Week, Period::Month, Period::Quarter, Period::Year]
    }
}

/// Grain options for every supported period, each flagged usable or not.
///
/// A period is enabled when the interval holds between 2 and 2500 buckets of
/// it, and — when `min_grain` is given — the period is at least as coarse as
/// that floor.
///
/// # Errors
///
/// Returns [`RangeError::NoGrainsAvailable`] if no period qualifies, which
/// signals a pathological (zero-length or absurdly long) range. No fallback
/// grain is substituted here; that decision belongs to the caller.
pub fn grain_options(duration_ms: i64, min_grain: Option<Period>) -> Result<Vec<TimeGrainOption>> {
    let options: Vec<TimeGrainOption> = Period::ALL
        .iter()
        .map(|&period| {
            let bucket_count = duration_ms as f64 / period.approx_millis() as f64;
            let fits_chart =
                (MIN_CHART_BUCKETS..=MAX_CHART_BUCKETS).contains(&bucket_count);
            let above_floor = min_grain.is_none_or(|floor| !is_grain_bigger(floor, period));
            TimeGrainOption {
                grain: period,
                enabled: fits_chart && above_floor,
            }
        })
        .collect();

    if options.iter().all(|option| !option.enabled) {
        return Err(RangeError::NoGrainsAvailable(format!(
            "no grain yields a usable bucket count for a {duration_ms} ms range"
        )));
    }
    Ok(options)
}

// ── Tests ───────────────────────────────────────────────────────────────────
