//! ISO-8601 duration codec and the closed set of calendar periods.
//!
//! A [`Period`] is one of the seven calendar units a dashboard can bucket by.
//! Each period has exactly one canonical ISO-8601 duration literal and an
//! approximate millisecond magnitude (month = 30 days, quarter = 90 days,
//! year = 365 days). The approximations are used for magnitude comparisons
//! and bucket counting only — calendar truncation and offset arithmetic in
//! [`crate::transform`] always use true month/year lengths.

use serde::Serialize;

use crate::error::{RangeError, Result};

pub(crate) const MILLIS_PER_SECOND: i64 = 1_000;
pub(crate) const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub(crate) const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub(crate) const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// A calendar bucket unit, smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Period {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Every supported period, ordered smallest to largest. Iteration over
    /// periods always goes through this table.
    pub const ALL: [Period; 7] = [
        Period::Minute,
        Period::Hour,
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Quarter,
        Period::Year,
    ];

    /// The canonical ISO-8601 duration literal for one unit of this period.
    pub fn iso_duration(self) -> &'static str {
        match self {
            Period::Minute => "PT1M",
            Period::Hour => "PT1H",
            Period::Day => "P1D",
            Period::Week => "P1W",
            Period::Month => "P1M",
            Period::Quarter => "P3M",
            Period::Year => "P1Y",
        }
    }

    /// Lowercase display label (e.g. for a grain picker).
    pub fn label(self) -> &'static str {
        match self {
            Period::Minute => "minute",
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Approximate width in milliseconds, for magnitude comparison and
    /// bucket counting. Months are 30 days, quarters 90, years 365.
    pub fn approx_millis(self) -> i64 {
        match self {
            Period::Minute => MILLIS_PER_MINUTE,
            Period::Hour => MILLIS_PER_HOUR,
            Period::Day => MILLIS_PER_DAY,
            Period::Week => 7 * MILLIS_PER_DAY,
            Period::Month => 30 * MILLIS_PER_DAY,
            Period::Quarter => 90 * MILLIS_PER_DAY,
            Period::Year => 365 * MILLIS_PER_DAY,
        }
    }
}

/// The canonical ISO-8601 duration for a period. Total over all periods.
pub fn period_to_duration(period: Period) -> &'static str {
    period.iso_duration()
}

/// The period for a canonical ISO-8601 duration literal.
///
/// Only the seven canonical literals (`PT1M`, `PT1H`, `P1D`, `P1W`, `P1M`,
/// `P3M`, `P1Y`) map to a period. Any other duration — well-formed or not —
/// has no period and returns `None`.
pub fn duration_to_period(duration: &str) -> Option<Period> {
    Period::ALL
        .iter()
        .copied()
        .find(|p| p.iso_duration() == duration)
}

/// Approximate length of an ISO-8601 duration in milliseconds.
///
/// # Errors
///
/// Returns [`RangeError::InvalidDuration`] if the string is not a
/// well-formed ISO-8601 duration.
pub fn duration_to_millis(duration: &str) -> Result<i64> {
    Ok(IsoDuration::parse(duration)?.approx_millis())
}

/// Parsed components of an ISO-8601 duration (`P[nY][nM][nW][nD][T[nH][nM][nS]]`).
///
/// Components are non-negative integers; signs and fractions are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IsoDuration {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl IsoDuration {
    /// Parse an ISO-8601 duration string.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidDuration`] for anything that is not a
    /// well-formed duration: missing `P`, no components, a number without a
    /// unit, a unit without a number, an unknown designator, or a time
    /// designator (`H`, `S`) in the date part.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let rest = s.strip_prefix('P').ok_or_else(|| {
            RangeError::InvalidDuration(format!("duration must start with 'P': '{s}'"))
        })?;

        let mut parsed = IsoDuration::default();
        let mut num_buf = String::new();
        let mut in_time = false;
        let mut found_any = false;

        for ch in rest.chars() {
            if ch.is_ascii_digit() {
                num_buf.push(ch);
                continue;
            }
            if ch == 'T' {
                if in_time || !num_buf.is_empty() {
                    return Err(RangeError::InvalidDuration(format!(
                        "misplaced 'T' in '{s}'"
                    )));
                }
                in_time = true;
                continue;
            }

            if num_buf.is_empty() {
                return Err(RangeError::InvalidDuration(format!(
                    "expected number before '{ch}' in '{s}'"
                )));
            }
            let n: i64 = num_buf
                .parse()
                .map_err(|_| RangeError::InvalidDuration(format!("invalid number in '{s}'")))?;
            num_buf.clear();
            found_any = true;

            match (ch, in_time) {
                ('Y', false) => parsed.years += n,
                ('M', false) => parsed.months += n,
                ('W', false) => parsed.weeks += n,
                ('D', false) => parsed.days += n,
                ('H', true) => parsed.hours += n,
                ('M', true) => parsed.minutes += n,
                ('S', true) => parsed.seconds += n,
                _ => {
                    return Err(RangeError::InvalidDuration(format!(
                        "unknown designator '{ch}' in '{s}'"
                    )));
                }
            }
        }

        if !num_buf.is_empty() {
            return Err(RangeError::InvalidDuration(format!(
                "number without designator at end of '{s}'"
            )));
        }
        if !found_any {
            return Err(RangeError::InvalidDuration(format!(
                "duration has no components: '{s}'"
            )));
        }

        Ok(parsed)
    }

    /// Approximate length in milliseconds (30-day months, 365-day years).
    pub fn approx_millis(&self) -> i64 {
        self.seconds * MILLIS_PER_SECOND
            + self.minutes * MILLIS_PER_MINUTE
            + self.hours * MILLIS_PER_HOUR
            + self.days * MILLIS_PER_DAY
            + self.weeks * 7 * MILLIS_PER_DAY
            + self.months * 30 * MILLIS_PER_DAY
            + self.years * 365 * MILLIS_PER_DAY
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_components() {
        let d = IsoDuration::parse("PT6H").unwrap();
        assert_eq!(d.hours, 6);
        assert_eq!(d.approx_millis(), 6 * MILLIS_PER_HOUR);
    }

    #[test]
    fn test_parse_date_components() {
        let d = IsoDuration::parse("P1Y2M3W4D").unwrap();
        assert_eq!(d.years, 1);
        assert_eq!(d.months, 2);
        assert_eq!(d.weeks, 3);
        assert_eq!(d.days, 4);
    }

    #[test]
    fn test_parse_mixed_date_and_time() {
        let d = IsoDuration::parse("P1DT12H30M").unwrap();
        assert_eq!(d.days, 1);
        assert_eq!(d.hours, 12);
        assert_eq!(d.minutes, 30);
        assert_eq!(
            d.approx_millis(),
            MILLIS_PER_DAY + 12 * MILLIS_PER_HOUR + 30 * MILLIS_PER_MINUTE
        );
    }

    #[test]
    fn test_parse_month_vs_minute() {
        // 'M' means months before 'T' and minutes after it
        assert_eq!(IsoDuration::parse("P1M").unwrap().months, 1);
        assert_eq!(IsoDuration::parse("PT1M").unwrap().minutes, 1);
    }

    #[test]
    fn test_parse_rejects_missing_p() {
        assert!(IsoDuration::parse("6H").is_err());
        assert!(IsoDuration::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_duration() {
        assert!(IsoDuration::parse("P").is_err());
        assert!(IsoDuration::parse("PT").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_number() {
        let err = IsoDuration::parse("P3").unwrap_err();
        assert!(err.to_string().contains("without designator"), "got: {err}");
    }

    #[test]
    fn test_parse_rejects_time_unit_in_date_part() {
        assert!(IsoDuration::parse("P6H").is_err());
        assert!(IsoDuration::parse("P30S").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_designator() {
        assert!(IsoDuration::parse("P1X").is_err());
        assert!(IsoDuration::parse("PT1D").is_err());
    }

    #[test]
    fn test_parse_rejects_misplaced_t() {
        assert!(IsoDuration::parse("P1TT1H").is_err());
        assert!(IsoDuration::parse("P1T1H").is_err());
    }

    #[test]
    fn test_duration_to_millis_approximations() {
        assert_eq!(duration_to_millis("P1M").unwrap(), 30 * MILLIS_PER_DAY);
        assert_eq!(duration_to_millis("P1Y").unwrap(), 365 * MILLIS_PER_DAY);
        assert_eq!(duration_to_millis("P1W").unwrap(), 7 * MILLIS_PER_DAY);
        assert_eq!(duration_to_millis("PT1H").unwrap(), MILLIS_PER_HOUR);
    }

    #[test]
    fn test_period_duration_bijection() {
        for period in Period::ALL {
            let iso = period_to_duration(period);
            assert_eq!(duration_to_period(iso), Some(period), "{iso}");
        }
    }

    #[test]
    fn test_duration_to_period_unknown_is_none() {
        // Well-formed but non-canonical durations have no period
        assert_eq!(duration_to_period("P5D"), None);
        assert_eq!(duration_to_period("PT60M"), None);
        // Malformed input is also a lookup miss, not an error
        assert_eq!(duration_to_period("hello"), None);
    }

    #[test]
    fn test_period_order_is_by_magnitude() {
        for pair in Period::ALL.windows(2) {
            assert!(pair[0].approx_millis() < pair[1].approx_millis());
        }
    }
}
