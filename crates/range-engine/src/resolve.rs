//! Anchor and range resolution.
//!
//! Turns a declarative [`TimeRangeSpec`] into a concrete, timezone-aware,
//! half-open `[start, end)` interval. Each endpoint is either a literal
//! RFC 3339 datetime or a [`RelativePointInTime`]: a reference anchor plus a
//! transformation pipeline. Start and end resolve independently — they may
//! use different anchors and different pipelines.
//!
//! All functions take explicit inputs. The wall clock is never read here;
//! callers capture "now" once per top-level resolve call (see
//! [`ResolveContext::sampled`]) so that start/end pairs computed in the same
//! call stay mutually consistent.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::duration::Period;
use crate::error::{RangeError, Result};
use crate::grains;
use crate::transform::{apply_transforms, TimeTransform};

// ── Anchors ─────────────────────────────────────────────────────────────────

/// A named reference moment from which relative ranges are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferencePoint {
    /// The wall-clock instant captured in the [`ResolveContext`].
    Now,
    /// The most recent observed event time for the active dataset.
    LatestData,
    /// Whichever of the two is earlier. Period-to-date presets anchor here
    /// so a dataset carrying future-dated events never produces a window
    /// beyond the wall clock.
    MinOfLatestDataAndNow,
}

/// Inputs for one resolve call: the captured clock, the dataset's latest
/// observed timestamp, and the zone all truncation happens in.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub now: DateTime<Utc>,
    pub latest_data: DateTime<Utc>,
    pub timezone: Tz,
}

impl ResolveContext {
    pub fn new(now: DateTime<Utc>, latest_data: DateTime<Utc>, timezone: Tz) -> Self {
        ResolveContext {
            now,
            latest_data,
            timezone,
        }
    }

    /// Build a context from an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidTimezone`] if the name is not a valid
    /// IANA timezone.
    pub fn with_timezone_name(
        now: DateTime<Utc>,
        latest_data: DateTime<Utc>,
        timezone: &str,
    ) -> Result<Self> {
        let tz = timezone
            .parse::<Tz>()
            .map_err(|_| RangeError::InvalidTimezone(format!("'{timezone}'")))?;
        Ok(ResolveContext::new(now, latest_data, tz))
    }

    /// Capture the wall clock once and build a context from it. This is the
    /// engine's only clock read; everything downstream of the returned
    /// context is deterministic.
    pub fn sampled(latest_data: DateTime<Utc>, timezone: Tz) -> Self {
        ResolveContext::new(Utc::now(), latest_data, timezone)
    }
}

/// Resolve a reference point to a concrete instant. Pure.
pub fn resolve_reference(reference: ReferencePoint, ctx: &ResolveContext) -> DateTime<Utc> {
    match reference {
        ReferencePoint::Now => ctx.now,
        ReferencePoint::LatestData => ctx.latest_data,
        ReferencePoint::MinOfLatestDataAndNow => ctx.now.min(ctx.latest_data),
    }
}

// ── Range specification ─────────────────────────────────────────────────────

/// An anchor plus an ordered transformation pipeline, describing one
/// boundary (start or end) of a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelativePointInTime {
    pub reference: ReferencePoint,
    pub transformation: Vec<TimeTransform>,
}

impl RelativePointInTime {
    pub fn new(reference: ReferencePoint, transformation: Vec<TimeTransform>) -> Self {
        RelativePointInTime {
            reference,
            transformation,
        }
    }
}

/// One boundary of a range: a literal RFC 3339 datetime or a relative point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PointInTimeSpec {
    Absolute(String),
    Relative(RelativePointInTime),
}

/// How a catalog entry derives its boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RangeKind {
    /// A fixed lookback window offset from an anchor ("last 6 hours").
    OffsetAnchored,
    /// From the start of the anchor's current period ("month to date").
    PeriodAnchored,
    /// The dataset's full observed span, supplied externally.
    AllTime,
    /// Literal start/end datetimes.
    FixedRange,
}

/// A declarative time-range specification.
///
/// `iso_duration` is present exactly for the fixed-duration presets; it is
/// what the catalog's bidirectional duration lookup operates on. `AllTime`
/// specs omit both boundaries — the dataset's observed bounds are passed to
/// [`resolve_range`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRangeSpec {
    pub label: String,
    pub kind: RangeKind,
    pub iso_duration: Option<String>,
    pub start: Option<PointInTimeSpec>,
    pub end: Option<PointInTimeSpec>,
}

/// The dataset's full observed span, supplied by the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllTimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A concrete, half-open `[start, end)` interval. `end` is exclusive: a
/// bucket covering `end` itself never appears in results. `grain` is the
/// default aggregation grain for the interval's width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTimeRange {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub grain: Option<Period>,
}

impl ResolvedTimeRange {
    /// Interval width in milliseconds.
    pub fn duration_millis(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}

// ── Resolution ──────────────────────────────────────────────────────────────

/// Resolve one boundary spec to a concrete instant.
pub fn resolve_point(point: &PointInTimeSpec, ctx: &ResolveContext) -> Result<DateTime<Utc>> {
    match point {
        PointInTimeSpec::Absolute(s) => parse_rfc3339(s),
        PointInTimeSpec::Relative(rel) => {
            let anchor = resolve_reference(rel.reference, ctx).with_timezone(&ctx.timezone);
            let resolved = apply_transforms(anchor, &rel.transformation)?;
            Ok(resolved.with_timezone(&Utc))
        }
    }
}

/// Resolve a range spec to a concrete `[start, end)` interval.
///
/// `AllTime` specs return `all_time` verbatim; every other kind resolves its
/// start and end boundary specs independently.
///
/// # Errors
///
/// Returns [`RangeError::InvalidRange`] if a required boundary (or the
/// external all-time bounds) is missing or the resolved interval has
/// `start > end`; [`RangeError::InvalidDatetime`] /
/// [`RangeError::InvalidDuration`] propagate from boundary resolution.
pub fn resolve_range(
    spec: &TimeRangeSpec,
    ctx: &ResolveContext,
    all_time: Option<&AllTimeRange>,
) -> Result<ResolvedTimeRange> {
    let (start, end) = match spec.kind {
        RangeKind::AllTime => {
            let bounds = all_time.ok_or_else(|| {
                RangeError::InvalidRange(format!(
                    "'{}' requires externally supplied all-time bounds",
                    spec.label
                ))
            })?;
            (bounds.start, bounds.end)
        }
        RangeKind::OffsetAnchored | RangeKind::PeriodAnchored | RangeKind::FixedRange => {
            let start_spec = spec.start.as_ref().ok_or_else(|| {
                RangeError::InvalidRange(format!("'{}' has no start boundary", spec.label))
            })?;
            let end_spec = spec.end.as_ref().ok_or_else(|| {
                RangeError::InvalidRange(format!("'{}' has no end boundary", spec.label))
            })?;
            (
                resolve_point(start_spec, ctx)?,
                resolve_point(end_spec, ctx)?,
            )
        }
    };

    if start > end {
        return Err(RangeError::InvalidRange(format!(
            "'{}' resolved to start {} after end {}",
            spec.label, start, end
        )));
    }

    let grain = grains::default_grain((end - start).num_milliseconds());
    Ok(ResolvedTimeRange {
        name: spec.label.clone(),
        start,
        end,
        grain: Some(grain),
    })
}

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RangeError::InvalidDatetime(format!("'{s}': {e}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Period;
    use chrono::TimeZone;

    fn ctx() -> ResolveContext {
        ResolveContext::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            Tz::UTC,
        )
    }

    #[test]
    fn test_resolve_reference_now() {
        let c = ctx();
        assert_eq!(resolve_reference(ReferencePoint::Now, &c), c.now);
    }

    #[test]
    fn test_resolve_reference_latest_data() {
        let c = ctx();
        assert_eq!(
            resolve_reference(ReferencePoint::LatestData, &c),
            c.latest_data
        );
    }

    #[test]
    fn test_resolve_reference_min_picks_earlier() {
        let c = ctx();
        // latest data is earlier than now
        assert_eq!(
            resolve_reference(ReferencePoint::MinOfLatestDataAndNow, &c),
            c.latest_data
        );
        // future-dated data: now wins
        let future = ResolveContext::new(
            c.now,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Tz::UTC,
        );
        assert_eq!(
            resolve_reference(ReferencePoint::MinOfLatestDataAndNow, &future),
            future.now
        );
    }

    #[test]
    fn test_with_timezone_name_rejects_bad_zone() {
        let err =
            ResolveContext::with_timezone_name(ctx().now, ctx().latest_data, "Invalid/Zone")
                .unwrap_err();
        assert!(err.to_string().contains("Invalid timezone"), "got: {err}");
    }

    #[test]
    fn test_resolve_point_absolute() {
        let t = resolve_point(
            &PointInTimeSpec::Absolute("2023-06-15T10:00:00-04:00".to_string()),
            &ctx(),
        )
        .unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2023, 6, 15, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_point_absolute_malformed() {
        let err = resolve_point(
            &PointInTimeSpec::Absolute("not-a-datetime".to_string()),
            &ctx(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid datetime"), "got: {err}");
    }

    #[test]
    fn test_resolve_point_relative_pipeline() {
        // latest data truncated to its hour, then six hours back
        let point = PointInTimeSpec::Relative(RelativePointInTime::new(
            ReferencePoint::LatestData,
            vec![
                TimeTransform::start_of(Period::Hour),
                TimeTransform::subtract("PT6H"),
            ],
        ));
        let t = resolve_point(&point, &ctx()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_range_independent_boundaries() {
        // start anchored to latest data, end anchored to now — each with its
        // own pipeline
        let spec = TimeRangeSpec {
            label: "test".to_string(),
            kind: RangeKind::OffsetAnchored,
            iso_duration: None,
            start: Some(PointInTimeSpec::Relative(RelativePointInTime::new(
                ReferencePoint::LatestData,
                vec![TimeTransform::start_of(Period::Day)],
            ))),
            end: Some(PointInTimeSpec::Relative(RelativePointInTime::new(
                ReferencePoint::Now,
                vec![TimeTransform::start_of(Period::Hour)],
            ))),
        };
        let range = resolve_range(&spec, &ctx(), None).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_range_all_time_returns_bounds_verbatim() {
        let spec = TimeRangeSpec {
            label: "All Time".to_string(),
            kind: RangeKind::AllTime,
            iso_duration: None,
            start: None,
            end: None,
        };
        let bounds = AllTimeRange {
            start: Utc.with_ymd_and_hms(2020, 3, 7, 1, 2, 3).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        };
        let range = resolve_range(&spec, &ctx(), Some(&bounds)).unwrap();
        assert_eq!(range.start, bounds.start);
        assert_eq!(range.end, bounds.end);
    }

    #[test]
    fn test_resolve_range_all_time_requires_bounds() {
        let spec = TimeRangeSpec {
            label: "All Time".to_string(),
            kind: RangeKind::AllTime,
            iso_duration: None,
            start: None,
            end: None,
        };
        let err = resolve_range(&spec, &ctx(), None).unwrap_err();
        assert!(err.to_string().contains("all-time bounds"), "got: {err}");
    }

    #[test]
    fn test_resolve_range_missing_boundary() {
        let spec = TimeRangeSpec {
            label: "broken".to_string(),
            kind: RangeKind::FixedRange,
            iso_duration: None,
            start: Some(PointInTimeSpec::Absolute("2024-01-01T00:00:00Z".to_string())),
            end: None,
        };
        let err = resolve_range(&spec, &ctx(), None).unwrap_err();
        assert!(err.to_string().contains("no end boundary"), "got: {err}");
    }

    #[test]
    fn test_resolve_range_rejects_inverted_interval() {
        let spec = TimeRangeSpec {
            label: "inverted".to_string(),
            kind: RangeKind::FixedRange,
            iso_duration: None,
            start: Some(PointInTimeSpec::Absolute("2024-02-01T00:00:00Z".to_string())),
            end: Some(PointInTimeSpec::Absolute("2024-01-01T00:00:00Z".to_string())),
        };
        let err = resolve_range(&spec, &ctx(), None).unwrap_err();
        assert!(err.to_string().contains("after end"), "got: {err}");
    }

    #[test]
    fn test_resolve_range_attaches_default_grain() {
        let spec = TimeRangeSpec {
            label: "fixed week".to_string(),
            kind: RangeKind::FixedRange,
            iso_duration: None,
            start: Some(PointInTimeSpec::Absolute("2024-01-01T00:00:00Z".to_string())),
            end: Some(PointInTimeSpec::Absolute("2024-01-31T00:00:00Z".to_string())),
        };
        let range = resolve_range(&spec, &ctx(), None).unwrap();
        assert_eq!(range.grain, Some(Period::Day));
        assert_eq!(range.duration_millis(), 30 * 24 * 3600 * 1000);
    }

    #[test]
    fn test_resolved_range_serializes_rfc3339() {
        let range = ResolvedTimeRange {
            name: "test".to_string(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            grain: Some(Period::Hour),
        };
        let json = serde_json::to_value(&range).unwrap();
        assert_eq!(json["start"], "2024-01-01T00:00:00Z");
        assert_eq!(json["grain"], "Hour");
    }
}
