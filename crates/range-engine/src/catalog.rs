//! Named time-range presets and bidirectional ISO-duration lookup.
//!
//! The catalog is an immutable registry built once at startup
//! ([`RangeCatalog::with_defaults`]) and passed explicitly to whatever
//! resolves ranges — there is no module-level state. Fixed-lookback presets
//! carry an ISO-8601 duration and participate in the duration⇄name lookup;
//! period-to-date presets and "all time" are addressed by name only.
//!
//! Every "last N" preset ends at the truncated start of the unit *after* the
//! anchor, so the resolved interval is half-open and a bucket never
//! straddles the boundary: the end chain is always "+1 unit, truncate".

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::duration::{duration_to_millis, Period};
use crate::error::{RangeError, Result};
use crate::resolve::{
    resolve_range, AllTimeRange, PointInTimeSpec, RangeKind, ReferencePoint, RelativePointInTime,
    ResolveContext, ResolvedTimeRange, TimeRangeSpec,
};
use crate::transform::TimeTransform;

// ── Preset names ────────────────────────────────────────────────────────────

/// The closed set of catalog preset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PresetName {
    LastHour,
    LastSixHours,
    LastDay,
    Last2Days,
    Last5Days,
    LastWeek,
    Last2Weeks,
    Last30Days,
    Last60Days,
    LastYear,
    Today,
    WeekToDate,
    MonthToDate,
    YearToDate,
    AllTime,
}

impl PresetName {
    /// Every preset, in picker order.
    pub const ALL: [PresetName; 15] = [
        PresetName::LastHour,
        PresetName::LastSixHours,
        PresetName::LastDay,
        PresetName::Last2Days,
        PresetName::Last5Days,
        PresetName::LastWeek,
        PresetName::Last2Weeks,
        PresetName::Last30Days,
        PresetName::Last60Days,
        PresetName::LastYear,
        PresetName::Today,
        PresetName::WeekToDate,
        PresetName::MonthToDate,
        PresetName::YearToDate,
        PresetName::AllTime,
    ];

    /// Stable identifier, as used in URL state and dashboard config.
    pub fn as_str(self) -> &'static str {
        match self {
            PresetName::LastHour => "LAST_HOUR",
            PresetName::LastSixHours => "LAST_SIX_HOURS",
            PresetName::LastDay => "LAST_DAY",
            PresetName::Last2Days => "LAST_2_DAYS",
            PresetName::Last5Days => "LAST_5_DAYS",
            PresetName::LastWeek => "LAST_WEEK",
            PresetName::Last2Weeks => "LAST_2_WEEKS",
            PresetName::Last30Days => "LAST_30_DAYS",
            PresetName::Last60Days => "LAST_60_DAYS",
            PresetName::LastYear => "LAST_YEAR",
            PresetName::Today => "TODAY",
            PresetName::WeekToDate => "WEEK_TO_DATE",
            PresetName::MonthToDate => "MONTH_TO_DATE",
            PresetName::YearToDate => "YEAR_TO_DATE",
            PresetName::AllTime => "ALL_TIME",
        }
    }

    /// Human-readable label for pickers.
    pub fn label(self) -> &'static str {
        match self {
            PresetName::LastHour => "Last Hour",
            PresetName::LastSixHours => "Last 6 Hours",
            PresetName::LastDay => "Last Day",
            PresetName::Last2Days => "Last 2 Days",
            PresetName::Last5Days => "Last 5 Days",
            PresetName::LastWeek => "Last Week",
            PresetName::Last2Weeks => "Last 2 Weeks",
            PresetName::Last30Days => "Last 30 Days",
            PresetName::Last60Days => "Last 60 Days",
            PresetName::LastYear => "Last Year",
            PresetName::Today => "Today",
            PresetName::WeekToDate => "Week to Date",
            PresetName::MonthToDate => "Month to Date",
            PresetName::YearToDate => "Year to Date",
            PresetName::AllTime => "All Time",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetName {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self> {
        PresetName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RangeError::UnknownPreset(format!("'{s}'")))
    }
}

// ── Catalog ─────────────────────────────────────────────────────────────────

/// Immutable registry of named time-range presets.
#[derive(Debug, Clone)]
pub struct RangeCatalog {
    entries: Vec<(PresetName, TimeRangeSpec)>,
}

impl RangeCatalog {
    /// The default preset table.
    ///
    /// Fixed-lookback presets anchor to the latest observed data point;
    /// period-to-date presets anchor to `min(latest data, now)`.
    pub fn with_defaults() -> Self {
        let entries = vec![
            offset_anchored(PresetName::LastHour, "PT1H", Period::Hour, None),
            offset_anchored(PresetName::LastSixHours, "PT6H", Period::Hour, Some("PT5H")),
            offset_anchored(PresetName::LastDay, "P1D", Period::Hour, Some("PT23H")),
            offset_anchored(PresetName::Last2Days, "P2D", Period::Day, Some("P1D")),
            offset_anchored(PresetName::Last5Days, "P5D", Period::Day, Some("P4D")),
            offset_anchored(PresetName::LastWeek, "P1W", Period::Day, Some("P6D")),
            offset_anchored(PresetName::Last2Weeks, "P2W", Period::Day, Some("P13D")),
            offset_anchored(PresetName::Last30Days, "P30D", Period::Day, Some("P29D")),
            offset_anchored(PresetName::Last60Days, "P60D", Period::Day, Some("P59D")),
            offset_anchored(PresetName::LastYear, "P1Y", Period::Month, Some("P11M")),
            period_anchored(PresetName::Today, Period::Day),
            period_anchored(PresetName::WeekToDate, Period::Week),
            period_anchored(PresetName::MonthToDate, Period::Month),
            period_anchored(PresetName::YearToDate, Period::Year),
            (
                PresetName::AllTime,
                TimeRangeSpec {
                    label: PresetName::AllTime.label().to_string(),
                    kind: RangeKind::AllTime,
                    iso_duration: None,
                    start: None,
                    end: None,
                },
            ),
        ];
        RangeCatalog { entries }
    }

    /// Look up a preset's spec.
    pub fn get(&self, name: PresetName) -> Option<&TimeRangeSpec> {
        self.entries
            .iter()
            .find(|(entry_name, _)| *entry_name == name)
            .map(|(_, spec)| spec)
    }

    /// All preset names, in picker order.
    pub fn names(&self) -> impl Iterator<Item = PresetName> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// The ISO-8601 duration of a fixed-lookback preset. Period-to-date
    /// presets and "all time" have none.
    pub fn to_iso_duration(&self, name: PresetName) -> Option<&str> {
        self.get(name).and_then(|spec| spec.iso_duration.as_deref())
    }

    /// The preset for an ISO-8601 duration. Unrecognized durations fall back
    /// to [`PresetName::AllTime`] — dashboard configs may carry a default
    /// duration that matches no preset, and those render as the full span.
    pub fn from_iso_duration(&self, duration: &str) -> PresetName {
        self.entries
            .iter()
            .find(|(_, spec)| spec.iso_duration.as_deref() == Some(duration))
            .map(|(name, _)| *name)
            .unwrap_or(PresetName::AllTime)
    }

    /// The presets worth offering for a dataset with the given observed
    /// span. A fixed lookback longer than the dataset is hidden;
    /// period-to-date presets and "all time" are always offered.
    pub fn selectable_names(&self, all_time: &AllTimeRange) -> Vec<PresetName> {
        let span_ms = (all_time.end - all_time.start).num_milliseconds();
        self.entries
            .iter()
            .filter(|(_, spec)| match &spec.iso_duration {
                Some(iso) => duration_to_millis(iso).map_or(false, |ms| ms <= span_ms),
                None => true,
            })
            .map(|(name, _)| *name)
            .collect()
    }

    /// Resolve a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownPreset`] if the catalog has no such
    /// entry; otherwise propagates from [`resolve_range`].
    pub fn resolve(
        &self,
        name: PresetName,
        ctx: &ResolveContext,
        all_time: Option<&AllTimeRange>,
    ) -> Result<ResolvedTimeRange> {
        let spec = self
            .get(name)
            .ok_or_else(|| RangeError::UnknownPreset(format!("'{name}'")))?;
        resolve_range(spec, ctx, all_time)
    }
}

// ── Preset builders ─────────────────────────────────────────────────────────

/// A fixed-lookback preset anchored to the latest data point.
///
/// Start: truncate the anchor to `unit`, then step back `lookback`.
/// End: advance one `unit` past the anchor, then truncate — the exclusive
/// next-unit boundary.
fn offset_anchored(
    name: PresetName,
    iso_duration: &str,
    unit: Period,
    lookback: Option<&str>,
) -> (PresetName, TimeRangeSpec) {
    let mut start_ops = vec![TimeTransform::start_of(unit)];
    if let Some(lookback) = lookback {
        start_ops.push(TimeTransform::subtract(lookback));
    }
    let end_ops = vec![
        TimeTransform::add(unit.iso_duration()),
        TimeTransform::start_of(unit),
    ];

    (
        name,
        TimeRangeSpec {
            label: name.label().to_string(),
            kind: RangeKind::OffsetAnchored,
            iso_duration: Some(iso_duration.to_string()),
            start: Some(PointInTimeSpec::Relative(RelativePointInTime::new(
                ReferencePoint::LatestData,
                start_ops,
            ))),
            end: Some(PointInTimeSpec::Relative(RelativePointInTime::new(
                ReferencePoint::LatestData,
                end_ops,
            ))),
        },
    )
}

/// A period-to-date preset anchored to `min(latest data, now)`.
///
/// Start: truncate the anchor to `period`. End: the start of the day after
/// the anchor, so the window covers the anchor's whole (partial) day.
fn period_anchored(name: PresetName, period: Period) -> (PresetName, TimeRangeSpec) {
    (
        name,
        TimeRangeSpec {
            label: name.label().to_string(),
            kind: RangeKind::PeriodAnchored,
            iso_duration: None,
            start: Some(PointInTimeSpec::Relative(RelativePointInTime::new(
                ReferencePoint::MinOfLatestDataAndNow,
                vec![TimeTransform::start_of(period)],
            ))),
            end: Some(PointInTimeSpec::Relative(RelativePointInTime::new(
                ReferencePoint::MinOfLatestDataAndNow,
                vec![
                    TimeTransform::add("P1D"),
                    TimeTransform::start_of(Period::Day),
                ],
            ))),
        },
    )
}

// ── Tests ───────────────────────────────────────────────────────────────────
