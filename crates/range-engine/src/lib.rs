//! # range-engine
//!
//! Deterministic time-range and time-grain resolution for metrics
//! dashboards.
//!
//! The engine turns a relative, declarative description of a time window
//! ("last 6 hours", "week to date", "anchored to the latest observed data
//! point") into a concrete, timezone-aware, half-open `[start, end)`
//! interval, and separately decides which aggregation bucket sizes
//! (minute through year) are usable and default for that interval.
//!
//! Everything is synchronous and pure: the wall clock is read at most once
//! per resolve call, by the caller, and injected through
//! [`ResolveContext`] — so every computation is reproducible in tests.
//!
//! ## Modules
//!
//! - [`duration`] — ISO-8601 duration codec and the closed [`Period`] set
//! - [`transform`] — ordered offset/truncation pipelines over zone-aware instants
//! - [`resolve`] — anchor resolution and range resolution
//! - [`grains`] — aggregation grain selection for resolved ranges
//! - [`catalog`] — named presets and bidirectional ISO-duration lookup
//! - [`error`] — error types

pub mod catalog;
pub mod duration;
pub mod error;
pub mod grains;
pub mod resolve;
pub mod transform;

pub use catalog::{PresetName, RangeCatalog};
pub use duration::{
    duration_to_millis, duration_to_period, period_to_duration, IsoDuration, Period,
};
pub use error::RangeError;
pub use grains::{
    allowed_grains, default_grain, grain_options, is_grain_bigger, TimeGrainOption,
};
pub use resolve::{
    resolve_point, resolve_range, resolve_reference, AllTimeRange, PointInTimeSpec, RangeKind,
    ReferencePoint, RelativePointInTime, ResolveContext, ResolvedTimeRange, TimeRangeSpec,
};
pub use transform::{
    apply_offset, apply_transforms, truncate_end, truncate_start, Offset, OffsetDirection,
    TimeTransform, Truncation, TruncationEdge,
};
