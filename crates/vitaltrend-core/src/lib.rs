#![deny(clippy::all)]

mod aggregator;
mod align;
mod calendar;
mod error;
mod freshness;
pub mod loader;
pub mod metrics;
mod normalize;
mod safe_json;

pub use aggregator::*;
pub use align::*;
pub use calendar::*;
pub use error::CoreError;
pub use freshness::*;
pub use loader::{load_dataset_file, load_exports, scan_all, scan_exports, LoadResult};
pub use metrics::MetricKind;
pub use normalize::*;
pub use safe_json::*;

use serde::Serialize;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Anything that sits on a single calendar day.
pub trait DatedRecord {
    fn date(&self) -> CalendarDate;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightRecord {
    pub date: CalendarDate,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateRecord {
    pub date: CalendarDate,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub date: CalendarDate,
    pub steps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepRecord {
    pub date: CalendarDate,
    #[serde(rename = "durationHours")]
    pub duration_hours: f64,
    pub quality: Option<SleepQuality>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SleepQuality {
    pub const ALL: [SleepQuality; 4] = [
        SleepQuality::Excellent,
        SleepQuality::Good,
        SleepQuality::Fair,
        SleepQuality::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepQuality::Excellent => "excellent",
            SleepQuality::Good => "good",
            SleepQuality::Fair => "fair",
            SleepQuality::Poor => "poor",
        }
    }

    /// Case-insensitive label match; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<SleepQuality> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|q| q.as_str().eq_ignore_ascii_case(label))
    }
}

macro_rules! impl_dated {
    ( $( $ty:ty ),+ ) => {
        $(
            impl DatedRecord for $ty {
                fn date(&self) -> CalendarDate {
                    self.date
                }
            }
        )+
    };
}

impl_dated!(WeightRecord, HeartRateRecord, ActivityRecord, SleepRecord);

/// A normalized record of any metric family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum CanonicalRecord {
    Weight(WeightRecord),
    HeartRate(HeartRateRecord),
    Activity(ActivityRecord),
    Sleep(SleepRecord),
}

impl CanonicalRecord {
    pub fn kind(&self) -> MetricKind {
        match self {
            CanonicalRecord::Weight(_) => MetricKind::Weight,
            CanonicalRecord::HeartRate(_) => MetricKind::HeartRate,
            CanonicalRecord::Activity(_) => MetricKind::Activity,
            CanonicalRecord::Sleep(_) => MetricKind::Sleep,
        }
    }
}

impl DatedRecord for CanonicalRecord {
    fn date(&self) -> CalendarDate {
        match self {
            CanonicalRecord::Weight(r) => r.date,
            CanonicalRecord::HeartRate(r) => r.date,
            CanonicalRecord::Activity(r) => r.date,
            CanonicalRecord::Sleep(r) => r.date,
        }
    }
}

/// Raw records dropped by the normalizer, per metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscardCounts {
    pub weight: usize,
    pub heart_rate: usize,
    pub activity: usize,
    pub sleep: usize,
}

impl DiscardCounts {
    pub fn total(&self) -> usize {
        self.weight + self.heart_rate + self.activity + self.sleep
    }

    pub fn get_mut(&mut self, kind: MetricKind) -> &mut usize {
        match kind {
            MetricKind::Weight => &mut self.weight,
            MetricKind::HeartRate => &mut self.heart_rate,
            MetricKind::Activity => &mut self.activity,
            MetricKind::Sleep => &mut self.sleep,
        }
    }

    fn merge(&mut self, other: DiscardCounts) {
        self.weight += other.weight;
        self.heart_rate += other.heart_rate;
        self.activity += other.activity;
        self.sleep += other.sleep;
    }
}

/// Normalized, in-memory snapshot of every metric family.
///
/// Records keep source order; nothing here is deduplicated or sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub weight: Vec<WeightRecord>,
    pub heart_rate: Vec<HeartRateRecord>,
    pub activity: Vec<ActivityRecord>,
    pub sleep: Vec<SleepRecord>,
    /// Upstream precomputed summary, carried through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
    pub discarded: DiscardCounts,
}

impl Dataset {
    pub fn len(&self, kind: MetricKind) -> usize {
        match kind {
            MetricKind::Weight => self.weight.len(),
            MetricKind::HeartRate => self.heart_rate.len(),
            MetricKind::Activity => self.activity.len(),
            MetricKind::Sleep => self.sleep.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        MetricKind::iter().all(|kind| self.len(kind) == 0)
    }

    pub fn push(&mut self, record: CanonicalRecord) {
        match record {
            CanonicalRecord::Weight(r) => self.weight.push(r),
            CanonicalRecord::HeartRate(r) => self.heart_rate.push(r),
            CanonicalRecord::Activity(r) => self.activity.push(r),
            CanonicalRecord::Sleep(r) => self.sleep.push(r),
        }
    }

    /// Append `other` after this dataset, preserving source order.
    pub fn extend(&mut self, other: Dataset) {
        self.weight.extend(other.weight);
        self.heart_rate.extend(other.heart_rate);
        self.activity.extend(other.activity);
        self.sleep.extend(other.sleep);
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        self.discarded.merge(other.discarded);
    }

    /// Every record as a [`CanonicalRecord`], metric by metric.
    pub fn records(&self) -> impl Iterator<Item = CanonicalRecord> + '_ {
        self.weight
            .iter()
            .cloned()
            .map(CanonicalRecord::Weight)
            .chain(self.heart_rate.iter().cloned().map(CanonicalRecord::HeartRate))
            .chain(self.activity.iter().cloned().map(CanonicalRecord::Activity))
            .chain(self.sleep.iter().cloned().map(CanonicalRecord::Sleep))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMeta {
    pub version: String,
    pub window: Window,
}

/// Everything the presentation layer needs for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub meta: DashboardMeta,
    pub calendar: Vec<CalendarDate>,
    pub series: AlignedSet,
    pub coverage: CoverageSet,
    pub summary: SummarySet,
    pub data_range: Option<DataRange>,
    pub freshness: Freshness,
}

impl Dashboard {
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the full pipeline for one window.
///
/// Series and summary are derived independently from the same dataset and
/// window. Nothing reads the wall clock, so identical inputs give identical
/// output.
pub fn build_dashboard(dataset: &Dataset, window: Window) -> Result<Dashboard, CoreError> {
    let calendar = window.calendar()?;
    let series = align_dataset(dataset, &calendar);
    let coverage = series.coverage();
    let summary = calculate_summary(dataset, &window);
    let data_range = data_range(dataset);
    let freshness = freshness(data_range.map(|r| r.latest), window.end());

    tracing::debug!(
        days = window.days(),
        start = %window.start(),
        end = %window.end(),
        discarded = dataset.discarded.total(),
        "built dashboard"
    );

    Ok(Dashboard {
        meta: DashboardMeta {
            version: version(),
            window,
        },
        calendar,
        series,
        coverage,
        summary,
        data_range,
        freshness,
    })
}

/// Decode a raw payload and build the dashboard in one call.
pub fn dashboard_from_text(text: &str, window: Window) -> Result<Dashboard, CoreError> {
    build_dashboard(&parse_dataset(text), window)
}
