use crate::{CalendarDate, Dataset, DatedRecord};
use serde::Serialize;

/// Earliest and latest record date across every metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataRange {
    pub earliest: CalendarDate,
    pub latest: CalendarDate,
}

impl DataRange {
    /// Inclusive number of calendar days covered.
    pub fn span_days(&self) -> i64 {
        self.latest.days_since(self.earliest) + 1
    }
}

pub fn data_range(dataset: &Dataset) -> Option<DataRange> {
    let mut dates = dataset.records().map(|r| r.date());
    let first = dates.next()?;
    let (earliest, latest) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DataRange { earliest, latest })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Today,
    Yesterday,
    Recent,
    Old,
    VeryOld,
    NoData,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Today => "today",
            Freshness::Yesterday => "yesterday",
            Freshness::Recent => "recent",
            Freshness::Old => "old",
            Freshness::VeryOld => "very_old",
            Freshness::NoData => "no_data",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Freshness::Today => "Data is up to date",
            Freshness::Yesterday => "Last data is from yesterday",
            Freshness::Recent => "Last data is from this week",
            Freshness::Old => "Last data is from this month",
            Freshness::VeryOld => "Last data is more than a month old",
            Freshness::NoData => "No data available",
        }
    }
}

impl std::fmt::Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket the age of `latest` relative to `reference`.
///
/// A latest date after the reference counts as today.
pub fn freshness(latest: Option<CalendarDate>, reference: CalendarDate) -> Freshness {
    let Some(latest) = latest else {
        return Freshness::NoData;
    };
    match reference.days_since(latest) {
        i64::MIN..=0 => Freshness::Today,
        1 => Freshness::Yesterday,
        2..=7 => Freshness::Recent,
        8..=30 => Freshness::Old,
        _ => Freshness::VeryOld,
    }
}
