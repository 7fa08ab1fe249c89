//! Calendar alignment of sparse daily records
//!
//! Records may be sparse, unordered and share dates. Alignment produces one
//! slot per calendar day; a day without data is `None`, never zero.

use crate::{
    ActivityRecord, CalendarDate, Dataset, DatedRecord, HeartRateRecord, MetricKind,
    SleepRecord, WeightRecord,
};
use serde::Serialize;
use std::collections::HashMap;

/// One slot per calendar date, positionally aligned with the calendar.
pub type AlignedSeries<T> = Vec<Option<T>>;

/// Map `records` onto `calendar`.
///
/// When several records share a date the last one in source order wins. The
/// output always has `calendar.len()` slots.
pub fn align_series<T: DatedRecord + Clone>(
    records: &[T],
    calendar: &[CalendarDate],
) -> AlignedSeries<T> {
    let mut by_date: HashMap<CalendarDate, &T> = HashMap::with_capacity(records.len());
    for record in records {
        by_date.insert(record.date(), record);
    }

    calendar
        .iter()
        .map(|date| by_date.get(date).map(|record| (*record).clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSet {
    pub weight: AlignedSeries<WeightRecord>,
    pub heart_rate: AlignedSeries<HeartRateRecord>,
    pub activity: AlignedSeries<ActivityRecord>,
    pub sleep: AlignedSeries<SleepRecord>,
}

impl AlignedSet {
    pub fn coverage(&self) -> CoverageSet {
        let set = CoverageSet {
            weight: Coverage::of(&self.weight),
            heart_rate: Coverage::of(&self.heart_rate),
            activity: Coverage::of(&self.activity),
            sleep: Coverage::of(&self.sleep),
        };
        tracing::debug!(
            weight = %set.weight,
            heart_rate = %set.heart_rate,
            activity = %set.activity,
            sleep = %set.sleep,
            "data coverage"
        );
        set
    }
}

pub fn align_dataset(dataset: &Dataset, calendar: &[CalendarDate]) -> AlignedSet {
    AlignedSet {
        weight: align_series(&dataset.weight, calendar),
        heart_rate: align_series(&dataset.heart_rate, calendar),
        activity: align_series(&dataset.activity, calendar),
        sleep: align_series(&dataset.sleep, calendar),
    }
}

/// How many calendar slots carry data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub filled: usize,
    pub total: usize,
    /// Rounded percentage of filled slots.
    pub percent: u32,
}

impl Coverage {
    pub fn of<T>(series: &[Option<T>]) -> Self {
        let filled = series.iter().filter(|slot| slot.is_some()).count();
        let total = series.len();
        let percent = if total == 0 {
            0
        } else {
            (filled as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            filled,
            total,
            percent,
        }
    }
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} days ({}%)", self.filled, self.total, self.percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageSet {
    pub weight: Coverage,
    pub heart_rate: Coverage,
    pub activity: Coverage,
    pub sleep: Coverage,
}

impl CoverageSet {
    pub fn get(&self, kind: MetricKind) -> Coverage {
        match kind {
            MetricKind::Weight => self.weight,
            MetricKind::HeartRate => self.heart_rate,
            MetricKind::Activity => self.activity,
            MetricKind::Sleep => self.sleep,
        }
    }
}

// =============================================================================
// Chart projections
// =============================================================================

pub fn weight_values(series: &[Option<WeightRecord>]) -> Vec<Option<f64>> {
    series.iter().map(|slot| slot.as_ref().map(|r| r.value)).collect()
}

pub fn step_values(series: &[Option<ActivityRecord>]) -> Vec<Option<f64>> {
    series.iter().map(|slot| slot.as_ref().map(|r| r.steps)).collect()
}

pub fn sleep_hours(series: &[Option<SleepRecord>]) -> Vec<Option<f64>> {
    series
        .iter()
        .map(|slot| slot.as_ref().map(|r| r.duration_hours))
        .collect()
}

/// Heart rate as three parallel lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateLines {
    pub avg: Vec<Option<f64>>,
    pub min: Vec<Option<f64>>,
    pub max: Vec<Option<f64>>,
}

impl HeartRateLines {
    pub fn from_series(series: &[Option<HeartRateRecord>]) -> Self {
        let pick = |f: fn(&HeartRateRecord) -> Option<f64>| -> Vec<Option<f64>> {
            series.iter().map(|slot| slot.as_ref().and_then(f)).collect()
        };
        Self {
            avg: pick(|r| r.avg),
            min: pick(|r| r.min),
            max: pick(|r| r.max),
        }
    }

    /// Min/max bands are only worth drawing when both have at least one point.
    pub fn has_min_max(&self) -> bool {
        self.min.iter().any(Option::is_some) && self.max.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn weight(d: &str, value: f64) -> WeightRecord {
        WeightRecord {
            date: date(d),
            value,
            unit: "kg".to_string(),
        }
    }

    fn calendar(end: &str, days: u32) -> Vec<CalendarDate> {
        crate::build_calendar(date(end), days).unwrap()
    }

    #[test]
    fn test_align_series_with_gap() {
        let records = vec![weight("2024-01-01", 70.0), weight("2024-01-03", 68.0)];
        let series = align_series(&records, &calendar("2024-01-03", 3));
        assert_eq!(weight_values(&series), vec![Some(70.0), None, Some(68.0)]);
    }

    #[test]
    fn test_align_series_empty_input() {
        let series: AlignedSeries<WeightRecord> = align_series(&[], &calendar("2024-01-30", 30));
        assert_eq!(series.len(), 30);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn test_align_series_last_duplicate_wins() {
        let records = vec![
            weight("2024-01-02", 71.0),
            weight("2024-01-01", 70.0),
            weight("2024-01-02", 72.5),
        ];
        let series = align_series(&records, &calendar("2024-01-02", 2));
        assert_eq!(weight_values(&series), vec![Some(70.0), Some(72.5)]);
    }

    #[test]
    fn test_align_series_ignores_out_of_window_records() {
        let records = vec![
            weight("2023-12-01", 90.0),
            weight("2024-01-07", 70.0),
            weight("2024-02-01", 60.0),
        ];
        let series = align_series(&records, &calendar("2024-01-07", 7));
        assert_eq!(series.len(), 7);
        assert_eq!(series.iter().flatten().count(), 1);
        assert_eq!(series[6].as_ref().unwrap().value, 70.0);
    }

    #[test]
    fn test_align_series_length_for_any_input() {
        let mut records = Vec::new();
        for day in (1..=28).rev() {
            records.push(weight(&format!("2024-02-{:02}", day), day as f64));
            records.push(weight(&format!("2024-02-{:02}", day), day as f64 + 0.5));
        }
        for days in [7, 30] {
            let series = align_series(&records, &calendar("2024-02-20", days));
            assert_eq!(series.len(), days as usize);
        }
    }

    #[test]
    fn test_coverage() {
        let records = vec![weight("2024-01-01", 70.0), weight("2024-01-03", 68.0)];
        let series = align_series(&records, &calendar("2024-01-03", 3));
        let coverage = Coverage::of(&series);
        assert_eq!(coverage.filled, 2);
        assert_eq!(coverage.total, 3);
        assert_eq!(coverage.percent, 67);
        assert_eq!(coverage.to_string(), "2/3 days (67%)");

        let empty: Vec<Option<WeightRecord>> = Vec::new();
        assert_eq!(Coverage::of(&empty).percent, 0);
    }

    #[test]
    fn test_heart_rate_lines() {
        let records = vec![
            HeartRateRecord {
                date: date("2024-01-01"),
                avg: Some(70.0),
                min: None,
                max: None,
            },
            HeartRateRecord {
                date: date("2024-01-02"),
                avg: None,
                min: Some(50.0),
                max: Some(130.0),
            },
        ];
        let series = align_series(&records, &calendar("2024-01-03", 3));
        let lines = HeartRateLines::from_series(&series);

        assert_eq!(lines.avg, vec![Some(70.0), None, None]);
        assert_eq!(lines.min, vec![None, Some(50.0), None]);
        assert_eq!(lines.max, vec![None, Some(130.0), None]);
        assert!(lines.has_min_max());

        let lines = HeartRateLines::from_series(&series[..1]);
        assert!(!lines.has_min_max());
    }

    #[test]
    fn test_sleep_and_step_projections() {
        let sleep = vec![SleepRecord {
            date: date("2024-01-02"),
            duration_hours: 7.5,
            quality: None,
        }];
        let steps = vec![ActivityRecord {
            date: date("2024-01-01"),
            steps: 4000.0,
        }];
        let cal = calendar("2024-01-02", 2);

        assert_eq!(sleep_hours(&align_series(&sleep, &cal)), vec![None, Some(7.5)]);
        assert_eq!(step_values(&align_series(&steps, &cal)), vec![Some(4000.0), None]);
    }

    #[test]
    fn test_aligned_series_serializes_gaps_as_null() {
        let records = vec![weight("2024-01-02", 70.0)];
        let series = align_series(&records, &calendar("2024-01-02", 2));
        let json = serde_json::to_value(&series).unwrap();
        assert!(json[0].is_null());
        assert_eq!(json[1]["value"], 70.0);
        assert_eq!(json[1]["date"], "2024-01-02");
    }
}
