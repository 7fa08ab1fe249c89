//! Per-metric summaries scoped to a window
//!
//! Every metric goes through the same window filter before aggregation, so a
//! summary only ever sees the records the aligned series can show.

use crate::{
    ActivityRecord, Dataset, DatedRecord, HeartRateRecord, MetricKind, SleepQuality,
    SleepRecord, WeightRecord, Window,
};
use serde::Serialize;

/// Records whose date falls inside `window`, in source order.
pub fn filter_window<'a, T: DatedRecord>(records: &'a [T], window: &Window) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| window.contains(record.date()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightSummary {
    pub latest: f64,
    pub unit: String,
    /// `latest - oldest`; zero with a single record in the window.
    pub change: f64,
    pub change_percent: f64,
}

impl WeightSummary {
    /// `+1.20 kg (1.71%)` style label.
    pub fn change_label(&self) -> String {
        let sign = if self.change > 0.0 { "+" } else { "" };
        format!(
            "{}{:.2} {} ({:.2}%)",
            sign, self.change, self.unit, self.change_percent
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub unit: String,
}

impl HeartRateSummary {
    pub fn range_label(&self) -> String {
        format!("{:.0} - {:.0} {}", self.min, self.max, self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub total_steps: f64,
    /// Averaged over every day of the window, not just days with data.
    pub avg_steps: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityDistribution {
    pub excellent: u32,
    pub good: u32,
    pub fair: u32,
    pub poor: u32,
}

impl QualityDistribution {
    pub fn total(&self) -> u32 {
        self.excellent + self.good + self.fair + self.poor
    }

    pub fn count(&self, quality: SleepQuality) -> u32 {
        match quality {
            SleepQuality::Excellent => self.excellent,
            SleepQuality::Good => self.good,
            SleepQuality::Fair => self.fair,
            SleepQuality::Poor => self.poor,
        }
    }

    fn add(&mut self, quality: SleepQuality) {
        match quality {
            SleepQuality::Excellent => self.excellent += 1,
            SleepQuality::Good => self.good += 1,
            SleepQuality::Fair => self.fair += 1,
            SleepQuality::Poor => self.poor += 1,
        }
    }

    /// Share of good or excellent nights, as a percentage.
    pub fn good_quality_percent(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(f64::from(self.good + self.excellent) / f64::from(total) * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepSummary {
    pub avg_duration_hours: f64,
    pub best_duration_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_distribution: Option<QualityDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_quality_percent: Option<f64>,
}

/// One aggregate per metric; a metric without records in the window is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummarySet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<WeightSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<HeartRateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepSummary>,
}

impl SummarySet {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
            && self.heart_rate.is_none()
            && self.activity.is_none()
            && self.sleep.is_none()
    }

    pub fn has(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Weight => self.weight.is_some(),
            MetricKind::HeartRate => self.heart_rate.is_some(),
            MetricKind::Activity => self.activity.is_some(),
            MetricKind::Sleep => self.sleep.is_some(),
        }
    }
}

pub fn summarize_weight(records: &[&WeightRecord]) -> Option<WeightSummary> {
    let mut sorted = records.to_vec();
    // Stable, so records sharing a date keep source order: `latest` is the
    // first record of the newest date, while the aligned series shows the last.
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let latest = *sorted.first()?;
    let mut summary = WeightSummary {
        latest: latest.value,
        unit: latest.unit.clone(),
        change: 0.0,
        change_percent: 0.0,
    };

    if sorted.len() >= 2 {
        let oldest = sorted[sorted.len() - 1].value;
        summary.change = latest.value - oldest;
        if oldest > 0.0 {
            summary.change_percent = summary.change / oldest * 100.0;
        }
    }

    Some(summary)
}

/// Pools min, max and avg of every record into one population.
pub fn summarize_heart_rate(records: &[&HeartRateRecord]) -> Option<HeartRateSummary> {
    let pool: Vec<f64> = records
        .iter()
        .flat_map(|r| [r.min, r.max, r.avg])
        .flatten()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();

    if pool.is_empty() {
        return None;
    }

    let min = pool.iter().copied().fold(f64::INFINITY, f64::min);
    let max = pool.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = pool.iter().sum::<f64>() / pool.len() as f64;

    Some(HeartRateSummary {
        min,
        max,
        avg,
        unit: MetricKind::HeartRate.default_unit().to_string(),
    })
}

pub fn summarize_activity(records: &[&ActivityRecord], days: u32) -> Option<ActivitySummary> {
    if records.is_empty() || days == 0 {
        return None;
    }
    let total_steps: f64 = records.iter().map(|r| r.steps).sum();
    Some(ActivitySummary {
        total_steps,
        avg_steps: total_steps / f64::from(days),
    })
}

pub fn summarize_sleep(records: &[&SleepRecord]) -> Option<SleepSummary> {
    if records.is_empty() {
        return None;
    }

    let total: f64 = records.iter().map(|r| r.duration_hours).sum();
    let best = records
        .iter()
        .map(|r| r.duration_hours)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut distribution = QualityDistribution::default();
    for quality in records.iter().filter_map(|r| r.quality) {
        distribution.add(quality);
    }
    let quality_distribution = (distribution.total() > 0).then_some(distribution);

    Some(SleepSummary {
        avg_duration_hours: total / records.len() as f64,
        best_duration_hours: best,
        quality_distribution,
        good_quality_percent: quality_distribution.and_then(|d| d.good_quality_percent()),
    })
}

/// Summaries for every metric over `window`.
pub fn calculate_summary(dataset: &Dataset, window: &Window) -> SummarySet {
    let set = SummarySet {
        weight: summarize_weight(&filter_window(&dataset.weight, window)),
        heart_rate: summarize_heart_rate(&filter_window(&dataset.heart_rate, window)),
        activity: summarize_activity(&filter_window(&dataset.activity, window), window.days()),
        sleep: summarize_sleep(&filter_window(&dataset.sleep, window)),
    };

    tracing::debug!(
        days = window.days(),
        weight = set.weight.is_some(),
        heart_rate = set.heart_rate.is_some(),
        activity = set.activity.is_some(),
        sleep = set.sleep.is_some(),
        "calculated summary"
    );

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CalendarDate;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn window(days: u32, end: &str) -> Window {
        Window::new(days, date(end)).unwrap()
    }

    fn weight(d: &str, value: f64) -> WeightRecord {
        WeightRecord {
            date: date(d),
            value,
            unit: "kg".to_string(),
        }
    }

    fn heart(d: &str, avg: Option<f64>, min: Option<f64>, max: Option<f64>) -> HeartRateRecord {
        HeartRateRecord {
            date: date(d),
            avg,
            min,
            max,
        }
    }

    fn sleep(d: &str, hours: f64, quality: Option<SleepQuality>) -> SleepRecord {
        SleepRecord {
            date: date(d),
            duration_hours: hours,
            quality,
        }
    }

    #[test]
    fn test_filter_window_bounds_inclusive() {
        let records = vec![
            weight("2023-12-31", 1.0),
            weight("2024-01-01", 2.0),
            weight("2024-01-07", 3.0),
            weight("2024-01-08", 4.0),
        ];
        let filtered = filter_window(&records, &window(7, "2024-01-07"));
        let values: Vec<f64> = filtered.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_weight_summary_change() {
        let records = vec![weight("2024-01-03", 68.0), weight("2024-01-01", 70.0)];
        let refs: Vec<&WeightRecord> = records.iter().collect();
        let summary = summarize_weight(&refs).unwrap();

        assert_eq!(summary.latest, 68.0);
        assert_eq!(summary.unit, "kg");
        assert_eq!(summary.change, -2.0);
        assert!((summary.change_percent + 2.857142857).abs() < 1e-6);
        assert_eq!(summary.change_label(), "-2.00 kg (-2.86%)");
    }

    #[test]
    fn test_weight_summary_single_record_has_zero_change() {
        let records = vec![weight("2024-01-03", 68.0)];
        let refs: Vec<&WeightRecord> = records.iter().collect();
        let summary = summarize_weight(&refs).unwrap();

        assert_eq!(summary.latest, 68.0);
        assert_eq!(summary.change, 0.0);
        assert_eq!(summary.change_percent, 0.0);
        assert_eq!(summary.change_label(), "0.00 kg (0.00%)");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"latest": 68.0, "unit": "kg", "change": 0.0, "change_percent": 0.0})
        );
    }

    #[test]
    fn test_weight_summary_latest_is_first_of_newest_date() {
        let records = vec![
            weight("2024-01-01", 70.0),
            weight("2024-01-03", 68.0),
            weight("2024-01-03", 68.4),
        ];
        let refs: Vec<&WeightRecord> = records.iter().collect();
        let summary = summarize_weight(&refs).unwrap();
        assert_eq!(summary.latest, 68.0);
        assert_eq!(summary.change, -2.0);

        // The aligned series keeps the last record for the same day.
        let calendar = crate::build_calendar(date("2024-01-03"), 3).unwrap();
        let series = crate::align_series(&records, &calendar);
        assert_eq!(series[2].as_ref().unwrap().value, 68.4);
    }

    #[test]
    fn test_weight_summary_unit_from_latest() {
        let mut latest = weight("2024-01-05", 150.0);
        latest.unit = "lb".to_string();
        let records = vec![latest, weight("2024-01-01", 70.0)];
        let refs: Vec<&WeightRecord> = records.iter().collect();
        let summary = summarize_weight(&refs).unwrap();

        assert_eq!(summary.unit, "lb");
        assert_eq!(summary.change_label(), "+80.00 lb (114.29%)");
    }

    #[test]
    fn test_weight_summary_zero_oldest_guard() {
        let records = vec![weight("2024-01-01", 0.0), weight("2024-01-02", 5.0)];
        let refs: Vec<&WeightRecord> = records.iter().collect();
        let summary = summarize_weight(&refs).unwrap();
        assert_eq!(summary.change, 5.0);
        assert_eq!(summary.change_percent, 0.0);
    }

    #[test]
    fn test_heart_rate_pools_all_values() {
        let records = vec![
            heart("2024-01-01", Some(70.0), Some(50.0), Some(130.0)),
            heart("2024-01-02", Some(80.0), None, None),
            heart("2024-01-03", Some(f64::NAN), Some(0.0), Some(-5.0)),
        ];
        let refs: Vec<&HeartRateRecord> = records.iter().collect();
        let summary = summarize_heart_rate(&refs).unwrap();

        assert_eq!(summary.min, 50.0);
        assert_eq!(summary.max, 130.0);
        // (50 + 130 + 70 + 80) / 4
        assert!((summary.avg - 82.5).abs() < 1e-9);
        assert_eq!(summary.unit, "bpm");
        assert_eq!(summary.range_label(), "50 - 130 bpm");
    }

    #[test]
    fn test_heart_rate_empty_pool_is_omitted() {
        let records = vec![heart("2024-01-01", Some(0.0), None, Some(f64::INFINITY))];
        let refs: Vec<&HeartRateRecord> = records.iter().collect();
        assert!(summarize_heart_rate(&refs).is_none());
        assert!(summarize_heart_rate(&[]).is_none());
    }

    #[test]
    fn test_activity_average_over_full_window() {
        let records = vec![
            ActivityRecord {
                date: date("2024-01-01"),
                steps: 5000.0,
            },
            ActivityRecord {
                date: date("2024-01-04"),
                steps: 9000.0,
            },
            ActivityRecord {
                date: date("2024-01-07"),
                steps: 7000.0,
            },
        ];
        let dataset = Dataset {
            activity: records,
            ..Default::default()
        };
        let summary = calculate_summary(&dataset, &window(7, "2024-01-07"));
        let activity = summary.activity.unwrap();

        assert_eq!(activity.total_steps, 21000.0);
        assert_eq!(activity.avg_steps, 3000.0);
    }

    #[test]
    fn test_sleep_summary_with_quality() {
        let records = vec![
            sleep("2024-01-01", 7.0, Some(SleepQuality::Good)),
            sleep("2024-01-02", 8.5, Some(SleepQuality::Excellent)),
            sleep("2024-01-03", 6.0, Some(SleepQuality::Poor)),
            sleep("2024-01-04", 6.5, None),
        ];
        let refs: Vec<&SleepRecord> = records.iter().collect();
        let summary = summarize_sleep(&refs).unwrap();

        assert!((summary.avg_duration_hours - 7.0).abs() < 1e-9);
        assert_eq!(summary.best_duration_hours, 8.5);

        let dist = summary.quality_distribution.unwrap();
        assert_eq!(dist.total(), 3);
        assert_eq!(dist.count(SleepQuality::Good), 1);
        assert_eq!(dist.count(SleepQuality::Fair), 0);
        assert!((summary.good_quality_percent.unwrap() - 66.666_666).abs() < 1e-3);
    }

    #[test]
    fn test_sleep_summary_without_quality() {
        let records = vec![sleep("2024-01-01", 7.0, None)];
        let refs: Vec<&SleepRecord> = records.iter().collect();
        let summary = summarize_sleep(&refs).unwrap();

        assert!(summary.quality_distribution.is_none());
        assert!(summary.good_quality_percent.is_none());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("quality_distribution").is_none());
    }

    #[test]
    fn test_calculate_summary_ignores_records_outside_window() {
        let dataset = Dataset {
            weight: vec![weight("2024-01-01", 90.0), weight("2024-01-10", 80.0)],
            sleep: vec![sleep("2023-12-01", 9.0, None)],
            ..Default::default()
        };
        let summary = calculate_summary(&dataset, &window(7, "2024-01-10"));

        let weight = summary.weight.as_ref().unwrap();
        assert_eq!(weight.latest, 80.0);
        assert_eq!(weight.change, 0.0);
        assert!(summary.sleep.is_none());
        assert!(summary.has(MetricKind::Weight));
        assert!(!summary.has(MetricKind::HeartRate));
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_empty_dataset_summary() {
        let summary = calculate_summary(&Dataset::default(), &window(30, "2024-01-30"));
        assert!(summary.is_empty());
        assert_eq!(serde_json::to_string(&summary).unwrap(), "{}");
    }
}
