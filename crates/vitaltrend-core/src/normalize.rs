//! Shape normalization
//!
//! Importers disagree on field names and units. Each canonical field is
//! resolved through one ordered alias table below; the first alias present
//! decides the field, even when its value is `null` or unparsable.

use crate::metrics::MetricKind;
use crate::{
    ActivityRecord, CalendarDate, CanonicalRecord, Dataset, HeartRateRecord, SleepQuality,
    SleepRecord, WeightRecord,
};
use serde_json::{Map, Value};

pub const DATE_FIELD: &str = "date";
pub const WEIGHT_VALUE_FIELDS: &[&str] = &["value", "weight"];
pub const WEIGHT_UNIT_FIELD: &str = "unit";
pub const HEART_RATE_AVG_FIELDS: &[&str] = &["avg", "value"];
pub const HEART_RATE_MIN_FIELDS: &[&str] = &["min"];
pub const HEART_RATE_MAX_FIELDS: &[&str] = &["max"];
pub const ACTIVITY_STEP_FIELDS: &[&str] = &["steps", "total_steps", "value"];
pub const SLEEP_QUALITY_FIELD: &str = "quality";

/// How a sleep duration alias is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Hours,
    /// Hours, unless the magnitude says minutes (see [`duration_to_hours`]).
    Inferred,
}

pub const SLEEP_DURATION_FIELDS: &[(&str, DurationUnit)] = &[
    ("durationHours", DurationUnit::Hours),
    ("duration_hours", DurationUnit::Hours),
    ("duration", DurationUnit::Inferred),
];

/// Raw durations above this are read as minutes.
pub const MINUTES_THRESHOLD: f64 = 24.0;

/// Convert an untagged raw `duration` to hours.
///
/// Values above [`MINUTES_THRESHOLD`] are taken to be minutes. This is a
/// magnitude heuristic, not a unit tag: a genuine 25-hour value would be
/// misread.
pub fn duration_to_hours(raw: f64) -> f64 {
    if raw > MINUTES_THRESHOLD {
        raw / 60.0
    } else {
        raw
    }
}

/// Lenient numeric read: JSON numbers or numeric strings, finite only.
pub fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First alias present in `raw`. A present `null` counts, so a repaired
/// `NaN` shadows later aliases.
fn resolve<'a>(raw: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| raw.get(*key))
}

fn resolve_number(raw: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    resolve(raw, aliases).and_then(numeric)
}

fn record_date(raw: &Map<String, Value>) -> Option<CalendarDate> {
    match raw.get(DATE_FIELD)? {
        Value::String(s) => CalendarDate::parse_lenient(s),
        Value::Number(n) => n.as_i64().and_then(CalendarDate::from_timestamp_millis),
        _ => None,
    }
}

pub fn normalize_weight(raw: &Value) -> Option<WeightRecord> {
    let raw = raw.as_object()?;
    let date = record_date(raw)?;
    let value = resolve_number(raw, WEIGHT_VALUE_FIELDS)?;
    let unit = raw
        .get(WEIGHT_UNIT_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(MetricKind::Weight.default_unit())
        .to_string();

    Some(WeightRecord { date, value, unit })
}

pub fn normalize_heart_rate(raw: &Value) -> Option<HeartRateRecord> {
    let raw = raw.as_object()?;
    let date = record_date(raw)?;
    let avg = resolve_number(raw, HEART_RATE_AVG_FIELDS);
    let min = resolve_number(raw, HEART_RATE_MIN_FIELDS);
    let max = resolve_number(raw, HEART_RATE_MAX_FIELDS);

    if avg.is_none() && min.is_none() && max.is_none() {
        return None;
    }

    Some(HeartRateRecord {
        date,
        avg,
        min,
        max,
    })
}

pub fn normalize_activity(raw: &Value) -> Option<ActivityRecord> {
    let raw = raw.as_object()?;
    let date = record_date(raw)?;
    let steps = resolve_number(raw, ACTIVITY_STEP_FIELDS).filter(|s| *s >= 0.0)?;

    Some(ActivityRecord { date, steps })
}

pub fn normalize_sleep(raw: &Value) -> Option<SleepRecord> {
    let raw = raw.as_object()?;
    let date = record_date(raw)?;

    let (value, unit) = SLEEP_DURATION_FIELDS
        .iter()
        .find_map(|(key, unit)| raw.get(*key).map(|v| (v, *unit)))?;
    let duration = numeric(value)?;
    let duration_hours = match unit {
        DurationUnit::Hours => duration,
        DurationUnit::Inferred => duration_to_hours(duration),
    };
    if duration_hours <= 0.0 {
        return None;
    }

    let quality = raw
        .get(SLEEP_QUALITY_FIELD)
        .and_then(Value::as_str)
        .and_then(SleepQuality::from_label);

    Some(SleepRecord {
        date,
        duration_hours,
        quality,
    })
}

/// Normalize one raw record of a known metric family.
pub fn normalize_record(kind: MetricKind, raw: &Value) -> Option<CanonicalRecord> {
    match kind {
        MetricKind::Weight => normalize_weight(raw).map(CanonicalRecord::Weight),
        MetricKind::HeartRate => normalize_heart_rate(raw).map(CanonicalRecord::HeartRate),
        MetricKind::Activity => normalize_activity(raw).map(CanonicalRecord::Activity),
        MetricKind::Sleep => normalize_sleep(raw).map(CanonicalRecord::Sleep),
    }
}

/// The raw record array for a metric: the first dataset key alias that holds an array.
pub fn raw_records(payload: &Value, kind: MetricKind) -> &[Value] {
    kind.dataset_keys()
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn normalize_family(payload: &Value, kind: MetricKind, dataset: &mut Dataset) {
    let mut dropped = 0;
    for raw in raw_records(payload, kind) {
        match normalize_record(kind, raw) {
            Some(record) => dataset.push(record),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(metric = %kind, dropped, "discarded records without usable date or value");
    }
    *dataset.discarded.get_mut(kind) += dropped;
}

impl Dataset {
    /// Normalize a decoded payload. Never fails: unusable records are counted
    /// in [`Dataset::discarded`] and dropped.
    pub fn from_value(payload: &Value) -> Self {
        let mut dataset = Dataset::default();
        for kind in MetricKind::iter() {
            normalize_family(payload, kind, &mut dataset);
        }
        dataset.summary = payload.get("summary").filter(|s| !s.is_null()).cloned();
        dataset
    }
}
