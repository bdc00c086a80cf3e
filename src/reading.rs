/*
 *  reading.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Sensor readings - wire payload and the derived chart points
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of the sensor `/data` endpoint.
///
/// Every field is optional on the wire, a payload without `value` is
/// malformed and never becomes a [`Reading`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SensorPayload {
    #[serde(default, deserialize_with = "deserialize_numeric_f64")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_numeric_u32")]
    pub samples: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One timestamped decibel measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub sample_count: u32,
}

impl Reading {
    pub fn new(value: f64, timestamp: Option<DateTime<Utc>>, sample_count: u32) -> Self {
        Self { value, timestamp, sample_count }
    }

    /// Converts a wire payload, `None` when the value is missing or not finite.
    pub fn from_payload(payload: &SensorPayload) -> Option<Self> {
        let value = payload.value.filter(|v| v.is_finite())?;
        let timestamp = payload.timestamp.as_deref().and_then(parse_timestamp);
        Some(Self {
            value,
            timestamp,
            sample_count: payload.samples.unwrap_or(0),
        })
    }

    /// Reading time, falling back to when it was polled.
    pub fn observed_at(&self, polled_at: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.unwrap_or(polled_at)
    }
}

/// A single point on the history chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub display_time: String,
    pub value: f64,
}

impl HistoryPoint {
    pub fn new(display_time: impl Into<String>, value: f64) -> Self {
        Self { display_time: display_time.into(), value }
    }

    pub fn from_reading(reading: &Reading, polled_at: DateTime<Utc>) -> Self {
        Self {
            display_time: display_time(reading.observed_at(polled_at)),
            value: reading.value,
        }
    }
}

/// Local wall-clock `HH:MM:SS`.
pub fn display_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Accepts RFC 3339 as well as the naive ISO form python's `isoformat()` emits.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_numeric_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
}

fn deserialize_numeric_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    let n = v
        .as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()));
    Ok(n.and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_payload_with_value() {
        let payload: SensorPayload = serde_json::from_str(
            r#"{"value": 52.5, "samples": 12, "timestamp": "2025-06-01T10:15:30Z"}"#,
        ).unwrap();
        let reading = Reading::from_payload(&payload).unwrap();
        assert_eq!(reading.value, 52.5);
        assert_eq!(reading.sample_count, 12);
        assert_eq!(reading.timestamp.unwrap().minute(), 15);
    }

    #[test]
    fn test_payload_missing_value_is_ignored() {
        let payload: SensorPayload =
            serde_json::from_str(r#"{"samples": 3, "timestamp": null}"#).unwrap();
        assert!(Reading::from_payload(&payload).is_none());

        let payload: SensorPayload = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert!(Reading::from_payload(&payload).is_none());
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let payload: SensorPayload =
            serde_json::from_str(r#"{"value": "61.2", "samples": "4"}"#).unwrap();
        let reading = Reading::from_payload(&payload).unwrap();
        assert_eq!(reading.value, 61.2);
        assert_eq!(reading.sample_count, 4);
        assert!(reading.timestamp.is_none());
    }

    #[test]
    fn test_bad_timestamp_treated_as_absent() {
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2025-06-01T10:15:30.123456").is_some());
    }

    #[test]
    fn test_observed_at_falls_back_to_poll_time() {
        let polled = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let reading = Reading::new(40.0, None, 1);
        assert_eq!(reading.observed_at(polled), polled);

        let point = HistoryPoint::from_reading(&reading, polled);
        assert_eq!(point.display_time, display_time(polled));
        assert_eq!(point.display_time.len(), 8);
    }
}
