//! Tolerant JSON decoding of float API payloads.
//!
//! Rows with missing or unparsable fields are skipped. A payload of the wrong shape is
//! logged and decoded as empty rather than failing the request.

use bevy::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::api::types::{DossierRow, PathPoint, PlatformId, SensorReading};
use crate::core::coordinates::GeoCoord;

/// `GET /api/floats_in_box` returns a bare array of readings.
pub fn parse_snapshot(value: &Value) -> Vec<SensorReading> {
    let Some(rows) = value.as_array() else {
        warn!("[API] snapshot payload is not an array, treating as empty");
        return Vec::new();
    };
    parse_readings(rows)
}

/// `GET /api/floats_in_box/range` returns `{ positions: [...] }`. Order is kept as sent.
pub fn parse_range(value: &Value) -> Vec<SensorReading> {
    let Some(rows) = value.get("positions").and_then(Value::as_array) else {
        warn!("[API] range payload has no positions array, treating as empty");
        return Vec::new();
    };
    parse_readings(rows)
}

pub fn parse_dossier(value: &Value) -> Vec<DossierRow> {
    let Some(rows) = value.as_array() else {
        warn!("[API] dossier payload is not an array, treating as empty");
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            Some(DossierRow {
                date: get_timestamp(row, "date")?,
                depth_m: get_f64(row, "depth_m")?,
                temp_c: get_f64(row, "temp_c"),
                sal_psu: get_f64(row, "sal_psu"),
            })
        })
        .collect()
}

pub fn parse_path(value: &Value) -> Vec<PathPoint> {
    let Some(rows) = value.as_array() else {
        warn!("[API] path payload is not an array, treating as empty");
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            Some(PathPoint {
                date: get_timestamp(row, "date")?,
                coord: GeoCoord::new(get_f64(row, "lon")?, get_f64(row, "lat")?),
            })
        })
        .collect()
}

fn parse_readings(rows: &[Value]) -> Vec<SensorReading> {
    let mut readings = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        match parse_reading(row) {
            Some(reading) => readings.push(reading),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("[API] skipped {} malformed position rows", skipped);
    }
    readings
}

fn parse_reading(row: &Value) -> Option<SensorReading> {
    let platform_id: PlatformId = get_i64(row, "platform_id")?;
    let lat = get_f64(row, "lat")?;
    let lon = get_f64(row, "lon")?;
    let observed_at = get_timestamp(row, "date")?;
    Some(SensorReading {
        platform_id,
        coord: GeoCoord::new(lon, lat),
        observed_at,
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and bare dates.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn get_timestamp(value: &Value, key: &str) -> Option<NaiveDateTime> {
    value.get(key).and_then(Value::as_str).and_then(parse_timestamp)
}

fn get_i64(value: &Value, key: &str) -> Option<i64> {
    match value.get(key) {
        Some(Value::Number(num)) => num
            .as_i64()
            .or_else(|| num.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(val)) => val.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn get_f64(value: &Value, key: &str) -> Option<f64> {
    let parsed = match value.get(key) {
        Some(Value::Number(num)) => num.as_f64(),
        Some(Value::String(val)) => val.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
