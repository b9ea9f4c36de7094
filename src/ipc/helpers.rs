use crate::attendance::{parse_date, AttendanceEntry, AttendancePeriod, AttendanceStatus};
use crate::calc::{Score, ScoreComponent, ScoreComponents, WeightConfig};
use crate::error::ValidationError;
use crate::ipc::error::HandlerErr;
use serde::de::DeserializeOwned;
use serde_json::json;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be string or null", key))),
    }
}

pub fn get_array<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a Vec<serde_json::Value>, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn decode<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

/// A present but blank or null cell counts as 0, matching an empty grade input.
fn parse_score_value(key: &str, v: &serde_json::Value) -> Result<Score, HandlerErr> {
    let raw: i64 = if v.is_null() {
        0
    } else if let Some(n) = v.as_i64() {
        n
    } else if let Some(s) = v.as_str() {
        let t = s.trim();
        if t.is_empty() {
            0
        } else {
            t.parse::<i64>()
                .map_err(|_| ValidationError::NotAnInteger(key.to_string()))?
        }
    } else {
        return Err(ValidationError::NotAnInteger(key.to_string()).into());
    };
    Ok(Score::new(key, raw)?)
}

/// Decodes one score row. Every component must be present, under its English
/// key or its sheet alias (`tugas`, `uts`, `uas`). Keys listed in `passthrough`
/// are ignored; any other key is rejected.
pub fn parse_scores(
    row: &serde_json::Value,
    passthrough: &[&str],
) -> Result<ScoreComponents, HandlerErr> {
    let Some(obj) = row.as_object() else {
        return Err(HandlerErr::bad_params("scores must be an object"));
    };
    let mut found: [Option<Score>; 3] = [None; 3];
    for (key, v) in obj {
        if passthrough.contains(&key.as_str()) {
            continue;
        }
        let Some(component) = ScoreComponent::from_key(key) else {
            return Err(HandlerErr::bad_params(format!("unknown score field: {}", key))
                .with_details(json!({ "field": key })));
        };
        let slot = &mut found[component as usize];
        if slot.is_some() {
            return Err(HandlerErr::bad_params(format!(
                "{} given twice",
                component.as_str()
            )));
        }
        *slot = Some(parse_score_value(key, v)?);
    }

    let mut scores = ScoreComponents::default();
    for component in ScoreComponent::ALL {
        let Some(score) = found[component as usize] else {
            return Err(HandlerErr::bad_params(format!(
                "missing {} (or {})",
                component.as_str(),
                component.sheet_alias()
            )));
        };
        scores.set(component, score);
    }
    Ok(scores)
}

/// Absent or null weights fall back to `default`; absent keys weigh 0.
pub fn parse_weights(
    raw: Option<&serde_json::Value>,
    default: WeightConfig,
) -> Result<WeightConfig, HandlerErr> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(default);
    };
    let Some(obj) = raw.as_object() else {
        return Err(HandlerErr::bad_params("weights must be an object"));
    };
    let mut weights = WeightConfig {
        assignment: 0,
        midterm: 0,
        final_exam: 0,
    };
    for component in ScoreComponent::ALL {
        let key = component.as_str();
        let w = match obj.get(key) {
            None => 0,
            Some(v) if v.is_null() => 0,
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    HandlerErr::bad_params(format!(
                        "weights.{} must be a non-negative integer",
                        key
                    ))
                })?,
        };
        match component {
            ScoreComponent::Assignment => weights.assignment = w,
            ScoreComponent::Midterm => weights.midterm = w,
            ScoreComponent::Final => weights.final_exam = w,
        }
    }
    Ok(weights)
}

pub fn parse_period(params: &serde_json::Value) -> Result<Option<AttendancePeriod>, HandlerErr> {
    match get_optional_str(params, "period")? {
        None => Ok(None),
        Some(s) => Ok(Some(s.parse::<AttendancePeriod>()?)),
    }
}

pub fn parse_status(raw: Option<&serde_json::Value>) -> Result<AttendanceStatus, HandlerErr> {
    let Some(s) = raw.and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("status must be a string"));
    };
    Ok(s.parse::<AttendanceStatus>()?)
}

fn parse_attendance_entry(item: &serde_json::Value) -> Result<AttendanceEntry, HandlerErr> {
    let date = item
        .get("date")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing date"))?;
    Ok(AttendanceEntry {
        date: parse_date(date)?,
        status: parse_status(item.get("status"))?,
    })
}

/// Decodes `[{date, status}]`. The failing index is reported in `details`.
pub fn parse_attendance_entries(
    raw: &[serde_json::Value],
) -> Result<Vec<AttendanceEntry>, HandlerErr> {
    raw.iter()
        .enumerate()
        .map(|(i, item)| {
            parse_attendance_entry(item).map_err(|e| e.with_details(json!({ "index": i })))
        })
        .collect()
}
