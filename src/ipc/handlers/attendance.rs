use crate::attendance::{
    aggregate, daily_tally, summarize_class, AttendancePeriod, AttendanceRecord, AttendanceSummary,
};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_array, parse_attendance_entries, parse_period, parse_status};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn summary_json(summary: &AttendanceSummary) -> serde_json::Value {
    let mut v = json!(summary);
    v["band"] = json!(summary.band());
    v
}

fn attendance_aggregate(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let period = parse_period(params)?;
    let entries = parse_attendance_entries(get_array(params, "records")?)?;
    let selected = match &period {
        Some(p) => p.select(&entries),
        None => entries,
    };
    let summary = aggregate(&selected);
    Ok(json!({
        "period": period.as_ref().map(AttendancePeriod::to_string),
        "summary": summary,
        "band": summary.band(),
    }))
}

fn attendance_daily_tally(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let entries = get_array(params, "entries")?;
    let mut statuses = Vec::with_capacity(entries.len());
    for (i, e) in entries.iter().enumerate() {
        let status = parse_status(e.get("status")).map_err(|err| {
            err.with_details(json!({
                "index": i,
                "studentId": e.get("studentId").cloned().unwrap_or(serde_json::Value::Null),
            }))
        })?;
        statuses.push(status);
    }
    let counts = daily_tally(statuses);
    Ok(json!({
        "present": counts.present,
        "sick": counts.sick,
        "excused": counts.excused,
        "absent": counts.absent,
        "total": counts.total(),
    }))
}

fn attendance_report(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let period = parse_period(params)?;
    let students = get_array(params, "students")?;

    let mut records: Vec<AttendanceRecord> = Vec::with_capacity(students.len());
    for (i, s) in students.iter().enumerate() {
        let Some(student_id) = s.get("studentId").and_then(|v| v.as_str()) else {
            return Err(
                HandlerErr::bad_params("missing studentId").with_details(json!({ "index": i }))
            );
        };
        let raw = s.get("records").and_then(|v| v.as_array()).ok_or_else(|| {
            HandlerErr::bad_params("missing records")
                .with_details(json!({ "studentId": student_id }))
        })?;
        let entries = parse_attendance_entries(raw).map_err(|e| {
            let index = e.details.as_ref().and_then(|d| d.get("index")).cloned();
            e.with_details(json!({ "studentId": student_id, "index": index }))
        })?;
        records.push(AttendanceRecord {
            student_id: student_id.to_string(),
            entries,
        });
    }

    let summaries: Vec<AttendanceSummary> = records
        .iter()
        .map(|r| r.summary(period.as_ref()))
        .collect();
    let rows: Vec<serde_json::Value> = records
        .iter()
        .zip(&summaries)
        .map(|(r, s)| {
            let mut row = summary_json(s);
            row["studentId"] = json!(r.student_id);
            row
        })
        .collect();

    Ok(json!({
        "period": period.as_ref().map(AttendancePeriod::to_string),
        "daysInPeriod": period.as_ref().map(AttendancePeriod::days_in_month),
        "rows": rows,
        "classStats": summarize_class(&summaries),
    }))
}

fn handle_attendance_aggregate(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, attendance_aggregate(&req.params))
}

fn handle_attendance_daily_tally(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, attendance_daily_tally(&req.params))
}

fn handle_attendance_report(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, attendance_report(&req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.aggregate" => Some(handle_attendance_aggregate(state, req)),
        "attendance.dailyTally" => Some(handle_attendance_daily_tally(state, req)),
        "attendance.report" => Some(handle_attendance_report(state, req)),
        _ => None,
    }
}
