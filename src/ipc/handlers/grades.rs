use crate::calc::{
    self, compute_final_grade, summarize_grades, validate_categories, validate_weights,
    GradeCategory, GradeRecord,
};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{decode, get_array, parse_scores, parse_weights};
use crate::ipc::types::{AppState, Request};
use crate::ranking::rank;
use serde_json::json;

fn grades_compute(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(raw_scores) = params.get("scores").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing scores"));
    };
    let scores = parse_scores(raw_scores, &[])?;
    let weights = parse_weights(params.get("weights"), state.config.weights)?;
    let final_score = compute_final_grade(&scores, &weights);
    Ok(json!({
        "scores": scores,
        "weights": weights,
        "finalScore": final_score,
        "status": calc::classify(final_score),
        "letter": calc::letter_grade(final_score).to_string(),
        "weightCheck": validate_weights(&weights),
    }))
}

fn grades_validate_weights(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    if params.get("categories").is_some() {
        let categories: Vec<GradeCategory> = decode(params, "categories")?;
        return Ok(json!(validate_categories(&categories)));
    }
    if params.get("weights").is_none() {
        return Err(HandlerErr::bad_params("missing weights or categories"));
    }
    let weights = parse_weights(params.get("weights"), state.config.weights)?;
    Ok(json!(validate_weights(&weights)))
}

fn grades_sheet(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let rows = get_array(params, "rows")?;
    let weights = parse_weights(params.get("weights"), state.config.weights)?;

    let mut records: Vec<GradeRecord> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let Some(student_id) = row.get("studentId").and_then(|v| v.as_str()) else {
            return Err(
                HandlerErr::bad_params("missing studentId").with_details(json!({ "index": i }))
            );
        };
        let scores = parse_scores(row, &["studentId"])
            .map_err(|e| e.with_details(json!({ "index": i, "studentId": student_id })))?;
        records.push(GradeRecord::new(student_id, scores, &weights));
    }

    let summary = summarize_grades(&records);
    let check = validate_weights(&weights);
    if !check.valid {
        tracing::debug!(total = check.total, "grade sheet weights do not total 100");
    }
    Ok(json!({
        "weights": weights,
        "weightCheck": check,
        "rows": rank(&records),
        "summary": summary,
    }))
}

fn handle_grades_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, grades_compute(state, &req.params))
}

fn handle_grades_validate_weights(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, grades_validate_weights(state, &req.params))
}

fn handle_grades_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, grades_sheet(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.compute" => Some(handle_grades_compute(state, req)),
        "grades.validateWeights" => Some(handle_grades_validate_weights(state, req)),
        "grades.sheet" => Some(handle_grades_sheet(state, req)),
        _ => None,
    }
}
