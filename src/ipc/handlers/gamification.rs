use crate::gamification::{
    achievement_progress, progress_overview, summarize_achievements, Achievement,
    AchievementProgress, LearningGoal, SubjectProgress,
};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::decode;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn gamification_achievements(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let achievements: Vec<Achievement> = decode(params, "achievements")?;
    let mut rows: Vec<AchievementProgress> = Vec::with_capacity(achievements.len());
    for (i, a) in achievements.iter().enumerate() {
        let row = achievement_progress(i, a).map_err(|e| {
            HandlerErr::from(e).with_details(json!({ "index": i, "id": a.id }))
        })?;
        rows.push(row);
    }
    Ok(json!({
        "summary": summarize_achievements(&rows),
        "achievements": rows,
    }))
}

fn gamification_progress(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subjects: Vec<SubjectProgress> = decode(params, "subjects")?;
    let goals: Vec<LearningGoal> = match params.get("goals") {
        None => Vec::new(),
        Some(v) if v.is_null() => Vec::new(),
        Some(_) => decode(params, "goals")?,
    };
    let overview = progress_overview(&subjects, &goals)?;
    Ok(json!(overview))
}

fn handle_gamification_achievements(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, gamification_achievements(&req.params))
}

fn handle_gamification_progress(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, gamification_progress(&req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gamification.achievements" => Some(handle_gamification_achievements(state, req)),
        "gamification.progress" => Some(handle_gamification_progress(state, req)),
        _ => None,
    }
}
