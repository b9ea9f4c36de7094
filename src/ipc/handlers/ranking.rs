use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{decode, get_optional_str};
use crate::ipc::types::{AppState, Request};
use crate::ranking::{
    leaderboard, rank, summarize_leaderboard, LeaderboardEntry, LeaderboardFilter, RankEntry,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviousRank {
    student_id: String,
    rank: usize,
}

fn ranking_rank(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let entries: Vec<RankEntry> = decode(params, "entries")?;
    Ok(json!({ "ranked": rank(&entries) }))
}

fn ranking_leaderboard(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let entries: Vec<LeaderboardEntry> = decode(params, "entries")?;
    let class_name = get_optional_str(params, "className")?;
    let previous: Vec<PreviousRank> = match params.get("previous") {
        None => Vec::new(),
        Some(v) if v.is_null() => Vec::new(),
        Some(_) => decode(params, "previous")?,
    };
    let previous: HashMap<String, usize> = previous
        .into_iter()
        .map(|p| (p.student_id, p.rank))
        .collect();

    let filter = LeaderboardFilter::for_class(class_name.as_deref());
    let rows = leaderboard(&entries, &filter, &previous);
    Ok(json!({
        "className": filter.class_name,
        "rows": rows,
        "summary": summarize_leaderboard(&entries, &filter),
    }))
}

fn handle_ranking_rank(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, ranking_rank(&req.params))
}

fn handle_ranking_leaderboard(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, ranking_leaderboard(&req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ranking.rank" => Some(handle_ranking_rank(state, req)),
        "ranking.leaderboard" => Some(handle_ranking_leaderboard(state, req)),
        _ => None,
    }
}
