use crate::calc::round_half_up;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Anything that can be placed on a ranking.
pub trait Scored {
    fn score(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
}

impl RankEntry {
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
            level: None,
            points: None,
        }
    }
}

impl Scored for RankEntry {
    fn score(&self) -> f64 {
        self.score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: T,
}

/// Orders by score, highest first, and numbers the result 1..N.
///
/// Equal scores are not merged: they get consecutive ranks in input order,
/// so the same input always produces the same ranking.
pub fn rank<T>(entries: &[T]) -> Vec<Ranked<T>>
where
    T: Scored + Clone,
{
    let mut order: Vec<(usize, &T)> = entries.iter().enumerate().collect();
    order.sort_by(|(a_idx, a), (b_idx, b)| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_idx.cmp(b_idx))
    });
    order
        .into_iter()
        .enumerate()
        .map(|(pos, (_, entry))| Ranked {
            rank: pos + 1,
            entry: entry.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub points: u64,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_grade: Option<u32>,
}

impl Scored for LeaderboardEntry {
    fn score(&self) -> f64 {
        self.points as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardFilter {
    /// Lowercased; `None` means every class.
    pub class_name: Option<String>,
}

impl LeaderboardFilter {
    /// Blank and `all` both mean no filter.
    pub fn for_class(raw: Option<&str>) -> Self {
        let class_name = raw
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("all"))
            .map(|t| t.to_ascii_lowercase());
        Self { class_name }
    }

    pub fn matches(&self, entry: &LeaderboardEntry) -> bool {
        self.class_name
            .as_ref()
            .map(|c| entry.class_name.trim().to_ascii_lowercase() == *c)
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: usize,
    /// Positive when the student moved up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_change: Option<i64>,
    pub trend: Trend,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

/// Ranks by points within the filtered set. `previous` maps student id to
/// the rank that student held last period.
pub fn leaderboard(
    entries: &[LeaderboardEntry],
    filter: &LeaderboardFilter,
    previous: &HashMap<String, usize>,
) -> Vec<LeaderboardRow> {
    let selected: Vec<LeaderboardEntry> = entries
        .iter()
        .filter(|e| filter.matches(e))
        .cloned()
        .collect();
    rank(&selected)
        .into_iter()
        .map(|r| {
            let rank_change = previous
                .get(&r.entry.student_id)
                .map(|prev| *prev as i64 - r.rank as i64);
            let trend = match rank_change {
                None => Trend::New,
                Some(d) if d > 0 => Trend::Up,
                Some(d) if d < 0 => Trend::Down,
                Some(_) => Trend::Stable,
            };
            LeaderboardRow {
                rank: r.rank,
                rank_change,
                trend,
                entry: r.entry,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSummary {
    pub student_count: usize,
    /// Rounded class mean of points; 0 for an empty board.
    pub average_points: u32,
    pub top_points: u64,
}

/// Class-level figures over the same filtered set `leaderboard` ranks.
pub fn summarize_leaderboard(
    entries: &[LeaderboardEntry],
    filter: &LeaderboardFilter,
) -> LeaderboardSummary {
    let mut summary = LeaderboardSummary::default();
    let mut total: u64 = 0;
    for e in entries.iter().filter(|e| filter.matches(e)) {
        summary.student_count += 1;
        total = total.saturating_add(e.points);
        summary.top_points = summary.top_points.max(e.points);
    }
    summary.average_points = round_half_up(total, summary.student_count as u64);
    summary
}
