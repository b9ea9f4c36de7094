use crate::calc::{round_half_up, Score};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub progress: u32,
    pub max_progress: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub earned: bool,
    /// Completion in whole percent, capped at 100.
    pub percent: u32,
}

/// An achievement is earned once its progress reaches `maxProgress`.
pub fn achievement_progress(
    index: usize,
    achievement: &Achievement,
) -> Result<AchievementProgress, ValidationError> {
    let max = achievement.max_progress;
    if max == 0 {
        return Err(ValidationError::NotPositive(format!(
            "achievements[{}].maxProgress",
            index
        )));
    }
    let done = achievement.progress.min(max);
    Ok(AchievementProgress {
        achievement: achievement.clone(),
        earned: achievement.progress >= max,
        percent: round_half_up(done as u64 * 100, max as u64),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    pub earned: usize,
    pub total: usize,
}

pub fn summarize_achievements(rows: &[AchievementProgress]) -> AchievementSummary {
    AchievementSummary {
        earned: rows.iter().filter(|r| r.earned).count(),
        total: rows.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject: String,
    pub progress: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningGoal {
    pub id: String,
    pub title: String,
    pub progress: i64,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOverview {
    /// Rounded mean of the subject percentages; 0 with no subjects.
    pub overall_progress: u32,
    pub subject_count: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub pending_goals: usize,
}

/// Rolls a student's subject and goal percentages into one overview.
/// Every percentage must lie in 0..=100.
pub fn progress_overview(
    subjects: &[SubjectProgress],
    goals: &[LearningGoal],
) -> Result<ProgressOverview, ValidationError> {
    let mut sum: u64 = 0;
    for (i, s) in subjects.iter().enumerate() {
        let score = Score::new(&format!("subjects[{}].progress", i), s.progress)?;
        sum += score.value() as u64;
    }
    for (i, g) in goals.iter().enumerate() {
        Score::new(&format!("goals[{}].progress", i), g.progress)?;
    }

    let count = |status: GoalStatus| goals.iter().filter(|g| g.status == status).count();
    Ok(ProgressOverview {
        overall_progress: round_half_up(sum, subjects.len() as u64),
        subject_count: subjects.len(),
        active_goals: count(GoalStatus::Active),
        completed_goals: count(GoalStatus::Completed),
        pending_goals: count(GoalStatus::Pending),
    })
}
