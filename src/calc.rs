use crate::error::ValidationError;
use crate::ranking::Scored;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum final score that counts as a pass.
pub const PASS_THRESHOLD: u32 = 75;

/// Round `numerator / denominator` to the nearest integer, halves rounding up.
/// A zero denominator yields 0.
pub fn round_half_up(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let rounded = (2 * numerator + denominator) / (2 * denominator);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreComponent {
    Assignment,
    Midterm,
    Final,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 3] = [
        ScoreComponent::Assignment,
        ScoreComponent::Midterm,
        ScoreComponent::Final,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreComponent::Assignment => "assignment",
            ScoreComponent::Midterm => "midterm",
            ScoreComponent::Final => "final",
        }
    }

    /// Grade sheet column name: tugas, uts, uas.
    pub fn sheet_alias(self) -> &'static str {
        match self {
            ScoreComponent::Assignment => "tugas",
            ScoreComponent::Midterm => "uts",
            ScoreComponent::Final => "uas",
        }
    }

    /// Accepts the English key or the sheet alias. Case-sensitive, like the
    /// rest of the wire format.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == key || c.sheet_alias() == key)
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component score known to lie in [0,100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// `field` only feeds the error message.
    pub fn new(field: &str, value: i64) -> Result<Self, ValidationError> {
        if !(0..=Self::MAX as i64).contains(&value) {
            return Err(ValidationError::out_of_range(field, value));
        }
        Ok(Score(value as u8))
    }

    pub fn value(self) -> u32 {
        self.0 as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub assignment: Score,
    pub midterm: Score,
    #[serde(rename = "final")]
    pub final_exam: Score,
}

impl ScoreComponents {
    pub fn get(&self, component: ScoreComponent) -> Score {
        match component {
            ScoreComponent::Assignment => self.assignment,
            ScoreComponent::Midterm => self.midterm,
            ScoreComponent::Final => self.final_exam,
        }
    }

    pub fn set(&mut self, component: ScoreComponent, score: Score) {
        match component {
            ScoreComponent::Assignment => self.assignment = score,
            ScoreComponent::Midterm => self.midterm = score,
            ScoreComponent::Final => self.final_exam = score,
        }
    }
}

/// Percentage weight per component. Weights are expected to total 100, but
/// nothing here enforces it; see [`validate_weights`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightConfig {
    pub assignment: u32,
    pub midterm: u32,
    #[serde(rename = "final")]
    pub final_exam: u32,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            assignment: 30,
            midterm: 30,
            final_exam: 40,
        }
    }
}

impl WeightConfig {
    pub fn get(&self, component: ScoreComponent) -> u32 {
        match component {
            ScoreComponent::Assignment => self.assignment,
            ScoreComponent::Midterm => self.midterm,
            ScoreComponent::Final => self.final_exam,
        }
    }

    pub fn total(&self) -> u64 {
        ScoreComponent::ALL
            .iter()
            .map(|c| self.get(*c) as u64)
            .sum()
    }
}

/// Parses `"assignment,midterm,final"`, e.g. `30,30,40`.
impl FromStr for WeightConfig {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ValidationError::BadWeights(s.to_string()))?;
        let [assignment, midterm, final_exam] = parts[..] else {
            return Err(ValidationError::BadWeights(s.to_string()));
        };
        Ok(Self {
            assignment,
            midterm,
            final_exam,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightCheck {
    pub valid: bool,
    pub total: u64,
}

impl WeightCheck {
    fn from_total(total: u64) -> Self {
        Self {
            valid: total == 100,
            total,
        }
    }
}

pub fn validate_weights(weights: &WeightConfig) -> WeightCheck {
    WeightCheck::from_total(weights.total())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub weight: u32,
}

pub fn validate_categories(categories: &[GradeCategory]) -> WeightCheck {
    WeightCheck::from_total(categories.iter().map(|c| c.weight as u64).sum())
}

pub fn compute_final_grade(scores: &ScoreComponents, weights: &WeightConfig) -> u32 {
    let weighted: u64 = ScoreComponent::ALL
        .iter()
        .map(|c| scores.get(*c).value() as u64 * weights.get(*c) as u64)
        .sum();
    round_half_up(weighted, 100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    Pass,
    Fail,
}

pub fn classify(final_score: u32) -> PassStatus {
    if final_score >= PASS_THRESHOLD {
        PassStatus::Pass
    } else {
        PassStatus::Fail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    E,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::E => "E",
        };
        f.write_str(s)
    }
}

/// A >= 90, B >= 80, C >= 70, D >= 60, otherwise E.
pub fn letter_grade(final_score: u32) -> LetterGrade {
    match final_score {
        s if s >= 90 => LetterGrade::A,
        s if s >= 80 => LetterGrade::B,
        s if s >= 70 => LetterGrade::C,
        s if s >= 60 => LetterGrade::D,
        _ => LetterGrade::E,
    }
}

/// One student's row on a grade sheet. The derived fields are private so they
/// can only change through the component setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    student_id: String,
    scores: ScoreComponents,
    final_score: u32,
    status: PassStatus,
    letter: LetterGrade,
}

impl GradeRecord {
    pub fn new(
        student_id: impl Into<String>,
        scores: ScoreComponents,
        weights: &WeightConfig,
    ) -> Self {
        let final_score = compute_final_grade(&scores, weights);
        Self {
            student_id: student_id.into(),
            scores,
            final_score,
            status: classify(final_score),
            letter: letter_grade(final_score),
        }
    }

    pub fn set_component(
        &mut self,
        component: ScoreComponent,
        score: Score,
        weights: &WeightConfig,
    ) {
        self.scores.set(component, score);
        self.recompute(weights);
    }

    pub fn recompute(&mut self, weights: &WeightConfig) {
        self.final_score = compute_final_grade(&self.scores, weights);
        self.status = classify(self.final_score);
        self.letter = letter_grade(self.final_score);
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn scores(&self) -> &ScoreComponents {
        &self.scores
    }

    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    pub fn status(&self) -> PassStatus {
        self.status
    }

    pub fn letter(&self) -> LetterGrade {
        self.letter
    }
}

impl Scored for GradeRecord {
    fn score(&self) -> f64 {
        self.final_score as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
    pub student_count: usize,
    pub average: u32,
    pub highest: u32,
    pub lowest: u32,
    pub passed: usize,
    pub failed: usize,
}

pub fn summarize_grades(records: &[GradeRecord]) -> GradeSummary {
    if records.is_empty() {
        return GradeSummary::default();
    }
    let sum: u64 = records.iter().map(|r| r.final_score as u64).sum();
    let passed = records
        .iter()
        .filter(|r| r.status == PassStatus::Pass)
        .count();
    GradeSummary {
        student_count: records.len(),
        average: round_half_up(sum, records.len() as u64),
        highest: records.iter().map(|r| r.final_score).max().unwrap_or(0),
        lowest: records.iter().map(|r| r.final_score).min().unwrap_or(0),
        passed,
        failed: records.len() - passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(a: i64, m: i64, f: i64) -> ScoreComponents {
        ScoreComponents {
            assignment: Score::new("assignment", a).expect("assignment"),
            midterm: Score::new("midterm", m).expect("midterm"),
            final_exam: Score::new("final", f).expect("final"),
        }
    }

    fn weights(a: u32, m: u32, f: u32) -> WeightConfig {
        WeightConfig {
            assignment: a,
            midterm: m,
            final_exam: f,
        }
    }

    #[test]
    fn uniform_scores_reproduce_the_score() {
        assert_eq!(compute_final_grade(&scores(80, 80, 80), &weights(30, 30, 40)), 80);
    }

    #[test]
    fn weighted_sum_rounds_half_up() {
        // 25.5 + 24 + 35.2 = 84.7
        assert_eq!(compute_final_grade(&scores(85, 80, 88), &weights(30, 30, 40)), 85);
        // 0.5 * 1 = 0.5 -> 1
        assert_eq!(compute_final_grade(&scores(1, 0, 0), &weights(50, 50, 0)), 1);
        // 0.3 * 1 = 0.3 -> 0
        assert_eq!(compute_final_grade(&scores(1, 0, 0), &weights(30, 30, 40)), 0);
    }

    #[test]
    fn bad_weight_total_still_computes_and_is_reported() {
        let w = weights(50, 50, 50);
        assert_eq!(compute_final_grade(&scores(80, 80, 80), &w), 120);
        assert_eq!(validate_weights(&w), WeightCheck { valid: false, total: 150 });
        assert_eq!(
            validate_weights(&WeightConfig::default()),
            WeightCheck { valid: true, total: 100 }
        );
    }

    #[test]
    fn score_rejects_out_of_range() {
        assert!(Score::new("midterm", 101).is_err());
        assert!(Score::new("midterm", -1).is_err());
        assert_eq!(Score::new("midterm", 100).map(Score::value), Ok(100));
        assert_eq!(Score::new("midterm", 0).map(Score::value), Ok(0));
    }

    #[test]
    fn letter_boundaries() {
        assert_eq!(letter_grade(90), LetterGrade::A);
        assert_eq!(letter_grade(89), LetterGrade::B);
        assert_eq!(letter_grade(80), LetterGrade::B);
        assert_eq!(letter_grade(70), LetterGrade::C);
        assert_eq!(letter_grade(60), LetterGrade::D);
        assert_eq!(letter_grade(59), LetterGrade::E);
        assert_eq!(letter_grade(0), LetterGrade::E);
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        assert_eq!(classify(75), PassStatus::Pass);
        assert_eq!(classify(74), PassStatus::Fail);
    }

    #[test]
    fn record_recomputes_on_component_change() {
        let w = WeightConfig::default();
        let mut rec = GradeRecord::new("2023001", scores(70, 70, 70), &w);
        assert_eq!(rec.final_score(), 70);
        assert_eq!(rec.status(), PassStatus::Fail);

        rec.set_component(ScoreComponent::Final, Score::new("final", 95).expect("score"), &w);
        // 21 + 21 + 38
        assert_eq!(rec.final_score(), 80);
        assert_eq!(rec.status(), PassStatus::Pass);
        assert_eq!(rec.letter(), LetterGrade::B);
        assert_eq!(rec.scores().final_exam.value(), 95);
    }

    #[test]
    fn summary_of_sample_class() {
        let w = WeightConfig::default();
        let rows = vec![
            GradeRecord::new("1", scores(85, 80, 88), &w),
            GradeRecord::new("2", scores(90, 85, 92), &w),
            GradeRecord::new("3", scores(78, 75, 80), &w),
            GradeRecord::new("4", scores(50, 60, 55), &w),
        ];
        let s = summarize_grades(&rows);
        assert_eq!(s.student_count, 4);
        assert_eq!(s.highest, 89);
        assert_eq!(s.lowest, 55);
        assert_eq!(s.passed, 3);
        assert_eq!(s.failed, 1);
        // (85 + 89 + 78 + 55) / 4 = 76.75
        assert_eq!(s.average, 77);
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        assert_eq!(summarize_grades(&[]), GradeSummary::default());
    }

    #[test]
    fn weights_parse_from_csv() {
        assert_eq!("30, 30,40".parse::<WeightConfig>(), Ok(WeightConfig::default()));
        assert!("30,30".parse::<WeightConfig>().is_err());
        assert!("30,-1,40".parse::<WeightConfig>().is_err());
    }

    #[test]
    fn categories_total() {
        let category = |name: &str, weight: u32| GradeCategory {
            name: name.to_string(),
            description: None,
            weight,
        };
        let cats = vec![
            category("Tugas Harian", 30),
            category("UTS", 30),
            category("UAS", 30),
        ];
        assert_eq!(validate_categories(&cats), WeightCheck { valid: false, total: 90 });
        assert_eq!(validate_categories(&[]), WeightCheck { valid: false, total: 0 });
    }

    #[test]
    fn component_keys_accept_sheet_aliases() {
        assert_eq!(ScoreComponent::from_key("tugas"), Some(ScoreComponent::Assignment));
        assert_eq!(ScoreComponent::from_key("uts"), Some(ScoreComponent::Midterm));
        assert_eq!(ScoreComponent::from_key("uas"), Some(ScoreComponent::Final));
        assert_eq!(ScoreComponent::from_key("final"), Some(ScoreComponent::Final));
        assert_eq!(ScoreComponent::from_key("Final"), None);
        assert_eq!(ScoreComponent::from_key("assignmnet"), None);
    }

    #[test]
    fn grade_records_rank_by_final_score() {
        let w = WeightConfig::default();
        let rows = vec![
            GradeRecord::new("1", scores(70, 70, 70), &w),
            GradeRecord::new("2", scores(85, 80, 88), &w),
            GradeRecord::new("3", scores(70, 70, 70), &w),
        ];
        let ranked = crate::ranking::rank(&rows);
        let order: Vec<(&str, usize)> = ranked
            .iter()
            .map(|r| (r.entry.student_id(), r.rank))
            .collect();
        assert_eq!(order, vec![("2", 1), ("1", 2), ("3", 3)]);
    }
}
