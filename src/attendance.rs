use crate::calc::round_half_up;
use crate::error::ValidationError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Students below this percentage are flagged on the class report.
pub const LOW_ATTENDANCE_THRESHOLD: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Sick,
    Excused,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Excused => "excused",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the English names and the sheet codes (hadir, sakit, izin, alpha).
impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" | "hadir" => Ok(AttendanceStatus::Present),
            "sick" | "sakit" => Ok(AttendanceStatus::Sick),
            "excused" | "izin" => Ok(AttendanceStatus::Excused),
            "absent" | "alpha" => Ok(AttendanceStatus::Absent),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::BadDate(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttendanceEntry {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub present: usize,
    pub sick: usize,
    pub excused: usize,
    pub absent: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.present + self.sick + self.excused + self.absent
    }

    fn bump(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Sick => self.sick += 1,
            AttendanceStatus::Excused => self.excused += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }
}

/// Count statuses, e.g. one class on one day.
pub fn daily_tally<I>(statuses: I) -> StatusCounts
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    let mut counts = StatusCounts::default();
    for s in statuses {
        counts.bump(s);
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total_days: usize,
    pub percentage: u32,
}

impl AttendanceSummary {
    pub fn band(&self) -> AttendanceBand {
        band(self.percentage)
    }
}

/// Totals per status plus the share of days present. No records means 0%.
pub fn aggregate(records: &[AttendanceEntry]) -> AttendanceSummary {
    let counts = daily_tally(records.iter().map(|r| r.status));
    let total_days = records.len();
    AttendanceSummary {
        counts,
        total_days,
        percentage: round_half_up(counts.present as u64 * 100, total_days as u64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceBand {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

pub fn band(percentage: u32) -> AttendanceBand {
    match percentage {
        p if p >= 90 => AttendanceBand::Excellent,
        p if p >= 80 => AttendanceBand::Good,
        p if p >= 70 => AttendanceBand::Fair,
        _ => AttendanceBand::NeedsAttention,
    }
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AttendancePeriod {
    pub year: i32,
    pub month: u32,
}

impl AttendancePeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        match (self.first_day(), next) {
            (Some(first), Some(next)) => (next - first).num_days() as u32,
            _ => 0,
        }
    }

    pub fn select(&self, records: &[AttendanceEntry]) -> Vec<AttendanceEntry> {
        records
            .iter()
            .filter(|r| self.contains(r.date))
            .copied()
            .collect()
    }
}

impl fmt::Display for AttendancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for AttendancePeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ValidationError::BadPeriod(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        let year = y.parse::<i32>().map_err(|_| bad())?;
        let month = m.parse::<u32>().map_err(|_| bad())?;
        if !(1..=12).contains(&month) {
            return Err(bad());
        }
        let period = AttendancePeriod { year, month };
        period.first_day().ok_or_else(bad)?;
        Ok(period)
    }
}

/// One student's attendance for a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub entries: Vec<AttendanceEntry>,
}

impl AttendanceRecord {
    pub fn summary(&self, period: Option<&AttendancePeriod>) -> AttendanceSummary {
        match period {
            Some(p) => aggregate(&p.select(&self.entries)),
            None => aggregate(&self.entries),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttendanceStats {
    pub student_count: usize,
    pub average_percentage: u32,
    pub perfect_attendance: usize,
    pub low_attendance: usize,
}

pub fn summarize_class(summaries: &[AttendanceSummary]) -> ClassAttendanceStats {
    if summaries.is_empty() {
        return ClassAttendanceStats::default();
    }
    let sum: u64 = summaries.iter().map(|s| s.percentage as u64).sum();
    ClassAttendanceStats {
        student_count: summaries.len(),
        average_percentage: round_half_up(sum, summaries.len() as u64),
        perfect_attendance: summaries.iter().filter(|s| s.percentage == 100).count(),
        low_attendance: summaries
            .iter()
            .filter(|s| s.percentage < LOW_ATTENDANCE_THRESHOLD)
            .count(),
    }
}
