//! Read-only aggregation over completed-session history.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::model::{HistoryEntry, Subject};

/// Number of trailing days reported in [`StudyStats::last_seven_days`].
pub const TREND_DAYS: i64 = 7;

/// Coarse rating for a subject's accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressRating {
    /// Below 30 %.
    Poor,
    /// 30 % up to (not including) 80 %.
    Fair,
    Excellent,
}

impl ProgressRating {
    #[must_use]
    pub fn from_percent(percent: u32) -> Self {
        if percent < 30 {
            ProgressRating::Poor
        } else if percent < 80 {
            ProgressRating::Fair
        } else {
            ProgressRating::Excellent
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ProgressRating::Poor => "미흡",
            ProgressRating::Fair => "보통",
            ProgressRating::Excellent => "우수",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectProgress {
    pub subject: Subject,
    pub solved: u32,
    pub correct: u32,
    pub percent: u32,
    pub rating: ProgressRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub problems: u32,
}

/// Aggregate statistics for the home and analysis pages.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyStats {
    pub today_problems: u32,
    pub total_problems: u32,
    pub total_correct: u32,
    /// `sum(correct) / sum(total)`; `None` when nothing was solved.
    pub accuracy: Option<f64>,
    pub streak_days: u32,
    pub subjects: Vec<SubjectProgress>,
    /// Oldest first, ending today.
    pub last_seven_days: Vec<DailyCount>,
}

impl StudyStats {
    /// Aggregate history, bucketing dates into calendar days at `offset`.
    #[must_use]
    pub fn from_history(
        entries: &[HistoryEntry],
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let today = local_day(now, offset);

        let mut today_problems = 0_u32;
        let mut total_problems = 0_u32;
        let mut total_correct = 0_u32;
        let mut days = HashSet::new();
        let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        let mut per_subject: BTreeMap<Subject, (u32, u32)> = BTreeMap::new();

        for entry in entries {
            let day = local_day(entry.date(), offset);
            days.insert(day);

            total_problems = total_problems.saturating_add(entry.total());
            total_correct = total_correct.saturating_add(entry.correct_count());
            if day == today {
                today_problems = today_problems.saturating_add(entry.total());
            }

            let bucket = per_day.entry(day).or_default();
            *bucket = bucket.saturating_add(entry.total());

            let (solved, correct) = per_subject.entry(entry.subject().clone()).or_default();
            *solved = solved.saturating_add(entry.total());
            *correct = correct.saturating_add(entry.correct_count());
        }

        let accuracy = (total_problems > 0)
            .then(|| f64::from(total_correct) / f64::from(total_problems));

        let subjects = per_subject
            .into_iter()
            .map(|(subject, (solved, correct))| {
                let percent = percent(correct, solved);
                SubjectProgress {
                    subject,
                    solved,
                    correct,
                    percent,
                    rating: ProgressRating::from_percent(percent),
                }
            })
            .collect();

        let last_seven_days = (0..TREND_DAYS)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                DailyCount {
                    date,
                    problems: per_day.get(&date).copied().unwrap_or(0),
                }
            })
            .collect();

        Self {
            today_problems,
            total_problems,
            total_correct,
            accuracy,
            streak_days: streak(&days, today),
            subjects,
            last_seven_days,
        }
    }

    /// Accuracy as a rounded percentage; 0 when nothing was solved.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percent(self.total_correct, self.total_problems)
    }
}

/// Consecutive days with activity, walking back from `today` until the first gap.
#[must_use]
pub fn streak(days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut count = 0_u32;
    let mut day = Some(today);
    while let Some(current) = day {
        if !days.contains(&current) {
            break;
        }
        count += 1;
        day = current.pred_opt();
    }
    count
}

fn local_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, StudyMode};
    use crate::time::fixed_now;

    fn entry(subject: &str, total: u32, correct: u32, date: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry::from_persisted(
            Subject::new(subject).unwrap(),
            Difficulty::Easy,
            StudyMode::Quiz,
            total,
            correct,
            total - correct,
            correct * 10,
            date,
        )
        .unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn empty_history_has_no_accuracy() {
        let stats = StudyStats::from_history(&[], fixed_now(), utc());
        assert_eq!(stats.today_problems, 0);
        assert_eq!(stats.accuracy, None);
        assert_eq!(stats.accuracy_percent(), 0);
        assert_eq!(stats.streak_days, 0);
        assert_eq!(stats.last_seven_days.len(), 7);
    }

    #[test]
    fn today_total_and_accuracy() {
        let now = fixed_now();
        let history = vec![
            entry("os", 10, 8, now),
            entry("ds", 5, 2, now - Duration::hours(1)),
            entry("os", 10, 5, now - Duration::days(3)),
        ];
        let stats = StudyStats::from_history(&history, now, utc());

        assert_eq!(stats.today_problems, 15);
        assert_eq!(stats.total_problems, 25);
        assert_eq!(stats.total_correct, 15);
        assert!((stats.accuracy.unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(stats.accuracy_percent(), 60);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let now = fixed_now();
        let history = vec![
            entry("os", 1, 1, now),
            entry("os", 1, 1, now - Duration::days(1)),
            entry("os", 1, 1, now - Duration::days(2)),
            entry("os", 1, 1, now - Duration::days(4)),
        ];
        let stats = StudyStats::from_history(&history, now, utc());
        assert_eq!(stats.streak_days, 3);
    }

    #[test]
    fn streak_is_zero_without_activity_today() {
        let now = fixed_now();
        let history = vec![entry("os", 1, 1, now - Duration::days(1))];
        let stats = StudyStats::from_history(&history, now, utc());
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn offset_moves_day_boundary() {
        // fixed_now() is 22:13 UTC, already the next day at UTC+9; 12:13 UTC is not.
        let now = fixed_now();
        let earlier = now - Duration::hours(10);
        let history = vec![entry("os", 4, 4, earlier)];

        let at_utc = StudyStats::from_history(&history, now, utc());
        assert_eq!(at_utc.today_problems, 4);

        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let at_seoul = StudyStats::from_history(&history, now, seoul);
        assert_eq!(at_seoul.today_problems, 0);
        assert_eq!(at_seoul.streak_days, 0);
    }

    #[test]
    fn subjects_are_rated() {
        let now = fixed_now();
        let history = vec![
            entry("os", 40, 10, now),
            entry("ds", 64, 56, now),
            entry("web", 40, 30, now),
        ];
        let stats = StudyStats::from_history(&history, now, utc());

        let by_key: Vec<_> = stats
            .subjects
            .iter()
            .map(|s| (s.subject.as_str(), s.percent, s.rating))
            .collect();
        assert_eq!(
            by_key,
            vec![
                ("ds", 88, ProgressRating::Excellent),
                ("os", 25, ProgressRating::Poor),
                ("web", 75, ProgressRating::Fair),
            ]
        );
    }

    #[test]
    fn trend_buckets_end_today() {
        let now = fixed_now();
        let history = vec![
            entry("os", 3, 3, now),
            entry("os", 2, 1, now - Duration::days(6)),
            entry("os", 9, 9, now - Duration::days(7)),
        ];
        let stats = StudyStats::from_history(&history, now, utc());
        let counts: Vec<u32> = stats.last_seven_days.iter().map(|d| d.problems).collect();
        assert_eq!(counts, vec![2, 0, 0, 0, 0, 0, 3]);
        assert_eq!(stats.last_seven_days[6].date, now.date_naive());
    }
}
