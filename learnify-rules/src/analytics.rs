//! Performance aggregation over a reporting window.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use learnify_schema::analytics::{
    ActivitySlice, HeatmapCell, PerformanceSummary, PeriodChange, ProjectedPoint, RecentActivity,
    Recommendation, SubjectPerformance, TrendPoint, VelocityPoint,
};
use learnify_schema::{SessionKind, TimeRange};
use serde::Serialize;
use std::collections::BTreeMap;

const RECENT_LIMIT: usize = 10;
const PROJECTION_DAYS: i64 = 7;
const PROJECTION_MIN_ITEMS: usize = 5;
const PROJECTION_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct LessonRecord {
    pub title: String,
    pub subject: String,
    /// Best accuracy as a percentage.
    pub score: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizRecord {
    pub title: String,
    pub subject: String,
    pub score: f64,
    pub date: DateTime<Utc>,
    pub minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub kind: SessionKind,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn minutes(&self) -> i64 {
        self.end
            .map_or(0, |end| (end - self.start).num_minutes().max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRecord {
    pub amount: i64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityData {
    pub lessons: Vec<LessonRecord>,
    pub quizzes: Vec<QuizRecord>,
    pub sessions: Vec<SessionRecord>,
    pub xp: Vec<XpRecord>,
}

/// Half-open reporting window `[start, end)`; `start` is `None` for `all`.
///
/// The current window ends at `now` and the previous one at the current
/// window's `start`, so a boundary timestamp lands in exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn for_range(range: TimeRange, now: DateTime<Utc>) -> Self {
        Self {
            start: shift_back(range, now),
            end: now,
        }
    }

    /// Window of the same calendar length immediately before this one.
    pub fn previous(&self, range: TimeRange) -> Option<Self> {
        let start = self.start?;
        Some(Self {
            start: Some(shift_back(range, start)?),
            end: start,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| at >= s) && at < self.end
    }

    fn filter(&self, data: &ActivityData) -> ActivityData {
        ActivityData {
            lessons: data.lessons.iter().filter(|l| self.contains(l.date)).cloned().collect(),
            quizzes: data.quizzes.iter().filter(|q| self.contains(q.date)).cloned().collect(),
            sessions: data.sessions.iter().filter(|s| self.contains(s.start)).cloned().collect(),
            xp: data.xp.iter().filter(|x| self.contains(x.date)).copied().collect(),
        }
    }
}

fn shift_back(range: TimeRange, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match range {
        TimeRange::Week => from.checked_sub_signed(Duration::days(7)),
        TimeRange::Month => from.checked_sub_months(Months::new(1)),
        TimeRange::Year => from.checked_sub_months(Months::new(12)),
        TimeRange::All => None,
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn rounded_mean(values: &[f64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).round() as i64
}

fn scores(data: &ActivityData) -> Vec<f64> {
    data.lessons
        .iter()
        .map(|l| l.score)
        .chain(data.quizzes.iter().map(|q| q.score))
        .collect()
}

fn study_minutes(data: &ActivityData) -> i64 {
    data.sessions.iter().map(SessionRecord::minutes).sum()
}

fn total_xp(data: &ActivityData) -> i64 {
    data.xp.iter().map(|x| x.amount).sum()
}

fn subject_performance(data: &ActivityData) -> Vec<SubjectPerformance> {
    let mut by_subject: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (subject, score) in data
        .lessons
        .iter()
        .map(|l| (l.subject.as_str(), l.score))
        .chain(data.quizzes.iter().map(|q| (q.subject.as_str(), q.score)))
    {
        by_subject.entry(subject).or_default().push(score);
    }

    let mut out: Vec<SubjectPerformance> = by_subject
        .into_iter()
        .map(|(subject, values)| SubjectPerformance {
            subject: subject.to_string(),
            score: rounded_mean(&values),
        })
        .collect();
    out.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.subject.cmp(&b.subject)));
    out
}

fn activity_distribution(data: &ActivityData) -> Vec<ActivitySlice> {
    let count = |kinds: &[SessionKind]| {
        data.sessions.iter().filter(|s| kinds.contains(&s.kind)).count()
    };
    [
        ("Lessons", data.lessons.len()),
        ("Quizzes", data.quizzes.len()),
        ("Practice", count(&[SessionKind::Practice])),
        ("Review", count(&[SessionKind::Review])),
        ("Other", count(&[SessionKind::Reading, SessionKind::Other])),
    ]
    .into_iter()
    .filter(|(_, n)| *n > 0)
    .map(|(name, n)| ActivitySlice {
        name: name.to_string(),
        value: i64::try_from(n).unwrap_or(i64::MAX),
    })
    .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn recent_activities(data: &ActivityData) -> Vec<RecentActivity> {
    let mut all: Vec<RecentActivity> = data
        .lessons
        .iter()
        .map(|l| RecentActivity {
            kind: "lesson".to_string(),
            title: l.title.clone(),
            subject: l.subject.clone(),
            date: l.date,
            score: Some(l.score.round() as i64),
            duration: None,
        })
        .chain(data.quizzes.iter().map(|q| RecentActivity {
            kind: "quiz".to_string(),
            title: q.title.clone(),
            subject: q.subject.clone(),
            date: q.date,
            score: Some(q.score.round() as i64),
            duration: q.minutes,
        }))
        .chain(data.sessions.iter().map(|s| RecentActivity {
            kind: "session".to_string(),
            title: session_title(s.kind),
            subject: s.subject.clone(),
            date: s.start,
            score: None,
            duration: Some(s.minutes()),
        }))
        .collect();
    all.sort_by(|a, b| b.date.cmp(&a.date));
    all.truncate(RECENT_LIMIT);
    all
}

fn session_title(kind: SessionKind) -> String {
    let label = match kind {
        SessionKind::Practice => "Practice",
        SessionKind::Review => "Review",
        SessionKind::Reading => "Reading",
        SessionKind::Other => "Study",
    };
    format!("{label} Session")
}

/// Per-day mean of scored activities, rounded to whole points, ascending.
#[allow(clippy::cast_precision_loss)]
pub fn daily_scores(data: &ActivityData) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (date, score) in data
        .lessons
        .iter()
        .map(|l| (l.date.date_naive(), l.score))
        .chain(data.quizzes.iter().map(|q| (q.date.date_naive(), q.score)))
    {
        by_day.entry(date).or_default().push(score);
    }
    by_day
        .into_iter()
        .map(|(day, v)| (day, (v.iter().sum::<f64>() / v.len() as f64).round()))
        .collect()
}

/// Daily scores restricted to the reporting window; the input to [`project`].
pub fn daily_scores_in(
    data: &ActivityData,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Vec<(NaiveDate, f64)> {
    daily_scores(&Window::for_range(range, now).filter(data))
}

fn performance_trend(data: &ActivityData) -> Vec<TrendPoint> {
    let mut days: BTreeMap<NaiveDate, (Vec<f64>, i64)> = BTreeMap::new();
    for (day, score) in daily_scores(data) {
        days.entry(day).or_default().0.push(score);
    }
    for s in &data.sessions {
        days.entry(s.start.date_naive()).or_default().1 += s.minutes();
    }
    days.into_iter()
        .map(|(date, (score, minutes))| TrendPoint {
            date,
            score: rounded_mean(&score),
            time_spent: minutes,
        })
        .collect()
}

fn learning_velocity(data: &ActivityData, trend: &[TrendPoint]) -> Vec<VelocityPoint> {
    let mut xp_by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for x in &data.xp {
        *xp_by_day.entry(x.date.date_naive()).or_default() += x.amount;
    }
    let mut prev_score: Option<i64> = None;
    trend
        .iter()
        .map(|p| {
            let velocity = prev_score.map_or(0, |prev| p.score - prev);
            prev_score = Some(p.score);
            VelocityPoint {
                date: p.date,
                velocity,
                xp_per_day: xp_by_day.get(&p.date).copied().unwrap_or(0),
            }
        })
        .collect()
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn study_heatmap(data: &ActivityData) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<(i32, u32, u32), i64> = BTreeMap::new();
    for s in &data.sessions {
        let week = s.start.iso_week();
        let weekday = s.start.weekday().num_days_from_monday();
        *cells.entry((week.year(), week.week(), weekday)).or_default() += s.minutes();
    }
    cells
        .into_iter()
        .map(|((_, week, weekday), value)| HeatmapCell {
            day: WEEKDAYS[weekday as usize].to_string(),
            week,
            value,
        })
        .collect()
}

pub fn summarize(data: &ActivityData, range: TimeRange, now: DateTime<Utc>) -> PerformanceSummary {
    let window = Window::for_range(range, now);
    let current = window.filter(data);

    let average_score = rounded_mean(&scores(&current));
    let total_study_time = study_minutes(&current);
    let total = total_xp(&current);

    let changes = window.previous(range).map(|prev| {
        let before = prev.filter(data);
        PeriodChange {
            score_change: average_score - rounded_mean(&scores(&before)),
            time_change: total_study_time - study_minutes(&before),
            xp_change: total - total_xp(&before),
        }
    });

    let performance_trend = performance_trend(&current);
    PerformanceSummary {
        average_score,
        total_study_time,
        total_xp: total,
        subject_performance: subject_performance(&current),
        activity_distribution: activity_distribution(&current),
        recent_activities: recent_activities(&current),
        learning_velocity: learning_velocity(&current, &performance_trend),
        performance_trend,
        study_heatmap: study_heatmap(&current),
        changes,
    }
}

/// Whether there is enough activity in the window to project from.
pub fn has_enough_for_projection(data: &ActivityData, range: TimeRange, now: DateTime<Utc>) -> bool {
    let current = Window::for_range(range, now).filter(data);
    current.lessons.len() > PROJECTION_MIN_ITEMS
        || current.quizzes.len() > PROJECTION_MIN_ITEMS
        || current.sessions.len() > PROJECTION_MIN_ITEMS
}

/// Projects the next seven days from the per-day slope of the last three
/// daily scores.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn project(points: &[(NaiveDate, f64)]) -> Vec<ProjectedPoint> {
    if points.len() < PROJECTION_POINTS {
        return Vec::new();
    }
    let recent = &points[points.len() - PROJECTION_POINTS..];
    let (first_day, first_score) = recent[0];
    let (last_day, last_score) = recent[PROJECTION_POINTS - 1];
    let span = (last_day - first_day).num_days();
    let slope = if span > 0 {
        (last_score - first_score) / span as f64
    } else {
        0.0
    };

    (1..=PROJECTION_DAYS)
        .map(|k| ProjectedPoint {
            date: last_day + Duration::days(k),
            projected_score: (last_score + slope * k as f64).clamp(0.0, 100.0).round() as i64,
        })
        .collect()
}

pub fn fallback_recommendations() -> Vec<Recommendation> {
    let rec = |title: &str, description: &str, tags: [&str; 2], action: &str, link: &str| Recommendation {
        title: title.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        action_text: Some(action.to_string()),
        action_link: Some(link.to_string()),
    };
    vec![
        rec(
            "Practice Regularly",
            "Set aside 20 minutes each day for focused practice on challenging topics.",
            ["Study Habits", "Time Management"],
            "Create Study Schedule",
            "/dashboard/schedule",
        ),
        rec(
            "Review Past Mistakes",
            "Analyze your previous quiz attempts to identify and address knowledge gaps.",
            ["Review", "Self-Assessment"],
            "View Quiz History",
            "/dashboard/quizzes",
        ),
        rec(
            "Try Different Learning Methods",
            "Experiment with visual, auditory, and kinesthetic learning approaches to find what works best for you.",
            ["Learning Styles", "Study Techniques"],
            "Explore Learning Styles",
            "/dashboard/learning-styles",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Activity Type")]
    pub activity_type: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Score")]
    pub score: Option<i64>,
    #[serde(rename = "Duration (minutes)")]
    pub duration_minutes: Option<i64>,
}

/// One row per lesson, quiz and session in the window, oldest first.
#[allow(clippy::cast_possible_truncation)]
pub fn export_rows(data: &ActivityData, range: TimeRange, now: DateTime<Utc>) -> Vec<ExportRow> {
    let current = Window::for_range(range, now).filter(data);
    let mut rows: Vec<(DateTime<Utc>, ExportRow)> = current
        .lessons
        .iter()
        .map(|l| (l.date, "Lesson".to_string(), &l.title, &l.subject, Some(l.score), None))
        .chain(
            current
                .quizzes
                .iter()
                .map(|q| (q.date, "Quiz".to_string(), &q.title, &q.subject, Some(q.score), q.minutes)),
        )
        .map(|(date, kind, title, subject, score, minutes)| {
            (
                date,
                ExportRow {
                    date: date.format("%Y-%m-%d").to_string(),
                    activity_type: kind,
                    title: title.clone(),
                    subject: subject.clone(),
                    score: score.map(|s| s.round() as i64),
                    duration_minutes: minutes,
                },
            )
        })
        .collect();
    rows.extend(current.sessions.iter().map(|s| {
        (
            s.start,
            ExportRow {
                date: s.start.format("%Y-%m-%d").to_string(),
                activity_type: "Study Session".to_string(),
                title: session_title(s.kind),
                subject: s.subject.clone(),
                score: None,
                duration_minutes: Some(s.minutes()),
            },
        )
    }));
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.into_iter().map(|(_, row)| row).collect()
}

pub fn export_filename(range: TimeRange, subject: &str) -> String {
    format!("performance_data_{}_{subject}.csv", range.as_str())
}
