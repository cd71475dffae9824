use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Days, NaiveDate, Utc};
use learnify_rules::analytics::{
    daily_scores_in, export_filename, export_rows, has_enough_for_projection, project, summarize,
};
use learnify_schema::TimeRange;
use learnify_schema::analytics::{PerformanceResponse, PredictiveInsights, StudySessionCreate};
use serde::Deserialize;
use tracing::{debug, info};

use crate::ai::RecommendationContext;
use crate::db::models::DbStudySession;
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route(
            "/api/analytics/study-sessions",
            get(list_sessions).post(record_session),
        )
        .route("/api/analytics/performance", get(performance))
        .route("/api/analytics/export", get(export))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRangeQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    subject_id: Option<i64>,
}

async fn list_sessions(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<SessionRangeQuery>,
) -> Result<Json<Vec<DbStudySession>>, LearnifyError> {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return Err(LearnifyError::validation(
            "MISSING_FIELD",
            "startDate and endDate are required.",
        ));
    };
    if end < start {
        return Err(LearnifyError::validation(
            "INVALID_RANGE",
            "endDate must not be before startDate.",
        ));
    }

    // Inclusive of the whole end day.
    let from = start.and_time(chrono::NaiveTime::MIN).and_utc();
    let until = end
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX)
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();

    let mut sessions = state.db.list_study_sessions(caller.id, from, until).await?;
    if let Some(subject_id) = query.subject_id {
        sessions.retain(|s| s.subject_id == Some(subject_id));
    }
    Ok(Json(sessions))
}

async fn record_session(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<StudySessionCreate>,
) -> Result<(StatusCode, Json<DbStudySession>), LearnifyError> {
    if body.end_time.is_some_and(|end| end < body.start_time) {
        return Err(LearnifyError::validation(
            "INVALID_RANGE",
            "endTime must not be before startTime.",
        ));
    }
    let session = state.db.record_study_session(caller.id, body).await?;
    debug!(user.id = caller.id, session.id = session.id, kind = %session.kind, "Study session recorded");
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportQuery {
    user_id: Option<i64>,
    time_range: Option<String>,
    /// A subject id, or `all`.
    subject_id: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> TimeRange {
        TimeRange::parse_lenient(self.time_range.as_deref())
    }

    fn subject(&self) -> Result<Option<i64>, LearnifyError> {
        match self.subject_id.as_deref().map(str::trim) {
            None | Some("" | "all") => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                LearnifyError::validation("INVALID_QUERY", "subjectId must be a number or 'all'.")
            }),
        }
    }
}

async fn performance(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Json<PerformanceResponse>, LearnifyError> {
    let user_id = caller.viewable_user(&state.db, query.user_id).await?;
    let range = query.range();
    let subject_id = query.subject()?;
    let now = Utc::now();

    let data = state.db.activity_data(user_id, subject_id).await?;
    let summary = summarize(&data, range, now);

    let predictive_insights = if has_enough_for_projection(&data, range, now) {
        let user = state
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| LearnifyError::not_found(format!("User {user_id}")))?;
        let subject_name = match subject_id {
            Some(id) => state
                .db
                .list_subjects()
                .await?
                .into_iter()
                .find(|s| s.id == id)
                .map_or_else(|| "All Subjects".to_string(), |s| s.name),
            None => "All Subjects".to_string(),
        };
        let ctx = RecommendationContext {
            student: &user.name,
            grade_level: user.grade_level.as_deref(),
            subject: &subject_name,
        };
        Some(PredictiveInsights {
            predictions: project(&daily_scores_in(&data, range, now)),
            recommendations: state.ai.recommendations(ctx, &summary).await,
        })
    } else {
        None
    };

    Ok(Json(PerformanceResponse {
        user_id,
        time_range: range,
        summary,
        predictive_insights,
    }))
}

async fn export(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Response, LearnifyError> {
    let user_id = caller.viewable_user(&state.db, query.user_id).await?;
    let range = query.range();
    let subject_id = query.subject()?;

    let data = state.db.activity_data(user_id, subject_id).await?;
    let rows = export_rows(&data, range, Utc::now());

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &rows {
        writer.serialize(row)?;
    }
    if rows.is_empty() {
        writer.write_record([
            "Date",
            "Activity Type",
            "Title",
            "Subject",
            "Score",
            "Duration (minutes)",
        ])?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| LearnifyError::Unexpected(format!("CSV flush failed: {e}")))?;

    let subject_label = subject_id.map_or_else(|| "all".to_string(), |id| id.to_string());
    let filename = export_filename(range, &subject_label);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| LearnifyError::Unexpected(format!("bad content-disposition: {e}")))?;

    info!(user.id = user_id, rows = rows.len(), range = range.as_str(), "Performance data exported");

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
