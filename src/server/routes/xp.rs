use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use learnify_rules::StreakOutcome;
use learnify_rules::xp::{SOURCE_MANUAL, validate_award};
use learnify_schema::xp::{BadgeView, DailyClaimResponse, XpAwardRequest, XpAwardResponse, XpSummary};
use serde::Deserialize;
use tracing::info;

use crate::db::models::DbXpTransaction;
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/xp", get(summary))
        .route("/api/xp/daily", post(claim_daily))
        .route("/api/xp/award", post(award))
        .route("/api/xp/transactions", get(transactions))
}

async fn claim_daily(
    State(state): State<LearnifyState>,
    caller: Caller,
) -> Result<Json<DailyClaimResponse>, LearnifyError> {
    let claim = state.db.claim_daily(caller.id, Utc::now()).await?;

    match claim.outcome {
        StreakOutcome::AlreadyClaimed { streak } => Err(LearnifyError::conflict(
            "ALREADY_CLAIMED",
            format!("Daily XP already claimed today (streak {streak})."),
        )),
        StreakOutcome::Claimed {
            streak,
            xp_gained,
            bonus_xp,
            badge,
        } => {
            info!(user.id = caller.id, streak, xp_gained, badge = ?badge, "Daily XP claimed");
            let message = if bonus_xp > 0 {
                format!("Daily XP claimed with a {streak}-day streak bonus!")
            } else {
                "Daily XP claimed!".to_string()
            };
            Ok(Json(DailyClaimResponse {
                message,
                xp_gained,
                bonus_xp,
                xp: claim.xp,
                streak,
                badge,
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryQuery {
    user_id: Option<i64>,
}

async fn summary(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Json<XpSummary>, LearnifyError> {
    let user_id = caller.viewable_user(&state.db, query.user_id).await?;
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("User {user_id}")))?;
    let badges = state.db.list_badges(user_id).await?;

    Ok(Json(XpSummary {
        user_id,
        current_xp: user.xp,
        streak: user.streak,
        last_active: user.last_active,
        badges: badges
            .into_iter()
            .map(|b| BadgeView {
                label: b.label,
                awarded_at: b.awarded_at,
            })
            .collect(),
    }))
}

async fn award(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<XpAwardRequest>,
) -> Result<Json<XpAwardResponse>, LearnifyError> {
    caller.require_staff()?;
    let amount = validate_award(body.amount)
        .map_err(|msg| LearnifyError::validation("INVALID_AMOUNT", msg))?;

    let new_xp = state
        .db
        .award_xp(body.user_id, amount, SOURCE_MANUAL, body.reason)
        .await?;
    info!(user.id = body.user_id, amount, by = caller.id, "XP awarded");

    Ok(Json(XpAwardResponse {
        user_id: body.user_id,
        new_xp,
    }))
}

async fn transactions(
    State(state): State<LearnifyState>,
    caller: Caller,
) -> Result<Json<Vec<DbXpTransaction>>, LearnifyError> {
    Ok(Json(state.db.list_xp_transactions(caller.id).await?))
}
