use chrono::{DateTime, Utc};
use learnify_rules::StreakOutcome;
use learnify_rules::xp::SOURCE_DAILY;
use sqlx::SqlitePool;
use tracing::debug;

use super::progress::add_xp;
use crate::db::models::{DbBadge, DbXpTransaction};
use crate::error::LearnifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyClaim {
    pub outcome: StreakOutcome,
    /// Balance after the claim.
    pub xp: i64,
}

/// Applies the daily streak rules against the stored activity timestamp.
pub async fn claim_daily(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<DailyClaim, LearnifyError> {
    let mut tx = pool.begin().await?;

    let (xp, streak, last_active): (i64, i64, Option<DateTime<Utc>>) = sqlx::query_as(
        r"
        SELECT xp, streak, last_active FROM users WHERE id = ?
        ",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| LearnifyError::not_found(format!("User {user_id}")))?;

    let outcome = learnify_rules::claim_daily(now, last_active, streak);
    let StreakOutcome::Claimed {
        streak: new_streak,
        xp_gained,
        ref badge,
        ..
    } = outcome
    else {
        return Ok(DailyClaim { outcome, xp });
    };

    sqlx::query(
        r"
        UPDATE users SET streak = ?, last_active = ? WHERE id = ?
        ",
    )
    .bind(new_streak)
    .bind(now)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let reason = format!("Daily login, streak {new_streak}");
    let balance = add_xp(&mut tx, user_id, xp_gained, SOURCE_DAILY, Some(reason.as_str())).await?;

    if let Some(label) = badge {
        sqlx::query(
            r"
            INSERT INTO badges (user_id, label, awarded_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, label) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(label)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    debug!(user_id, streak = new_streak, xp_gained, "daily claim applied");
    Ok(DailyClaim {
        outcome,
        xp: balance,
    })
}

pub async fn award_xp(
    pool: &SqlitePool,
    user_id: i64,
    amount: i64,
    source: &str,
    reason: Option<String>,
) -> Result<i64, LearnifyError> {
    let mut tx = pool.begin().await?;
    let balance = add_xp(&mut tx, user_id, amount, source, reason.as_deref()).await?;
    tx.commit().await?;
    Ok(balance)
}

pub async fn list_badges(pool: &SqlitePool, user_id: i64) -> Result<Vec<DbBadge>, LearnifyError> {
    let rows = sqlx::query_as::<_, DbBadge>(
        r"
        SELECT id, user_id, label, awarded_at FROM badges WHERE user_id = ? ORDER BY awarded_at, id
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_transactions(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<DbXpTransaction>, LearnifyError> {
    let rows = sqlx::query_as::<_, DbXpTransaction>(
        r"
        SELECT id, user_id, amount, source, reason, created_at
        FROM xp_transactions
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
