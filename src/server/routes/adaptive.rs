use axum::{Json, Router, routing::post};
use learnify_rules::Difficulty;
use learnify_rules::difficulty::{direction_hints, pick_hints, replay};
use learnify_schema::adaptive::{DifficultyReplayRequest, DifficultyReplayResponse};
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::error::LearnifyError;
use crate::server::extract::ApiJson;
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new().route("/api/adaptive/difficulty", post(replay_difficulty))
}

/// Stateless: the client sends every outcome of the session so far.
async fn replay_difficulty(
    caller: Caller,
    ApiJson(body): ApiJson<DifficultyReplayRequest>,
) -> Result<Json<DifficultyReplayResponse>, LearnifyError> {
    let outcome = replay(Difficulty::new(i64::from(body.initial_difficulty)), &body.outcomes);

    let hints = match outcome.adjustments.last() {
        Some(last) if outcome.changed_last => {
            let mut rng = rand::rng();
            match body.phase {
                Some(phase) => pick_hints(&mut rng, last.direction(), phase),
                None => direction_hints(last.direction())
                    .choose(&mut rng)
                    .map(|h| vec![(*h).to_string()])
                    .unwrap_or_default(),
            }
        }
        _ => Vec::new(),
    };

    debug!(
        user.id = caller.id,
        answered = body.outcomes.len(),
        difficulty = outcome.difficulty.get(),
        adjustments = outcome.adjustments.len(),
        "Difficulty replayed"
    );

    Ok(Json(DifficultyReplayResponse {
        difficulty: outcome.difficulty.get(),
        adjustments: outcome.adjustments.iter().map(|a| a.to_view()).collect(),
        hints,
    }))
}
