use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{Duration, Utc};
use learnify::{
    ai::AiService,
    server::router::{LearnifyState, learnify_router},
};
use serde_json::{Value, json};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

const ADMIN: (i64, &str) = (900, "admin");

/// Returns the router and the database url backing it.
async fn test_app(tag: &str) -> (Router, String) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "learnify-progress-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let url = format!("sqlite:{}", temp_path.display());
    let db = learnify::db::spawn(&url).await;
    let state = LearnifyState::new(db, AiService::disabled(), Arc::from("pwd"), 1024 * 1024);
    (learnify_router(state), url)
}

async fn call(app: &Router, method: &str, uri: &str, caller: (i64, &str), body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-learnify-key", "pwd")
        .header("x-user-id", caller.0.to_string())
        .header("x-user-role", caller.1)
        .header(header::CONTENT_TYPE, "application/json");
    let body = body.map_or_else(Body::empty, |json| Body::from(json.to_string()));
    let resp: Response = app
        .clone()
        .oneshot(builder.body(body).expect("failed to build request"))
        .await
        .expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response is not JSON")
    };
    (status, json)
}

async fn create_user(app: &Router, name: &str, role: &'static str, age: i64) -> (i64, &'static str) {
    let (status, body) = call(
        app,
        "POST",
        "/api/users",
        ADMIN,
        Some(json!({
            "name": name,
            "email": format!("{name}@school.test"),
            "role": role,
            "age": age
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (body["id"].as_i64().expect("user id"), role)
}

async fn create_subject(app: &Router, teacher: (i64, &str), name: &str) -> i64 {
    let (status, body) = call(app, "POST", "/api/subjects", teacher, Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("subject id")
}

#[tokio::test]
async fn adaptive_difficulty_hints_follow_the_last_window() {
    let (app, _) = test_app("adaptive").await;
    let student = create_user(&app, "sam", "student", 9).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/adaptive/difficulty",
        student,
        Some(json!({"initialDifficulty": 3, "outcomes": [true, true, true]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["difficulty"], 4);
    assert_eq!(body["adjustments"][0]["direction"], "harder");
    assert_eq!(body["adjustments"][0]["afterAnswers"], 3);
    assert!(!body["hints"].as_array().unwrap().is_empty());

    // Second window at 2/3 keeps the level, so no fresh hints.
    let (status, body) = call(
        &app,
        "POST",
        "/api/adaptive/difficulty",
        student,
        Some(json!({
            "initialDifficulty": 3,
            "outcomes": [true, true, true, true, false, true],
            "phase": "pictorial"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["difficulty"], 4);
    assert_eq!(body["adjustments"].as_array().unwrap().len(), 1);
    assert_eq!(body["hints"], json!([]));

    let (status, body) = call(
        &app,
        "POST",
        "/api/adaptive/difficulty",
        student,
        Some(json!({"initialDifficulty": 1, "outcomes": [false, false, false]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["difficulty"], 1);
    assert_eq!(body["adjustments"], json!([]));
    assert_eq!(body["hints"], json!([]));
}

#[tokio::test]
async fn quiz_attempts_are_validated() {
    let (app, _) = test_app("quizzes").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "sam", "student", 9).await;
    let subject_id = create_subject(&app, teacher, "Math").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/quizzes",
        student,
        Some(json!({"title": "Fractions", "subjectId": subject_id})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, quiz) = call(
        &app,
        "POST",
        "/api/quizzes",
        teacher,
        Some(json!({"title": "Fractions", "subjectId": subject_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let attempts = format!("/api/quizzes/{}/attempts", quiz["id"].as_i64().unwrap());

    for score in [101.0, -1.0] {
        let (status, body) = call(&app, "POST", &attempts, student, Some(json!({"score": score}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_SCORE");
    }

    let (status, body) = call(
        &app,
        "POST",
        &attempts,
        student,
        Some(json!({"score": 90, "timeSpentMinutes": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_DURATION");

    for score in [0, 100] {
        let (status, body) = call(
            &app,
            "POST",
            &attempts,
            student,
            Some(json!({"score": score, "timeSpentMinutes": 12})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["userId"], student.0);
        assert_eq!(body["score"], f64::from(score));
    }
}

#[tokio::test]
async fn manual_xp_awards_are_staff_only_and_ledgered() {
    let (app, _) = test_app("xp-award").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "sam", "student", 9).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/xp/award",
        student,
        Some(json!({"userId": student.0, "amount": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    for amount in [0, -10] {
        let (status, body) = call(
            &app,
            "POST",
            "/api/xp/award",
            teacher,
            Some(json!({"userId": student.0, "amount": amount})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_AMOUNT");
    }

    let (status, body) = call(
        &app,
        "POST",
        "/api/xp/award",
        teacher,
        Some(json!({"userId": student.0, "amount": 25, "reason": "Helped a classmate"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], student.0);
    assert_eq!(body["newXp"], 25);

    let (status, ledger) = call(&app, "GET", "/api/xp/transactions", student, None).await;
    assert_eq!(status, StatusCode::OK);
    let ledger = ledger.as_array().unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["amount"], 25);
    assert_eq!(ledger[0]["source"], "MANUAL_AWARD");
    assert_eq!(ledger[0]["reason"], "Helped a classmate");

    // The awarding teacher's own ledger is untouched.
    let (_, ledger) = call(&app, "GET", "/api/xp/transactions", teacher, None).await;
    assert_eq!(ledger, json!([]));
}

#[tokio::test]
async fn learning_path_nodes_complete_within_their_own_path() {
    let (app, _) = test_app("paths").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "sam", "student", 9).await;
    let subject_id = create_subject(&app, teacher, "Math").await;

    let mut path_ids = Vec::new();
    for (title, nodes) in [("Numbers", vec!["Counting", "Adding"]), ("Shapes", vec!["Circles"])] {
        let (status, body) = call(
            &app,
            "POST",
            "/api/learning-paths",
            teacher,
            Some(json!({
                "title": title,
                "subjectId": subject_id,
                "nodes": nodes.iter().map(|n| json!({"title": n, "skill": n.to_lowercase()})).collect::<Vec<_>>()
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        path_ids.push(body["id"].as_i64().unwrap());
    }
    let (numbers, shapes) = (path_ids[0], path_ids[1]);

    let (status, view) = call(&app, "GET", &format!("/api/learning-paths/{numbers}"), student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["path"]["title"], "Numbers");
    assert_eq!(view["progress"], Value::Null);
    let node_ids: Vec<i64> = view["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();
    assert_eq!(node_ids.len(), 2);

    let (_, other) = call(&app, "GET", &format!("/api/learning-paths/{shapes}"), student, None).await;
    let foreign_node = other["nodes"][0]["id"].as_i64().unwrap();
    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/learning-paths/{numbers}/nodes/{foreign_node}/complete"),
        student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, progress) = call(
        &app,
        "POST",
        &format!("/api/learning-paths/{numbers}/nodes/{}/complete", node_ids[0]),
        student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["overallProgress"], 50);
    assert_eq!(progress["currentNodeId"], node_ids[1]);

    let (_, progress) = call(
        &app,
        "POST",
        &format!("/api/learning-paths/{numbers}/nodes/{}/complete", node_ids[1]),
        student,
        None,
    )
    .await;
    assert_eq!(progress["overallProgress"], 100);
    assert_eq!(progress["currentNodeId"], Value::Null);
    assert_eq!(progress["completedNodeIds"], json!(node_ids));

    let (_, view) = call(&app, "GET", &format!("/api/learning-paths/{numbers}"), student, None).await;
    assert_eq!(view["progress"]["overallProgress"], 100);

    let (status, _) = call(&app, "GET", "/api/learning-paths/99999", student, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn daily_mindfulness_is_assigned_by_age_group_and_completed() {
    let (app, _) = test_app("mindfulness").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "sam", "student", 9).await;

    let (status, body) = call(&app, "GET", "/api/sel/mindfulness-prompts/daily", student, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // Only the other age groups have a prompt yet.
    for group in ["5-7", "12-14"] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/sel/mindfulness-prompts",
            teacher,
            Some(json!({
                "title": format!("Breathing {group}"),
                "instructions": "Breathe in for four counts.",
                "ageGroup": group,
                "durationMinutes": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = call(&app, "GET", "/api/sel/mindfulness-prompts/daily", student, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        "POST",
        "/api/sel/mindfulness-prompts",
        student,
        Some(json!({"title": "Mine", "instructions": "Relax.", "ageGroup": "8-11"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        "POST",
        "/api/sel/mindfulness-prompts",
        teacher,
        Some(json!({
            "title": "Body scan",
            "instructions": "Notice your toes, then your knees.",
            "ageGroup": "8-11",
            "durationMinutes": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, daily) = call(&app, "GET", "/api/sel/mindfulness-prompts/daily", student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(daily["title"], "Body scan");
    assert_eq!(daily["durationMinutes"], 5);
    assert_eq!(daily["completedAt"], Value::Null);

    let (status, done) = call(
        &app,
        "POST",
        "/api/sel/mindfulness-prompts/complete",
        student,
        Some(json!({"reflection": "My toes were cold."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["promptId"], daily["promptId"]);
    assert_eq!(done["reflection"], "My toes were cold.");
    assert!(done["completedAt"].is_string());

    // Same assignment for the rest of the day.
    let (_, again) = call(&app, "GET", "/api/sel/mindfulness-prompts/daily", student, None).await;
    assert_eq!(again["id"], daily["id"]);
    assert!(again["completedAt"].is_string());
}

#[tokio::test]
async fn performance_predictions_only_use_the_requested_window() {
    let (app, url) = test_app("performance").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "sam", "student", 9).await;
    let subject_id = create_subject(&app, teacher, "Math").await;

    let (_, quiz) = call(
        &app,
        "POST",
        "/api/quizzes",
        teacher,
        Some(json!({"title": "Fractions", "subjectId": subject_id})),
    )
    .await;
    let attempts = format!("/api/quizzes/{}/attempts", quiz["id"].as_i64().unwrap());

    let (status, body) = call(&app, "GET", "/api/analytics/performance?timeRange=week", student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeRange"], "week");
    assert!(body.get("predictiveInsights").is_none());

    let mut old = Vec::new();
    for score in [10, 10, 10, 90, 90, 90, 90, 90, 90] {
        let (status, body) = call(&app, "POST", &attempts, student, Some(json!({"score": score}))).await;
        assert_eq!(status, StatusCode::CREATED);
        if score == 10 {
            old.push(body["id"].as_i64().unwrap());
        }
    }

    // Backdate the low scores to before this week.
    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    for (id, days_ago) in old.iter().zip([40, 30, 20]) {
        sqlx::query("UPDATE quiz_attempts SET completed_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(days_ago))
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool.close().await;

    let (status, body) = call(&app, "GET", "/api/analytics/performance?timeRange=week", student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], student.0);
    assert_eq!(body["averageScore"], 90);
    assert_eq!(body["performanceTrend"].as_array().unwrap().len(), 1);

    let insights = &body["predictiveInsights"];
    assert_eq!(insights["predictions"], json!([]));
    assert_eq!(insights["recommendations"].as_array().unwrap().len(), 3);

    // Over all time the older days count, so there is enough to project.
    let (_, body) = call(&app, "GET", "/api/analytics/performance?timeRange=all", student, None).await;
    assert_eq!(body["performanceTrend"].as_array().unwrap().len(), 4);
    assert_eq!(body["predictiveInsights"]["predictions"].as_array().unwrap().len(), 7);
}
