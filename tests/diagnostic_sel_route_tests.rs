use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
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

async fn test_app(tag: &str) -> Router {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "learnify-route-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let db = learnify::db::spawn(&format!("sqlite:{}", temp_path.display())).await;
    let state = LearnifyState::new(db, AiService::disabled(), Arc::from("pwd"), 1024 * 1024);
    learnify_router(state)
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

async fn create_user(app: &Router, name: &str, role: &str, age: i64) -> (i64, &'static str) {
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
    let role: &'static str = match role {
        "teacher" => "teacher",
        "parent" => "parent",
        _ => "student",
    };
    (body["id"].as_i64().expect("user id"), role)
}

#[tokio::test]
async fn diagnostic_scores_skills_and_feeds_the_knowledge_graph() {
    let app = test_app("diagnostic").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "sam", "student", 9).await;

    let (_, subject) = call(&app, "POST", "/api/subjects", teacher, Some(json!({"name": "Math"}))).await;
    let subject_id = subject["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        "/api/knowledge-graph/concepts",
        teacher,
        Some(json!({"name": "addition", "subjectId": subject_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut ids = Vec::new();
    for (question, answer, skill) in [("1+1?", "2", "addition"), ("3+4?", "7", "addition"), ("5-2?", "3", "subtraction")] {
        let (status, body) = call(
            &app,
            "POST",
            "/api/learning-paths/diagnostic/questions",
            teacher,
            Some(json!({
                "subjectId": subject_id,
                "topic": "arithmetic",
                "question": question,
                "options": [answer, "0"],
                "correctAnswer": answer,
                "skill": skill
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, body) = call(
        &app,
        "POST",
        "/api/learning-paths/diagnostic/questions",
        teacher,
        Some(json!({
            "subjectId": subject_id,
            "question": "2+2?",
            "options": ["3", "5"],
            "correctAnswer": "4",
            "skill": "addition"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ANSWER");

    let (status, questions) = call(
        &app,
        "GET",
        &format!("/api/learning-paths/diagnostic?subjectId={subject_id}&topic=arithmetic"),
        student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(questions.as_array().unwrap().len(), 3);
    assert!(questions[0].get("correctAnswer").is_none());

    let (status, result) = call(
        &app,
        "POST",
        "/api/learning-paths/diagnostic/submit",
        student,
        Some(json!({
            "subjectId": subject_id,
            "responses": {
                (ids[0].to_string()): "2",
                (ids[1].to_string()): "7",
                (ids[2].to_string()): "0"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["overallProficiency"], 67);
    assert_eq!(result["masteredSkills"], json!(["addition"]));
    assert_eq!(result["inProgressSkills"], json!(["subtraction"]));
    assert!(result["learningInsights"].is_null());

    let (status, graph) = call(
        &app,
        "GET",
        &format!("/api/knowledge-graph?subjectId={subject_id}"),
        student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graph["concepts"][0]["name"], "addition");
    assert_eq!(graph["concepts"][0]["masteryLevel"], 100.0);
}

#[tokio::test]
async fn daily_sel_content_follows_the_learner_age_group() {
    let app = test_app("sel").await;
    let teacher = create_user(&app, "tara", "teacher", 35).await;
    let student = create_user(&app, "kim", "student", 13).await;

    let (status, _) = call(&app, "GET", "/api/sel/growth-mindset/daily", student, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        "POST",
        "/api/sel/affirmations",
        teacher,
        Some(json!({"text": "Mistakes help me grow.", "ageGroup": "15-18"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_AGE_GROUP");

    for (text, group) in [("Mistakes help me grow.", "12-14"), ("I can try again!", "5-7")] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/sel/affirmations",
            teacher,
            Some(json!({"text": text, "ageGroup": group})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, today) = call(&app, "GET", "/api/sel/growth-mindset/daily", student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today["text"], "Mistakes help me grow.");

    // Same assignment for the rest of the day.
    let (_, again) = call(&app, "GET", "/api/sel/growth-mindset/daily", student, None).await;
    assert_eq!(again["affirmationId"], today["affirmationId"]);

    let (status, ack) = call(
        &app,
        "POST",
        "/api/sel/growth-mindset/acknowledge",
        student,
        Some(json!({"reflection": "I fixed my long division."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!ack["acknowledgedAt"].is_null());
    assert_eq!(ack["reflection"], "I fixed my long division.");

    let (status, body) = call(
        &app,
        "POST",
        "/api/sel/moods",
        student,
        Some(json!({"mood": "happy", "intensity": 11})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INTENSITY");

    let (status, _) = call(
        &app,
        "POST",
        "/api/sel/moods",
        student,
        Some(json!({"mood": "happy", "intensity": 7, "factors": ["friends"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, moods) = call(&app, "GET", "/api/sel/moods", student, None).await;
    assert_eq!(moods.as_array().unwrap().len(), 1);
    assert_eq!(moods[0]["factors"], json!(["friends"]));
}

#[tokio::test]
async fn style_profile_and_teach_back_are_per_caller() {
    let app = test_app("styles").await;
    let student = create_user(&app, "ola", "student", 10).await;

    let (status, _) = call(&app, "GET", "/api/learning-styles/profile", student, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        "POST",
        "/api/learning-styles/profile",
        student,
        Some(json!({
            "visual": -1.0, "auditory": 2.0, "reading": 1.0, "kinesthetic": 4.0,
            "dominantStyle": "kinesthetic"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SCORE");

    let (status, profile) = call(
        &app,
        "POST",
        "/api/learning-styles/profile",
        student,
        Some(json!({
            "visual": 3.0, "auditory": 2.0, "reading": 1.0, "kinesthetic": 4.0,
            "dominantStyle": "kinesthetic"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["dominantStyle"], "kinesthetic");

    let (status, teach) = call(
        &app,
        "POST",
        "/api/peer-teaching/teach-back",
        student,
        Some(json!({
            "sessionId": "s-1",
            "questionId": "q-1",
            "answer": "You carry the one.",
            "correct": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(teach["userId"], student.0);
}
