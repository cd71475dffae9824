use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
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

const KEY: &str = "pwd";
const ADMIN: (i64, &str) = (900, "admin");

async fn test_app(tag: &str) -> Router {
    test_app_with_limit(tag, 1024 * 1024).await
}

async fn test_app_with_limit(tag: &str, max_body_bytes: usize) -> Router {
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
    let state = LearnifyState::new(db, AiService::disabled(), Arc::from(KEY), max_body_bytes);
    learnify_router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<(i64, &str)>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-learnify-key", KEY);
    if let Some((id, role)) = caller {
        builder = builder
            .header("x-user-id", id.to_string())
            .header("x-user-role", role);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).expect("failed to build request"))
        .await
        .expect("request failed")
}

async fn json_body(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("response is not JSON")
}

async fn create_user(app: &Router, name: &str, role: &str) -> i64 {
    let resp = send(
        app,
        "POST",
        "/api/users",
        Some(ADMIN),
        Some(json!({
            "name": name,
            "email": format!("{name}@school.test"),
            "role": role,
            "age": 10
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["id"].as_i64().expect("user id")
}

#[tokio::test]
async fn service_key_and_identity_are_required() {
    let app = test_app("auth").await;

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // no key
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/api/subjects").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["code"], "UNAUTHORIZED");

    // wrong key
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/subjects")
                .header("x-learnify-key", "nope")
                .header("x-user-id", "1")
                .header("x-user-role", "student")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // key but no identity
    let resp = send(&app, "GET", "/api/subjects", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["code"], "UNAUTHENTICATED");

    // key in the query string
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/subjects?key=pwd")
                .header("x-user-id", "1")
                .header("x-user-role", "student")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!([]));

    let resp = send(&app, "GET", "/api/nowhere", Some((1, "student")), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lesson_flow_grades_and_awards_xp() {
    let app = test_app("lessons").await;
    let teacher = (create_user(&app, "tara", "teacher").await, "teacher");
    let student = (create_user(&app, "sam", "student").await, "student");

    let resp = send(&app, "POST", "/api/subjects", Some(student), Some(json!({"name": "Math"}))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&app, "POST", "/api/subjects", Some(teacher), Some(json!({"name": "Math"}))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let subject_id = json_body(resp).await["id"].as_i64().unwrap();

    let resp = send(
        &app,
        "POST",
        "/api/lessons",
        Some(teacher),
        Some(json!({
            "title": "Counting",
            "description": "Count blocks",
            "subjectId": subject_id,
            "level": "beginner",
            "content": "Let's count.",
            "steps": [{
                "type": "concrete",
                "content": "Count the blocks",
                "difficultyLevel": 3,
                "question": {
                    "text": "How many blocks?",
                    "options": ["3", "4"],
                    "correctAnswer": "4",
                    "explanation": "Four blocks in a row."
                }
            }]
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let lesson_id = json_body(resp).await["id"].as_i64().unwrap();

    let resp = send(&app, "GET", &format!("/api/lessons/{lesson_id}"), Some(student), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await;
    let step = &view["steps"][0];
    assert_eq!(step["question"]["text"], "How many blocks?");
    assert!(step["question"].get("correctAnswer").is_none());
    let step_id = step["id"].as_i64().unwrap();

    let resp = send(
        &app,
        "POST",
        &format!("/api/lessons/{lesson_id}/steps/{step_id}/check"),
        Some(student),
        Some(json!({"answer": "3"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["correct"], false);

    let resp = send(
        &app,
        "POST",
        "/api/progress/lesson-complete",
        Some(student),
        Some(json!({
            "lessonId": lesson_id,
            "difficultyLevel": 3,
            "responses": { (step_id.to_string()): "4" }
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let done = json_body(resp).await;
    assert_eq!(done["xpEarned"], 30);
    assert_eq!(done["accuracy"], 100);
    assert_eq!(done["achievements"][0]["achievementType"], "FIRST_LESSON");

    let resp = send(&app, "GET", "/api/xp", Some(student), None).await;
    assert_eq!(json_body(resp).await["currentXp"], 40);

    // Students cannot read other students' XP.
    let resp = send(&app, "GET", &format!("/api/xp?userId={}", teacher.0), Some(student), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&app, "POST", "/api/xp/daily", Some(student), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let claim = json_body(resp).await;
    assert_eq!(claim["streak"], 1);
    assert_eq!(claim["xp"], 50);

    let resp = send(&app, "POST", "/api/xp/daily", Some(student), None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(resp).await["error"]["code"], "ALREADY_CLAIMED");
}

#[tokio::test]
async fn export_without_data_still_has_headers() {
    let app = test_app("export").await;
    let student = (create_user(&app, "ola", "student").await, "student");

    let resp = send(&app, "GET", "/api/analytics/export", Some(student), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"performance_data_month_all.csv\""
    );
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(
        text.trim_end(),
        "Date,Activity Type,Title,Subject,Score,Duration (minutes)"
    );

    let resp = send(
        &app,
        "GET",
        "/api/analytics/study-sessions?startDate=2025-01-10&endDate=2025-01-01",
        Some(student),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ai_feedback_is_unavailable_when_disabled() {
    let app = test_app("ai").await;

    let resp = send(
        &app,
        "POST",
        "/api/ai/generate-feedback",
        Some((1, "student")),
        Some(json!({"studentResponse": "", "questionContext": "2+2"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "MISSING_FIELD");

    let resp = send(
        &app,
        "POST",
        "/api/ai/generate-feedback",
        Some((1, "student")),
        Some(json!({"studentResponse": "4", "questionContext": "2+2"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(resp).await["error"]["code"], "AI_UNAVAILABLE");
}

#[tokio::test]
async fn oversized_chunked_body_is_rejected_as_too_large() {
    let app = test_app_with_limit("body-limit", 128).await;
    let teacher = create_user(&app, "tara", "teacher").await;

    // No content-length, so the limit trips while the body is buffered.
    let chunks = vec![Ok::<_, std::io::Error>(Bytes::from(vec![b' '; 512]))];
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/subjects")
                .header("x-learnify-key", KEY)
                .header("x-user-id", teacher.to_string())
                .header("x-user-role", "teacher")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from_stream(tokio_stream::iter(chunks)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    // Small bodies still go through.
    let resp = send(&app, "POST", "/api/subjects", Some((teacher, "teacher")), Some(json!({"name": "Art"}))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}
