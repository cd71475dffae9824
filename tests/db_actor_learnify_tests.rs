use chrono::{Duration, TimeZone, Utc};
use learnify::db::{self, LessonCompletion};
use learnify_rules::streak::StreakOutcome;
use learnify_schema::{
    CpaPhase, QuestionData, Role,
    lessons::{LessonCreate, LessonStepCreate, SubjectCreate},
    progress::GradedResponse,
    users::UserCreate,
};
use std::{
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

fn unique_sqlite_url(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "learnify-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    format!("sqlite:{}", temp_path.display())
}

fn user(name: &str, role: Role) -> UserCreate {
    UserCreate {
        name: name.to_string(),
        email: format!("{}@school.test", name.to_lowercase()),
        role,
        age: Some(10),
        grade_level: Some("5".to_string()),
    }
}

fn lesson(subject_id: i64, title: &str) -> LessonCreate {
    LessonCreate {
        title: title.to_string(),
        description: "Counting objects".to_string(),
        subject_id,
        level: "beginner".to_string(),
        content: "Let's count.".to_string(),
        steps: vec![LessonStepCreate {
            phase: CpaPhase::Concrete,
            content: "Count the blocks".to_string(),
            image_url: None,
            difficulty_level: 3,
            question: Some(QuestionData {
                text: "How many blocks?".to_string(),
                options: vec!["3".to_string(), "4".to_string()],
                correct_answer: Some("4".to_string()),
                ..QuestionData::default()
            }),
        }],
    }
}

#[tokio::test]
async fn users_and_parent_links_round_trip() {
    let db = db::spawn(&unique_sqlite_url("users")).await;

    let parent = db.create_user(user("Pat", Role::Parent)).await.expect("create parent");
    let child = db.create_user(user("Kim", Role::Student)).await.expect("create child");
    assert_eq!(child.role, "student");
    assert_eq!(child.xp, 0);

    assert!(!db.is_parent_of(parent.id, child.id).await.unwrap());
    db.link_parent(parent.id, child.id).await.expect("link");
    // Linking twice is idempotent.
    db.link_parent(parent.id, child.id).await.expect("relink");
    assert!(db.is_parent_of(parent.id, child.id).await.unwrap());

    let fetched = db.get_user(child.id).await.unwrap().expect("child exists");
    assert_eq!(fetched.email, "kim@school.test");
    assert!(db.get_user(9_999).await.unwrap().is_none());
}

#[tokio::test]
async fn lesson_completion_awards_first_lesson_once() {
    let db = db::spawn(&unique_sqlite_url("lessons")).await;

    let teacher = db.create_user(user("Tara", Role::Teacher)).await.unwrap();
    let student = db.create_user(user("Sam", Role::Student)).await.unwrap();
    let subject = db
        .create_subject(SubjectCreate {
            name: "Math".to_string(),
            color: None,
        })
        .await
        .unwrap();
    let lesson_id = db.create_lesson(lesson(subject.id, "Counting"), teacher.id).await.unwrap();

    let (stored, steps) = db.get_lesson(lesson_id).await.unwrap().expect("lesson exists");
    assert_eq!(stored.subject, "Math");
    assert_eq!(steps.len(), 1);

    let completion = || LessonCompletion {
        user_id: student.id,
        lesson_id,
        subject_id: subject.id,
        subject: "Math".to_string(),
        difficulty: 3,
        accuracy: 1.0,
        xp: 30,
        responses: BTreeMap::from([(
            steps[0].id,
            GradedResponse {
                answer: "4".to_string(),
                is_correct: true,
            },
        )]),
    };

    let first = db.complete_lesson(completion()).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].achievement_type, "FIRST_LESSON");

    let again = db.complete_lesson(completion()).await.unwrap();
    assert!(again.is_empty());

    let progress = db
        .get_lesson_progress(student.id, lesson_id)
        .await
        .unwrap()
        .expect("progress recorded");
    assert_eq!(progress.attempts_count, 2);

    // 30 + 10 (achievement) + 30
    let me = db.get_user(student.id).await.unwrap().unwrap();
    assert_eq!(me.xp, 70);
    let ledger = db.list_xp_transactions(student.id).await.unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.iter().map(|t| t.amount).sum::<i64>(), 70);
}

#[tokio::test]
async fn daily_claim_tracks_streak_by_utc_day() {
    let db = db::spawn(&unique_sqlite_url("daily")).await;
    let student = db.create_user(user("Ola", Role::Student)).await.unwrap();

    let day_one = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
    let first = db.claim_daily(student.id, day_one).await.unwrap();
    assert!(matches!(first.outcome, StreakOutcome::Claimed { streak: 1, .. }));
    assert_eq!(first.xp, 10);

    let repeat = db
        .claim_daily(student.id, day_one + Duration::hours(6))
        .await
        .unwrap();
    assert_eq!(repeat.outcome, StreakOutcome::AlreadyClaimed { streak: 1 });
    assert_eq!(repeat.xp, 10);

    let next = db
        .claim_daily(student.id, day_one + Duration::days(1))
        .await
        .unwrap();
    assert!(matches!(next.outcome, StreakOutcome::Claimed { streak: 2, .. }));
    assert_eq!(next.xp, 20);

    let missing = db.claim_daily(4_242, day_one).await;
    assert!(missing.is_err());
}
