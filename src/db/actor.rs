use crate::db::models::{
    DbAffirmation, DbBadge, DbConcept, DbConceptConnection, DbDailyAffirmation,
    DbDailyMindfulness, DbLearningPath, DbLearningPathNode, DbLearningPathProgress,
    DbLearningStyleProfile, DbLesson, DbLessonProgress, DbLessonStep, DbMindfulnessPrompt,
    DbMoodEntry, DbQuiz, DbQuizAttempt, DbStudySession, DbSubject, DbTeachBack, DbUser,
    DbXpTransaction,
};
use crate::db::queries::{
    analytics, content, diagnostic, graph, paths, profile, progress, sel, users, xp,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::LearnifyError;
use chrono::{DateTime, NaiveDate, Utc};
use learnify_rules::analytics::ActivityData;
use learnify_rules::diagnostic::AnswerKey;
use learnify_schema::diagnostic::{DiagnosticQuestionCreate, DiagnosticQuestionView};
use learnify_schema::graph::{ConceptCreate, ConnectionCreate, KnowledgeGraph};
use learnify_schema::lessons::{LessonCreate, SubjectCreate};
use learnify_schema::paths::LearningPathCreate;
use learnify_schema::peer::TeachBackCreate;
use learnify_schema::progress::AchievementAward;
use learnify_schema::quizzes::{QuizAttemptCreate, QuizCreate};
use learnify_schema::sel::{AffirmationCreate, MindfulnessPromptCreate, MoodCreate};
use learnify_schema::styles::LearningStyleProfileInput;
use learnify_schema::users::UserCreate;
use learnify_schema::analytics::StudySessionCreate;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

pub use crate::db::queries::diagnostic::DiagnosticSubmission;
pub use crate::db::queries::progress::LessonCompletion;
pub use crate::db::queries::xp::DailyClaim;

type Reply<T> = RpcReplyPort<Result<T, LearnifyError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    CreateUser(UserCreate, Reply<DbUser>),
    GetUser(i64, Reply<Option<DbUser>>),
    /// (parent id, student id)
    LinkParent(i64, i64, Reply<()>),
    IsParentOf(i64, i64, Reply<bool>),

    CreateSubject(SubjectCreate, Reply<DbSubject>),
    ListSubjects(Reply<Vec<DbSubject>>),
    /// Lesson body and author id.
    CreateLesson(LessonCreate, i64, Reply<i64>),
    ListLessons(Reply<Vec<DbLesson>>),
    GetLesson(i64, Reply<Option<(DbLesson, Vec<DbLessonStep>)>>),
    CreateQuiz(QuizCreate, Reply<DbQuiz>),
    /// (quiz id, user id, attempt)
    RecordQuizAttempt(i64, i64, QuizAttemptCreate, Reply<DbQuizAttempt>),

    /// (user id, lesson id)
    GetLessonProgress(i64, i64, Reply<Option<DbLessonProgress>>),
    CompleteLesson(LessonCompletion, Reply<Vec<AchievementAward>>),

    ClaimDaily(i64, DateTime<Utc>, Reply<DailyClaim>),
    /// (user id, amount, source, reason) -> new balance
    AwardXp(i64, i64, String, Option<String>, Reply<i64>),
    ListBadges(i64, Reply<Vec<DbBadge>>),
    ListXpTransactions(i64, Reply<Vec<DbXpTransaction>>),

    RecordStudySession(i64, StudySessionCreate, Reply<DbStudySession>),
    /// (user id, from, until) with `until` exclusive.
    ListStudySessions(i64, DateTime<Utc>, DateTime<Utc>, Reply<Vec<DbStudySession>>),
    /// (user id, subject filter)
    ActivityData(i64, Option<i64>, Reply<ActivityData>),

    CreateDiagnosticQuestion(DiagnosticQuestionCreate, Reply<i64>),
    /// (subject id, topic)
    PlacementQuestions(i64, Option<String>, Reply<Vec<DiagnosticQuestionView>>),
    AnswerKeys(i64, Reply<Vec<AnswerKey>>),
    SaveDiagnostic(DiagnosticSubmission, Reply<i64>),

    CreatePath(LearningPathCreate, Reply<i64>),
    GetPath(i64, Reply<Option<(DbLearningPath, Vec<DbLearningPathNode>)>>),
    /// (user id, path id)
    GetPathProgress(i64, i64, Reply<Option<DbLearningPathProgress>>),
    /// (user id, path id, node id)
    CompleteNode(i64, i64, i64, Reply<DbLearningPathProgress>),

    CreateConcept(ConceptCreate, Reply<DbConcept>),
    CreateConnection(ConnectionCreate, Reply<DbConceptConnection>),
    KnowledgeGraph(i64, Option<i64>, Reply<KnowledgeGraph>),

    CreateMood(i64, MoodCreate, Reply<DbMoodEntry>),
    ListMoods(i64, Option<NaiveDate>, Reply<Vec<DbMoodEntry>>),
    CreateAffirmation(AffirmationCreate, Reply<DbAffirmation>),
    CreatePrompt(MindfulnessPromptCreate, Reply<DbMindfulnessPrompt>),
    /// (user id, age group, today)
    DailyAffirmation(i64, String, NaiveDate, Reply<Option<DbDailyAffirmation>>),
    AcknowledgeAffirmation(i64, NaiveDate, Option<String>, Reply<Option<DbDailyAffirmation>>),
    DailyMindfulness(i64, String, NaiveDate, Reply<Option<DbDailyMindfulness>>),
    CompleteMindfulness(
        i64,
        String,
        NaiveDate,
        Option<String>,
        Reply<Option<DbDailyMindfulness>>,
    ),

    UpsertStyleProfile(i64, LearningStyleProfileInput, Reply<DbLearningStyleProfile>),
    GetStyleProfile(i64, Reply<Option<DbLearningStyleProfile>>),
    RecordTeachBack(i64, TeachBackCreate, Reply<DbTeachBack>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

/// `ractor::call!` with RPC failures mapped into `LearnifyError::Ractor`.
macro_rules! rpc {
    ($actor:expr, $variant:ident $(, $arg:expr)* $(,)?) => {
        ractor::call!($actor, DbActorMessage::$variant $(, $arg)*).map_err(|e| {
            LearnifyError::Ractor(format!(
                concat!("DbActor ", stringify!($variant), " RPC failed: {}"),
                e
            ))
        })?
    };
}

impl DbActorHandle {
    pub async fn create_user(&self, user: UserCreate) -> Result<DbUser, LearnifyError> {
        rpc!(self.actor, CreateUser, user)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<DbUser>, LearnifyError> {
        rpc!(self.actor, GetUser, id)
    }

    pub async fn link_parent(&self, parent_id: i64, student_id: i64) -> Result<(), LearnifyError> {
        rpc!(self.actor, LinkParent, parent_id, student_id)
    }

    pub async fn is_parent_of(&self, parent_id: i64, student_id: i64) -> Result<bool, LearnifyError> {
        rpc!(self.actor, IsParentOf, parent_id, student_id)
    }

    pub async fn create_subject(&self, subject: SubjectCreate) -> Result<DbSubject, LearnifyError> {
        rpc!(self.actor, CreateSubject, subject)
    }

    pub async fn list_subjects(&self) -> Result<Vec<DbSubject>, LearnifyError> {
        rpc!(self.actor, ListSubjects)
    }

    pub async fn create_lesson(&self, lesson: LessonCreate, author: i64) -> Result<i64, LearnifyError> {
        rpc!(self.actor, CreateLesson, lesson, author)
    }

    pub async fn list_lessons(&self) -> Result<Vec<DbLesson>, LearnifyError> {
        rpc!(self.actor, ListLessons)
    }

    pub async fn get_lesson(
        &self,
        id: i64,
    ) -> Result<Option<(DbLesson, Vec<DbLessonStep>)>, LearnifyError> {
        rpc!(self.actor, GetLesson, id)
    }

    pub async fn create_quiz(&self, quiz: QuizCreate) -> Result<DbQuiz, LearnifyError> {
        rpc!(self.actor, CreateQuiz, quiz)
    }

    pub async fn record_quiz_attempt(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt: QuizAttemptCreate,
    ) -> Result<DbQuizAttempt, LearnifyError> {
        rpc!(self.actor, RecordQuizAttempt, quiz_id, user_id, attempt)
    }

    pub async fn get_lesson_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
    ) -> Result<Option<DbLessonProgress>, LearnifyError> {
        rpc!(self.actor, GetLessonProgress, user_id, lesson_id)
    }

    pub async fn complete_lesson(
        &self,
        done: LessonCompletion,
    ) -> Result<Vec<AchievementAward>, LearnifyError> {
        rpc!(self.actor, CompleteLesson, done)
    }

    pub async fn claim_daily(&self, user_id: i64, now: DateTime<Utc>) -> Result<DailyClaim, LearnifyError> {
        rpc!(self.actor, ClaimDaily, user_id, now)
    }

    pub async fn award_xp(
        &self,
        user_id: i64,
        amount: i64,
        source: &str,
        reason: Option<String>,
    ) -> Result<i64, LearnifyError> {
        rpc!(self.actor, AwardXp, user_id, amount, source.to_string(), reason)
    }

    pub async fn list_badges(&self, user_id: i64) -> Result<Vec<DbBadge>, LearnifyError> {
        rpc!(self.actor, ListBadges, user_id)
    }

    pub async fn list_xp_transactions(
        &self,
        user_id: i64,
    ) -> Result<Vec<DbXpTransaction>, LearnifyError> {
        rpc!(self.actor, ListXpTransactions, user_id)
    }

    pub async fn record_study_session(
        &self,
        user_id: i64,
        session: StudySessionCreate,
    ) -> Result<DbStudySession, LearnifyError> {
        rpc!(self.actor, RecordStudySession, user_id, session)
    }

    pub async fn list_study_sessions(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<DbStudySession>, LearnifyError> {
        rpc!(self.actor, ListStudySessions, user_id, from, until)
    }

    pub async fn activity_data(
        &self,
        user_id: i64,
        subject_id: Option<i64>,
    ) -> Result<ActivityData, LearnifyError> {
        rpc!(self.actor, ActivityData, user_id, subject_id)
    }

    pub async fn create_diagnostic_question(
        &self,
        question: DiagnosticQuestionCreate,
    ) -> Result<i64, LearnifyError> {
        rpc!(self.actor, CreateDiagnosticQuestion, question)
    }

    pub async fn placement_questions(
        &self,
        subject_id: i64,
        topic: Option<String>,
    ) -> Result<Vec<DiagnosticQuestionView>, LearnifyError> {
        rpc!(self.actor, PlacementQuestions, subject_id, topic)
    }

    pub async fn answer_keys(&self, subject_id: i64) -> Result<Vec<AnswerKey>, LearnifyError> {
        rpc!(self.actor, AnswerKeys, subject_id)
    }

    pub async fn save_diagnostic(&self, submission: DiagnosticSubmission) -> Result<i64, LearnifyError> {
        rpc!(self.actor, SaveDiagnostic, submission)
    }

    pub async fn create_path(&self, path: LearningPathCreate) -> Result<i64, LearnifyError> {
        rpc!(self.actor, CreatePath, path)
    }

    pub async fn get_path(
        &self,
        path_id: i64,
    ) -> Result<Option<(DbLearningPath, Vec<DbLearningPathNode>)>, LearnifyError> {
        rpc!(self.actor, GetPath, path_id)
    }

    pub async fn get_path_progress(
        &self,
        user_id: i64,
        path_id: i64,
    ) -> Result<Option<DbLearningPathProgress>, LearnifyError> {
        rpc!(self.actor, GetPathProgress, user_id, path_id)
    }

    pub async fn complete_node(
        &self,
        user_id: i64,
        path_id: i64,
        node_id: i64,
    ) -> Result<DbLearningPathProgress, LearnifyError> {
        rpc!(self.actor, CompleteNode, user_id, path_id, node_id)
    }

    pub async fn create_concept(&self, concept: ConceptCreate) -> Result<DbConcept, LearnifyError> {
        rpc!(self.actor, CreateConcept, concept)
    }

    pub async fn create_connection(
        &self,
        connection: ConnectionCreate,
    ) -> Result<DbConceptConnection, LearnifyError> {
        rpc!(self.actor, CreateConnection, connection)
    }

    pub async fn knowledge_graph(
        &self,
        user_id: i64,
        subject_id: Option<i64>,
    ) -> Result<KnowledgeGraph, LearnifyError> {
        rpc!(self.actor, KnowledgeGraph, user_id, subject_id)
    }

    pub async fn create_mood(&self, user_id: i64, mood: MoodCreate) -> Result<DbMoodEntry, LearnifyError> {
        rpc!(self.actor, CreateMood, user_id, mood)
    }

    pub async fn list_moods(
        &self,
        user_id: i64,
        day: Option<NaiveDate>,
    ) -> Result<Vec<DbMoodEntry>, LearnifyError> {
        rpc!(self.actor, ListMoods, user_id, day)
    }

    pub async fn create_affirmation(
        &self,
        affirmation: AffirmationCreate,
    ) -> Result<DbAffirmation, LearnifyError> {
        rpc!(self.actor, CreateAffirmation, affirmation)
    }

    pub async fn create_prompt(
        &self,
        prompt: MindfulnessPromptCreate,
    ) -> Result<DbMindfulnessPrompt, LearnifyError> {
        rpc!(self.actor, CreatePrompt, prompt)
    }

    pub async fn daily_affirmation(
        &self,
        user_id: i64,
        age_group: &str,
        today: NaiveDate,
    ) -> Result<Option<DbDailyAffirmation>, LearnifyError> {
        rpc!(self.actor, DailyAffirmation, user_id, age_group.to_string(), today)
    }

    pub async fn acknowledge_affirmation(
        &self,
        user_id: i64,
        today: NaiveDate,
        reflection: Option<String>,
    ) -> Result<Option<DbDailyAffirmation>, LearnifyError> {
        rpc!(self.actor, AcknowledgeAffirmation, user_id, today, reflection)
    }

    pub async fn daily_mindfulness(
        &self,
        user_id: i64,
        age_group: &str,
        today: NaiveDate,
    ) -> Result<Option<DbDailyMindfulness>, LearnifyError> {
        rpc!(self.actor, DailyMindfulness, user_id, age_group.to_string(), today)
    }

    pub async fn complete_mindfulness(
        &self,
        user_id: i64,
        age_group: &str,
        today: NaiveDate,
        reflection: Option<String>,
    ) -> Result<Option<DbDailyMindfulness>, LearnifyError> {
        rpc!(
            self.actor,
            CompleteMindfulness,
            user_id,
            age_group.to_string(),
            today,
            reflection
        )
    }

    pub async fn upsert_style_profile(
        &self,
        user_id: i64,
        input: LearningStyleProfileInput,
    ) -> Result<DbLearningStyleProfile, LearnifyError> {
        rpc!(self.actor, UpsertStyleProfile, user_id, input)
    }

    pub async fn get_style_profile(
        &self,
        user_id: i64,
    ) -> Result<Option<DbLearningStyleProfile>, LearnifyError> {
        rpc!(self.actor, GetStyleProfile, user_id)
    }

    pub async fn record_teach_back(
        &self,
        user_id: i64,
        response: TeachBackCreate,
    ) -> Result<DbTeachBack, LearnifyError> {
        rpc!(self.actor, RecordTeachBack, user_id, response)
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    #[allow(clippy::too_many_lines)]
    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::CreateUser(user, reply) => {
                let _ = reply.send(users::create_user(pool, user).await);
            }
            DbActorMessage::GetUser(id, reply) => {
                let _ = reply.send(users::get_user(pool, id).await);
            }
            DbActorMessage::LinkParent(parent_id, student_id, reply) => {
                let _ = reply.send(users::link_parent(pool, parent_id, student_id).await);
            }
            DbActorMessage::IsParentOf(parent_id, student_id, reply) => {
                let _ = reply.send(users::is_parent_of(pool, parent_id, student_id).await);
            }

            DbActorMessage::CreateSubject(subject, reply) => {
                let _ = reply.send(content::create_subject(pool, subject).await);
            }
            DbActorMessage::ListSubjects(reply) => {
                let _ = reply.send(content::list_subjects(pool).await);
            }
            DbActorMessage::CreateLesson(lesson, author, reply) => {
                let _ = reply.send(content::create_lesson(pool, lesson, author).await);
            }
            DbActorMessage::ListLessons(reply) => {
                let _ = reply.send(content::list_lessons(pool).await);
            }
            DbActorMessage::GetLesson(id, reply) => {
                let _ = reply.send(content::get_lesson(pool, id).await);
            }
            DbActorMessage::CreateQuiz(quiz, reply) => {
                let _ = reply.send(content::create_quiz(pool, quiz).await);
            }
            DbActorMessage::RecordQuizAttempt(quiz_id, user_id, attempt, reply) => {
                let res = content::record_quiz_attempt(pool, quiz_id, user_id, attempt).await;
                let _ = reply.send(res);
            }

            DbActorMessage::GetLessonProgress(user_id, lesson_id, reply) => {
                let _ = reply.send(progress::get_progress(pool, user_id, lesson_id).await);
            }
            DbActorMessage::CompleteLesson(done, reply) => {
                let _ = reply.send(progress::complete_lesson(pool, done).await);
            }

            DbActorMessage::ClaimDaily(user_id, now, reply) => {
                let _ = reply.send(xp::claim_daily(pool, user_id, now).await);
            }
            DbActorMessage::AwardXp(user_id, amount, source, reason, reply) => {
                let res = xp::award_xp(pool, user_id, amount, &source, reason).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListBadges(user_id, reply) => {
                let _ = reply.send(xp::list_badges(pool, user_id).await);
            }
            DbActorMessage::ListXpTransactions(user_id, reply) => {
                let _ = reply.send(xp::list_transactions(pool, user_id).await);
            }

            DbActorMessage::RecordStudySession(user_id, session, reply) => {
                let _ = reply.send(analytics::record_study_session(pool, user_id, session).await);
            }
            DbActorMessage::ListStudySessions(user_id, from, until, reply) => {
                let res = analytics::list_study_sessions(pool, user_id, from, until).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ActivityData(user_id, subject_id, reply) => {
                let _ = reply.send(analytics::activity_data(pool, user_id, subject_id).await);
            }

            DbActorMessage::CreateDiagnosticQuestion(question, reply) => {
                let _ = reply.send(diagnostic::create_question(pool, question).await);
            }
            DbActorMessage::PlacementQuestions(subject_id, topic, reply) => {
                let res = diagnostic::placement_questions(pool, subject_id, topic.as_deref()).await;
                let _ = reply.send(res);
            }
            DbActorMessage::AnswerKeys(subject_id, reply) => {
                let _ = reply.send(diagnostic::answer_keys(pool, subject_id).await);
            }
            DbActorMessage::SaveDiagnostic(submission, reply) => {
                let _ = reply.send(diagnostic::save_submission(pool, submission).await);
            }

            DbActorMessage::CreatePath(path, reply) => {
                let _ = reply.send(paths::create_path(pool, path).await);
            }
            DbActorMessage::GetPath(path_id, reply) => {
                let _ = reply.send(paths::get_path(pool, path_id).await);
            }
            DbActorMessage::GetPathProgress(user_id, path_id, reply) => {
                let _ = reply.send(paths::get_progress(pool, user_id, path_id).await);
            }
            DbActorMessage::CompleteNode(user_id, path_id, node_id, reply) => {
                let res = paths::complete_node(pool, user_id, path_id, node_id).await;
                let _ = reply.send(res);
            }

            DbActorMessage::CreateConcept(concept, reply) => {
                let _ = reply.send(graph::create_concept(pool, concept).await);
            }
            DbActorMessage::CreateConnection(connection, reply) => {
                let _ = reply.send(graph::create_connection(pool, connection).await);
            }
            DbActorMessage::KnowledgeGraph(user_id, subject_id, reply) => {
                let _ = reply.send(graph::knowledge_graph(pool, user_id, subject_id).await);
            }

            DbActorMessage::CreateMood(user_id, mood, reply) => {
                let _ = reply.send(sel::create_mood(pool, user_id, mood).await);
            }
            DbActorMessage::ListMoods(user_id, day, reply) => {
                let _ = reply.send(sel::list_moods(pool, user_id, day).await);
            }
            DbActorMessage::CreateAffirmation(affirmation, reply) => {
                let _ = reply.send(sel::create_affirmation(pool, affirmation).await);
            }
            DbActorMessage::CreatePrompt(prompt, reply) => {
                let _ = reply.send(sel::create_prompt(pool, prompt).await);
            }
            DbActorMessage::DailyAffirmation(user_id, age_group, today, reply) => {
                let res = sel::daily_affirmation(pool, user_id, &age_group, today).await;
                let _ = reply.send(res);
            }
            DbActorMessage::AcknowledgeAffirmation(user_id, today, reflection, reply) => {
                let res = sel::acknowledge_affirmation(pool, user_id, today, reflection).await;
                let _ = reply.send(res);
            }
            DbActorMessage::DailyMindfulness(user_id, age_group, today, reply) => {
                let res = sel::daily_mindfulness(pool, user_id, &age_group, today).await;
                let _ = reply.send(res);
            }
            DbActorMessage::CompleteMindfulness(user_id, age_group, today, reflection, reply) => {
                let res =
                    sel::complete_mindfulness(pool, user_id, &age_group, today, reflection).await;
                let _ = reply.send(res);
            }

            DbActorMessage::UpsertStyleProfile(user_id, input, reply) => {
                let _ = reply.send(profile::upsert_style_profile(pool, user_id, input).await);
            }
            DbActorMessage::GetStyleProfile(user_id, reply) => {
                let _ = reply.send(profile::get_style_profile(pool, user_id).await);
            }
            DbActorMessage::RecordTeachBack(user_id, response, reply) => {
                let _ = reply.send(profile::record_teach_back(pool, user_id, response).await);
            }
        }
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> DbActorHandle {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .expect("failed to spawn DbActor");

    DbActorHandle { actor }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), LearnifyError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
