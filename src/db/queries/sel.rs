use chrono::{Days, NaiveDate, Utc};
use learnify_rules::sel::REPEAT_WINDOW_DAYS;
use learnify_schema::sel::{AffirmationCreate, MindfulnessPromptCreate, MoodCreate};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::db::models::{
    DbAffirmation, DbDailyAffirmation, DbDailyMindfulness, DbMindfulnessPrompt, DbMoodEntry,
};
use crate::error::LearnifyError;

pub async fn create_mood(
    pool: &SqlitePool,
    user_id: i64,
    mood: MoodCreate,
) -> Result<DbMoodEntry, LearnifyError> {
    let row = sqlx::query_as::<_, DbMoodEntry>(
        r"
        INSERT INTO mood_entries (user_id, mood, intensity, note, factors, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, mood, intensity, note, factors, created_at
        ",
    )
    .bind(user_id)
    .bind(mood.mood)
    .bind(mood.intensity)
    .bind(mood.note)
    .bind(Json(mood.factors))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Newest first; `day` narrows to one UTC calendar day.
pub async fn list_moods(
    pool: &SqlitePool,
    user_id: i64,
    day: Option<NaiveDate>,
) -> Result<Vec<DbMoodEntry>, LearnifyError> {
    let rows = match day {
        Some(day) => {
            let from = day.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
            let until = day
                .checked_add_days(Days::new(1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc());
            sqlx::query_as::<_, DbMoodEntry>(
                r"
                SELECT id, user_id, mood, intensity, note, factors, created_at
                FROM mood_entries
                WHERE user_id = ? AND created_at >= ? AND created_at < ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .bind(user_id)
            .bind(from)
            .bind(until)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbMoodEntry>(
                r"
                SELECT id, user_id, mood, intensity, note, factors, created_at
                FROM mood_entries
                WHERE user_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

pub async fn create_affirmation(
    pool: &SqlitePool,
    affirmation: AffirmationCreate,
) -> Result<DbAffirmation, LearnifyError> {
    let row = sqlx::query_as::<_, DbAffirmation>(
        r"
        INSERT INTO affirmations (text, age_group, category, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, text, age_group, category, created_at
        ",
    )
    .bind(affirmation.text)
    .bind(affirmation.age_group)
    .bind(affirmation.category)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn create_prompt(
    pool: &SqlitePool,
    prompt: MindfulnessPromptCreate,
) -> Result<DbMindfulnessPrompt, LearnifyError> {
    let row = sqlx::query_as::<_, DbMindfulnessPrompt>(
        r"
        INSERT INTO mindfulness_prompts (title, instructions, age_group, duration_minutes, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, title, instructions, age_group, duration_minutes, created_at
        ",
    )
    .bind(prompt.title)
    .bind(prompt.instructions)
    .bind(prompt.age_group)
    .bind(prompt.duration_minutes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Table layout of one kind of once-per-day content.
struct DailyTable {
    daily: &'static str,
    content: &'static str,
    content_fk: &'static str,
    /// Columns selected from the daily row `d` joined with the content row `c`.
    columns: &'static str,
    done_column: &'static str,
}

const AFFIRMATIONS: DailyTable = DailyTable {
    daily: "daily_affirmations",
    content: "affirmations",
    content_fk: "affirmation_id",
    columns: "d.id, d.user_id, d.affirmation_id, d.day, d.acknowledged_at, d.reflection, c.text, c.category",
    done_column: "acknowledged_at",
};

const MINDFULNESS: DailyTable = DailyTable {
    daily: "daily_mindfulness",
    content: "mindfulness_prompts",
    content_fk: "prompt_id",
    columns: "d.id, d.user_id, d.prompt_id, d.day, d.completed_at, d.reflection, c.title, c.instructions, c.duration_minutes",
    done_column: "completed_at",
};

impl DailyTable {
    async fn today<T>(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<Option<T>, LearnifyError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT {} FROM {} d JOIN {} c ON c.id = d.{} WHERE d.user_id = ? AND d.day = ?",
            self.columns, self.daily, self.content, self.content_fk
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(user_id)
            .bind(today)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Random content for the age group, preferring items not shown in the
    /// repeat window.
    async fn pick(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        age_group: &str,
        today: NaiveDate,
    ) -> Result<Option<i64>, LearnifyError> {
        let cutoff = today
            .checked_sub_days(Days::new(REPEAT_WINDOW_DAYS.unsigned_abs()))
            .unwrap_or(today);
        let fresh_sql = format!(
            "SELECT id FROM {content} WHERE age_group = ? AND id NOT IN \
             (SELECT {fk} FROM {daily} WHERE user_id = ? AND day >= ?) \
             ORDER BY RANDOM() LIMIT 1",
            content = self.content,
            fk = self.content_fk,
            daily = self.daily,
        );
        let fresh: Option<i64> = sqlx::query_scalar(&fresh_sql)
            .bind(age_group)
            .bind(user_id)
            .bind(cutoff)
            .fetch_optional(&mut *conn)
            .await?;
        if fresh.is_some() {
            return Ok(fresh);
        }

        let any_sql = format!(
            "SELECT id FROM {} WHERE age_group = ? ORDER BY RANDOM() LIMIT 1",
            self.content
        );
        let any: Option<i64> = sqlx::query_scalar(&any_sql)
            .bind(age_group)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(any)
    }

    /// Today's item, assigning one on the first request of the day. `None`
    /// when there is no content for the age group.
    async fn get_or_assign<T>(
        &self,
        pool: &SqlitePool,
        user_id: i64,
        age_group: &str,
        today: NaiveDate,
    ) -> Result<Option<T>, LearnifyError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut tx = pool.begin().await?;
        if let Some(existing) = self.today::<T>(&mut tx, user_id, today).await? {
            return Ok(Some(existing));
        }

        let Some(content_id) = self.pick(&mut tx, user_id, age_group, today).await? else {
            return Ok(None);
        };

        let insert = format!(
            "INSERT INTO {} (user_id, {}, day) VALUES (?, ?, ?) ON CONFLICT(user_id, day) DO NOTHING",
            self.daily, self.content_fk
        );
        sqlx::query(&insert)
            .bind(user_id)
            .bind(content_id)
            .bind(today)
            .execute(&mut *tx)
            .await?;

        let row = self.today::<T>(&mut tx, user_id, today).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn mark_done<T>(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        today: NaiveDate,
        reflection: Option<String>,
    ) -> Result<Option<T>, LearnifyError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = format!(
            "UPDATE {} SET {} = ?, reflection = COALESCE(?, reflection) WHERE user_id = ? AND day = ?",
            self.daily, self.done_column
        );
        let affected = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(reflection)
            .bind(user_id)
            .bind(today)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if affected == 0 {
            return Ok(None);
        }
        self.today::<T>(conn, user_id, today).await
    }
}

pub async fn daily_affirmation(
    pool: &SqlitePool,
    user_id: i64,
    age_group: &str,
    today: NaiveDate,
) -> Result<Option<DbDailyAffirmation>, LearnifyError> {
    AFFIRMATIONS
        .get_or_assign(pool, user_id, age_group, today)
        .await
}

/// Requires today's affirmation to have been served already.
pub async fn acknowledge_affirmation(
    pool: &SqlitePool,
    user_id: i64,
    today: NaiveDate,
    reflection: Option<String>,
) -> Result<Option<DbDailyAffirmation>, LearnifyError> {
    let mut conn = pool.acquire().await?;
    AFFIRMATIONS
        .mark_done(&mut conn, user_id, today, reflection)
        .await
}

pub async fn daily_mindfulness(
    pool: &SqlitePool,
    user_id: i64,
    age_group: &str,
    today: NaiveDate,
) -> Result<Option<DbDailyMindfulness>, LearnifyError> {
    MINDFULNESS
        .get_or_assign(pool, user_id, age_group, today)
        .await
}

/// Completes today's prompt, assigning one first if the learner never
/// fetched it.
pub async fn complete_mindfulness(
    pool: &SqlitePool,
    user_id: i64,
    age_group: &str,
    today: NaiveDate,
    reflection: Option<String>,
) -> Result<Option<DbDailyMindfulness>, LearnifyError> {
    if MINDFULNESS
        .get_or_assign::<DbDailyMindfulness>(pool, user_id, age_group, today)
        .await?
        .is_none()
    {
        return Ok(None);
    }
    let mut conn = pool.acquire().await?;
    MINDFULNESS
        .mark_done(&mut conn, user_id, today, reflection)
        .await
}
