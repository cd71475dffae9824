//! SQL DDL for initializing the database schema.
//! SQLite-first design; statements are applied one by one at actor start.

/// SQLite schema includes:
/// - accounts: `users`, `parent_links`, `badges`
/// - content: `subjects`, `lessons`, `lesson_steps`, `quizzes`
/// - progress: `lesson_progress`, `achievements`, `xp_transactions`, `quiz_attempts`, `study_sessions`
/// - placement: `diagnostic_questions`, `diagnostic_results`, learning paths, concepts
/// - wellbeing: moods, affirmations, mindfulness prompts, learning styles, teach-back
pub const SQLITE_INIT: &str = r"
-- ---------------------------------------------------------------------------
-- Accounts
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    age INTEGER NULL,
    grade_level TEXT NULL,
    xp INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    last_active TEXT NULL, -- RFC3339
    created_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS parent_links (
    parent_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    student_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (parent_id, student_id)
);

CREATE TABLE IF NOT EXISTS badges (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    label TEXT NOT NULL,
    awarded_at TEXT NOT NULL,
    UNIQUE(user_id, label)
);

-- ---------------------------------------------------------------------------
-- Content
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS subjects (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    color TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lessons (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    level TEXT NOT NULL,
    content TEXT NOT NULL,
    created_by INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lesson_steps (
    id INTEGER PRIMARY KEY NOT NULL,
    lesson_id INTEGER NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    phase TEXT NOT NULL, -- concrete | pictorial | abstract
    content TEXT NOT NULL,
    image_url TEXT NULL,
    difficulty_level INTEGER NOT NULL DEFAULT 3,
    question TEXT NULL, -- JSON
    UNIQUE(lesson_id, position)
);

CREATE TABLE IF NOT EXISTS quizzes (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    created_at TEXT NOT NULL
);

-- ---------------------------------------------------------------------------
-- Progress and XP
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS lesson_progress (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    lesson_id INTEGER NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
    completed INTEGER NOT NULL DEFAULT 0,
    attempts_count INTEGER NOT NULL DEFAULT 0,
    highest_difficulty_completed INTEGER NOT NULL DEFAULT 0,
    best_accuracy REAL NOT NULL DEFAULT 0,
    response_data TEXT NOT NULL DEFAULT '{}', -- JSON, last attempt
    last_attempt_at TEXT NOT NULL,
    UNIQUE(user_id, lesson_id)
);

CREATE TABLE IF NOT EXISTS achievements (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    achievement_type TEXT NOT NULL,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    xp_awarded INTEGER NOT NULL,
    awarded_at TEXT NOT NULL,
    UNIQUE(user_id, achievement_type, subject_id)
);

CREATE TABLE IF NOT EXISTS xp_transactions (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount INTEGER NOT NULL,
    source TEXT NOT NULL,
    reason TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_xp_transactions_user ON xp_transactions(user_id, created_at);

CREATE TABLE IF NOT EXISTS quiz_attempts (
    id INTEGER PRIMARY KEY NOT NULL,
    quiz_id INTEGER NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    score REAL NOT NULL,
    time_spent_minutes INTEGER NULL,
    completed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS study_sessions (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    subject_id INTEGER NULL REFERENCES subjects(id),
    start_time TEXT NOT NULL,
    end_time TEXT NULL,
    notes TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_study_sessions_user ON study_sessions(user_id, start_time);

-- ---------------------------------------------------------------------------
-- Diagnostics, learning paths, knowledge graph
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS diagnostic_questions (
    id INTEGER PRIMARY KEY NOT NULL,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    topic TEXT NULL,
    question TEXT NOT NULL,
    options TEXT NOT NULL, -- JSON array
    correct_answer TEXT NOT NULL,
    difficulty INTEGER NOT NULL DEFAULT 1,
    skill TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS diagnostic_results (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    responses TEXT NOT NULL, -- JSON evaluations
    skill_scores TEXT NOT NULL, -- JSON
    overall_proficiency INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS learning_paths (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    description TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS learning_path_nodes (
    id INTEGER PRIMARY KEY NOT NULL,
    path_id INTEGER NOT NULL REFERENCES learning_paths(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NULL,
    lesson_id INTEGER NULL REFERENCES lessons(id) ON DELETE SET NULL,
    skill TEXT NULL,
    UNIQUE(path_id, position)
);

CREATE TABLE IF NOT EXISTS learning_path_progress (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    path_id INTEGER NOT NULL REFERENCES learning_paths(id) ON DELETE CASCADE,
    current_node_id INTEGER NULL,
    completed_node_ids TEXT NOT NULL DEFAULT '[]',
    mastered_skills TEXT NOT NULL DEFAULT '[]',
    in_progress_skills TEXT NOT NULL DEFAULT '[]',
    overall_progress INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, path_id)
);

CREATE TABLE IF NOT EXISTS concepts (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    description TEXT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(subject_id, name)
);

CREATE TABLE IF NOT EXISTS concept_connections (
    id INTEGER PRIMARY KEY NOT NULL,
    source_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
    strength REAL NOT NULL DEFAULT 1.0,
    kind TEXT NOT NULL,
    UNIQUE(source_id, target_id, kind)
);

CREATE TABLE IF NOT EXISTS concept_mastery (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    concept_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
    correct INTEGER NOT NULL DEFAULT 0,
    total INTEGER NOT NULL DEFAULT 0,
    mastery_level REAL NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, concept_id)
);

-- ---------------------------------------------------------------------------
-- Wellbeing and learner profile
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS mood_entries (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    mood TEXT NOT NULL,
    intensity INTEGER NOT NULL,
    note TEXT NULL,
    factors TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS affirmations (
    id INTEGER PRIMARY KEY NOT NULL,
    text TEXT NOT NULL,
    age_group TEXT NOT NULL,
    category TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_affirmations (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    affirmation_id INTEGER NOT NULL REFERENCES affirmations(id) ON DELETE CASCADE,
    day TEXT NOT NULL, -- YYYY-MM-DD, UTC
    acknowledged_at TEXT NULL,
    reflection TEXT NULL,
    UNIQUE(user_id, day)
);

CREATE TABLE IF NOT EXISTS mindfulness_prompts (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    instructions TEXT NOT NULL,
    age_group TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_mindfulness (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    prompt_id INTEGER NOT NULL REFERENCES mindfulness_prompts(id) ON DELETE CASCADE,
    day TEXT NOT NULL, -- YYYY-MM-DD, UTC
    completed_at TEXT NULL,
    reflection TEXT NULL,
    UNIQUE(user_id, day)
);

CREATE TABLE IF NOT EXISTS learning_style_profiles (
    user_id INTEGER PRIMARY KEY NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    visual REAL NOT NULL,
    auditory REAL NOT NULL,
    reading REAL NOT NULL,
    kinesthetic REAL NOT NULL,
    dominant_style TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teach_back_responses (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    session_id TEXT NOT NULL,
    question_id TEXT NOT NULL,
    answer TEXT NOT NULL,
    correct INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
";
