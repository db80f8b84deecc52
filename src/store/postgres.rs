// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::{
    models::{
        attempt::QuizAttempt,
        content::{Content, ContentFilter, ContentUpdate, NewContent},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
        user::{Role, User},
    },
    quiz::normalize::AnswerMap,
    store::{ContentStore, QuizStore, StoreResult, UserStore},
};

const USER_COLUMNS: &str = "id, username, password, role, created_at";

const CONTENT_COLUMNS: &str = "id, title, description, type, class_id, subject_id, author_id, \
     due_date, status, attachment_url, created_at, updated_at";

const QUIZ_COLUMNS: &str = "id, content_id, time_limit_minutes, passing_score, total_points, created_at";

const QUESTION_COLUMNS: &str = "id, quiz_id, question_text, options, points, display_order";

const ATTEMPT_COLUMNS: &str = "id, quiz_id, student_id, started_at, completed_at, score, answers";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id DESC", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_user(&self, id: i64, role: Option<Role>, password_hash: Option<&str>) -> StoreResult<bool> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = builder.separated(", ");

        // Touching `id` keeps the statement valid when nothing else changes.
        separated.push("id = id");

        if let Some(role) = role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }

        if let Some(hash) = password_hash {
            separated.push("password = ");
            separated.push_bind_unseparated(hash.to_string());
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn create_content(&self, content: NewContent) -> StoreResult<Content> {
        let created = insert_content(&self.pool, &content).await?;
        Ok(created)
    }

    async fn create_quiz_content(
        &self,
        content: NewContent,
        quiz: NewQuiz,
        questions: Vec<NewQuestion>,
    ) -> StoreResult<(Content, Quiz)> {
        let mut tx = self.pool.begin().await?;

        let created = insert_content(&mut *tx, &content).await?;

        let total_points: i32 = questions.iter().map(|q| q.points).sum();

        let created_quiz = sqlx::query_as::<_, Quiz>(&format!(
            r#"
            INSERT INTO quizzes (content_id, time_limit_minutes, passing_score, total_points)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            QUIZ_COLUMNS
        ))
        .bind(created.id)
        .bind(quiz.time_limit_minutes)
        .bind(quiz.passing_score)
        .bind(total_points)
        .fetch_one(&mut *tx)
        .await?;

        for question in &questions {
            sqlx::query(
                r#"
                INSERT INTO questions (quiz_id, question_text, options, points, display_order)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(created_quiz.id)
            .bind(&question.question_text)
            .bind(Json(&question.options))
            .bind(question.points)
            .bind(question.display_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok((created, created_quiz))
    }

    async fn find_content(&self, id: i64) -> StoreResult<Option<Content>> {
        let content = sqlx::query_as::<_, Content>(&format!(
            "SELECT {} FROM contents WHERE id = $1",
            CONTENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(content)
    }

    async fn list_contents(&self, filter: &ContentFilter) -> StoreResult<Vec<Content>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM contents WHERE TRUE", CONTENT_COLUMNS));

        if let Some(class_id) = filter.class_id {
            builder.push(" AND class_id = ");
            builder.push_bind(class_id);
        }

        if let Some(subject_id) = filter.subject_id {
            builder.push(" AND subject_id = ");
            builder.push_bind(subject_id);
        }

        if let Some(content_type) = filter.content_type {
            builder.push(" AND type = ");
            builder.push_bind(content_type.as_str());
        }

        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let contents = builder.build_query_as::<Content>().fetch_all(&self.pool).await?;
        Ok(contents)
    }

    async fn update_content(&self, id: i64, update: ContentUpdate) -> StoreResult<Option<Content>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE contents SET ");
        let mut separated = builder.separated(", ");

        separated.push("updated_at = CURRENT_TIMESTAMP");

        if let Some(title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }

        if let Some(description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }

        if let Some(due_date) = update.due_date {
            separated.push("due_date = ");
            separated.push_bind_unseparated(due_date);
        }

        if let Some(status) = update.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }

        if let Some(attachment_url) = update.attachment_url {
            separated.push("attachment_url = ");
            separated.push_bind_unseparated(attachment_url);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", CONTENT_COLUMNS));

        let content = builder
            .build_query_as::<Content>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(content)
    }

    async fn delete_content(&self, id: i64) -> StoreResult<bool> {
        // Quizzes, questions and attempts go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn find_quiz(&self, id: i64) -> StoreResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!("SELECT {} FROM quizzes WHERE id = $1", QUIZ_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quiz)
    }

    async fn find_quiz_by_content(&self, content_id: i64) -> StoreResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE content_id = $1",
            QUIZ_COLUMNS
        ))
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn find_quiz_content(&self, content_id: i64) -> StoreResult<Option<Content>> {
        let content = sqlx::query_as::<_, Content>(&format!(
            "SELECT {} FROM contents WHERE id = $1 AND type = 'quiz'",
            CONTENT_COLUMNS
        ))
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(content)
    }

    async fn list_questions(&self, quiz_id: i64) -> StoreResult<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY display_order, id",
            QUESTION_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn add_question(&self, quiz_id: i64, question: NewQuestion) -> StoreResult<Question> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (quiz_id, question_text, options, points, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(quiz_id)
        .bind(&question.question_text)
        .bind(Json(&question.options))
        .bind(question.points)
        .bind(question.display_order)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE quizzes SET total_points = total_points + $1 WHERE id = $2")
            .bind(question.points)
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn find_attempt(&self, id: i64) -> StoreResult<Option<QuizAttempt>> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {} FROM quiz_attempts WHERE id = $1",
            ATTEMPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn find_attempts(&self, student_id: i64, quiz_id: i64) -> StoreResult<Vec<QuizAttempt>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {} FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2 ORDER BY started_at",
            ATTEMPT_COLUMNS
        ))
        .bind(student_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn list_student_attempts(&self, student_id: i64) -> StoreResult<Vec<QuizAttempt>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {} FROM quiz_attempts WHERE student_id = $1 ORDER BY started_at DESC",
            ATTEMPT_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn list_quiz_attempts(&self, quiz_id: i64) -> StoreResult<Vec<QuizAttempt>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {} FROM quiz_attempts WHERE quiz_id = $1 ORDER BY started_at DESC",
            ATTEMPT_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn insert_attempt(
        &self,
        student_id: i64,
        quiz_id: i64,
        started_at: DateTime<Utc>,
    ) -> StoreResult<Option<QuizAttempt>> {
        // The partial unique index on in-progress attempts arbitrates concurrent begins.
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            r#"
            INSERT INTO quiz_attempts (quiz_id, student_id, started_at, answers)
            VALUES ($1, $2, $3, '{{}}'::jsonb)
            ON CONFLICT (quiz_id, student_id) WHERE completed_at IS NULL DO NOTHING
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(quiz_id)
        .bind(student_id)
        .bind(started_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn save_answers(&self, attempt_id: i64, answers: &AnswerMap) -> StoreResult<Option<QuizAttempt>> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            r#"
            UPDATE quiz_attempts SET answers = $2
            WHERE id = $1 AND completed_at IS NULL
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id)
        .bind(Json(answers))
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        answers: &AnswerMap,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<QuizAttempt>> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            r#"
            UPDATE quiz_attempts SET answers = $2, score = $3, completed_at = $4
            WHERE id = $1 AND completed_at IS NULL
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id)
        .bind(Json(answers))
        .bind(score)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn delete_attempts(&self, student_id: i64, quiz_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2")
            .bind(student_id)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

async fn insert_content<'e, E>(executor: E, content: &NewContent) -> Result<Content, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Content>(&format!(
        r#"
        INSERT INTO contents
        (title, description, type, class_id, subject_id, author_id, due_date, status, attachment_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        CONTENT_COLUMNS
    ))
    .bind(&content.title)
    .bind(&content.description)
    .bind(content.content_type.as_str())
    .bind(content.class_id)
    .bind(content.subject_id)
    .bind(content.author_id)
    .bind(content.due_date)
    .bind(content.status.as_str())
    .bind(&content.attachment_url)
    .fetch_one(executor)
    .await
}
