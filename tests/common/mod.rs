// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schoolhub::{
    config::Config,
    models::{
        attempt::QuizAttempt,
        content::{Content, ContentFilter, ContentStatus, ContentType, ContentUpdate, NewContent},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
        user::{Role, User},
    },
    quiz::normalize::AnswerMap,
    routes,
    state::{AppState, SharedStore},
    store::{ContentStore, QuizStore, StoreError, StoreResult, UserStore},
    utils::hash::hash_password,
};
use serde_json::Value;
use sqlx::types::Json;

/// In-memory store with the same uniqueness and cascade rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
    lose_next_insert: AtomicBool,
    conflict_next_completion: AtomicBool,
    lost_inserts: AtomicUsize,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    contents: Vec<Content>,
    quizzes: Vec<Quiz>,
    questions: Vec<Question>,
    attempts: Vec<QuizAttempt>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_content(&mut self, new: NewContent) -> Content {
        let now = Utc::now();
        let content = Content {
            id: self.id(),
            title: new.title,
            description: new.description,
            content_type: new.content_type.as_str().to_string(),
            class_id: new.class_id,
            subject_id: new.subject_id,
            author_id: new.author_id,
            due_date: new.due_date,
            status: new.status.as_str().to_string(),
            attachment_url: new.attachment_url,
            created_at: now,
            updated_at: now,
        };
        self.contents.push(content.clone());
        content
    }

    fn insert_question(&mut self, quiz_id: i64, new: NewQuestion) -> Question {
        let question = Question {
            id: self.id(),
            quiz_id,
            question_text: new.question_text,
            options: Json(new.options),
            points: new.points,
            display_order: new.display_order,
        };
        self.questions.push(question.clone());
        question
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().expect("memory store poisoned")
    }

    /// Inserts a question row verbatim, e.g. with a legacy option encoding.
    pub fn insert_raw_question(&self, quiz_id: i64, options: Value, points: i32) -> Question {
        let mut t = self.tables();
        let order = t.questions.iter().filter(|q| q.quiz_id == quiz_id).count() as i32 + 1;
        let question = t.insert_question(
            quiz_id,
            NewQuestion {
                question_text: format!("Question {}", order),
                options,
                points,
                display_order: order,
            },
        );
        if let Some(quiz) = t.quizzes.iter_mut().find(|q| q.id == quiz_id) {
            quiz.total_points += points;
        }
        question
    }

    /// Creates a published quiz with no questions; returns (content id, quiz id).
    pub fn insert_quiz(&self, author_id: i64) -> (i64, i64) {
        let mut t = self.tables();
        let content = t.insert_content(NewContent {
            title: "Quiz".to_string(),
            description: None,
            content_type: ContentType::Quiz,
            class_id: 1,
            subject_id: 1,
            author_id,
            due_date: None,
            status: ContentStatus::Published,
            attachment_url: None,
        });
        let quiz = Quiz {
            id: t.id(),
            content_id: content.id,
            time_limit_minutes: None,
            passing_score: 40,
            total_points: 0,
            created_at: Utc::now(),
        };
        t.quizzes.push(quiz.clone());
        (content.id, quiz.id)
    }

    /// Adds an in-progress attempt directly, bypassing the lifecycle.
    pub fn force_attempt(&self, student_id: i64, quiz_id: i64) -> QuizAttempt {
        let mut t = self.tables();
        let attempt = QuizAttempt {
            id: t.id(),
            quiz_id,
            student_id,
            started_at: Utc::now(),
            completed_at: None,
            score: None,
            answers: Json(AnswerMap::new()),
        };
        t.attempts.push(attempt.clone());
        attempt
    }

    /// The next `insert_attempt` behaves as if a concurrent begin won the race:
    /// a rival in-progress attempt is stored and the insert reports `None`.
    pub fn lose_next_begin_race(&self) {
        self.lose_next_insert.store(true, Ordering::SeqCst);
    }

    /// The next `complete_attempt` trips the completed-attempt unique index.
    pub fn conflict_next_completion(&self) {
        self.conflict_next_completion.store(true, Ordering::SeqCst);
    }

    pub fn lost_inserts(&self) -> usize {
        self.lost_inserts.load(Ordering::SeqCst)
    }

    pub fn content_exists(&self, id: i64) -> bool {
        self.tables().contents.iter().any(|c| c.id == id)
    }

    pub fn attempt_count(&self) -> usize {
        self.tables().attempts.len()
    }

    pub fn question_count(&self) -> usize {
        self.tables().questions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> StoreResult<User> {
        let mut t = self.tables();
        if t.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }
        let user = User {
            id: t.id(),
            username: username.to_string(),
            password: password_hash.to_string(),
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users = self.tables().users.clone();
        users.reverse();
        Ok(users)
    }

    async fn update_user(&self, id: i64, role: Option<Role>, password_hash: Option<&str>) -> StoreResult<bool> {
        let mut t = self.tables();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        if let Some(role) = role {
            user.role = role.as_str().to_string();
        }
        if let Some(hash) = password_hash {
            user.password = hash.to_string();
        }
        Ok(true)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let mut t = self.tables();
        let referenced = t.contents.iter().any(|c| c.author_id == id)
            || t.attempts.iter().any(|a| a.student_id == id);
        if referenced {
            return Err(StoreError::Conflict("user is still referenced".to_string()));
        }
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        Ok(t.users.len() != before)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_content(&self, content: NewContent) -> StoreResult<Content> {
        Ok(self.tables().insert_content(content))
    }

    async fn create_quiz_content(
        &self,
        content: NewContent,
        quiz: NewQuiz,
        questions: Vec<NewQuestion>,
    ) -> StoreResult<(Content, Quiz)> {
        let mut t = self.tables();
        let content = t.insert_content(content);
        let quiz = Quiz {
            id: t.id(),
            content_id: content.id,
            time_limit_minutes: quiz.time_limit_minutes,
            passing_score: quiz.passing_score,
            total_points: questions.iter().map(|q| q.points).sum(),
            created_at: Utc::now(),
        };
        t.quizzes.push(quiz.clone());
        for question in questions {
            t.insert_question(quiz.id, question);
        }
        Ok((content, quiz))
    }

    async fn find_content(&self, id: i64) -> StoreResult<Option<Content>> {
        Ok(self.tables().contents.iter().find(|c| c.id == id).cloned())
    }

    async fn list_contents(&self, filter: &ContentFilter) -> StoreResult<Vec<Content>> {
        let mut contents: Vec<Content> = self
            .tables()
            .contents
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        contents.reverse();
        Ok(contents)
    }

    async fn update_content(&self, id: i64, update: ContentUpdate) -> StoreResult<Option<Content>> {
        let mut t = self.tables();
        let Some(content) = t.contents.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            content.title = title;
        }
        if let Some(description) = update.description {
            content.description = Some(description);
        }
        if let Some(due_date) = update.due_date {
            content.due_date = Some(due_date);
        }
        if let Some(status) = update.status {
            content.status = status.as_str().to_string();
        }
        if let Some(url) = update.attachment_url {
            content.attachment_url = Some(url);
        }
        content.updated_at = Utc::now();
        Ok(Some(content.clone()))
    }

    async fn delete_content(&self, id: i64) -> StoreResult<bool> {
        let mut t = self.tables();
        let before = t.contents.len();
        t.contents.retain(|c| c.id != id);
        if t.contents.len() == before {
            return Ok(false);
        }

        let quiz_ids: Vec<i64> = t
            .quizzes
            .iter()
            .filter(|q| q.content_id == id)
            .map(|q| q.id)
            .collect();
        t.quizzes.retain(|q| q.content_id != id);
        t.questions.retain(|q| !quiz_ids.contains(&q.quiz_id));
        t.attempts.retain(|a| !quiz_ids.contains(&a.quiz_id));
        Ok(true)
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn find_quiz(&self, id: i64) -> StoreResult<Option<Quiz>> {
        Ok(self.tables().quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn find_quiz_by_content(&self, content_id: i64) -> StoreResult<Option<Quiz>> {
        Ok(self
            .tables()
            .quizzes
            .iter()
            .find(|q| q.content_id == content_id)
            .cloned())
    }

    async fn find_quiz_content(&self, content_id: i64) -> StoreResult<Option<Content>> {
        Ok(self
            .tables()
            .contents
            .iter()
            .find(|c| c.id == content_id && c.is_quiz())
            .cloned())
    }

    async fn list_questions(&self, quiz_id: i64) -> StoreResult<Vec<Question>> {
        let mut questions: Vec<Question> = self
            .tables()
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.display_order, q.id));
        Ok(questions)
    }

    async fn add_question(&self, quiz_id: i64, question: NewQuestion) -> StoreResult<Question> {
        let mut t = self.tables();
        let points = question.points;
        let created = t.insert_question(quiz_id, question);
        if let Some(quiz) = t.quizzes.iter_mut().find(|q| q.id == quiz_id) {
            quiz.total_points += points;
        }
        Ok(created)
    }

    async fn find_attempt(&self, id: i64) -> StoreResult<Option<QuizAttempt>> {
        Ok(self.tables().attempts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_attempts(&self, student_id: i64, quiz_id: i64) -> StoreResult<Vec<QuizAttempt>> {
        Ok(self
            .tables()
            .attempts
            .iter()
            .filter(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn list_student_attempts(&self, student_id: i64) -> StoreResult<Vec<QuizAttempt>> {
        let mut attempts: Vec<QuizAttempt> = self
            .tables()
            .attempts
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        attempts.reverse();
        Ok(attempts)
    }

    async fn list_quiz_attempts(&self, quiz_id: i64) -> StoreResult<Vec<QuizAttempt>> {
        let mut attempts: Vec<QuizAttempt> = self
            .tables()
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect();
        attempts.reverse();
        Ok(attempts)
    }

    async fn insert_attempt(
        &self,
        student_id: i64,
        quiz_id: i64,
        started_at: DateTime<Utc>,
    ) -> StoreResult<Option<QuizAttempt>> {
        if self.lose_next_insert.swap(false, Ordering::SeqCst) {
            self.force_attempt(student_id, quiz_id);
            self.lost_inserts.fetch_add(1, Ordering::SeqCst);
            return Ok(None);
        }

        let mut t = self.tables();
        let open = t
            .attempts
            .iter()
            .any(|a| a.student_id == student_id && a.quiz_id == quiz_id && !a.is_completed());
        if open {
            return Ok(None);
        }
        let attempt = QuizAttempt {
            id: t.id(),
            quiz_id,
            student_id,
            started_at,
            completed_at: None,
            score: None,
            answers: Json(AnswerMap::new()),
        };
        t.attempts.push(attempt.clone());
        Ok(Some(attempt))
    }

    async fn save_answers(&self, attempt_id: i64, answers: &AnswerMap) -> StoreResult<Option<QuizAttempt>> {
        let mut t = self.tables();
        let Some(attempt) = t
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id && !a.is_completed())
        else {
            return Ok(None);
        };
        attempt.answers = Json(answers.clone());
        Ok(Some(attempt.clone()))
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        answers: &AnswerMap,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<QuizAttempt>> {
        if self.conflict_next_completion.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Conflict("uniq_attempt_completed".to_string()));
        }

        let mut t = self.tables();
        let Some(pair) = t
            .attempts
            .iter()
            .find(|a| a.id == attempt_id && !a.is_completed())
            .map(|a| (a.student_id, a.quiz_id))
        else {
            return Ok(None);
        };
        let already_done = t
            .attempts
            .iter()
            .any(|a| (a.student_id, a.quiz_id) == pair && a.is_completed());
        if already_done {
            return Err(StoreError::Conflict("uniq_attempt_completed".to_string()));
        }

        let attempt = t
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id)
            .expect("attempt vanished under lock");
        attempt.answers = Json(answers.clone());
        attempt.score = Some(score);
        attempt.completed_at = Some(completed_at);
        Ok(Some(attempt.clone()))
    }

    async fn delete_attempts(&self, student_id: i64, quiz_id: i64) -> StoreResult<u64> {
        let mut t = self.tables();
        let before = t.attempts.len();
        t.attempts
            .retain(|a| !(a.student_id == student_id && a.quiz_id == quiz_id));
        Ok((before - t.attempts.len()) as u64)
    }
}

pub const TEST_PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates a user directly in the store and logs in over HTTP.
    /// Returns (user id, bearer token).
    pub async fn user_with_token(&self, prefix: &str, role: Role) -> (i64, String) {
        let username = format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8]);
        let hash = hash_password(TEST_PASSWORD).unwrap();
        let user = self.store.create_user(&username, &hash, role).await.unwrap();

        let login: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        let token = login["token"].as_str().expect("Token not found").to_string();
        (user.id, token)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "memory://".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        admin_username: None,
        admin_password: None,
    }
}

/// Spawns the app on a random port backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let shared: SharedStore = store.clone();

    let app = routes::create_router(AppState {
        store: shared,
        config: test_config(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}
