#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDateTime, Utc};
use journal_backend::{
    auth::{
        models::{NewUser, User},
        repository::UserRepository,
    },
    config::{AppEnv, Config},
    create_router,
    error::RepoError,
    journal::{
        models::{
            DailySubTask, DailyTask, JournalEntry, JournalInsert, JournalPatch, NewDailyTask,
            SubTaskPatch, TaskPatch,
        },
        repository::JournalRepository,
        task_repository::DailyTaskRepository,
    },
    AppState,
};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret";
pub const TEST_PASSWORD: &str = "password123";

pub fn test_config(env: AppEnv) -> Config {
    Config {
        database_url: String::new(),
        db_max_connections: 5,
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_hours: 24,
        server_address: "127.0.0.1:0".to_string(),
        env,
        // Lowest cost bcrypt accepts.
        bcrypt_cost: 4,
        shutdown_grace: Duration::from_secs(1),
        log_dir: std::env::temp_dir().to_string_lossy().into_owned(),
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    entries: Vec<JournalEntry>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owned_entry(&mut self, id: i64, user_id: i64) -> Result<&mut JournalEntry, RepoError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .ok_or(RepoError::NotFound)
    }

    fn build_task(&mut self, entry_id: i64, task: &NewDailyTask) -> DailyTask {
        let task_id = self.next_id();
        let now = Utc::now();
        let sub_tasks = task
            .sub_tasks
            .iter()
            .map(|sub_task| DailySubTask {
                id: self.next_id(),
                daily_task_id: task_id,
                sub_task: sub_task.clone(),
                status: false,
                created_at: now,
                updated_at: now,
            })
            .collect();

        DailyTask {
            id: task_id,
            journal_entry_id: entry_id,
            task: task.task.clone(),
            status: false,
            sub_tasks,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Backs all three repositories with plain vectors so router tests run
/// without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    vanish_on_next_update: AtomicBool,
}

impl MemoryStore {
    /// Makes the next entry update behave as if a concurrent request had
    /// deleted the entry between lookup and write.
    pub fn delete_before_next_update(&self) {
        self.vanish_on_next_update.store(true, Ordering::SeqCst);
    }

    pub fn entry_count(&self) -> usize {
        self.tables.lock().unwrap().entries.len()
    }

    pub fn task_count(&self) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.entries.iter().map(|e| e.daily_tasks.len()).sum()
    }

    pub fn sub_task_count(&self) -> usize {
        let tables = self.tables.lock().unwrap();
        tables
            .entries
            .iter()
            .flat_map(|e| e.daily_tasks.iter())
            .map(|t| t.sub_tasks.len())
            .sum()
    }

    pub fn stored_password_hash(&self, email: &str) -> Option<String> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<i64, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Duplicate("email"));
        }
        let id = tables.next_id();
        let now = Utc::now();
        tables.users.push(User {
            id,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl JournalRepository for MemoryStore {
    async fn create(&self, entry: JournalInsert) -> Result<i64, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let daily_tasks = entry
            .daily_tasks
            .iter()
            .map(|task| tables.build_task(id, task))
            .collect();
        let now = Utc::now();
        tables.entries.push(JournalEntry {
            id,
            user_id: entry.user_id,
            date: entry.date,
            mood: entry.mood,
            this_day_description: entry.this_day_description,
            daily_reflection: entry.daily_reflection,
            daily_tasks,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn find_by_id(&self, id: i64, user_id: i64) -> Result<JournalEntry, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        tables.owned_entry(id, user_id).map(|e| e.clone())
    }

    async fn find_all(&self, user_id: i64) -> Result<Vec<JournalEntry>, RepoError> {
        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<JournalEntry> = tables
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn find_by_date(
        &self,
        user_id: i64,
        date: NaiveDateTime,
    ) -> Result<Vec<JournalEntry>, RepoError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.date == date)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, user_id: i64, patch: &JournalPatch) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        if self.vanish_on_next_update.swap(false, Ordering::SeqCst) {
            tables.entries.retain(|e| e.id != id);
            return Err(RepoError::NotFound);
        }

        let entry = tables.owned_entry(id, user_id)?;
        if let Some(mood) = patch.mood {
            entry.mood = mood;
        }
        if let Some(description) = &patch.this_day_description {
            entry.this_day_description = description.clone();
        }
        if let Some(reflection) = &patch.daily_reflection {
            entry.daily_reflection = reflection.clone();
        }
        entry.updated_at = Utc::now();
        Ok(())
    }

    // Tasks live inside their entry here, so removing the entry cannot leave
    // orphans behind. Orphaned rows are only observable against Postgres, see
    // `test_pg_entry_round_trip_and_cascade`.
    async fn delete(&self, id: i64, user_id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.entries.len();
        tables
            .entries
            .retain(|e| !(e.id == id && e.user_id == user_id));
        if tables.entries.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl DailyTaskRepository for MemoryStore {
    async fn create_task(
        &self,
        entry_id: i64,
        user_id: i64,
        task: NewDailyTask,
    ) -> Result<i64, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        tables.owned_entry(entry_id, user_id)?;
        let built = tables.build_task(entry_id, &task);
        let task_id = built.id;
        tables.owned_entry(entry_id, user_id)?.daily_tasks.push(built);
        Ok(task_id)
    }

    async fn update_task(
        &self,
        entry_id: i64,
        task_id: i64,
        user_id: i64,
        patch: &TaskPatch,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let task = tables
            .owned_entry(entry_id, user_id)?
            .daily_tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(RepoError::NotFound)?;
        if let Some(text) = &patch.task {
            task.task = text.clone();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_task(
        &self,
        entry_id: i64,
        task_id: i64,
        user_id: i64,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables.owned_entry(entry_id, user_id)?;
        let before = entry.daily_tasks.len();
        entry.daily_tasks.retain(|t| t.id != task_id);
        if entry.daily_tasks.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn update_sub_task(
        &self,
        entry_id: i64,
        task_id: i64,
        sub_task_id: i64,
        user_id: i64,
        patch: &SubTaskPatch,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let sub_task = tables
            .owned_entry(entry_id, user_id)?
            .daily_tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .and_then(|t| t.sub_tasks.iter_mut().find(|s| s.id == sub_task_id))
            .ok_or(RepoError::NotFound)?;
        if let Some(text) = &patch.sub_task {
            sub_task.sub_task = text.clone();
        }
        if let Some(status) = patch.status {
            sub_task.status = status;
        }
        sub_task.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App setup
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: Arc<AppState>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with_env(AppEnv::Debug)
}

pub fn spawn_app_with_env(env: AppEnv) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let state = Arc::new(AppState::new(
        test_config(env),
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let router = create_router(state.clone());

    TestApp {
        router,
        store,
        state,
    }
}

pub struct PgTestApp {
    pub router: Router,
    pub pool: PgPool,
}

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`) and applies migrations.
/// Callers skip the test when this returns an error.
pub async fn setup_pg_app() -> Result<PgTestApp, String> {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| {
            "TEST_DATABASE_URL or DATABASE_URL must be set for integration tests".to_string()
        })?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {e}"))?;

    let state = Arc::new(AppState::with_pool(test_config(AppEnv::Debug), pool.clone()));

    Ok(PgTestApp {
        router: create_router(state),
        pool,
    })
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn register(router: &Router, email: &str) -> TestResponse {
    send(
        router,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": email,
            "full_name": "Test User",
            "password": TEST_PASSWORD,
        })),
    )
    .await
}

pub async fn login(router: &Router, email: &str, password: &str) -> TestResponse {
    send(
        router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

/// Registers `email` and returns a bearer token for it.
pub async fn token_for(router: &Router, email: &str) -> String {
    let registered = register(router, email).await;
    assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);

    let logged_in = login(router, email, TEST_PASSWORD).await;
    assert_eq!(logged_in.status, StatusCode::OK, "{:?}", logged_in.body);
    logged_in.body["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

pub fn sample_entry() -> Value {
    json!({
        "date": "2024-03-05T14:30:00Z",
        "mood": "Happy",
        "this_day_description": "Went for a long walk",
        "daily_reflection": "Should do that more often",
        "daily_tasks": [
            { "task": "groceries", "sub_tasks": [{ "sub_task": "milk" }, { "sub_task": "bread" }] },
            { "task": "laundry", "sub_tasks": [] }
        ]
    })
}

pub async fn create_entry(router: &Router, token: &str, body: Value) -> i64 {
    let created = send(router, Method::POST, "/api/v1/journals", Some(token), Some(body)).await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    created.body["data"]["journal_id"].as_i64().unwrap()
}
