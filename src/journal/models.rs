use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::mood::Mood;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: i64,
    pub user_id: i64,
    /// Midnight of the entry's calendar day.
    #[sqlx(rename = "entry_date")]
    pub date: NaiveDateTime,
    pub mood: Mood,
    pub this_day_description: String,
    pub daily_reflection: String,
    #[sqlx(skip)]
    pub daily_tasks: Vec<DailyTask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyTask {
    pub id: i64,
    pub journal_entry_id: i64,
    pub task: String,
    pub status: bool,
    #[sqlx(skip)]
    pub sub_tasks: Vec<DailySubTask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailySubTask {
    pub id: i64,
    pub daily_task_id: i64,
    pub sub_task: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateJournalRequest {
    pub date: String,
    pub mood: Mood,
    pub this_day_description: String,
    #[serde(default)]
    pub daily_reflection: String,
    #[serde(default)]
    pub daily_tasks: Vec<CreateDailyTaskRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateDailyTaskRequest {
    pub task: String,
    #[serde(default)]
    pub sub_tasks: Vec<CreateSubTaskRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateSubTaskRequest {
    pub sub_task: String,
}

/// Partial update. Absent fields are left untouched; `date` is accepted in any
/// shape but never applied.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateJournalRequest {
    #[serde(default)]
    pub date: Option<serde_json::Value>,
    pub mood: Option<Mood>,
    pub this_day_description: Option<String>,
    pub daily_reflection: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateDailyTaskRequest {
    pub task: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateSubTaskRequest {
    pub sub_task: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JournalIdResponse {
    pub journal_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyTaskIdResponse {
    pub daily_task_id: i64,
}

// ---------------------------------------------------------------------------
// Service inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub user_id: i64,
    pub date: DateTime<FixedOffset>,
    pub mood: Mood,
    pub this_day_description: String,
    pub daily_reflection: String,
    pub daily_tasks: Vec<NewDailyTask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDailyTask {
    pub task: String,
    pub sub_tasks: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JournalUpdate {
    /// Raw date value from the client, if one was sent. Never persisted.
    pub date: Option<String>,
    pub mood: Option<Mood>,
    pub this_day_description: Option<String>,
    pub daily_reflection: Option<String>,
}

// ---------------------------------------------------------------------------
// Repository inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JournalInsert {
    pub user_id: i64,
    pub date: NaiveDateTime,
    pub mood: Mood,
    pub this_day_description: String,
    pub daily_reflection: String,
    pub daily_tasks: Vec<NewDailyTask>,
}

/// Columns an update may touch. The entry date is not one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalPatch {
    pub mood: Option<Mood>,
    pub this_day_description: Option<String>,
    pub daily_reflection: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub task: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTaskPatch {
    pub sub_task: Option<String>,
    pub status: Option<bool>,
}

impl From<CreateDailyTaskRequest> for NewDailyTask {
    fn from(req: CreateDailyTaskRequest) -> Self {
        NewDailyTask {
            task: req.task,
            sub_tasks: req.sub_tasks.into_iter().map(|s| s.sub_task).collect(),
        }
    }
}

impl From<UpdateJournalRequest> for JournalUpdate {
    fn from(req: UpdateJournalRequest) -> Self {
        JournalUpdate {
            date: req.date.map(|v| v.to_string()),
            mood: req.mood,
            this_day_description: req.this_day_description,
            daily_reflection: req.daily_reflection,
        }
    }
}

impl From<UpdateDailyTaskRequest> for TaskPatch {
    fn from(req: UpdateDailyTaskRequest) -> Self {
        TaskPatch {
            task: req.task,
            status: req.status,
        }
    }
}

impl From<UpdateSubTaskRequest> for SubTaskPatch {
    fn from(req: UpdateSubTaskRequest) -> Self {
        SubTaskPatch {
            sub_task: req.sub_task,
            status: req.status,
        }
    }
}
