use std::sync::Arc;

use super::models::{NewDailyTask, SubTaskPatch, TaskPatch};
use super::service::{require_text, validate_new_task};
use super::task_repository::DailyTaskRepository;
use crate::error::{AppError, AppResult, RepoError};

#[derive(Clone)]
pub struct DailyTaskService {
    tasks: Arc<dyn DailyTaskRepository>,
}

impl DailyTaskService {
    pub fn new(tasks: Arc<dyn DailyTaskRepository>) -> Self {
        Self { tasks }
    }

    /// Adds a task to an entry. New tasks and their sub-tasks always start
    /// incomplete.
    pub async fn add_task(&self, entry_id: i64, user_id: i64, task: NewDailyTask) -> AppResult<i64> {
        validate_new_task(&task)?;

        let task_id = self
            .tasks
            .create_task(entry_id, user_id, task)
            .await
            .map_err(|e| not_found(e, "Journal entry not found"))?;

        tracing::info!(user_id = %user_id, journal_id = %entry_id, task_id = %task_id, "Daily task added");

        Ok(task_id)
    }

    pub async fn update_task(
        &self,
        entry_id: i64,
        task_id: i64,
        user_id: i64,
        patch: TaskPatch,
    ) -> AppResult<()> {
        if let Some(task) = &patch.task {
            require_text("task", task)?;
        }

        self.tasks
            .update_task(entry_id, task_id, user_id, &patch)
            .await
            .map_err(|e| not_found(e, "Daily task not found"))
    }

    pub async fn delete_task(&self, entry_id: i64, task_id: i64, user_id: i64) -> AppResult<()> {
        self.tasks
            .delete_task(entry_id, task_id, user_id)
            .await
            .map_err(|e| not_found(e, "Daily task not found"))?;

        tracing::info!(user_id = %user_id, journal_id = %entry_id, task_id = %task_id, "Daily task deleted");

        Ok(())
    }

    pub async fn update_sub_task(
        &self,
        entry_id: i64,
        task_id: i64,
        sub_task_id: i64,
        user_id: i64,
        patch: SubTaskPatch,
    ) -> AppResult<()> {
        if let Some(sub_task) = &patch.sub_task {
            require_text("sub_task", sub_task)?;
        }

        self.tasks
            .update_sub_task(entry_id, task_id, sub_task_id, user_id, &patch)
            .await
            .map_err(|e| not_found(e, "Daily sub-task not found"))
    }
}

fn not_found(err: RepoError, message: &str) -> AppError {
    match err {
        RepoError::NotFound => AppError::NotFound(message.to_string()),
        other => other.into(),
    }
}
