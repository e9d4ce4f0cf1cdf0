use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::models::{NewDailyTask, SubTaskPatch, TaskPatch};
use crate::error::RepoError;

/// Persistence for daily tasks and sub-tasks. Ownership is resolved through
/// the parent journal entry's `user_id`.
#[async_trait]
pub trait DailyTaskRepository: Send + Sync {
    async fn create_task(
        &self,
        entry_id: i64,
        user_id: i64,
        task: NewDailyTask,
    ) -> Result<i64, RepoError>;

    async fn update_task(
        &self,
        entry_id: i64,
        task_id: i64,
        user_id: i64,
        patch: &TaskPatch,
    ) -> Result<(), RepoError>;

    /// Deletes the task and its sub-tasks.
    async fn delete_task(&self, entry_id: i64, task_id: i64, user_id: i64)
        -> Result<(), RepoError>;

    async fn update_sub_task(
        &self,
        entry_id: i64,
        task_id: i64,
        sub_task_id: i64,
        user_id: i64,
        patch: &SubTaskPatch,
    ) -> Result<(), RepoError>;
}

/// Inserts a task (incomplete) and its sub-tasks (incomplete) on an open
/// connection, usually inside a transaction.
pub(crate) async fn insert_task(
    conn: &mut PgConnection,
    entry_id: i64,
    task: &NewDailyTask,
) -> Result<i64, RepoError> {
    let task_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO daily_tasks (journal_entry_id, task, status) VALUES ($1, $2, FALSE) RETURNING id",
    )
    .bind(entry_id)
    .bind(&task.task)
    .fetch_one(&mut *conn)
    .await
    .map_err(RepoError::storage("failed to create daily task"))?;

    for sub_task in &task.sub_tasks {
        sqlx::query(
            "INSERT INTO daily_sub_tasks (daily_task_id, sub_task, status) VALUES ($1, $2, FALSE)",
        )
        .bind(task_id)
        .bind(sub_task)
        .execute(&mut *conn)
        .await
        .map_err(RepoError::storage("failed to create daily sub-task"))?;
    }

    Ok(task_id)
}

#[derive(Clone)]
pub struct PgDailyTaskRepository {
    pool: PgPool,
}

impl PgDailyTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DailyTaskRepository for PgDailyTaskRepository {
    async fn create_task(
        &self,
        entry_id: i64,
        user_id: i64,
        task: NewDailyTask,
    ) -> Result<i64, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepoError::storage("failed to begin transaction"))?;

        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM journal_entries WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepoError::storage("failed to lock journal entry"))?
        .ok_or(RepoError::NotFound)?;

        let task_id = insert_task(&mut *tx, entry_id, &task).await?;

        tx.commit()
            .await
            .map_err(RepoError::storage("failed to commit daily task"))?;

        Ok(task_id)
    }

    async fn update_task(
        &self,
        entry_id: i64,
        task_id: i64,
        user_id: i64,
        patch: &TaskPatch,
    ) -> Result<(), RepoError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE daily_tasks SET updated_at = now()");
        if let Some(task) = &patch.task {
            query.push(", task = ").push_bind(task.clone());
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status);
        }
        query
            .push(" WHERE id = ")
            .push_bind(task_id)
            .push(" AND journal_entry_id = ")
            .push_bind(entry_id)
            .push(" AND EXISTS (SELECT 1 FROM journal_entries j WHERE j.id = daily_tasks.journal_entry_id AND j.user_id = ")
            .push_bind(user_id)
            .push(")");

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(RepoError::storage("failed to update daily task"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_task(
        &self,
        entry_id: i64,
        task_id: i64,
        user_id: i64,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepoError::storage("failed to begin transaction"))?;

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT t.id
            FROM daily_tasks t
            INNER JOIN journal_entries j ON j.id = t.journal_entry_id
            WHERE t.id = $1 AND t.journal_entry_id = $2 AND j.user_id = $3
            FOR UPDATE OF t
            "#,
        )
        .bind(task_id)
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepoError::storage("failed to lock daily task"))?
        .ok_or(RepoError::NotFound)?;

        sqlx::query("DELETE FROM daily_sub_tasks WHERE daily_task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::storage("failed to delete daily sub-tasks"))?;

        sqlx::query("DELETE FROM daily_tasks WHERE id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::storage("failed to delete daily task"))?;

        tx.commit()
            .await
            .map_err(RepoError::storage("failed to commit daily task deletion"))?;

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
        let mut query =
            QueryBuilder::<Postgres>::new("UPDATE daily_sub_tasks SET updated_at = now()");
        if let Some(sub_task) = &patch.sub_task {
            query.push(", sub_task = ").push_bind(sub_task.clone());
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status);
        }
        query
            .push(" WHERE id = ")
            .push_bind(sub_task_id)
            .push(" AND daily_task_id = ")
            .push_bind(task_id)
            .push(
                " AND EXISTS (SELECT 1 FROM daily_tasks t \
                 INNER JOIN journal_entries j ON j.id = t.journal_entry_id \
                 WHERE t.id = daily_sub_tasks.daily_task_id AND t.journal_entry_id = ",
            )
            .push_bind(entry_id)
            .push(" AND j.user_id = ")
            .push_bind(user_id)
            .push(")");

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(RepoError::storage("failed to update daily sub-task"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
