use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

use super::models::{DailySubTask, DailyTask, JournalEntry, JournalInsert, JournalPatch};
use super::task_repository::insert_task;
use crate::error::RepoError;

/// Persistence for journal entries. Every operation is scoped to the owning
/// user; an entry owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Inserts the entry with its nested tasks and sub-tasks atomically.
    async fn create(&self, entry: JournalInsert) -> Result<i64, RepoError>;

    async fn find_by_id(&self, id: i64, user_id: i64) -> Result<JournalEntry, RepoError>;

    async fn find_all(&self, user_id: i64) -> Result<Vec<JournalEntry>, RepoError>;

    async fn find_by_date(
        &self,
        user_id: i64,
        date: NaiveDateTime,
    ) -> Result<Vec<JournalEntry>, RepoError>;

    /// Applies the fields present in `patch`. [`RepoError::NotFound`] when no
    /// owned row matched.
    async fn update(&self, id: i64, user_id: i64, patch: &JournalPatch) -> Result<(), RepoError>;

    /// Deletes the entry together with its tasks and their sub-tasks.
    async fn delete(&self, id: i64, user_id: i64) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct PgJournalRepository {
    pool: PgPool,
}

impl PgJournalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Loads tasks and sub-tasks for a batch of entries with two queries.
    async fn attach_tasks(
        &self,
        mut entries: Vec<JournalEntry>,
    ) -> Result<Vec<JournalEntry>, RepoError> {
        if entries.is_empty() {
            return Ok(entries);
        }

        let entry_ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        let tasks = sqlx::query_as::<_, DailyTask>(
            "SELECT * FROM daily_tasks WHERE journal_entry_id = ANY($1) ORDER BY id",
        )
        .bind(&entry_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::storage("failed to load daily tasks"))?;

        let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let sub_tasks = if task_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, DailySubTask>(
                "SELECT * FROM daily_sub_tasks WHERE daily_task_id = ANY($1) ORDER BY id",
            )
            .bind(&task_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::storage("failed to load daily sub-tasks"))?
        };

        let mut subs_by_task: HashMap<i64, Vec<DailySubTask>> = HashMap::new();
        for sub in sub_tasks {
            subs_by_task.entry(sub.daily_task_id).or_default().push(sub);
        }

        let mut tasks_by_entry: HashMap<i64, Vec<DailyTask>> = HashMap::new();
        for mut task in tasks {
            task.sub_tasks = subs_by_task.remove(&task.id).unwrap_or_default();
            tasks_by_entry
                .entry(task.journal_entry_id)
                .or_default()
                .push(task);
        }

        for entry in &mut entries {
            entry.daily_tasks = tasks_by_entry.remove(&entry.id).unwrap_or_default();
        }

        Ok(entries)
    }
}

#[async_trait]
impl JournalRepository for PgJournalRepository {
    async fn create(&self, entry: JournalInsert) -> Result<i64, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepoError::storage("failed to begin transaction"))?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO journal_entries (user_id, entry_date, mood, this_day_description, daily_reflection)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.date)
        .bind(entry.mood)
        .bind(&entry.this_day_description)
        .bind(&entry.daily_reflection)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepoError::storage("failed to create journal entry"))?;

        for task in &entry.daily_tasks {
            insert_task(&mut *tx, id, task).await?;
        }

        tx.commit()
            .await
            .map_err(RepoError::storage("failed to commit journal entry"))?;

        Ok(id)
    }

    async fn find_by_id(&self, id: i64, user_id: i64) -> Result<JournalEntry, RepoError> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::storage("failed to load journal entry"))?
        .ok_or(RepoError::NotFound)?;

        self.attach_tasks(vec![entry])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)
    }

    async fn find_all(&self, user_id: i64) -> Result<Vec<JournalEntry>, RepoError> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journal_entries WHERE user_id = $1 ORDER BY entry_date DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::storage("failed to list journal entries"))?;

        self.attach_tasks(entries).await
    }

    async fn find_by_date(
        &self,
        user_id: i64,
        date: NaiveDateTime,
    ) -> Result<Vec<JournalEntry>, RepoError> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journal_entries WHERE user_id = $1 AND entry_date = $2 ORDER BY id",
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::storage("failed to list journal entries by date"))?;

        self.attach_tasks(entries).await
    }

    async fn update(&self, id: i64, user_id: i64, patch: &JournalPatch) -> Result<(), RepoError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE journal_entries SET updated_at = now()");
        if let Some(mood) = patch.mood {
            query.push(", mood = ").push_bind(mood);
        }
        if let Some(description) = &patch.this_day_description {
            query
                .push(", this_day_description = ")
                .push_bind(description.clone());
        }
        if let Some(reflection) = &patch.daily_reflection {
            query
                .push(", daily_reflection = ")
                .push_bind(reflection.clone());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(RepoError::storage("failed to update journal entry"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepoError::storage("failed to begin transaction"))?;

        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM journal_entries WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepoError::storage("failed to lock journal entry"))?
        .ok_or(RepoError::NotFound)?;

        sqlx::query(
            r#"
            DELETE FROM daily_sub_tasks
            WHERE daily_task_id IN (SELECT id FROM daily_tasks WHERE journal_entry_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(RepoError::storage("failed to delete daily sub-tasks"))?;

        sqlx::query("DELETE FROM daily_tasks WHERE journal_entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::storage("failed to delete daily tasks"))?;

        sqlx::query("DELETE FROM journal_entries WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::storage("failed to delete journal entry"))?;

        tx.commit()
            .await
            .map_err(RepoError::storage("failed to commit journal deletion"))?;

        Ok(())
    }
}
