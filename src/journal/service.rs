use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use super::dates::truncate_to_midnight;
use super::models::{
    JournalEntry, JournalInsert, JournalPatch, JournalUpdate, NewDailyTask, NewJournalEntry,
};
use super::mood::Mood;
use super::repository::JournalRepository;
use crate::error::{AppError, AppResult, RepoError};

#[derive(Clone)]
pub struct JournalService {
    entries: Arc<dyn JournalRepository>,
}

impl JournalService {
    pub fn new(entries: Arc<dyn JournalRepository>) -> Self {
        Self { entries }
    }

    pub async fn create_entry(&self, entry: NewJournalEntry) -> AppResult<i64> {
        // Set the date to the beginning of the day
        let date = truncate_to_midnight(entry.date);

        require_text("this_day_description", &entry.this_day_description)?;
        require_mood(entry.mood)?;
        for task in &entry.daily_tasks {
            validate_new_task(task)?;
        }

        let user_id = entry.user_id;
        let id = self
            .entries
            .create(JournalInsert {
                user_id,
                date,
                mood: entry.mood,
                this_day_description: entry.this_day_description,
                daily_reflection: entry.daily_reflection,
                daily_tasks: entry.daily_tasks,
            })
            .await?;

        tracing::info!(user_id = %user_id, journal_id = %id, date = %date, "Journal entry created");

        Ok(id)
    }

    pub async fn get_entry(&self, id: i64, user_id: i64) -> AppResult<JournalEntry> {
        self.entries
            .find_by_id(id, user_id)
            .await
            .map_err(entry_not_found)
    }

    pub async fn get_all_entries(&self, user_id: i64) -> AppResult<Vec<JournalEntry>> {
        Ok(self.entries.find_all(user_id).await?)
    }

    /// Entries whose stored day equals the day of `date`.
    pub async fn get_entries_by_date(
        &self,
        user_id: i64,
        date: DateTime<FixedOffset>,
    ) -> AppResult<Vec<JournalEntry>> {
        Ok(self
            .entries
            .find_by_date(user_id, truncate_to_midnight(date))
            .await?)
    }

    /// Applies a partial update. The entry date never changes, whatever the
    /// update carries.
    pub async fn update_entry(&self, id: i64, user_id: i64, update: JournalUpdate) -> AppResult<()> {
        let existing = self
            .entries
            .find_by_id(id, user_id)
            .await
            .map_err(entry_not_found)?;

        if let Some(requested) = &update.date {
            tracing::debug!(
                journal_id = %id,
                stored     = %existing.date,
                requested  = %requested,
                "Ignoring date change on journal update"
            );
        }

        if let Some(mood) = update.mood {
            require_mood(mood)?;
        }
        if let Some(description) = &update.this_day_description {
            require_text("this_day_description", description)?;
        }

        let patch = JournalPatch {
            mood: update.mood,
            this_day_description: update.this_day_description,
            daily_reflection: update.daily_reflection,
        };

        // Not transactional with the lookup above: a delete in between shows up here as not-found.
        self.entries
            .update(existing.id, user_id, &patch)
            .await
            .map_err(entry_not_found)?;

        tracing::info!(user_id = %user_id, journal_id = %id, "Journal entry updated");

        Ok(())
    }

    pub async fn delete_entry(&self, id: i64, user_id: i64) -> AppResult<()> {
        self.entries
            .find_by_id(id, user_id)
            .await
            .map_err(entry_not_found)?;

        self.entries
            .delete(id, user_id)
            .await
            .map_err(entry_not_found)?;

        tracing::info!(user_id = %user_id, journal_id = %id, "Journal entry deleted");

        Ok(())
    }
}

fn entry_not_found(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound => AppError::NotFound("Journal entry not found".into()),
        other => other.into(),
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_mood(mood: Mood) -> AppResult<()> {
    if !mood.is_known() {
        return Err(AppError::Validation(format!(
            "mood must be one of Happy, Sad, Energized, Calm, Anxious (got {mood})"
        )));
    }
    Ok(())
}

pub(crate) fn validate_new_task(task: &NewDailyTask) -> AppResult<()> {
    require_text("task", &task.task)?;
    for sub_task in &task.sub_tasks {
        require_text("sub_task", sub_task)?;
    }
    Ok(())
}
