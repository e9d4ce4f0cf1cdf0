use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    auth::extractor::AuthenticatedUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    journal::{
        dates::parse_entry_date,
        models::{
            CreateDailyTaskRequest, CreateJournalRequest, DailyTaskIdResponse, JournalEntry,
            JournalIdResponse, JournalQuery, NewJournalEntry, UpdateDailyTaskRequest,
            UpdateJournalRequest, UpdateSubTaskRequest,
        },
    },
    response::ApiResponse,
    AppState,
};

fn invalid_date(raw: &str) -> AppError {
    AppError::Validation(format!(
        "invalid date {raw:?}: expected YYYY-MM-DD or an RFC 3339 timestamp"
    ))
}

pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreateJournalRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<JournalIdResponse>>)> {
    let date = parse_entry_date(&payload.date).ok_or_else(|| invalid_date(&payload.date))?;

    let journal_id = state
        .journals
        .create_entry(NewJournalEntry {
            user_id: user.user_id,
            date,
            mood: payload.mood,
            this_day_description: payload.this_day_description,
            daily_reflection: payload.daily_reflection,
            daily_tasks: payload.daily_tasks.into_iter().map(Into::into).collect(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(JournalIdResponse { journal_id })),
    ))
}

pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<JournalEntry>>> {
    let entry = state.journals.get_entry(id, user.user_id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// `GET /journals` lists every entry; `GET /journals?date=YYYY-MM-DD` narrows
/// to one day.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(query): AppQuery<JournalQuery>,
) -> AppResult<Json<ApiResponse<Vec<JournalEntry>>>> {
    let entries = match query.date.as_deref() {
        Some(raw) => {
            let date = parse_entry_date(raw).ok_or_else(|| invalid_date(raw))?;
            state
                .journals
                .get_entries_by_date(user.user_id, date)
                .await?
        }
        None => state.journals.get_all_entries(user.user_id).await?,
    };

    Ok(Json(ApiResponse::ok(entries)))
}

pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateJournalRequest>,
) -> AppResult<Json<ApiResponse<JournalIdResponse>>> {
    state
        .journals
        .update_entry(id, user.user_id, payload.into())
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        "Journal entry updated successfully",
        JournalIdResponse { journal_id: id },
    )))
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<JournalIdResponse>>> {
    state.journals.delete_entry(id, user.user_id).await?;

    Ok(Json(ApiResponse::ok_with_message(
        "Journal entry deleted successfully",
        JournalIdResponse { journal_id: id },
    )))
}

pub async fn add_task(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(entry_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateDailyTaskRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DailyTaskIdResponse>>)> {
    let daily_task_id = state
        .tasks
        .add_task(entry_id, user.user_id, payload.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DailyTaskIdResponse { daily_task_id })),
    ))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath((entry_id, task_id)): AppPath<(i64, i64)>,
    AppJson(payload): AppJson<UpdateDailyTaskRequest>,
) -> AppResult<Json<ApiResponse<DailyTaskIdResponse>>> {
    state
        .tasks
        .update_task(entry_id, task_id, user.user_id, payload.into())
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        "Daily task updated successfully",
        DailyTaskIdResponse {
            daily_task_id: task_id,
        },
    )))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath((entry_id, task_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<ApiResponse<DailyTaskIdResponse>>> {
    state
        .tasks
        .delete_task(entry_id, task_id, user.user_id)
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        "Daily task deleted successfully",
        DailyTaskIdResponse {
            daily_task_id: task_id,
        },
    )))
}

pub async fn update_sub_task(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath((entry_id, task_id, sub_task_id)): AppPath<(i64, i64, i64)>,
    AppJson(payload): AppJson<UpdateSubTaskRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .tasks
        .update_sub_task(entry_id, task_id, sub_task_id, user.user_id, payload.into())
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        "Daily sub-task updated successfully",
        serde_json::json!({ "daily_sub_task_id": sub_task_id }),
    )))
}
