//! Runs the HTTP flows against a real Postgres. Skipped when neither
//! `TEST_DATABASE_URL` nor `DATABASE_URL` is set.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

use common::{create_entry, sample_entry, send, setup_pg_app, token_for};

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4())
}

#[tokio::test]
async fn test_pg_entry_round_trip_and_cascade() {
    let app = match setup_pg_app().await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Skipping test_pg_entry_round_trip_and_cascade: {e}");
            return;
        }
    };

    let token = token_for(&app.router, &unique_email("pg-cascade")).await;
    let id = create_entry(&app.router, &token, sample_entry()).await;

    let response = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/journals/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["date"], "2024-03-05T00:00:00");
    assert_eq!(response.body["data"]["mood"], "Happy");
    assert_eq!(response.body["data"]["daily_tasks"].as_array().unwrap().len(), 2);

    let task_ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM daily_tasks WHERE journal_entry_id = $1")
            .bind(id)
            .fetch_all(&app.pool)
            .await
            .unwrap();
    assert_eq!(task_ids.len(), 2);

    let response = send(
        &app.router,
        Method::DELETE,
        &format!("/api/v1/journals/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let tasks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM daily_tasks WHERE journal_entry_id = $1")
            .bind(id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    let sub_tasks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM daily_sub_tasks WHERE daily_task_id = ANY($1)")
            .bind(&task_ids)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(tasks, 0);
    assert_eq!(sub_tasks, 0);
}

#[tokio::test]
async fn test_pg_update_keeps_date_and_scopes_owner() {
    let app = match setup_pg_app().await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Skipping test_pg_update_keeps_date_and_scopes_owner: {e}");
            return;
        }
    };

    let owner = token_for(&app.router, &unique_email("pg-owner")).await;
    let intruder = token_for(&app.router, &unique_email("pg-intruder")).await;
    let id = create_entry(&app.router, &owner, sample_entry()).await;
    let uri = format!("/api/v1/journals/{id}");

    let response = send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&owner),
        Some(json!({ "date": "2031-07-07", "mood": "anxious" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app.router, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(response.body["data"]["date"], "2024-03-05T00:00:00");
    assert_eq!(response.body["data"]["mood"], "Anxious");

    let response = send(&app.router, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&app.router, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_pg_duplicate_registration() {
    let app = match setup_pg_app().await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Skipping test_pg_duplicate_registration: {e}");
            return;
        }
    };

    let email = unique_email("pg-dup");
    let first = common::register(&app.router, &email).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = common::register(&app.router, &email.to_uppercase()).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.body["error"]["code"], "user_already_exist");
}
