pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod journal;
pub mod logging;
pub mod middleware;
pub mod response;

pub use config::Config;
pub use database::{create_pool, run_migrations};

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::auth::{
    repository::{PgUserRepository, UserRepository},
    security::auth_middleware,
    service::AuthService,
};
use crate::error::AppError;
use crate::journal::{
    repository::{JournalRepository, PgJournalRepository},
    service::JournalService,
    task_repository::{DailyTaskRepository, PgDailyTaskRepository},
    task_service::DailyTaskService,
};
use crate::middleware::{
    envelope::render_error_envelope, recovery::panic_response, request_id::MakeRequestUuid,
    request_log::log_requests,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub journals: JournalService,
    pub tasks: DailyTaskService,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        entries: Arc<dyn JournalRepository>,
        tasks: Arc<dyn DailyTaskRepository>,
    ) -> Self {
        Self {
            auth: AuthService::new(users, &config),
            journals: JournalService::new(entries),
            tasks: DailyTaskService::new(tasks),
            config,
        }
    }

    /// Wires every service to its Postgres repository.
    pub fn with_pool(config: Config, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgJournalRepository::new(pool.clone())),
            Arc::new(PgDailyTaskRepository::new(pool)),
        )
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/login", post(auth::handlers::login));

    // protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/journals",
            post(journal::handlers::create_entry).get(journal::handlers::list_entries),
        )
        .route(
            "/journals/{id}",
            get(journal::handlers::get_entry)
                .patch(journal::handlers::update_entry)
                .put(journal::handlers::update_entry)
                .delete(journal::handlers::delete_entry),
        )
        .route("/journals/{id}/tasks", post(journal::handlers::add_task))
        .route(
            "/journals/{id}/tasks/{task_id}",
            patch(journal::handlers::update_task).delete(journal::handlers::delete_task),
        )
        .route(
            "/journals/{id}/tasks/{task_id}/sub-tasks/{sub_task_id}",
            patch(journal::handlers::update_sub_task),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .method_not_allowed_fallback(method_not_allowed);

    let routes = Router::new()
        .route("/", get(root))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed);

    with_middleware(routes, state)
}

/// Applies the shared middleware stack. Layers run outermost first: CORS,
/// request id assignment, request logging, error envelope, panic recovery.
pub fn with_middleware(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.clone(), render_error_envelope))
        .layer(from_fn(log_requests))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Journal Backend API - v0.1.0"
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
