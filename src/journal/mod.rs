pub mod dates;
pub mod handlers;
pub mod models;
pub mod mood;
pub mod repository;
pub mod service;
pub mod task_repository;
pub mod task_service;

pub use mood::Mood;
