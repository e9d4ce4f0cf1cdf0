pub mod extractor;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod security;
pub mod service;
