use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::models::{NewUser, User};
use crate::error::RepoError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user and returns its id. A taken email yields
    /// [`RepoError::Duplicate`].
    async fn create(&self, user: NewUser) -> Result<i64, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, full_name, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepoError::Duplicate("email")
            }
            other => RepoError::storage("failed to create user")(other),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::storage("failed to look up user by email"))
    }
}
