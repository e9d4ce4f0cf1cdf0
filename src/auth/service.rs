use std::sync::Arc;

use crate::auth::{
    models::NewUser,
    repository::UserRepository,
    security::{create_jwt, hash_password, verify_password},
};
use crate::config::Config;
use crate::error::{AppError, AppResult, RepoError};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    jwt_expiry_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &Config) -> Self {
        Self {
            users,
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiry_hours: config.jwt_expiry_hours,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Creates an account and returns the new user id.
    pub async fn register(&self, email: &str, full_name: &str, password: &str) -> AppResult<i64> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            tracing::warn!(email = %email, "Registration failed - email already exists");
            return Err(AppError::Conflict("User already exists".into()));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;

        let user_id = self
            .users
            .create(NewUser {
                email: email.clone(),
                full_name: full_name.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration for the same email.
                RepoError::Duplicate(_) => AppError::Conflict("User already exists".into()),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user_id, email = %email, "New user registered");

        Ok(user_id)
    }

    /// Verifies the credentials and issues a signed token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::warn!(email = %email, "Failed login attempt - user not found");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "Failed login attempt - wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = create_jwt(user.id, &user.email, &self.jwt_secret, self.jwt_expiry_hours)?;

        tracing::info!(user_id = %user.id, "Successful login");

        Ok(token)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
