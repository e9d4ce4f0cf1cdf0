use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use crate::auth::models::{AuthUser, Claims};
use crate::error::AppError;
use crate::AppState;

// bcrypt is deliberately slow, so both operations run on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password hashing error: {e}")))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password verification error: {e}")))
}

/// Issues an HS256 token for the user. An expiry that overflows the clock is
/// an internal error rather than a panic.
pub fn create_jwt(
    user_id: i64,
    email: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, AppError> {
    let expiration = chrono::TimeDelta::try_hours(expiry_hours)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::Internal(format!("Token expiry of {expiry_hours} hours is out of range"))
        })?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiration,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation error: {e}")))
}

/// Decodes and verifies a token. Only HS256 is accepted; tokens signed with
/// any other algorithm are rejected even when the secret matches.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

/// Resolves the bearer token into an [`AuthUser`].
pub fn authenticate(auth_header: Option<&str>, secret: &str) -> Result<AuthUser, AppError> {
    let auth_header = auth_header
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let claims = decode_jwt(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    let user_id = claims
        .sub
        .parse::<u64>()
        .ok()
        .and_then(|id| i64::try_from(id).ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid token subject".into()))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
    })
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?,
        ),
        None => None,
    };

    let user = authenticate(auth_header, &state.config.jwt_secret)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
