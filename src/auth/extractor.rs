use axum::{extract::FromRequestParts, http::request::Parts};
use std::future::{ready, Future};

use crate::auth::models::AuthUser;
use crate::error::AppError;

// Wrapper type for the injected AuthUser that implements FromRequestParts
pub struct AuthenticatedUser(pub AuthUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Unauthorized("No authentication information".into()));
        ready(result)
    }
}
