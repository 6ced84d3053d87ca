//! Request extractors.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use yatube_db::entities::user;

use crate::response::ApiResponse;

/// Route of the login page.
pub const LOGIN_URL: &str = "/auth/login/";

/// Login URL that brings the user back to `next` afterwards.
#[must_use]
pub fn login_redirect_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", urlencoding::encode(next))
}

/// Authenticated user extractor.
///
/// Anonymous requests are redirected to the login page with the original
/// path and query in `next`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<user::Model>() {
            return Ok(Self(user.clone()));
        }

        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        Err(Redirect::to(&login_redirect_url(&next)))
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Staff user extractor for the admin API.
#[derive(Debug, Clone)]
pub struct StaffUser(pub user::Model);

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<user::Model>() {
            Some(user) if user.is_staff => Ok(Self(user.clone())),
            Some(_) => Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::<()>::err("FORBIDDEN", "Staff access required")),
            )
                .into_response()),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::err("UNAUTHORIZED", "Authentication required")),
            )
                .into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_url_encodes_next() {
        assert_eq!(
            login_redirect_url("/posts/1/edit/"),
            "/auth/login/?next=%2Fposts%2F1%2Fedit%2F"
        );
        assert_eq!(
            login_redirect_url("/follow/?page=2"),
            "/auth/login/?next=%2Ffollow%2F%3Fpage%3D2"
        );
    }
}
