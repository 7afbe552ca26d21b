//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uacl_core::error::CoreError;
use uacl_core::identity::ShortenedUser;

use crate::error::AppError;
use crate::state::AppState;

/// Identity extracted from a valid token in the `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(username = %user.0.username, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub ShortenedUser);

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, CoreError> {
    let header =
        header.ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            )
        })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;

        let identity = state.sessions.authorize(token)?;
        Ok(AuthUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn extracts_token_after_bearer_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        assert_matches!(bearer_token(None), Err(CoreError::Unauthorized(_)));
        assert_matches!(bearer_token(Some("Basic dXNlcg==")), Err(CoreError::Unauthorized(_)));
        assert_matches!(bearer_token(Some("Bearer ")), Err(CoreError::Unauthorized(_)));
        assert_matches!(bearer_token(Some("abc.def.ghi")), Err(CoreError::Unauthorized(_)));
    }
}
