use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::auth::{session, AuthError, CurrentUser};
use crate::config::SessionConfig;
use crate::entities::user;
use crate::error::Error;

/// Resolves `Authorization: Bearer <token>` to a [`CurrentUser`] or rejects with 401.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session_config): Extension<Arc<SessionConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = bearer_token(request.headers()).ok_or(AuthError::InvalidToken)?;
    let user_id = session::validate(token, &session_config)?;

    let user = user::Entity::find_by_id(user_id.as_str())
        .one(&db)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    tracing::Span::current().record("user_id", user.id.as_str());
    request.extensions_mut().insert(CurrentUser { id: user.id });
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
