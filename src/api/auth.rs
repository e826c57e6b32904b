use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::json;

use crate::api::extract::{ApiForm, ApiJson};
use crate::auth::{password, session};
use crate::config::SessionConfig;
use crate::entities::user;
use crate::error::{Error, Result};

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(serde::Deserialize)]
pub struct RegisterRequest {
    user_id: String,
    first_name: String,
    last_name: String,
    password: String,
}

/// Username/password form, as sent by OAuth2 password-grant clients.
#[derive(serde::Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

/// Accepts `local@domain.tld` with no whitespace and exactly one `@`.
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Response> {
    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(Error::InvalidArgument("First and last name are required.".to_string()));
    }
    let email = payload.user_id.trim();
    if !is_valid_email(email) {
        return Err(Error::InvalidArgument("A valid e-mail address is required.".to_string()));
    }

    if user::Entity::find_by_id(email).one(&db).await?.is_some() {
        return Err(Error::Conflict("Email already registered.".to_string()));
    }

    let password_hash = password::hash_blocking(payload.password).await?;

    let new_user = user::ActiveModel {
        id: Set(email.to_string()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        password_hash: Set(password_hash),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };
    let user = new_user
        .insert(&db)
        .await
        .map_err(|e| Error::conflict_on_unique(e, "Email already registered."))?;

    tracing::Span::current()
        .record("table", "users")
        .record("action", "register_user")
        .record("user_id", user.id.as_str())
        .record("business_event", "User registered successfully");
    crate::metrics::record_registration();

    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "User successfully created"})),
    )
        .into_response())
}

/// Checks the form's credentials and issues a session token for the user.
async fn authenticate(db: &DatabaseConnection, session_config: &SessionConfig, form: LoginForm) -> Result<String> {
    let Some(user) = user::Entity::find_by_id(form.username.as_str()).one(db).await? else {
        tracing::Span::current()
            .record("action", "login_user_failed")
            .record("error", "unknown_user");
        crate::metrics::record_login("rejected");
        return Err(Error::Unauthenticated(BAD_CREDENTIALS.to_string()));
    };

    if !password::verify_blocking(form.password, user.password_hash).await? {
        tracing::Span::current()
            .record("action", "login_user_failed")
            .record("error", "invalid_credentials");
        crate::metrics::record_login("rejected");
        return Err(Error::Unauthenticated(BAD_CREDENTIALS.to_string()));
    }

    let token = session::issue(&user.id, session_config)?;

    tracing::Span::current()
        .record("table", "users")
        .record("action", "login_user")
        .record("user_id", user.id.as_str())
        .record("business_event", "User logged in successfully");
    crate::metrics::record_login("success");

    Ok(token)
}

pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session_config): Extension<Arc<SessionConfig>>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Response> {
    let access_token = authenticate(&db, &session_config, form).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "user logged in successfully",
            "data": {"access_token": access_token},
        })),
    )
        .into_response())
}

/// OAuth2 token endpoint shape for password-grant clients.
pub async fn token(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session_config): Extension<Arc<SessionConfig>>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Response> {
    let access_token = authenticate(&db, &session_config, form).await?;

    Ok((
        StatusCode::OK,
        Json(json!({"access_token": access_token, "token_type": "bearer"})),
    )
        .into_response())
}
