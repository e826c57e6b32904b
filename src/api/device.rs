use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::api::extract::{ApiJson, ApiPath};
use crate::auth::CurrentUser;
use crate::entities::node;
use crate::error::Result;
use crate::registry::devices;

#[derive(serde::Deserialize)]
pub struct DeviceRegister {
    node_id: String,
    node_name: Option<String>,
    paddock_id: i32,
}

#[derive(serde::Deserialize)]
pub struct DeviceRename {
    node_name: String,
}

fn node_json(node: &node::Model) -> serde_json::Value {
    json!({
        "node_id": node.id,
        "node_name": node.name,
        "paddock_id": node.paddock_id,
    })
}

pub async fn view_readings(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((node_id, data_type)): ApiPath<(String, String)>,
) -> Result<Response> {
    tracing::Span::current()
        .record("table", "readings")
        .record("action", "view_readings")
        .record("node_id", node_id.as_str());

    let result = devices::get_readings(&db, &node_id, &data_type, &user.id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "node_id": result.node_id,
            "node_name": result.node_name,
            "paddock_id": result.paddock_id,
            "readings": result.readings,
        })),
    )
        .into_response())
}

pub async fn register_device(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<DeviceRegister>,
) -> Result<Response> {
    let node = devices::claim(&db, &payload.node_id, &user.id, payload.paddock_id, payload.node_name).await?;

    tracing::Span::current()
        .record("table", "nodes")
        .record("action", "claim_device")
        .record("node_id", node.id.as_str())
        .record("paddock_id", payload.paddock_id)
        .record("business_event", "Device linked to paddock");
    crate::metrics::record_device_claimed();

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Device linked successfully",
            "node": node_json(&node),
        })),
    )
        .into_response())
}

pub async fn unlink_device(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(node_id): ApiPath<String>,
) -> Result<Response> {
    let node = devices::unlink(&db, &node_id, &user.id).await?;

    tracing::Span::current()
        .record("table", "nodes")
        .record("action", "unlink_device")
        .record("node_id", node.id.as_str())
        .record("business_event", "Device unlinked");
    crate::metrics::record_device_unlinked();

    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "message": "Device unlinked successfully"})),
    )
        .into_response())
}

pub async fn rename_device(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(node_id): ApiPath<String>,
    ApiJson(payload): ApiJson<DeviceRename>,
) -> Result<Response> {
    let node = devices::rename(&db, &node_id, &user.id, payload.node_name).await?;

    tracing::Span::current()
        .record("table", "nodes")
        .record("action", "rename_device")
        .record("node_id", node.id.as_str());

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Device updated successfully",
            "node": node_json(&node),
        })),
    )
        .into_response())
}
