use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::api::extract::{ApiJson, ApiPath};
use crate::aggregation;
use crate::auth::CurrentUser;
use crate::entities::paddock;
use crate::error::Result;
use crate::registry::paddocks::{self, NewPaddock, PaddockChanges};

#[derive(serde::Deserialize)]
pub struct PaddockCreate {
    paddock_name: Option<String>,
    crop_type: Option<String>,
    area: Option<f64>,
    plant_date: Option<NaiveDate>,
}

#[derive(serde::Deserialize)]
pub struct PaddockUpdate {
    paddock_name: String,
    crop_type: Option<String>,
    area: Option<f64>,
}

fn paddock_json(p: &paddock::Model) -> serde_json::Value {
    json!({
        "paddock_id": p.id,
        "paddock_name": p.name,
        "crop_type": p.crop_type,
        "area": p.area,
        "plant_date": p.plant_date,
    })
}

fn record(action: &'static str, paddock_id: i32) {
    tracing::Span::current()
        .record("table", "paddocks")
        .record("action", action)
        .record("paddock_id", paddock_id);
}

pub async fn create_paddock(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<PaddockCreate>,
) -> Result<Response> {
    let new = NewPaddock {
        name: payload.paddock_name,
        crop_type: payload.crop_type,
        area: payload.area,
        plant_date: payload.plant_date,
    };
    let paddock = paddocks::create(&db, &user.id, new).await?;

    record("create_paddock", paddock.id);
    tracing::Span::current().record("business_event", "Paddock created");
    crate::metrics::record_paddock_created();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Paddock created successfully",
            "paddock": paddock_json(&paddock),
        })),
    )
        .into_response())
}

pub async fn list_paddocks(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response> {
    let paddocks = paddocks::list(&db, &user.id).await?;
    let items: Vec<_> = paddocks.iter().map(paddock_json).collect();

    tracing::Span::current()
        .record("table", "paddocks")
        .record("action", "list_paddocks");

    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "count": items.len(), "paddocks": items})),
    )
        .into_response())
}

pub async fn get_paddock(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(paddock_id): ApiPath<i32>,
) -> Result<Response> {
    record("get_paddock", paddock_id);
    let paddock = paddocks::get(&db, &user.id, paddock_id).await?;

    let mut body = paddock_json(&paddock);
    body["user_id"] = json!(paddock.user_id);
    body["created_at"] = json!(paddock.created_at);

    Ok((StatusCode::OK, Json(json!({"success": true, "paddock": body}))).into_response())
}

pub async fn list_paddock_devices(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(paddock_id): ApiPath<i32>,
) -> Result<Response> {
    record("list_paddock_devices", paddock_id);
    let devices = paddocks::list_devices(&db, &user.id, paddock_id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "count": devices.len(), "devices": devices})),
    )
        .into_response())
}

pub async fn sensor_averages(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(paddock_id): ApiPath<i32>,
) -> Result<Response> {
    record("sensor_averages", paddock_id);
    let result = aggregation::aggregate(&db, &user.id, paddock_id).await?;
    crate::metrics::record_aggregation(result.nodes_with_readings);

    let mut body = serde_json::to_value(&result).map_err(|e| crate::error::Error::Internal {
        operation: format!("serialize sensor averages: {e}"),
    })?;
    body["success"] = json!(true);
    if result.nodes_count == 0 {
        body["message"] = json!("No nodes found in this paddock");
    } else if result.nodes_with_readings == 0 {
        body["message"] = json!("No sensor readings found for nodes in this paddock");
    }

    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn update_paddock(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(paddock_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PaddockUpdate>,
) -> Result<Response> {
    record("update_paddock", paddock_id);
    let changes = PaddockChanges {
        name: payload.paddock_name,
        crop_type: payload.crop_type,
        area: payload.area,
    };
    let paddock = paddocks::rename(&db, &user.id, paddock_id, changes).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Paddock updated successfully",
            "paddock": paddock_json(&paddock),
        })),
    )
        .into_response())
}

pub async fn delete_paddock(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(paddock_id): ApiPath<i32>,
) -> Result<Response> {
    record("delete_paddock", paddock_id);
    let unlinked = paddocks::delete(&db, &user.id, paddock_id).await?;

    tracing::Span::current().record("business_event", "Paddock deleted and devices unlinked");
    crate::metrics::record_paddock_deleted(unlinked);

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Paddock deleted successfully and all devices unlinked",
            "devices_unlinked": unlinked,
        })),
    )
        .into_response())
}
