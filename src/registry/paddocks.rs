use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    EntityTrait, FromQueryResult, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, Value,
};
use serde::Serialize;

use super::{normalize_name, MAX_NAME_LEN};
use crate::entities::{battery, node, paddock};
use crate::error::{Error, Result};

pub const CROP_TYPES: [&str; 8] = [
    "default",
    "Grains",
    "Legumes",
    "Fruit",
    "Oil Seeds",
    "Root Crops",
    "Tropical",
    "Other",
];

#[derive(Debug, Clone, Default)]
pub struct NewPaddock {
    pub name: Option<String>,
    pub crop_type: Option<String>,
    pub area: Option<f64>,
    pub plant_date: Option<NaiveDate>,
}

/// Fields a PATCH may change. The name is always given; the rest are left alone when `None`.
#[derive(Debug, Clone, Default)]
pub struct PaddockChanges {
    pub name: String,
    pub crop_type: Option<String>,
    pub area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub node_id: String,
    pub node_name: String,
    pub gps: Option<String>,
    /// Battery level from the node's most recent capture.
    pub battery: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct LatestBattery {
    node_id: String,
    capture_id: i32,
}

pub fn generate_paddock_name(existing: u64) -> String {
    format!("Paddock-{}", existing + 1)
}

fn conflict_message(name: &str) -> String {
    format!("A paddock named '{name}' already exists")
}

fn not_found() -> Error {
    Error::NotFound("Paddock not found".to_string())
}

fn check_name_len(name: &str) -> Result<()> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "Paddock name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn check_crop_type(crop_type: Option<String>) -> Result<Option<String>> {
    match crop_type {
        Some(c) if !CROP_TYPES.contains(&c.as_str()) => Err(Error::InvalidArgument(format!(
            "Crop type '{c}' is invalid."
        ))),
        other => Ok(other),
    }
}

fn check_area(area: Option<f64>) -> Result<Option<f64>> {
    match area {
        Some(a) if !a.is_finite() || a < 0.0 => Err(Error::InvalidArgument(
            "Area must be a non-negative number".to_string(),
        )),
        other => Ok(other),
    }
}

/// Looks a paddock up by id, visible only to its owner.
pub async fn find_owned<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    paddock_id: i32,
) -> Result<paddock::Model> {
    paddock::Entity::find_by_id(paddock_id)
        .filter(paddock::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(not_found)
}

async fn name_taken<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    name: &str,
    except: Option<i32>,
) -> Result<bool> {
    let mut query = paddock::Entity::find()
        .filter(paddock::Column::UserId.eq(user_id))
        .filter(paddock::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(paddock::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

pub async fn create(db: &DatabaseConnection, user_id: &str, new: NewPaddock) -> Result<paddock::Model> {
    let name = match normalize_name(new.name) {
        Some(name) => name,
        None => {
            let existing = paddock::Entity::find()
                .filter(paddock::Column::UserId.eq(user_id))
                .count(db)
                .await?;
            generate_paddock_name(existing)
        }
    };
    check_name_len(&name)?;
    let crop_type = check_crop_type(new.crop_type)?;
    let area = check_area(new.area)?;

    if name_taken(db, user_id, &name, None).await? {
        return Err(Error::Conflict(conflict_message(&name)));
    }

    insert(db, user_id, name, crop_type, area, new.plant_date).await
}

/// Writes the row. A concurrent create can pass the name check in [`create`], so the unique
/// `(user_id, name)` index has the final say.
pub(crate) async fn insert(
    db: &DatabaseConnection,
    user_id: &str,
    name: String,
    crop_type: Option<String>,
    area: Option<f64>,
    plant_date: Option<NaiveDate>,
) -> Result<paddock::Model> {
    let active = paddock::ActiveModel {
        user_id: Set(user_id.to_string()),
        name: Set(name.clone()),
        crop_type: Set(crop_type),
        area: Set(area),
        plant_date: Set(plant_date),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    active
        .insert(db)
        .await
        .map_err(|e| Error::conflict_on_unique(e, conflict_message(&name)))
}

pub async fn list(db: &DatabaseConnection, user_id: &str) -> Result<Vec<paddock::Model>> {
    Ok(paddock::Entity::find()
        .filter(paddock::Column::UserId.eq(user_id))
        .order_by_asc(paddock::Column::Id)
        .all(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, user_id: &str, paddock_id: i32) -> Result<paddock::Model> {
    find_owned(db, user_id, paddock_id).await
}

pub async fn rename(
    db: &DatabaseConnection,
    user_id: &str,
    paddock_id: i32,
    changes: PaddockChanges,
) -> Result<paddock::Model> {
    let existing = find_owned(db, user_id, paddock_id).await?;

    let name = normalize_name(Some(changes.name))
        .ok_or_else(|| Error::InvalidArgument("Paddock name is required".to_string()))?;
    check_name_len(&name)?;
    let crop_type = check_crop_type(changes.crop_type)?;
    let area = check_area(changes.area)?;

    if name_taken(db, user_id, &name, Some(paddock_id)).await? {
        return Err(Error::Conflict(conflict_message(&name)));
    }

    let mut active = existing.into_active_model();
    active.name = Set(name.clone());
    if let Some(crop_type) = crop_type {
        active.crop_type = Set(Some(crop_type));
    }
    if let Some(area) = area {
        active.area = Set(Some(area));
    }

    active
        .update(db)
        .await
        .map_err(|e| Error::conflict_on_unique(e, conflict_message(&name)))
}

/// Deletes a paddock after unlinking its devices, in one transaction. Returns the number of
/// devices that were unlinked.
pub async fn delete(db: &DatabaseConnection, user_id: &str, paddock_id: i32) -> Result<u64> {
    let txn = db.begin().await?;

    let paddock = find_owned(&txn, user_id, paddock_id).await?;

    let unlinked = unlink_members(&txn, paddock.id).await?;

    paddock.delete(&txn).await?;
    txn.commit().await?;

    Ok(unlinked)
}

/// Clears owner and paddock on every device in the paddock.
pub(crate) async fn unlink_members<C: ConnectionTrait>(db: &C, paddock_id: i32) -> Result<u64> {
    Ok(node::Entity::update_many()
        .col_expr(node::Column::PaddockId, Expr::value(Value::Int(None)))
        .col_expr(node::Column::UserId, Expr::value(Value::String(None)))
        .filter(node::Column::PaddockId.eq(paddock_id))
        .exec(db)
        .await?
        .rows_affected)
}

pub(crate) async fn member_nodes<C: ConnectionTrait>(db: &C, paddock_id: i32) -> Result<Vec<node::Model>> {
    Ok(node::Entity::find()
        .filter(node::Column::PaddockId.eq(paddock_id))
        .order_by_asc(node::Column::Id)
        .all(db)
        .await?)
}

pub async fn list_devices(
    db: &DatabaseConnection,
    user_id: &str,
    paddock_id: i32,
) -> Result<Vec<DeviceSummary>> {
    let paddock = find_owned(db, user_id, paddock_id).await?;
    let nodes = member_nodes(db, paddock.id).await?;
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    let node_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();

    // One row per device: the battery reading from its newest capture.
    let latest = battery::Entity::find()
        .select_only()
        .column(battery::Column::NodeId)
        .column_as(Expr::col(battery::Column::CaptureId).max(), "capture_id")
        .filter(battery::Column::NodeId.is_in(node_ids))
        .group_by(battery::Column::NodeId)
        .into_model::<LatestBattery>()
        .all(db)
        .await?;

    let mut latest_battery: HashMap<String, f64> = HashMap::new();
    if !latest.is_empty() {
        let matching = latest.iter().fold(Condition::any(), |cond, l| {
            cond.add(
                Condition::all()
                    .add(battery::Column::NodeId.eq(l.node_id.as_str()))
                    .add(battery::Column::CaptureId.eq(l.capture_id)),
            )
        });
        for b in battery::Entity::find().filter(matching).all(db).await? {
            latest_battery.insert(b.node_id, b.bat_lvl);
        }
    }

    Ok(nodes
        .into_iter()
        .map(|n| DeviceSummary {
            battery: latest_battery.get(&n.id).copied(),
            node_id: n.id,
            node_name: n.name,
            gps: n.gps,
        })
        .collect())
}
