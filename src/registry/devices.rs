use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use super::{normalize_name, paddocks, MAX_NAME_LEN};
use crate::entities::{node, reading};
use crate::error::{Error, Result};

/// Sensor types a device reading can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingType {
    Temperature,
    Ph,
}

impl ReadingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingType::Temperature => "temperature",
            ReadingType::Ph => "ph",
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "temperature" => Ok(ReadingType::Temperature),
            "ph" => Ok(ReadingType::Ph),
            other => Err(Error::InvalidArgument(format!("Data type '{other}' is invalid."))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingView {
    pub reading_type: String,
    pub reading_val: f64,
    /// RFC 3339 in the server's local zone.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReadings {
    pub node_id: String,
    pub node_name: String,
    pub paddock_id: Option<i32>,
    pub readings: Vec<ReadingView>,
}

pub fn generate_node_name(owned: u64) -> String {
    format!("Device-{}", owned + 1)
}

/// Stored timestamps carry no zone and are UTC; this renders one for display.
pub fn render_local(timestamp: NaiveDateTime) -> String {
    Utc.from_utc_datetime(&timestamp)
        .with_timezone(&Local)
        .to_rfc3339()
}

fn not_found(node_id: &str) -> Error {
    Error::NotFound(format!("Device '{node_id}' not found."))
}

async fn find_node(db: &DatabaseConnection, node_id: &str) -> Result<node::Model> {
    node::Entity::find_by_id(node_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(node_id))
}

/// Devices are addressed by id, so unlike paddocks a non-owner is told the device exists.
async fn find_node_owned_by(db: &DatabaseConnection, node_id: &str, requester: &str) -> Result<node::Model> {
    let node = find_node(db, node_id).await?;
    if node.user_id.as_deref() != Some(requester) {
        return Err(Error::Forbidden("You do not have access to this device.".to_string()));
    }
    Ok(node)
}

/// All readings of one type for a device, oldest first.
///
/// Checks run in a fixed order: unknown device, then ownership, then the sensor type.
pub async fn get_readings(
    db: &DatabaseConnection,
    node_id: &str,
    reading_type: &str,
    requester: &str,
) -> Result<DeviceReadings> {
    let node = find_node_owned_by(db, node_id, requester).await?;
    let reading_type: ReadingType = reading_type.parse()?;

    let readings = reading::Entity::find()
        .filter(reading::Column::NodeId.eq(node.id.as_str()))
        .filter(reading::Column::ReadingType.eq(reading_type.as_str()))
        .order_by_asc(reading::Column::Timestamp)
        .order_by_asc(reading::Column::CaptureId)
        .all(db)
        .await?;

    Ok(DeviceReadings {
        node_id: node.id,
        node_name: node.name,
        paddock_id: node.paddock_id,
        readings: readings
            .into_iter()
            .map(|r| ReadingView {
                reading_type: r.reading_type,
                reading_val: r.reading_val,
                timestamp: render_local(r.timestamp),
            })
            .collect(),
    })
}

/// Claims an unowned device for `requester` and places it in one of their paddocks.
pub async fn claim(
    db: &DatabaseConnection,
    node_id: &str,
    requester: &str,
    paddock_id: i32,
    name: Option<String>,
) -> Result<node::Model> {
    let node = find_node(db, node_id).await?;
    if node.is_claimed() {
        return Err(Error::Conflict(format!("Device '{node_id}' already linked")));
    }

    let paddock = paddocks::find_owned(db, requester, paddock_id).await?;

    let name = match normalize_name(name) {
        Some(name) => name,
        None => {
            let owned = node::Entity::find()
                .filter(node::Column::UserId.eq(requester))
                .count(db)
                .await?;
            generate_node_name(owned)
        }
    };
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "Device name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    link_if_unowned(db, node_id, requester, paddock.id, name).await?;
    find_node(db, node_id).await
}

/// Owner, paddock and name go in one write, and only while the device is still unowned. A
/// device claimed since it was read is left alone and reported as a conflict.
pub(crate) async fn link_if_unowned(
    db: &DatabaseConnection,
    node_id: &str,
    owner: &str,
    paddock_id: i32,
    name: String,
) -> Result<()> {
    let claimed = node::Entity::update_many()
        .col_expr(node::Column::UserId, Expr::value(owner.to_string()))
        .col_expr(node::Column::PaddockId, Expr::value(paddock_id))
        .col_expr(node::Column::Name, Expr::value(name))
        .filter(node::Column::Id.eq(node_id))
        .filter(node::Column::UserId.is_null())
        .exec(db)
        .await?;

    if claimed.rows_affected == 0 {
        return Err(Error::Conflict(format!("Device '{node_id}' already linked")));
    }
    Ok(())
}

/// Releases a device from its owner and paddock.
pub async fn unlink(db: &DatabaseConnection, node_id: &str, requester: &str) -> Result<node::Model> {
    let node = find_node_owned_by(db, node_id, requester).await?;

    let mut active = node.into_active_model();
    active.user_id = Set(None);
    active.paddock_id = Set(None);
    Ok(active.update(db).await?)
}

pub async fn rename(
    db: &DatabaseConnection,
    node_id: &str,
    requester: &str,
    name: String,
) -> Result<node::Model> {
    let node = find_node_owned_by(db, node_id, requester).await?;

    let name = normalize_name(Some(name))
        .ok_or_else(|| Error::InvalidArgument("Device name is required".to_string()))?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "Device name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    let mut active = node.into_active_model();
    active.name = Set(name);
    Ok(active.update(db).await?)
}
