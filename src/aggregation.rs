//! Paddock-level sensor summary: the latest reading of each sensor type on every device in a
//! paddock, folded into average/min/max per type.
//!
//! "Latest" is decided by capture id, never by the reading timestamp.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QuerySelect,
};
use serde::Serialize;

use crate::entities::reading;
use crate::error::Result;
use crate::registry::paddocks;

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
struct LatestCapture {
    node_id: String,
    reading_type: String,
    capture_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestReading {
    pub node_id: String,
    pub reading_type: String,
    pub reading_val: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Devices that contributed a value.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub paddock_id: i32,
    pub paddock_name: String,
    pub nodes_count: usize,
    pub nodes_with_readings: usize,
    pub sensor_averages: BTreeMap<String, f64>,
    pub sensor_details: BTreeMap<String, SensorStats>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Folds one reading per (device, type) into per-type statistics. Needs no store.
pub fn summarize(
    paddock_id: i32,
    paddock_name: String,
    nodes_count: usize,
    readings: &[LatestReading],
) -> AggregateResult {
    let mut by_type: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut reporting: BTreeSet<&str> = BTreeSet::new();

    for r in readings {
        by_type.entry(r.reading_type.as_str()).or_default().push(r.reading_val);
        reporting.insert(r.node_id.as_str());
    }

    let sensor_details: BTreeMap<String, SensorStats> = by_type
        .into_iter()
        .map(|(reading_type, values)| {
            let sum: f64 = values.iter().sum();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let stats = SensorStats {
                average: round2(sum / values.len() as f64),
                min: round2(min),
                max: round2(max),
                count: values.len(),
            };
            (reading_type.to_string(), stats)
        })
        .collect();

    let sensor_averages = sensor_details
        .iter()
        .map(|(reading_type, stats)| (reading_type.clone(), stats.average))
        .collect();

    AggregateResult {
        paddock_id,
        paddock_name,
        nodes_count,
        nodes_with_readings: reporting.len(),
        sensor_averages,
        sensor_details,
    }
}

pub async fn aggregate(db: &DatabaseConnection, requester: &str, paddock_id: i32) -> Result<AggregateResult> {
    let paddock = paddocks::find_owned(db, requester, paddock_id).await?;
    let nodes = paddocks::member_nodes(db, paddock.id).await?;
    if nodes.is_empty() {
        return Ok(summarize(paddock.id, paddock.name, 0, &[]));
    }

    let node_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();

    let latest = reading::Entity::find()
        .select_only()
        .column(reading::Column::NodeId)
        .column(reading::Column::ReadingType)
        .column_as(Expr::col(reading::Column::CaptureId).max(), "capture_id")
        .filter(reading::Column::NodeId.is_in(node_ids))
        .group_by(reading::Column::NodeId)
        .group_by(reading::Column::ReadingType)
        .into_model::<LatestCapture>()
        .all(db)
        .await?;

    tracing::debug!(paddock_id = paddock.id, series = latest.len(), "resolved latest captures");

    let readings = if latest.is_empty() {
        Vec::new()
    } else {
        let matching = latest.iter().fold(Condition::any(), |cond, l| {
            cond.add(
                Condition::all()
                    .add(reading::Column::NodeId.eq(l.node_id.as_str()))
                    .add(reading::Column::ReadingType.eq(l.reading_type.as_str()))
                    .add(reading::Column::CaptureId.eq(l.capture_id)),
            )
        });

        reading::Entity::find()
            .filter(matching)
            .all(db)
            .await?
            .into_iter()
            .map(|r| LatestReading {
                node_id: r.node_id,
                reading_type: r.reading_type,
                reading_val: r.reading_val,
            })
            .collect()
    };

    Ok(summarize(paddock.id, paddock.name, nodes.len(), &readings))
}
