use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{node, paddock, user};

/// Seeds the inventory gauges from the store. Handlers keep them current afterwards.
pub async fn init_metrics(db: &DatabaseConnection) {
    let user_count = user::Entity::find().count(db).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to count users for metrics");
        0
    });
    metrics::gauge!("netlink_users_total").set(user_count as f64);

    let paddock_count = paddock::Entity::find().count(db).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to count paddocks for metrics");
        0
    });
    metrics::gauge!("netlink_paddocks_total").set(paddock_count as f64);

    let claimed_count = node::Entity::find()
        .filter(node::Column::UserId.is_not_null())
        .count(db)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to count claimed devices for metrics");
            0
        });
    metrics::gauge!("netlink_devices_claimed_total").set(claimed_count as f64);

    tracing::info!(
        "Initialized metrics: Users={}, Paddocks={}, ClaimedDevices={}",
        user_count,
        paddock_count,
        claimed_count
    );
}

pub fn record_registration() {
    metrics::counter!("netlink_users_registered_total").increment(1);
    metrics::gauge!("netlink_users_total").increment(1.0);
}

pub fn record_login(outcome: &'static str) {
    metrics::counter!("netlink_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_paddock_created() {
    metrics::counter!("netlink_paddocks_created_total").increment(1);
    metrics::gauge!("netlink_paddocks_total").increment(1.0);
}

/// A deleted paddock releases every device it held.
pub fn record_paddock_deleted(devices_unlinked: u64) {
    metrics::counter!("netlink_paddocks_deleted_total").increment(1);
    metrics::gauge!("netlink_paddocks_total").decrement(1.0);
    metrics::gauge!("netlink_devices_claimed_total").decrement(devices_unlinked as f64);
}

pub fn record_device_claimed() {
    metrics::counter!("netlink_device_claims_total").increment(1);
    metrics::gauge!("netlink_devices_claimed_total").increment(1.0);
}

pub fn record_device_unlinked() {
    metrics::counter!("netlink_device_unlinks_total").increment(1);
    metrics::gauge!("netlink_devices_claimed_total").decrement(1.0);
}

pub fn record_aggregation(nodes_with_readings: usize) {
    metrics::counter!("netlink_aggregations_total").increment(1);
    metrics::histogram!("netlink_aggregation_reporting_nodes").record(nodes_with_readings as f64);
}
