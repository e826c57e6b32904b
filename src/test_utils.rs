//! Fixtures for unit and router tests. Every database is a fresh in-memory SQLite with the
//! full migration set applied.

use chrono::{NaiveDateTime, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::auth::password;
use crate::config::SessionConfig;
use crate::entities::{battery, capture, node, reading, user};
use crate::migrator::Migrator;

pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        secret_key: "test-secret-key-for-testing-only".to_string(),
        token_ttl: Duration::from_secs(60 * 60),
    }
}

/// Inserts a user whose stored hash matches nothing. Enough for registry tests.
pub async fn insert_user(db: &DatabaseConnection, id: &str) -> user::Model {
    insert_user_with_hash(db, id, "not-a-real-hash".to_string()).await
}

/// Inserts a user who can log in with [`TEST_PASSWORD`].
pub async fn insert_user_with_password(db: &DatabaseConnection, id: &str) -> user::Model {
    let hash = password::hash(TEST_PASSWORD).expect("Failed to hash test password");
    insert_user_with_hash(db, id, hash).await
}

async fn insert_user_with_hash(db: &DatabaseConnection, id: &str, password_hash: String) -> user::Model {
    user::ActiveModel {
        id: Set(id.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("Farmer".to_string()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

/// A provisioned device nobody has claimed.
pub async fn insert_node(db: &DatabaseConnection, id: &str) -> node::Model {
    node::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("Node-{id}")),
        capture_id: Set(None),
        gps: Set(None),
        paddock_id: Set(None),
        user_id: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to insert node")
}

pub async fn claimed_node(db: &DatabaseConnection, id: &str, user_id: &str, paddock_id: i32) -> node::Model {
    node::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("Node-{id}")),
        capture_id: Set(None),
        gps: Set(Some("-27.4698,153.0251".to_string())),
        paddock_id: Set(Some(paddock_id)),
        user_id: Set(Some(user_id.to_string())),
    }
    .insert(db)
    .await
    .expect("Failed to insert claimed node")
}

pub async fn insert_capture(db: &DatabaseConnection) -> i32 {
    capture::ActiveModel {
        timestamp: Set(Utc::now().naive_utc()),
        resp_time: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert capture")
    .id
}

pub async fn insert_battery(db: &DatabaseConnection, capture_id: i32, node_id: &str, level: f64) {
    battery::ActiveModel {
        capture_id: Set(capture_id),
        node_id: Set(node_id.to_string()),
        bat_lvl: Set(level),
        bat_hlth: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to insert battery");
}

pub async fn insert_reading(db: &DatabaseConnection, capture_id: i32, node_id: &str, reading_type: &str, value: f64) {
    insert_reading_at(db, capture_id, node_id, reading_type, value, Utc::now().naive_utc()).await
}

pub async fn insert_reading_at(
    db: &DatabaseConnection,
    capture_id: i32,
    node_id: &str,
    reading_type: &str,
    value: f64,
    timestamp: NaiveDateTime,
) {
    reading::ActiveModel {
        capture_id: Set(capture_id),
        node_id: Set(node_id.to_string()),
        reading_type: Set(reading_type.to_string()),
        reading_val: Set(value),
        timestamp: Set(timestamp),
    }
    .insert(db)
    .await
    .expect("Failed to insert reading");
}
