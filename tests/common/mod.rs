//! Shared fixtures for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use satoyama_db::drafts::{NewNode, NewSensor, NewSensorType};
use satoyama_db::entity::{nodes, sensor_types, sensors};
use satoyama_db::services::{Gateway, TimestampResolver};

/// Fresh migrated in-memory SQLite database.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}

pub async fn gateway() -> Gateway {
    Gateway::new(database().await, TimestampResolver::default())
}

pub async fn seed_node(gateway: &Gateway, alias: &str) -> nodes::Model {
    gateway
        .create_node(NewNode::new().with_alias(alias))
        .await
        .expect("create node")
}

pub async fn seed_sensor_type(gateway: &Gateway) -> sensor_types::Model {
    gateway
        .create_sensor_type(NewSensorType::new("temperature", "C"))
        .await
        .expect("create sensor type")
}

pub async fn seed_sensor(
    gateway: &Gateway,
    sensor_type: &sensor_types::Model,
    node: &nodes::Model,
) -> sensors::Model {
    gateway
        .create_sensor(NewSensor::new(sensor_type.clone(), node.clone()))
        .await
        .expect("create sensor")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .expect("valid date")
}
