//! Gateway tests against a migrated in-memory SQLite database.
//!
//! Run with: cargo test --test gateway_test

mod common;

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, DatabaseBackend, DbErr, EntityTrait, MockDatabase, NotSet, PaginatorTrait,
    Set,
};

use satoyama_db::drafts::{NewNode, NewReading, NewSensor};
use satoyama_db::entity::{Record, nodes, readings, sensors};
use satoyama_db::error::AppError;
use satoyama_db::services::{Gateway, TimestampResolver};

use common::{at, gateway, seed_node, seed_sensor, seed_sensor_type};

#[tokio::test]
async fn created_sensor_keeps_its_parents_and_gets_a_unique_id() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let first_node = seed_node(&gateway, "first").await;
    let second_node = seed_node(&gateway, "second").await;

    let mut ids = HashSet::new();
    for node in [&first_node, &second_node, &first_node] {
        let created = seed_sensor(&gateway, &sensor_type, node).await;
        let found = gateway.find_sensor(created.id).await.unwrap().unwrap();

        assert_eq!(found, created);
        assert_eq!(found.node_id, node.id);
        assert_eq!(found.sensortype_id, sensor_type.id);
        assert!(ids.insert(found.id), "duplicate sensor id {}", found.id);
    }
}

#[tokio::test]
async fn node_reports_sensors_created_against_it() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = gateway
        .create_node(NewNode::new().with_sensors(Vec::<NewSensor>::new()))
        .await
        .unwrap();

    for _ in 0..3 {
        seed_sensor(&gateway, &sensor_type, &node).await;
    }

    let node = gateway.find_node(node.id).await.unwrap().unwrap();
    assert_eq!(gateway.sensor_count(node.id).await.unwrap(), 3);
}

#[tokio::test]
async fn non_numeric_value_persists_nothing() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = seed_node(&gateway, "field").await;
    let sensor = seed_sensor(&gateway, &sensor_type, &node).await;

    let err = gateway
        .create_reading(NewReading::new(sensor.clone(), "abc", "2023-05-01"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValueConversion { .. }), "{err:?}");
    assert_eq!(gateway.reading_count(sensor.id).await.unwrap(), 0);
}

#[tokio::test]
async fn unmatched_timestamp_persists_nothing() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = seed_node(&gateway, "field").await;
    let sensor = seed_sensor(&gateway, &sensor_type, &node).await;

    let err = gateway
        .create_reading(NewReading::new(sensor.clone(), 12.5, "01.05.2023 noon"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TimestampResolution { .. }), "{err:?}");
    assert_eq!(gateway.reading_count(sensor.id).await.unwrap(), 0);
}

#[tokio::test]
async fn reading_is_stored_with_resolved_timestamp() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = seed_node(&gateway, "field").await;
    let sensor = seed_sensor(&gateway, &sensor_type, &node).await;

    let created = gateway
        .create_reading(NewReading::new(sensor.clone(), "19.5", "2023-05-01T06:30:00"))
        .await
        .unwrap();

    let found = gateway.find_reading(created.id).await.unwrap().unwrap();
    assert_eq!(found.sensor_id, sensor.id);
    assert_eq!(found.timestamp, at(2023, 5, 1, 6, 30, 0));
    assert!((found.value - 19.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn latest_reading_cache_follows_newest_timestamp() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = seed_node(&gateway, "field").await;
    let sensor = seed_sensor(&gateway, &sensor_type, &node).await;
    assert!(sensor.latest_reading.is_none());

    let newest = gateway
        .create_reading(NewReading::new(sensor.clone(), 2.0, "2023-05-02"))
        .await
        .unwrap();
    // Backfilled reading must not displace the newer one
    gateway
        .create_reading(NewReading::new(sensor.clone(), 1.0, "2023-05-01"))
        .await
        .unwrap();

    let sensor = gateway.find_sensor(sensor.id).await.unwrap().unwrap();
    let cached: serde_json::Value =
        serde_json::from_str(sensor.latest_reading.as_deref().unwrap()).unwrap();
    assert_eq!(cached["type"], "Reading");
    assert_eq!(cached["id"], newest.id);
    assert_eq!(cached["value"], 2.0);
    assert_eq!(cached["timestamp"], "2023-05-02 00:00:00");
}

#[tokio::test]
async fn node_with_nested_sensors_and_readings_commits_together() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;

    let node = gateway
        .create_node(
            NewNode::new()
                .with_alias("greenhouse")
                .at(139.69, 35.68)
                .with_sensors([
                    NewSensor::nested(sensor_type.clone()).with_readings([
                        NewReading::nested(20.0, "2023-05-01 10:00:00"),
                        NewReading::nested(21.0, "2023-05-01 11:00:00"),
                    ]),
                    NewSensor::nested(sensor_type.clone()).with_alias("spare"),
                ]),
        )
        .await
        .unwrap();

    assert_eq!(node.alias.as_deref(), Some("greenhouse"));
    assert_eq!(gateway.sensor_count(node.id).await.unwrap(), 2);
    assert_eq!(readings::Entity::find().count(gateway.db()).await.unwrap(), 2);

    let with_readings = sensors::Entity::find()
        .all(gateway.db())
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.alias.is_none())
        .unwrap();
    assert!(
        with_readings
            .latest_reading
            .as_deref()
            .is_some_and(|cached| cached.contains("2023-05-01 11:00:00"))
    );
}

#[tokio::test]
async fn sensor_with_nested_readings_returns_cached_latest() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = seed_node(&gateway, "field").await;

    let sensor = gateway
        .create_sensor(
            NewSensor::new(sensor_type, node)
                .with_readings([NewReading::nested("7", "2023-06-01 00:00:00")]),
        )
        .await
        .unwrap();

    assert_eq!(gateway.reading_count(sensor.id).await.unwrap(), 1);
    assert!(sensor.latest_reading.is_some());
}

#[tokio::test]
async fn foreign_key_violation_rolls_back_everything() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let mut missing_type = sensor_type.clone();
    missing_type.id = 999;

    let err = gateway
        .create_node(NewNode::new().with_alias("doomed").with_sensors([
            NewSensor::nested(sensor_type),
            NewSensor::nested(missing_type),
        ]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StorageConstraintViolation(_)), "{err:?}");
    assert_eq!(nodes::Entity::find().count(gateway.db()).await.unwrap(), 0);
    assert_eq!(sensors::Entity::find().count(gateway.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn reading_for_unknown_sensor_is_a_constraint_violation() {
    let gateway = gateway().await;
    let sensor_type = seed_sensor_type(&gateway).await;
    let node = seed_node(&gateway, "field").await;
    let mut ghost = seed_sensor(&gateway, &sensor_type, &node).await;
    ghost.id += 100;

    let err = gateway
        .create_reading(NewReading::new(ghost, 1.0, "2023-05-01"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StorageConstraintViolation(_)), "{err:?}");
    assert_eq!(readings::Entity::find().count(gateway.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn generic_create_returns_matching_record_kind() {
    let gateway = gateway().await;

    let record = gateway.create(NewNode::new().with_alias("any").into()).await.unwrap();
    match record {
        Record::Node(node) => {
            assert_eq!(node.alias.as_deref(), Some("any"));
            assert_eq!(node.uuid.len(), 32);
        }
        other => panic!("expected a node, got {:?}", other.kind()),
    }
}

#[tokio::test]
async fn duplicate_uuid_is_a_constraint_violation() {
    let gateway = gateway().await;
    let node = seed_node(&gateway, "original").await;

    let err = nodes::ActiveModel {
        id: NotSet,
        uuid: Set(node.uuid.clone()),
        alias: Set(Some("copy".to_string())),
        longitude: Set(None),
        latitude: Set(None),
    }
    .insert(gateway.db())
    .await
    .unwrap_err();

    assert!(
        matches!(AppError::from(err), AppError::StorageConstraintViolation(_)),
        "duplicate uuid not classified as a constraint violation"
    );
    assert_eq!(nodes::Entity::find().count(gateway.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn failed_cache_refresh_keeps_the_reading() {
    let stored = readings::Model {
        id: 7,
        timestamp: at(2023, 5, 1, 10, 0, 0),
        value: 2.5,
        sensor_id: 3,
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![stored.clone()]])
        .append_query_errors([DbErr::Custom("cache lookup failed".to_string())])
        .into_connection();
    let gateway = Gateway::new(db, TimestampResolver::default());

    let sensor = sensors::Model {
        id: 3,
        uuid: "1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d".to_string(),
        alias: None,
        node_id: 1,
        sensortype_id: 2,
        latest_reading: None,
    };
    let created = gateway
        .create_reading(NewReading::new(sensor, 2.5, "2023-05-01 10:00:00"))
        .await
        .unwrap();

    assert_eq!(created, stored);
}
