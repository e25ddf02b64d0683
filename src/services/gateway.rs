use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::config::{Config, DEFAULT_DATETIME_FORMAT};
use crate::drafts::{
    Draft, NewNode, NewReading, NewSensor, NewSensorType, ValidNode, ValidReading, ValidSensor,
    ValidSensorType,
};
use crate::entity::{EntityKind, Record, nodes, readings, sensor_types, sensors};
use crate::error::{AppError, AppResult};
use crate::services::timestamp::TimestampResolver;
use crate::views::{self, RenderContext};

/// Transactional boundary between validated drafts and storage.
///
/// Every `create_*` call validates first and only then opens a transaction, so
/// a rejected draft never reaches the database. Storage failures roll the
/// transaction back and are returned to the caller.
pub struct Gateway {
    db: DatabaseConnection,
    resolver: TimestampResolver,
    datetime_format: String,
}

impl Gateway {
    pub fn new(db: DatabaseConnection, resolver: TimestampResolver) -> Self {
        Self {
            db,
            resolver,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }

    pub fn from_config(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            db,
            resolver: TimestampResolver::new(config.datetime_formats.iter().cloned()),
            datetime_format: config.datetime_format.clone(),
        }
    }

    #[must_use]
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Give up the gateway and keep its connection.
    pub fn into_db(self) -> DatabaseConnection {
        self.db
    }

    /// Views over this gateway's connection using its render format.
    pub fn views(&self) -> RenderContext<'_, DatabaseConnection> {
        RenderContext::new(&self.db, &self.datetime_format)
    }

    /// Create any kind of record from its draft.
    ///
    /// # Errors
    ///
    /// Validation errors from the draft, `StorageConstraintViolation` or
    /// `Database` from storage.
    pub async fn create(&self, draft: Draft) -> AppResult<Record> {
        match draft {
            Draft::Node(node) => self.create_node(node).await.map(Record::from),
            Draft::SensorType(sensor_type) => {
                self.create_sensor_type(sensor_type).await.map(Record::from)
            }
            Draft::Sensor(sensor) => self.create_sensor(sensor).await.map(Record::from),
            Draft::Reading(reading) => self.create_reading(reading).await.map(Record::from),
        }
    }

    /// # Errors
    ///
    /// See [`Gateway::create`].
    pub async fn create_node(&self, draft: NewNode) -> AppResult<nodes::Model> {
        let node = draft.validate(&self.resolver)?;
        let sensor_count = node.sensors.len();

        let txn = self.db.begin().await?;
        let result = insert_node(&txn, node).await;
        let (model, sensors_with_readings) = finish(txn, EntityKind::Node, result).await?;

        tracing::debug!(id = model.id, uuid = %model.uuid, sensor_count, "Created node");

        for sensor_id in sensors_with_readings {
            self.refresh_latest_reading(sensor_id).await;
        }
        Ok(model)
    }

    /// # Errors
    ///
    /// See [`Gateway::create`].
    pub async fn create_sensor_type(&self, draft: NewSensorType) -> AppResult<sensor_types::Model> {
        let sensor_type = draft.validate()?;

        let txn = self.db.begin().await?;
        let result = insert_sensor_type(&txn, sensor_type).await;
        let model = finish(txn, EntityKind::SensorType, result).await?;

        tracing::debug!(id = model.id, name = %model.name, unit = %model.unit, "Created sensor type");
        Ok(model)
    }

    /// # Errors
    ///
    /// See [`Gateway::create`].
    pub async fn create_sensor(&self, draft: NewSensor) -> AppResult<sensors::Model> {
        let sensor = draft.validate(&self.resolver)?;
        let reading_count = sensor.value.readings.len();

        let txn = self.db.begin().await?;
        let result = insert_sensor(&txn, sensor.parent_id, sensor.value).await;
        let mut model = finish(txn, EntityKind::Sensor, result).await?;

        tracing::debug!(
            id = model.id,
            node_id = model.node_id,
            sensortype_id = model.sensortype_id,
            reading_count,
            "Created sensor"
        );

        if reading_count > 0 {
            model.latest_reading = self.refresh_latest_reading(model.id).await;
        }
        Ok(model)
    }

    /// # Errors
    ///
    /// See [`Gateway::create`].
    pub async fn create_reading(&self, draft: NewReading) -> AppResult<readings::Model> {
        let reading = draft.validate(&self.resolver)?;

        let txn = self.db.begin().await?;
        let result = insert_reading(&txn, reading.parent_id, reading.value).await;
        let model = finish(txn, EntityKind::Reading, result).await?;

        tracing::debug!(
            id = model.id,
            sensor_id = model.sensor_id,
            value = model.value,
            timestamp = %model.timestamp,
            "Created reading"
        );

        self.refresh_latest_reading(model.sensor_id).await;
        Ok(model)
    }

    /// Re-cache the newest reading of a sensor. Failures are logged, not returned.
    async fn refresh_latest_reading(&self, sensor_id: i32) -> Option<String> {
        match self.try_refresh_latest_reading(sensor_id).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, sensor_id, "Failed to refresh latest reading");
                None
            }
        }
    }

    async fn try_refresh_latest_reading(&self, sensor_id: i32) -> AppResult<Option<String>> {
        let Some(latest) = readings::Entity::find()
            .filter(readings::Column::SensorId.eq(sensor_id))
            .order_by_desc(readings::Column::Timestamp)
            .order_by_desc(readings::Column::Id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let summary = views::reading_summary(&latest, &self.datetime_format)?;
        let cached =
            serde_json::to_string(&summary).map_err(|e| AppError::Internal(e.to_string()))?;

        sensors::Entity::update_many()
            .col_expr(sensors::Column::LatestReading, Expr::value(cached.clone()))
            .filter(sensors::Column::Id.eq(sensor_id))
            .exec(&self.db)
            .await?;

        tracing::trace!(sensor_id, reading_id = latest.id, "Refreshed latest reading");
        Ok(Some(cached))
    }

    // ========== LOOKUPS ==========

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_node(&self, id: i32) -> AppResult<Option<nodes::Model>> {
        Ok(nodes::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_sensor_type(&self, id: i32) -> AppResult<Option<sensor_types::Model>> {
        Ok(sensor_types::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_sensor(&self, id: i32) -> AppResult<Option<sensors::Model>> {
        Ok(sensors::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_reading(&self, id: i32) -> AppResult<Option<readings::Model>> {
        Ok(readings::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn sensor_count(&self, node_id: i32) -> AppResult<u64> {
        count_node_sensors(&self.db, node_id).await
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn reading_count(&self, sensor_id: i32) -> AppResult<u64> {
        count_sensor_readings(&self.db, sensor_id).await
    }
}

/// Commit on success, roll back and hand the error back on failure.
async fn finish<T>(
    txn: DatabaseTransaction,
    kind: EntityKind,
    result: AppResult<T>,
) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, %kind, "Rollback failed");
            }
            tracing::warn!(error = %e, %kind, "Insert rolled back");
            Err(e)
        }
    }
}

/// Returns the node and the ids of nested sensors that received readings.
async fn insert_node<C: ConnectionTrait>(
    db: &C,
    node: ValidNode,
) -> AppResult<(nodes::Model, Vec<i32>)> {
    let model = nodes::ActiveModel {
        id: NotSet,
        uuid: Set(node.uuid),
        alias: Set(node.alias),
        longitude: Set(node.longitude),
        latitude: Set(node.latitude),
    }
    .insert(db)
    .await?;

    let mut sensors_with_readings = Vec::new();
    for sensor in node.sensors {
        let has_readings = !sensor.readings.is_empty();
        let sensor_model = insert_sensor(db, model.id, sensor).await?;
        if has_readings {
            sensors_with_readings.push(sensor_model.id);
        }
    }

    Ok((model, sensors_with_readings))
}

async fn insert_sensor_type<C: ConnectionTrait>(
    db: &C,
    sensor_type: ValidSensorType,
) -> AppResult<sensor_types::Model> {
    let model = sensor_types::ActiveModel {
        id: NotSet,
        name: Set(sensor_type.name),
        unit: Set(sensor_type.unit),
    }
    .insert(db)
    .await?;
    Ok(model)
}

async fn insert_sensor<C: ConnectionTrait>(
    db: &C,
    node_id: i32,
    sensor: ValidSensor,
) -> AppResult<sensors::Model> {
    let model = sensors::ActiveModel {
        id: NotSet,
        uuid: Set(sensor.uuid),
        alias: Set(sensor.alias),
        node_id: Set(node_id),
        sensortype_id: Set(sensor.sensortype_id),
        latest_reading: Set(None),
    }
    .insert(db)
    .await?;

    for reading in sensor.readings {
        insert_reading(db, model.id, reading).await?;
    }

    Ok(model)
}

async fn insert_reading<C: ConnectionTrait>(
    db: &C,
    sensor_id: i32,
    reading: ValidReading,
) -> AppResult<readings::Model> {
    let model = readings::ActiveModel {
        id: NotSet,
        timestamp: Set(reading.timestamp),
        value: Set(reading.value),
        sensor_id: Set(sensor_id),
    }
    .insert(db)
    .await?;
    Ok(model)
}

pub(crate) async fn count_node_sensors<C: ConnectionTrait>(db: &C, node_id: i32) -> AppResult<u64> {
    Ok(sensors::Entity::find()
        .filter(sensors::Column::NodeId.eq(node_id))
        .count(db)
        .await?)
}

pub(crate) async fn count_type_sensors<C: ConnectionTrait>(
    db: &C,
    sensortype_id: i32,
) -> AppResult<u64> {
    Ok(sensors::Entity::find()
        .filter(sensors::Column::SensortypeId.eq(sensortype_id))
        .count(db)
        .await?)
}

pub(crate) async fn count_sensor_readings<C: ConnectionTrait>(
    db: &C,
    sensor_id: i32,
) -> AppResult<u64> {
    Ok(readings::Entity::find()
        .filter(readings::Column::SensorId.eq(sensor_id))
        .count(db)
        .await?)
}
