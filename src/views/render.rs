use std::fmt::Write;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::{EntityKind, Record, nodes, readings, sensor_types, sensors};
use crate::error::{AppError, AppResult};
use crate::services::gateway::{count_node_sensors, count_sensor_readings, count_type_sensors};

use super::types::{
    Detailed, NodeDetail, NodeSummary, ReadingDetail, ReadingSummary, SensorDetail, SensorSummary,
    SensorTypeDetail, SensorTypeSummary, Summary,
};

/// Connection and formatting used to build views.
#[derive(Debug)]
pub struct RenderContext<'a, C> {
    db: &'a C,
    datetime_format: &'a str,
}

/// Capability of rendering a record as a summary or a detailed view.
#[allow(async_fn_in_trait)]
pub trait Serializable {
    /// # Errors
    ///
    /// Returns an error if counting children fails.
    async fn summary<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>) -> AppResult<Summary>;

    /// # Errors
    ///
    /// Returns an error if loading related records fails.
    async fn detailed<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>)
    -> AppResult<Detailed>;
}

impl<'a, C: ConnectionTrait> RenderContext<'a, C> {
    pub fn new(db: &'a C, datetime_format: &'a str) -> Self {
        Self {
            db,
            datetime_format,
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the sensor count query fails.
    pub async fn node_summary(&self, node: &nodes::Model) -> AppResult<NodeSummary> {
        let sensor_count = count_node_sensors(self.db, node.id).await?;
        Ok(node_summary_with(node, sensor_count))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if loading sensors or their counts fails.
    pub async fn node_detail(&self, node: &nodes::Model) -> AppResult<NodeDetail> {
        let sensors = sensors::Entity::find()
            .filter(sensors::Column::NodeId.eq(node.id))
            .order_by_asc(sensors::Column::Id)
            .all(self.db)
            .await?;

        Ok(NodeDetail {
            summary: node_summary_with(node, sensors.len() as u64),
            sensors: self.sensor_summaries(&sensors).await?,
        })
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the sensor count query fails.
    pub async fn sensor_type_summary(
        &self,
        sensor_type: &sensor_types::Model,
    ) -> AppResult<SensorTypeSummary> {
        let sensor_count = count_type_sensors(self.db, sensor_type.id).await?;
        Ok(sensor_type_summary_with(sensor_type, sensor_count))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if loading sensors or their counts fails.
    pub async fn sensor_type_detail(
        &self,
        sensor_type: &sensor_types::Model,
    ) -> AppResult<SensorTypeDetail> {
        let sensors = sensors::Entity::find()
            .filter(sensors::Column::SensortypeId.eq(sensor_type.id))
            .order_by_asc(sensors::Column::Id)
            .all(self.db)
            .await?;

        Ok(SensorTypeDetail {
            summary: sensor_type_summary_with(sensor_type, sensors.len() as u64),
            sensors: self.sensor_summaries(&sensors).await?,
        })
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the reading count query fails.
    pub async fn sensor_summary(&self, sensor: &sensors::Model) -> AppResult<SensorSummary> {
        let reading_count = count_sensor_readings(self.db, sensor.id).await?;
        Ok(sensor_summary_with(sensor, reading_count))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails, `AppError::Internal` if a
    /// parent row is missing or a timestamp cannot be rendered.
    pub async fn sensor_detail(&self, sensor: &sensors::Model) -> AppResult<SensorDetail> {
        let sensor_type = sensor_types::Entity::find_by_id(sensor.sensortype_id)
            .one(self.db)
            .await?
            .ok_or_else(|| missing_parent(EntityKind::SensorType, sensor.sensortype_id))?;
        let node = nodes::Entity::find_by_id(sensor.node_id)
            .one(self.db)
            .await?
            .ok_or_else(|| missing_parent(EntityKind::Node, sensor.node_id))?;

        let readings = readings::Entity::find()
            .filter(readings::Column::SensorId.eq(sensor.id))
            .order_by_asc(readings::Column::Timestamp)
            .order_by_asc(readings::Column::Id)
            .all(self.db)
            .await?;

        Ok(SensorDetail {
            summary: sensor_summary_with(sensor, readings.len() as u64),
            sensortype: self.sensor_type_summary(&sensor_type).await?,
            node: self.node_summary(&node).await?,
            readings: readings
                .iter()
                .map(|reading| reading_summary(reading, self.datetime_format))
                .collect::<AppResult<Vec<_>>>()?,
        })
    }

    /// # Errors
    ///
    /// Returns `AppError::Internal` if the timestamp cannot be rendered.
    pub fn reading_summary(&self, reading: &readings::Model) -> AppResult<ReadingSummary> {
        reading_summary(reading, self.datetime_format)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails, `AppError::Internal` if
    /// the sensor row is missing or the timestamp cannot be rendered.
    pub async fn reading_detail(&self, reading: &readings::Model) -> AppResult<ReadingDetail> {
        let sensor = sensors::Entity::find_by_id(reading.sensor_id)
            .one(self.db)
            .await?
            .ok_or_else(|| missing_parent(EntityKind::Sensor, reading.sensor_id))?;

        Ok(ReadingDetail {
            summary: reading_summary(reading, self.datetime_format)?,
            sensor: self.sensor_summary(&sensor).await?,
        })
    }

    async fn sensor_summaries(&self, sensors: &[sensors::Model]) -> AppResult<Vec<SensorSummary>> {
        let mut summaries = Vec::with_capacity(sensors.len());
        for sensor in sensors {
            summaries.push(self.sensor_summary(sensor).await?);
        }
        Ok(summaries)
    }
}

/// Summary of a reading; needs no queries.
///
/// # Errors
///
/// Returns `AppError::Internal` if `datetime_format` cannot render the timestamp.
pub fn reading_summary(reading: &readings::Model, datetime_format: &str) -> AppResult<ReadingSummary> {
    let mut timestamp = String::new();
    write!(timestamp, "{}", reading.timestamp.format(datetime_format)).map_err(|_| {
        AppError::Internal(format!("cannot render timestamp with {datetime_format:?}"))
    })?;

    Ok(ReadingSummary {
        kind: EntityKind::Reading,
        id: reading.id,
        value: reading.value,
        timestamp,
        sensor_id: reading.sensor_id,
    })
}

fn node_summary_with(node: &nodes::Model, sensor_count: u64) -> NodeSummary {
    NodeSummary {
        kind: EntityKind::Node,
        id: node.id,
        uuid: node.uuid.clone(),
        alias: node.alias.clone(),
        longitude: node.longitude,
        latitude: node.latitude,
        sensor_count,
    }
}

fn sensor_type_summary_with(sensor_type: &sensor_types::Model, sensor_count: u64) -> SensorTypeSummary {
    SensorTypeSummary {
        kind: EntityKind::SensorType,
        id: sensor_type.id,
        name: sensor_type.name.clone(),
        unit: sensor_type.unit.clone(),
        sensor_count,
    }
}

fn sensor_summary_with(sensor: &sensors::Model, reading_count: u64) -> SensorSummary {
    SensorSummary {
        kind: EntityKind::Sensor,
        id: sensor.id,
        uuid: sensor.uuid.clone(),
        alias: sensor.alias.clone(),
        node_id: sensor.node_id,
        sensortype_id: sensor.sensortype_id,
        reading_count,
        // A cache entry that no longer parses is treated as absent
        latest_reading: sensor
            .latest_reading
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok()),
    }
}

fn missing_parent(kind: EntityKind, id: i32) -> AppError {
    AppError::Internal(format!("{kind} {id} referenced but not found"))
}

impl Serializable for nodes::Model {
    async fn summary<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>) -> AppResult<Summary> {
        ctx.node_summary(self).await.map(Summary::Node)
    }

    async fn detailed<C: ConnectionTrait>(
        &self,
        ctx: &RenderContext<'_, C>,
    ) -> AppResult<Detailed> {
        ctx.node_detail(self).await.map(Detailed::Node)
    }
}

impl Serializable for sensor_types::Model {
    async fn summary<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>) -> AppResult<Summary> {
        ctx.sensor_type_summary(self).await.map(Summary::SensorType)
    }

    async fn detailed<C: ConnectionTrait>(
        &self,
        ctx: &RenderContext<'_, C>,
    ) -> AppResult<Detailed> {
        ctx.sensor_type_detail(self).await.map(Detailed::SensorType)
    }
}

impl Serializable for sensors::Model {
    async fn summary<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>) -> AppResult<Summary> {
        ctx.sensor_summary(self).await.map(Summary::Sensor)
    }

    async fn detailed<C: ConnectionTrait>(
        &self,
        ctx: &RenderContext<'_, C>,
    ) -> AppResult<Detailed> {
        ctx.sensor_detail(self).await.map(Detailed::Sensor)
    }
}

impl Serializable for readings::Model {
    async fn summary<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>) -> AppResult<Summary> {
        ctx.reading_summary(self).map(Summary::Reading)
    }

    async fn detailed<C: ConnectionTrait>(
        &self,
        ctx: &RenderContext<'_, C>,
    ) -> AppResult<Detailed> {
        ctx.reading_detail(self).await.map(Detailed::Reading)
    }
}

impl Serializable for Record {
    async fn summary<C: ConnectionTrait>(&self, ctx: &RenderContext<'_, C>) -> AppResult<Summary> {
        match self {
            Self::Node(m) => m.summary(ctx).await,
            Self::SensorType(m) => m.summary(ctx).await,
            Self::Sensor(m) => m.summary(ctx).await,
            Self::Reading(m) => m.summary(ctx).await,
        }
    }

    async fn detailed<C: ConnectionTrait>(
        &self,
        ctx: &RenderContext<'_, C>,
    ) -> AppResult<Detailed> {
        match self {
            Self::Node(m) => m.detailed(ctx).await,
            Self::SensorType(m) => m.detailed(ctx).await,
            Self::Sensor(m) => m.detailed(ctx).await,
            Self::Reading(m) => m.detailed(ctx).await,
        }
    }
}
