//! sea-orm entities for the sensor inventory schema.
//!
//! `Node 1—* Sensor`, `SensorType 1—* Sensor`, `Sensor 1—* Reading`.

pub mod nodes;
pub mod readings;
pub mod sensor_types;
pub mod sensors;

use std::fmt;

use sea_orm::{EntityTrait, IdenStatic, Iterable};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Columns maintained by storage or the gateway rather than the caller.
const MANAGED_COLUMNS: [&str; 3] = ["id", "uuid", "latest_reading"];

/// The four kinds of record in the inventory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Node,
    SensorType,
    Sensor,
    Reading,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::SensorType => "SensorType",
            Self::Sensor => "Sensor",
            Self::Reading => "Reading",
        }
    }

    /// Fields a caller may supply when constructing this kind of record.
    #[must_use]
    pub fn settables(self) -> Vec<String> {
        match self {
            Self::Node => settables::<nodes::Entity>(),
            Self::SensorType => settables::<sensor_types::Entity>(),
            Self::Sensor => settables::<sensors::Entity>(),
            Self::Reading => settables::<readings::Entity>(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names of `E` that are not managed by storage.
#[must_use]
pub fn settables<E: EntityTrait>() -> Vec<String> {
    E::Column::iter()
        .map(|column| column.as_str().to_owned())
        .filter(|name| !MANAGED_COLUMNS.contains(&name.as_str()))
        .collect()
}

/// A persisted row of any of the four kinds.
///
/// Constructors take parents as `Record` so a reference of the wrong kind is
/// rejected at validation time instead of surfacing as a bad foreign key.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Node(nodes::Model),
    SensorType(sensor_types::Model),
    Sensor(sensors::Model),
    Reading(readings::Model),
}

impl Record {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Node(_) => EntityKind::Node,
            Self::SensorType(_) => EntityKind::SensorType,
            Self::Sensor(_) => EntityKind::Sensor,
            Self::Reading(_) => EntityKind::Reading,
        }
    }

    #[must_use]
    pub fn id(&self) -> i32 {
        match self {
            Self::Node(m) => m.id,
            Self::SensorType(m) => m.id,
            Self::Sensor(m) => m.id,
            Self::Reading(m) => m.id,
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::ContractViolation` if the record is not a node.
    pub fn as_node(&self, field: &str) -> AppResult<&nodes::Model> {
        match self {
            Self::Node(m) => Ok(m),
            other => Err(other.wrong_kind(field, EntityKind::Node)),
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::ContractViolation` if the record is not a sensor type.
    pub fn as_sensor_type(&self, field: &str) -> AppResult<&sensor_types::Model> {
        match self {
            Self::SensorType(m) => Ok(m),
            other => Err(other.wrong_kind(field, EntityKind::SensorType)),
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::ContractViolation` if the record is not a sensor.
    pub fn as_sensor(&self, field: &str) -> AppResult<&sensors::Model> {
        match self {
            Self::Sensor(m) => Ok(m),
            other => Err(other.wrong_kind(field, EntityKind::Sensor)),
        }
    }

    fn wrong_kind(&self, field: &str, expected: EntityKind) -> AppError {
        AppError::ContractViolation(format!(
            "{field} must be a {expected}, got a {}",
            self.kind()
        ))
    }
}

impl From<nodes::Model> for Record {
    fn from(model: nodes::Model) -> Self {
        Self::Node(model)
    }
}

impl From<sensor_types::Model> for Record {
    fn from(model: sensor_types::Model) -> Self {
        Self::SensorType(model)
    }
}

impl From<sensors::Model> for Record {
    fn from(model: sensors::Model) -> Self {
        Self::Sensor(model)
    }
}

impl From<readings::Model> for Record {
    fn from(model: readings::Model) -> Self {
        Self::Reading(model)
    }
}
