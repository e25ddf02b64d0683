//! Validating constructors for inventory records.
//!
//! A draft holds caller-supplied field values. `validate` checks kinds,
//! required fields, numeric conversion and timestamp resolution without
//! touching storage, producing a value the gateway can insert as-is.
//! Child collections are drafts too and are inserted with their parent.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::entity::{EntityKind, Record};
use crate::error::{AppError, AppResult};
use crate::services::timestamp::{ResolveTimestamp, TimestampInput};

/// A reading value as supplied by a caller.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
}

impl ReadingValue {
    /// # Errors
    ///
    /// `ValueConversion` if text does not parse as a number or the number is
    /// NaN or infinite, `MissingField("value")` if it is blank.
    pub fn to_f64(&self) -> AppResult<f64> {
        let (value, input) = match self {
            Self::Number(value) => (Some(*value), value.to_string()),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(AppError::MissingField("value"));
                }
                (trimmed.parse::<f64>().ok(), text.clone())
            }
        };

        // NaN and infinities cannot be stored or rendered back
        match value {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(AppError::ValueConversion { input }),
        }
    }
}

impl From<f64> for ReadingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ReadingValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for ReadingValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ReadingValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Any of the four drafts, used for owned child collections.
#[derive(Clone, Debug)]
pub enum Draft {
    Node(NewNode),
    SensorType(NewSensorType),
    Sensor(NewSensor),
    Reading(NewReading),
}

impl Draft {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Node(_) => EntityKind::Node,
            Self::SensorType(_) => EntityKind::SensorType,
            Self::Sensor(_) => EntityKind::Sensor,
            Self::Reading(_) => EntityKind::Reading,
        }
    }
}

impl From<NewNode> for Draft {
    fn from(draft: NewNode) -> Self {
        Self::Node(draft)
    }
}

impl From<NewSensorType> for Draft {
    fn from(draft: NewSensorType) -> Self {
        Self::SensorType(draft)
    }
}

impl From<NewSensor> for Draft {
    fn from(draft: NewSensor) -> Self {
        Self::Sensor(draft)
    }
}

impl From<NewReading> for Draft {
    fn from(draft: NewReading) -> Self {
        Self::Reading(draft)
    }
}

/// A validated child together with the id of the parent it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct Attached<T> {
    pub parent_id: i32,
    pub value: T,
}

// ========== NODE ==========

#[derive(Clone, Debug, Default)]
pub struct NewNode {
    pub alias: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Sensor drafts created on this node in the same transaction.
    pub sensors: Vec<Draft>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidNode {
    pub uuid: String,
    pub alias: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub sensors: Vec<ValidSensor>,
}

impl NewNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn at(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = Some(longitude);
        self.latitude = Some(latitude);
        self
    }

    #[must_use]
    pub fn with_sensors<I, D>(mut self, sensors: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Draft>,
    {
        self.sensors = sensors.into_iter().map(Into::into).collect();
        self
    }

    /// # Errors
    ///
    /// `ContractViolation` if an item in `sensors` is not a sensor draft or
    /// names a node of its own; any error from validating a nested sensor.
    pub fn validate(self, resolver: &impl ResolveTimestamp) -> AppResult<ValidNode> {
        let sensors = self
            .sensors
            .into_iter()
            .map(|draft| match draft {
                Draft::Sensor(sensor) => sensor.validate_nested(resolver),
                other => Err(AppError::ContractViolation(format!(
                    "each item in sensors must be a Sensor, got a {}",
                    other.kind()
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ValidNode {
            uuid: new_uuid(),
            alias: self.alias,
            longitude: self.longitude,
            latitude: self.latitude,
            sensors,
        })
    }
}

// ========== SENSOR TYPE ==========

#[derive(Clone, Debug)]
pub struct NewSensorType {
    pub name: String,
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidSensorType {
    pub name: String,
    pub unit: String,
}

impl NewSensorType {
    #[must_use]
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }

    /// # Errors
    ///
    /// `MissingField` if `name` or `unit` is blank.
    pub fn validate(self) -> AppResult<ValidSensorType> {
        if self.name.trim().is_empty() {
            return Err(AppError::MissingField("name"));
        }
        if self.unit.trim().is_empty() {
            return Err(AppError::MissingField("unit"));
        }
        Ok(ValidSensorType {
            name: self.name,
            unit: self.unit,
        })
    }
}

// ========== SENSOR ==========

#[derive(Clone, Debug)]
pub struct NewSensor {
    pub sensortype: Record,
    /// Required at top level; must be absent when nested in a node draft.
    pub node: Option<Record>,
    pub alias: Option<String>,
    /// Reading drafts created on this sensor in the same transaction.
    pub readings: Vec<Draft>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidSensor {
    pub uuid: String,
    pub alias: Option<String>,
    pub sensortype_id: i32,
    pub readings: Vec<ValidReading>,
}

impl NewSensor {
    #[must_use]
    pub fn new(sensortype: impl Into<Record>, node: impl Into<Record>) -> Self {
        Self {
            sensortype: sensortype.into(),
            node: Some(node.into()),
            alias: None,
            readings: Vec::new(),
        }
    }

    /// A sensor draft for the `sensors` collection of a node draft.
    #[must_use]
    pub fn nested(sensortype: impl Into<Record>) -> Self {
        Self {
            sensortype: sensortype.into(),
            node: None,
            alias: None,
            readings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_readings<I, D>(mut self, readings: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Draft>,
    {
        self.readings = readings.into_iter().map(Into::into).collect();
        self
    }

    /// # Errors
    ///
    /// `ContractViolation` if `sensortype` or `node` is of the wrong kind or an
    /// item in `readings` is not a reading draft; `MissingField("node")`.
    pub fn validate(self, resolver: &impl ResolveTimestamp) -> AppResult<Attached<ValidSensor>> {
        let node_id = match &self.node {
            Some(node) => node.as_node("node")?.id,
            None => return Err(AppError::MissingField("node")),
        };
        Ok(Attached {
            parent_id: node_id,
            value: self.validate_body(resolver)?,
        })
    }

    pub(crate) fn validate_nested(self, resolver: &impl ResolveTimestamp) -> AppResult<ValidSensor> {
        if let Some(node) = &self.node {
            return Err(AppError::ContractViolation(format!(
                "a sensor created within a node cannot name {} {}",
                node.kind(),
                node.id()
            )));
        }
        self.validate_body(resolver)
    }

    fn validate_body(self, resolver: &impl ResolveTimestamp) -> AppResult<ValidSensor> {
        let sensortype_id = self.sensortype.as_sensor_type("sensortype")?.id;

        let readings = self
            .readings
            .into_iter()
            .map(|draft| match draft {
                Draft::Reading(reading) => reading.validate_nested(resolver),
                other => Err(AppError::ContractViolation(format!(
                    "each item in readings must be a Reading, got a {}",
                    other.kind()
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ValidSensor {
            uuid: new_uuid(),
            alias: self.alias,
            sensortype_id,
            readings,
        })
    }
}

// ========== READING ==========

#[derive(Clone, Debug, Default)]
pub struct NewReading {
    /// Required at top level; must be absent when nested in a sensor draft.
    pub sensor: Option<Record>,
    pub value: Option<ReadingValue>,
    pub timestamp: Option<TimestampInput>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidReading {
    pub value: f64,
    pub timestamp: NaiveDateTime,
}

impl NewReading {
    #[must_use]
    pub fn new(
        sensor: impl Into<Record>,
        value: impl Into<ReadingValue>,
        timestamp: impl Into<TimestampInput>,
    ) -> Self {
        Self {
            sensor: Some(sensor.into()),
            value: Some(value.into()),
            timestamp: Some(timestamp.into()),
        }
    }

    /// A reading draft for the `readings` collection of a sensor draft.
    #[must_use]
    pub fn nested(value: impl Into<ReadingValue>, timestamp: impl Into<TimestampInput>) -> Self {
        Self {
            sensor: None,
            value: Some(value.into()),
            timestamp: Some(timestamp.into()),
        }
    }

    /// # Errors
    ///
    /// `ContractViolation` if `sensor` is not a sensor, `MissingField` for an
    /// absent sensor/value/timestamp, `ValueConversion`, `TimestampResolution`.
    pub fn validate(self, resolver: &impl ResolveTimestamp) -> AppResult<Attached<ValidReading>> {
        let sensor_id = match &self.sensor {
            Some(sensor) => sensor.as_sensor("sensor")?.id,
            None => return Err(AppError::MissingField("sensor")),
        };
        Ok(Attached {
            parent_id: sensor_id,
            value: self.validate_body(resolver)?,
        })
    }

    pub(crate) fn validate_nested(
        self,
        resolver: &impl ResolveTimestamp,
    ) -> AppResult<ValidReading> {
        if let Some(sensor) = &self.sensor {
            return Err(AppError::ContractViolation(format!(
                "a reading created within a sensor cannot name {} {}",
                sensor.kind(),
                sensor.id()
            )));
        }
        self.validate_body(resolver)
    }

    fn validate_body(self, resolver: &impl ResolveTimestamp) -> AppResult<ValidReading> {
        let value = self
            .value
            .as_ref()
            .ok_or(AppError::MissingField("value"))?
            .to_f64()?;
        let timestamp = resolver.resolve(self.timestamp)?;
        Ok(ValidReading { value, timestamp })
    }
}

fn new_uuid() -> String {
    Uuid::new_v4().simple().to_string()
}
