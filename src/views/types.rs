use serde::Serialize;

use crate::entity::EntityKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: i32,
    pub uuid: String,
    pub alias: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub sensor_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorTypeSummary {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: i32,
    pub name: String,
    pub unit: String,
    pub sensor_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: i32,
    pub uuid: String,
    pub alias: Option<String>,
    pub node_id: i32,
    pub sensortype_id: i32,
    pub reading_count: u64,
    /// Cached summary of the newest reading, if any
    pub latest_reading: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingSummary {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: i32,
    pub value: f64,
    /// Rendered with the configured datetime format
    pub timestamp: String,
    pub sensor_id: i32,
}

/// Node with the summaries of its sensors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub summary: NodeSummary,
    pub sensors: Vec<SensorSummary>,
}

/// Sensor type with the summaries of the sensors using it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorTypeDetail {
    #[serde(flatten)]
    pub summary: SensorTypeSummary,
    pub sensors: Vec<SensorSummary>,
}

/// Sensor with its parents' summaries and its readings, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDetail {
    #[serde(flatten)]
    pub summary: SensorSummary,
    pub sensortype: SensorTypeSummary,
    pub node: NodeSummary,
    pub readings: Vec<ReadingSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingDetail {
    #[serde(flatten)]
    pub summary: ReadingSummary,
    pub sensor: SensorSummary,
}

/// Summary of any record; serializes as the inner map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Summary {
    Node(NodeSummary),
    SensorType(SensorTypeSummary),
    Sensor(SensorSummary),
    Reading(ReadingSummary),
}

/// Detailed view of any record; serializes as the inner map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Detailed {
    Node(NodeDetail),
    SensorType(SensorTypeDetail),
    Sensor(SensorDetail),
    Reading(ReadingDetail),
}
