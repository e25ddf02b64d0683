use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sensors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub uuid: String,
    pub alias: Option<String>,
    pub node_id: i32,
    pub sensortype_id: i32,
    /// JSON summary of the most recent reading, refreshed after reading inserts.
    #[sea_orm(column_type = "Text", nullable)]
    pub latest_reading: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::nodes::Entity",
        from = "Column::NodeId",
        to = "super::nodes::Column::Id"
    )]
    Node,
    #[sea_orm(
        belongs_to = "super::sensor_types::Entity",
        from = "Column::SensortypeId",
        to = "super::sensor_types::Column::Id"
    )]
    SensorType,
    #[sea_orm(has_many = "super::readings::Entity")]
    Readings,
}

impl Related<super::nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Node.def()
    }
}

impl Related<super::sensor_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorType.def()
    }
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
