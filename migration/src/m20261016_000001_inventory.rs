use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== NODES ==========
        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Nodes::Uuid)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Nodes::Alias).string_len(100))
                    .col(ColumnDef::new(Nodes::Longitude).double())
                    .col(ColumnDef::new(Nodes::Latitude).double())
                    .to_owned(),
            )
            .await?;

        // ========== SENSOR TYPES ==========
        manager
            .create_table(
                Table::create()
                    .table(SensorTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorTypes::Name).string().not_null())
                    .col(ColumnDef::new(SensorTypes::Unit).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ========== SENSORS ==========
        manager
            .create_table(
                Table::create()
                    .table(Sensors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sensors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sensors::Uuid)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sensors::Alias).string())
                    .col(ColumnDef::new(Sensors::NodeId).integer().not_null())
                    .col(ColumnDef::new(Sensors::SensortypeId).integer().not_null())
                    .col(ColumnDef::new(Sensors::LatestReading).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_node")
                            .from(Sensors::Table, Sensors::NodeId)
                            .to(Nodes::Table, Nodes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_sensortype")
                            .from(Sensors::Table, Sensors::SensortypeId)
                            .to(SensorTypes::Table, SensorTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sensors_node_id")
                    .table(Sensors::Table)
                    .col(Sensors::NodeId)
                    .to_owned(),
            )
            .await?;

        // ========== READINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(Readings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Readings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Readings::Timestamp).date_time().not_null())
                    .col(ColumnDef::new(Readings::Value).double().not_null())
                    .col(ColumnDef::new(Readings::SensorId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_readings_sensor")
                            .from(Readings::Table, Readings::SensorId)
                            .to(Sensors::Table, Sensors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Latest-reading lookups scan a sensor's readings by time
        manager
            .create_index(
                Index::create()
                    .name("idx_readings_sensor_timestamp")
                    .table(Readings::Table)
                    .col(Readings::SensorId)
                    .col(Readings::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of dependencies
        manager
            .drop_table(Table::drop().table(Readings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sensors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(SensorTypes::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Nodes::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Nodes {
    Table,
    Id,
    Uuid,
    Alias,
    Longitude,
    Latitude,
}

#[derive(DeriveIden)]
pub enum SensorTypes {
    #[sea_orm(iden = "sensortypes")]
    Table,
    Id,
    Name,
    Unit,
}

#[derive(DeriveIden)]
pub enum Sensors {
    Table,
    Id,
    Uuid,
    Alias,
    NodeId,
    SensortypeId,
    LatestReading,
}

#[derive(DeriveIden)]
pub enum Readings {
    Table,
    Id,
    Timestamp,
    Value,
    SensorId,
}
