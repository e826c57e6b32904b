use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One reading per (capture, node, sensor type).
        manager
            .create_table(
                Table::create()
                    .table(Readings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Readings::CaptureId).integer().not_null())
                    .col(ColumnDef::new(Readings::NodeId).string_len(6).not_null())
                    .col(ColumnDef::new(Readings::ReadingType).string_len(12).not_null())
                    .col(ColumnDef::new(Readings::ReadingVal).double().not_null())
                    .col(
                        ColumnDef::new(Readings::Timestamp)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Readings::CaptureId)
                            .col(Readings::NodeId)
                            .col(Readings::ReadingType),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reading-capture_id")
                            .from(Readings::Table, Readings::CaptureId)
                            .to(Captures::Table, Captures::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reading-node_id")
                            .from(Readings::Table, Readings::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves the latest-capture-per-(node, type) lookup.
        manager
            .create_index(
                Index::create()
                    .name("idx-readings-node_id-reading_type-capture_id")
                    .table(Readings::Table)
                    .col(Readings::NodeId)
                    .col(Readings::ReadingType)
                    .col(Readings::CaptureId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Batteries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Batteries::CaptureId).integer().not_null())
                    .col(ColumnDef::new(Batteries::NodeId).string_len(6).not_null())
                    .col(ColumnDef::new(Batteries::BatLvl).double().not_null())
                    .col(ColumnDef::new(Batteries::BatHlth).double())
                    .primary_key(
                        Index::create()
                            .col(Batteries::CaptureId)
                            .col(Batteries::NodeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-battery-capture_id")
                            .from(Batteries::Table, Batteries::CaptureId)
                            .to(Captures::Table, Captures::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-battery-node_id")
                            .from(Batteries::Table, Batteries::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Written by the ingestion path only.
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notifications::NodeId).string_len(6).not_null())
                    .col(ColumnDef::new(Notifications::CaptureId).integer().not_null())
                    .col(ColumnDef::new(Notifications::NotifCode).integer())
                    .primary_key(
                        Index::create()
                            .col(Notifications::NodeId)
                            .col(Notifications::CaptureId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notification-node_id")
                            .from(Notifications::Table, Notifications::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notification-capture_id")
                            .from(Notifications::Table, Notifications::CaptureId)
                            .to(Captures::Table, Captures::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Batteries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Readings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Readings {
    Table,
    CaptureId,
    NodeId,
    ReadingType,
    ReadingVal,
    Timestamp,
}

#[derive(DeriveIden)]
enum Batteries {
    Table,
    CaptureId,
    NodeId,
    BatLvl,
    BatHlth,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    NodeId,
    CaptureId,
    NotifCode,
}

#[derive(DeriveIden)]
enum Captures {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Nodes {
    Table,
    Id,
}
