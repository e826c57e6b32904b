use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string_len(45).not_null())
                    .col(ColumnDef::new(Users::LastName).string_len(45).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Captures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Captures::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Captures::Timestamp).date_time().not_null())
                    .col(ColumnDef::new(Captures::RespTime).double())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Paddocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Paddocks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Paddocks::UserId).string_len(255).not_null())
                    .col(ColumnDef::new(Paddocks::Name).string_len(45).not_null())
                    .col(ColumnDef::new(Paddocks::CropType).string_len(16))
                    .col(ColumnDef::new(Paddocks::Area).double())
                    .col(ColumnDef::new(Paddocks::PlantDate).date())
                    .col(ColumnDef::new(Paddocks::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-paddock-user_id")
                            .from(Paddocks::Table, Paddocks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A paddock name is unique per owner, not globally.
        manager
            .create_index(
                Index::create()
                    .name("idx-paddocks-user_id-name")
                    .table(Paddocks::Table)
                    .col(Paddocks::UserId)
                    .col(Paddocks::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nodes::Id)
                            .string_len(6)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Nodes::Name).string_len(45).not_null())
                    .col(ColumnDef::new(Nodes::CaptureId).integer())
                    .col(ColumnDef::new(Nodes::Gps).string_len(30))
                    .col(ColumnDef::new(Nodes::PaddockId).integer())
                    .col(ColumnDef::new(Nodes::UserId).string_len(255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-node-capture_id")
                            .from(Nodes::Table, Nodes::CaptureId)
                            .to(Captures::Table, Captures::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-node-paddock_id")
                            .from(Nodes::Table, Nodes::PaddockId)
                            .to(Paddocks::Table, Paddocks::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-node-user_id")
                            .from(Nodes::Table, Nodes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-nodes-paddock_id")
                    .table(Nodes::Table)
                    .col(Nodes::PaddockId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Paddocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Captures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Captures {
    Table,
    Id,
    Timestamp,
    RespTime,
}

#[derive(DeriveIden)]
enum Paddocks {
    Table,
    Id,
    UserId,
    Name,
    CropType,
    Area,
    PlantDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Nodes {
    Table,
    Id,
    Name,
    CaptureId,
    Gps,
    PaddockId,
    UserId,
}
