use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical sensor unit. Provisioned unowned; `user_id` and `paddock_id` are set together
/// when a user claims it and cleared together when it is unlinked.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "nodes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Last capture this node took part in.
    pub capture_id: Option<i32>,
    pub gps: Option<String>,
    pub paddock_id: Option<i32>,
    pub user_id: Option<String>,
}

impl Model {
    pub fn is_claimed(&self) -> bool {
        self.user_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::paddock::Entity",
        from = "Column::PaddockId",
        to = "super::paddock::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Paddock,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::capture::Entity",
        from = "Column::CaptureId",
        to = "super::capture::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Capture,
    #[sea_orm(has_many = "super::reading::Entity")]
    Reading,
    #[sea_orm(has_many = "super::battery::Entity")]
    Battery,
}

impl Related<super::paddock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Paddock.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::capture::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Capture.def()
    }
}

impl Related<super::reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reading.def()
    }
}

impl Related<super::battery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Battery.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
