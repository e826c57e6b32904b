use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One telemetry collection session. Ids increase with time and are the ordering key for
/// "latest" lookups.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "captures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub timestamp: DateTime,
    #[sea_orm(column_type = "Double", nullable)]
    pub resp_time: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reading::Entity")]
    Reading,
    #[sea_orm(has_many = "super::battery::Entity")]
    Battery,
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
