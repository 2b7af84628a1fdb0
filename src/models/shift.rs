//! Shift entity model
//!
//! A scheduled block of volunteer work. Shifts imported from the legacy
//! system carry their origin event id in `legacy_event_id`; a unique index on
//! that column guarantees at most one local shift per legacy event.

use super::shift_type::Entity as ShiftTypeEntity;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    /// Unique identifier for the shift (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub shift_type_id: Uuid,

    pub starts_at: DateTimeWithTimeZone,

    pub ends_at: DateTimeWithTimeZone,

    /// Number of volunteer slots
    pub capacity: i32,

    pub location: Option<String>,

    /// Free-text notes; imported shifts also carry a human-readable
    /// "Nova ID: {id}" back-reference here
    pub notes: Option<String>,

    /// Originating legacy event id, NULL for locally created shifts
    pub legacy_event_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "ShiftTypeEntity",
        from = "Column::ShiftTypeId",
        to = "super::shift_type::Column::Id"
    )]
    ShiftType,
    #[sea_orm(has_many = "super::signup::Entity")]
    Signups,
}

impl Related<ShiftTypeEntity> for Entity {
    fn to() -> RelationDef {
        Relation::ShiftType.def()
    }
}

impl Related<super::signup::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Signups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
