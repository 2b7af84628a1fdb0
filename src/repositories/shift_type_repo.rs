//! # Shift Type Repository

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::shift_type::{ActiveModel, Column, Entity as ShiftType, Model};

/// Repository for shift type database operations
pub struct ShiftTypeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ShiftTypeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Model>, StoreError> {
        let shift_type = ShiftType::find()
            .filter(Column::Name.eq(name))
            .one(self.db)
            .await?;

        Ok(shift_type)
    }

    pub async fn create(&self, name: &str) -> Result<Model, StoreError> {
        let shift_type = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        };

        Ok(shift_type.insert(self.db).await?)
    }
}
