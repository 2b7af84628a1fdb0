//! # Signup Repository

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::signup::{ActiveModel, Column, Entity as Signup, Model};
use crate::repositories::NewSignup;

/// Repository for signup database operations
pub struct SignupRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SignupRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_user_and_shift(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
    ) -> Result<Option<Model>, StoreError> {
        let signup = Signup::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ShiftId.eq(shift_id))
            .one(self.db)
            .await?;

        Ok(signup)
    }

    pub async fn create(&self, new_signup: NewSignup) -> Result<Model, StoreError> {
        let now = Utc::now();

        let signup = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new_signup.user_id),
            shift_id: Set(new_signup.shift_id),
            status: Set(new_signup.status.as_str().to_string()),
            created_at: Set(new_signup.created_at.unwrap_or(now).into()),
            updated_at: Set(new_signup.updated_at.unwrap_or(now).into()),
        };

        Ok(signup.insert(self.db).await?)
    }
}
