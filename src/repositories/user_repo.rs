//! # User Repository
//!
//! Email-keyed lookup and creation of volunteer users.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::user::{ActiveModel, Column, Entity as User, Model};
use crate::repositories::NewUser;

/// Repository for user database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Look up a user by email, case-insensitively. Emails are stored
    /// lowercased, so the input is lowercased before comparison.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Model>, StoreError> {
        let user = User::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(self.db)
            .await?;

        Ok(user)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<Model, StoreError> {
        let now = Utc::now();

        let user = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email.to_lowercase()),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            phone: Set(new_user.phone),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(user.insert(self.db).await?)
    }
}
