//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, plus the [`HistoryStore`] trait the
//! import orchestrator persists through. The trait keeps the orchestrator
//! independent of the concrete database so tests can substitute an in-memory
//! store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{shift, shift_type, signup, user};
use crate::models::signup::SignupStatus;

pub mod shift_repo;
pub mod shift_type_repo;
pub mod signup_repo;
pub mod user_repo;

pub use shift_repo::ShiftRepository;
pub use shift_type_repo::ShiftTypeRepository;
pub use signup_repo::SignupRepository;
pub use user_repo::UserRepository;

/// Fields for a user row to be created during an import.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Stored lowercased; the unique key
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Fields for a shift row to be created during an import.
#[derive(Debug, Clone)]
pub struct NewShift {
    pub shift_type_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: i32,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub legacy_event_id: Option<i64>,
}

/// Fields for a signup row to be created during an import.
#[derive(Debug, Clone)]
pub struct NewSignup {
    pub user_id: Uuid,
    pub shift_id: Uuid,
    pub status: SignupStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Persistence capability the import orchestrator writes through.
///
/// Find-or-create semantics only: the orchestrator always looks up before it
/// creates, and never updates or deletes rows it did not create.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError>;

    async fn create_user(&self, new_user: NewUser) -> Result<user::Model, StoreError>;

    async fn find_shift_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<shift_type::Model>, StoreError>;

    async fn create_shift_type(&self, name: &str) -> Result<shift_type::Model, StoreError>;

    async fn find_shift_by_legacy_event(
        &self,
        legacy_event_id: i64,
    ) -> Result<Option<shift::Model>, StoreError>;

    async fn create_shift(&self, new_shift: NewShift) -> Result<shift::Model, StoreError>;

    async fn find_signup(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
    ) -> Result<Option<signup::Model>, StoreError>;

    async fn create_signup(&self, new_signup: NewSignup) -> Result<signup::Model, StoreError>;
}

/// [`HistoryStore`] backed by the live database, delegating to the per-entity
/// repositories.
#[derive(Clone)]
pub struct DbHistoryStore {
    db: DatabaseConnection,
}

impl DbHistoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryStore for DbHistoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError> {
        UserRepository::new(&self.db).find_by_email(email).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<user::Model, StoreError> {
        UserRepository::new(&self.db).create(new_user).await
    }

    async fn find_shift_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<shift_type::Model>, StoreError> {
        ShiftTypeRepository::new(&self.db).find_by_name(name).await
    }

    async fn create_shift_type(&self, name: &str) -> Result<shift_type::Model, StoreError> {
        ShiftTypeRepository::new(&self.db).create(name).await
    }

    async fn find_shift_by_legacy_event(
        &self,
        legacy_event_id: i64,
    ) -> Result<Option<shift::Model>, StoreError> {
        ShiftRepository::new(&self.db)
            .find_by_legacy_event(legacy_event_id)
            .await
    }

    async fn create_shift(&self, new_shift: NewShift) -> Result<shift::Model, StoreError> {
        ShiftRepository::new(&self.db).create(new_shift).await
    }

    async fn find_signup(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
    ) -> Result<Option<signup::Model>, StoreError> {
        SignupRepository::new(&self.db)
            .find_by_user_and_shift(user_id, shift_id)
            .await
    }

    async fn create_signup(&self, new_signup: NewSignup) -> Result<signup::Model, StoreError> {
        SignupRepository::new(&self.db).create(new_signup).await
    }
}
