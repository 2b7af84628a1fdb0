//! # Shift Repository
//!
//! Shifts imported from the legacy system are looked up by their
//! `legacy_event_id` column; that lookup is what makes re-imports idempotent.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::shift::{ActiveModel, Column, Entity as Shift, Model};
use crate::repositories::NewShift;

/// Repository for shift database operations
pub struct ShiftRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ShiftRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_legacy_event(
        &self,
        legacy_event_id: i64,
    ) -> Result<Option<Model>, StoreError> {
        let shift = Shift::find()
            .filter(Column::LegacyEventId.eq(legacy_event_id))
            .one(self.db)
            .await?;

        Ok(shift)
    }

    pub async fn create(&self, new_shift: NewShift) -> Result<Model, StoreError> {
        let now = Utc::now();

        let shift = ActiveModel {
            id: Set(Uuid::new_v4()),
            shift_type_id: Set(new_shift.shift_type_id),
            starts_at: Set(new_shift.starts_at.into()),
            ends_at: Set(new_shift.ends_at.into()),
            capacity: Set(new_shift.capacity),
            location: Set(new_shift.location),
            notes: Set(new_shift.notes),
            legacy_event_id: Set(new_shift.legacy_event_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(shift.insert(self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::ShiftTypeRepository;
    use migration::MigratorTrait;

    async fn setup_db() -> DatabaseConnection {
        let db = sea_orm::Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
    }

    #[tokio::test]
    async fn find_by_legacy_event_round_trip() {
        let db = setup_db().await;
        let shift_type = ShiftTypeRepository::new(&db)
            .create("General Volunteering")
            .await
            .unwrap();
        let repo = ShiftRepository::new(&db);

        assert!(repo.find_by_legacy_event(42).await.unwrap().is_none());

        let now = Utc::now();
        let created = repo
            .create(NewShift {
                shift_type_id: shift_type.id,
                starts_at: now,
                ends_at: now + chrono::Duration::hours(4),
                capacity: 5,
                location: Some("Main Hall".to_string()),
                notes: Some("Nova ID: 42".to_string()),
                legacy_event_id: Some(42),
            })
            .await
            .unwrap();

        let found = repo.find_by_legacy_event(42).await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(created.id));
    }

    #[tokio::test]
    async fn duplicate_legacy_event_id_is_rejected() {
        let db = setup_db().await;
        let shift_type = ShiftTypeRepository::new(&db)
            .create("General Volunteering")
            .await
            .unwrap();
        let repo = ShiftRepository::new(&db);

        let now = Utc::now();
        let new_shift = NewShift {
            shift_type_id: shift_type.id,
            starts_at: now,
            ends_at: now,
            capacity: 1,
            location: None,
            notes: None,
            legacy_event_id: Some(7),
        };

        repo.create(new_shift.clone()).await.unwrap();
        assert!(repo.create(new_shift).await.is_err());
    }
}
