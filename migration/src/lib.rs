//! Database migrations for the Nova Import service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_10_100000_create_users;
mod m2026_01_10_100100_create_shift_types;
mod m2026_01_10_100200_create_shifts;
mod m2026_01_10_100300_create_signups;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_10_100000_create_users::Migration),
            Box::new(m2026_01_10_100100_create_shift_types::Migration),
            Box::new(m2026_01_10_100200_create_shifts::Migration),
            Box::new(m2026_01_10_100300_create_signups::Migration),
        ]
    }
}
