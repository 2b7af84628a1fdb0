//! # Data Models
//!
//! This module contains the SeaORM entity models used throughout the Nova
//! Import service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod shift;
pub mod shift_type;
pub mod signup;
pub mod user;

pub use shift::Entity as Shift;
pub use shift_type::Entity as ShiftType;
pub use signup::Entity as Signup;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "nova-import".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
