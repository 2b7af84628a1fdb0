//! History import pipeline
//!
//! This module drives the migration of historical volunteer activity out of
//! the legacy Nova admin panel:
//! - `status`: pure inclusion rules deciding which legacy applications import
//! - `transform`: mapping of legacy resources to local entity fields
//! - `orchestrator`: the per-user state machine tying lookup, pagination,
//!   filtering, transformation and persistence together

pub mod orchestrator;
pub mod status;
pub mod transform;

pub use orchestrator::{
    BatchImportSummary, HistoryImporter, ImportOptions, UserImportResult, UserImportStatus,
};
pub use status::{ApplicationStatus, categorize, should_import};
pub use transform::{ShiftDraft, TransformError, transform_event, transform_signup, transform_user};
