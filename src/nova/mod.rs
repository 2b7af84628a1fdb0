//! Nova legacy admin client
//!
//! This module provides the read-only client for the legacy Nova admin API:
//! - Session-cookie authentication and paginated resource reads
//! - Parsing of Nova's field-array resource envelopes into typed structures
//!
//! Everything downstream of this module works with [`NovaResource`] values;
//! raw envelope JSON never escapes the client boundary.

pub mod client;
pub mod resource;

pub use client::{NovaClient, NovaCredentials, NovaError, PageEnvelope};
pub use resource::{FieldValue, NovaResource};
