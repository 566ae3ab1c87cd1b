// =============================================================================
// SHARED FOUNDATION - shared/src/lib.rs
// Types shared by the MsvmPkg build tooling
// =============================================================================

//! Shared build types for the Hyper-V UEFI firmware tooling
//!
//! Architecture and target identifiers used by the platform settings, and the
//! typed error enums every tool reports through.

pub mod types;

pub use types::error::{FlattenError, InvocableError, SettingsError};
pub use types::hardware::{BuildArchitecture, BuildTarget};
