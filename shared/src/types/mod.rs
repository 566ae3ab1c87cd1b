// =============================================================================
// SHARED TYPE ORGANIZATION - shared/src/types/mod.rs
// =============================================================================

pub use self::error::*;
pub use self::hardware::*;

pub mod hardware;
pub mod error;
