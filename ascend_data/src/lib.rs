//! Shared data model for Ascend progression content.
//!
//! Everything here is plain data plus pure functions: configuration entities,
//! their partial override documents, the experience curves and validation.

pub mod curve;
pub mod defs;
pub mod merge;
pub mod validate;

pub use defs::*;
pub use merge::*;
pub use validate::{ValidationError, validate_action_set, validate_category};
