//! Common types, traits, and error definitions for rust_navigation
//!
//! This module provides the pose primitives, the polygon geometry used for
//! footprints, and the traits every planner and collaborator implements.

pub mod types;
pub mod geometry;
pub mod traits;
pub mod error;

pub use types::*;
pub use geometry::*;
pub use traits::*;
pub use error::*;
