//! # Poise-Core
//!
//! Core types and utilities for the Poise nonverbal behavior analysis
//! system: landmark sets as delivered by an external detection provider,
//! the anatomical index schema they follow, and the typed metric values
//! every feature record is reduced to.

pub mod error;
pub mod geometry;
pub mod metric;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use metric::*;
pub use types::*;
