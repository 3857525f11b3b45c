//! # exhibit-core
//!
//! Core types and primitives for the Exhibit scene composition engine.
//! This crate contains foundational types shared across all Exhibit crates:
//! vectors and bounding boxes, colors, time windows, configuration, content
//! hashing, and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod hash;
pub mod math;
pub mod time;

pub use config::*;

pub use color::Color;
pub use error::{ExhibitError, ExhibitResult};
pub use hash::ContentHash;
pub use math::{Aabb, Vec3};
pub use time::TimeWindow;
