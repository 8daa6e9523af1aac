//! **agv-core**: floor model for AGV route planning (core types).
//!
//! This crate provides the foundational types used across the planner:
//! `(row, col)` geometry primitives, typed floor cells, and the immutable
//! [`GridMap`] that every solver runs against.

pub mod cell;
pub mod error;
pub mod geom;
pub mod grid;

pub use cell::{Category, PathPoint};
pub use error::MapError;
pub use geom::{Point, Range};
pub use grid::GridMap;
