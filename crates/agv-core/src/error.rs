use thiserror::Error;

use crate::geom::Point;

/// Reasons a [`GridMap`](crate::GridMap) cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("grid must be at least 3x3, got {rows}x{cols}")]
    InvalidDimension { rows: i32, cols: i32 },

    #[error("physical floor size must be at least 1x1, got {width}x{height}")]
    InvalidActualDimension { width: f64, height: f64 },

    #[error("at least 2 stations are required, got {0}")]
    InvalidStationCount(usize),

    #[error("point {point} lies outside the {rows}x{cols} grid")]
    OutOfBounds { point: Point, rows: i32, cols: i32 },
}
