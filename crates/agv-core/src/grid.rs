//! The [`GridMap`] type: the floor matrix a planning request runs against.
//!
//! A `GridMap` is built once per request and is immutable afterwards, with
//! the exception of the [`solution`](GridMap::solution) slot, which each
//! pipeline stage overwrites (raw route first, smoothed route second).

use crate::cell::{Category, PathPoint};
use crate::error::MapError;
use crate::geom::{Point, Range};

/// Smallest accepted grid side, in cells.
pub const MIN_DIMENSION: i32 = 3;

/// Smallest accepted number of stations in the visiting order.
pub const MIN_STATIONS: usize = 2;

/// A `rows × cols` matrix of [`PathPoint`]s plus the ordered stations a
/// vehicle must visit.
#[derive(Debug, Clone)]
pub struct GridMap {
    bounds: Range,
    width_length: f64,
    height_length: f64,
    cells: Vec<PathPoint>,
    stations: Vec<Point>,
    solution: Vec<Point>,
}

impl GridMap {
    /// Build a map.
    ///
    /// `width_length` and `height_length` give the physical floor size; they
    /// only matter for scoring. Cells not mentioned in `points` default to
    /// [`Category::Path`]. A later entry for the same coordinate replaces an
    /// earlier one.
    pub fn new(
        rows: i32,
        cols: i32,
        width_length: f64,
        height_length: f64,
        points: impl IntoIterator<Item = PathPoint>,
        stations: Vec<Point>,
    ) -> Result<Self, MapError> {
        if rows < MIN_DIMENSION || cols < MIN_DIMENSION {
            return Err(MapError::InvalidDimension { rows, cols });
        }
        if width_length < 1.0 || height_length < 1.0 {
            return Err(MapError::InvalidActualDimension {
                width: width_length,
                height: height_length,
            });
        }
        if stations.len() < MIN_STATIONS {
            return Err(MapError::InvalidStationCount(stations.len()));
        }

        let bounds = Range::with_size(rows, cols);
        let mut cells: Vec<PathPoint> = bounds.iter().map(PathPoint::new).collect();

        for point in points {
            let Some(i) = bounds.index(point.pos) else {
                return Err(MapError::OutOfBounds {
                    point: point.pos,
                    rows,
                    cols,
                });
            };
            cells[i] = point;
        }
        if let Some(&point) = stations.iter().find(|p| !bounds.contains(**p)) {
            return Err(MapError::OutOfBounds { point, rows, cols });
        }

        Ok(Self {
            bounds,
            width_length,
            height_length,
            cells,
            stations,
            solution: Vec::new(),
        })
    }

    /// The bounding range of the matrix.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    #[inline]
    pub fn rows(&self) -> i32 {
        self.bounds.rows()
    }

    #[inline]
    pub fn cols(&self) -> i32 {
        self.bounds.cols()
    }

    /// The cell at `p`, or `None` when `p` is outside the matrix.
    pub fn point_at(&self, p: Point) -> Option<&PathPoint> {
        self.bounds.index(p).map(|i| &self.cells[i])
    }

    /// Category of the cell at `p`, or `None` outside the matrix.
    #[inline]
    pub fn category_at(&self, p: Point) -> Option<Category> {
        self.point_at(p).map(|c| c.category)
    }

    /// Whether `p` is inside the matrix and not an obstacle.
    #[inline]
    pub fn is_passable(&self, p: Point) -> bool {
        self.point_at(p).is_some_and(PathPoint::is_passable)
    }

    /// Service time of the cell at `p` in seconds (0 outside the matrix).
    #[inline]
    pub fn service_time_at(&self, p: Point) -> f64 {
        self.point_at(p).map_or(0.0, |c| c.service_time)
    }

    /// Physical side of one cell:
    /// `sqrt((width · height) / (rows · cols))`.
    pub fn square_length(&self) -> f64 {
        let area = self.width_length * self.height_length;
        let cells = f64::from(self.rows()) * f64::from(self.cols());
        (area / cells).sqrt()
    }

    /// The ordered stations a route must visit.
    #[inline]
    pub fn stations(&self) -> &[Point] {
        &self.stations
    }

    /// The current contents of the solution slot.
    #[inline]
    pub fn solution(&self) -> &[Point] {
        &self.solution
    }

    /// Overwrite the solution slot.
    pub fn set_solution(&mut self, route: Vec<Point>) {
        self.solution = route;
    }

    /// Resolve a coordinate route into the cells it passes through.
    /// Coordinates outside the matrix are skipped.
    pub fn resolve(&self, route: &[Point]) -> Vec<&PathPoint> {
        route.iter().filter_map(|&p| self.point_at(p)).collect()
    }
}
