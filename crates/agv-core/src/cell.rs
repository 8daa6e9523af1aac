//! The [`PathPoint`] type: a typed cell of the floor grid.

use std::hash::{Hash, Hasher};

use crate::geom::Point;

/// What occupies a grid cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Category {
    /// Impassable cell.
    Obstacle,
    /// Free floor a vehicle may traverse.
    #[default]
    Path,
    /// A load/unload point. Traversable.
    Station,
}

impl Category {
    /// Whether a vehicle may occupy a cell of this category.
    #[inline]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Category::Obstacle)
    }
}

/// A named, typed cell of the floor.
///
/// Equality and hashing only look at the coordinate, so two `PathPoint`s
/// describing the same cell are interchangeable as set or map keys.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPoint {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub pos: Point,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Category,
    /// Seconds a vehicle is held at this cell (stations only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub service_time: f64,
}

impl PathPoint {
    /// A plain path cell at `pos`, named after its coordinate.
    pub fn new(pos: Point) -> Self {
        Self {
            name: format!("{}_{}", pos.row, pos.col),
            pos,
            category: Category::Path,
            service_time: 0.0,
        }
    }

    /// Set the category (builder).
    #[inline]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the service time in seconds (builder).
    #[inline]
    pub fn with_service_time(mut self, secs: f64) -> Self {
        self.service_time = secs;
        self
    }

    /// Set the name (builder).
    #[inline]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn is_passable(&self) -> bool {
        self.category.is_passable()
    }
}

impl PartialEq for PathPoint {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl Eq for PathPoint {}

impl Hash for PathPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pos.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_payload() {
        let a = PathPoint::new(Point::new(1, 1)).with_name("a");
        let b = PathPoint::new(Point::new(1, 1))
            .with_name("b")
            .with_category(Category::Station)
            .with_service_time(30.0);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn default_name_is_coordinate() {
        assert_eq!(PathPoint::new(Point::new(3, 7)).name, "3_7");
    }

    #[test]
    fn only_obstacles_block() {
        assert!(!Category::Obstacle.is_passable());
        assert!(Category::Path.is_passable());
        assert!(Category::Station.is_passable());
    }
}
