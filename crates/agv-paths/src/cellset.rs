use agv_core::{Point, Range};

/// A set of grid cells backed by a flat, generation-stamped array.
///
/// Membership is keyed by coordinate. [`clear`](CellSet::clear) is O(1): it
/// bumps the generation counter so stale stamps are ignored, which lets the
/// searches reuse one allocation for every segment they explore.
#[derive(Debug, Clone)]
pub struct CellSet {
    range: Range,
    stamps: Vec<u32>,
    generation: u32,
    len: usize,
}

impl CellSet {
    /// Create an empty set covering `range`.
    pub fn new(range: Range) -> Self {
        Self {
            range,
            stamps: vec![0; range.len()],
            generation: 1,
            len: 0,
        }
    }

    /// Create a set covering `range` holding every point of `points` that
    /// lies inside it.
    pub fn from_points(range: Range, points: impl IntoIterator<Item = Point>) -> Self {
        let mut set = Self::new(range);
        for p in points {
            set.insert(p);
        }
        set
    }

    /// Remove every point.
    pub fn clear(&mut self) {
        self.len = 0;
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: old stamps could alias the new generation.
            self.stamps.iter_mut().for_each(|s| *s = 0);
            self.generation = 1;
        }
    }

    /// Insert `p`. Returns `true` if it was not already present. Points
    /// outside the range are ignored and return `false`.
    pub fn insert(&mut self, p: Point) -> bool {
        let Some(i) = self.range.index(p) else {
            return false;
        };
        if self.stamps[i] == self.generation {
            return false;
        }
        self.stamps[i] = self.generation;
        self.len += 1;
        true
    }

    /// Remove `p`. Returns `true` if it was present.
    pub fn remove(&mut self, p: Point) -> bool {
        let Some(i) = self.range.index(p) else {
            return false;
        };
        if self.stamps[i] != self.generation {
            return false;
        }
        self.stamps[i] = 0;
        self.len -= 1;
        true
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.range
            .index(p)
            .is_some_and(|i| self.stamps[i] == self.generation)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
