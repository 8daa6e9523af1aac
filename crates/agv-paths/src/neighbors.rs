use agv_core::Point;

/// Which moves count as a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Connectivity {
    /// Axis-aligned moves only.
    #[default]
    Four,
    /// Axis-aligned and diagonal moves.
    Eight,
}

impl Connectivity {
    /// Whether `a` and `b` are one step apart under this connectivity.
    #[inline]
    pub fn adjacent(self, a: Point, b: Point) -> bool {
        match self {
            Connectivity::Four => a.is_adjacent_4(b),
            Connectivity::Eight => a.is_adjacent_8(b),
        }
    }
}

/// Cached neighbor computation helper.
///
/// Enumerates the neighbours of a grid point under a [`Connectivity`],
/// filtered by a predicate, reusing one buffer across calls.
pub struct Neighbors {
    buf: Vec<Point>,
}

impl Default for Neighbors {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighbors {
    /// Create a new `Neighbors` helper.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(8),
        }
    }

    /// Return 4-directional (cardinal) neighbors of `p`, keeping only those
    /// for which `keep` returns `true`.
    fn cardinal(&mut self, p: Point, keep: impl Fn(Point) -> bool) -> &[Point] {
        self.buf.clear();
        self.buf.extend(p.neighbors_4().into_iter().filter(|&n| keep(n)));
        &self.buf
    }

    /// Return 8-directional neighbors of `p`, keeping only those for which
    /// `keep` returns `true`.
    fn all(&mut self, p: Point, keep: impl Fn(Point) -> bool) -> &[Point] {
        self.buf.clear();
        self.buf.extend(p.neighbors_8().into_iter().filter(|&n| keep(n)));
        &self.buf
    }

    /// Neighbours of `p` one `conn` step away for which `keep` returns
    /// `true`.
    pub fn of(&mut self, conn: Connectivity, p: Point, keep: impl Fn(Point) -> bool) -> &[Point] {
        match conn {
            Connectivity::Four => self.cardinal(p, keep),
            Connectivity::Eight => self.all(p, keep),
        }
    }
}
