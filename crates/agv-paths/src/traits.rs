use agv_core::{GridMap, Point, Range};

/// Minimal search interface: the area being searched and which cells in it
/// a vehicle may occupy.
pub trait Terrain {
    /// Rectangle every searched point lies in.
    fn bounds(&self) -> Range;

    /// Whether a vehicle may stand on `p`. Must be `false` outside
    /// [`bounds`](Terrain::bounds).
    fn passable(&self, p: Point) -> bool;
}

impl Terrain for GridMap {
    #[inline]
    fn bounds(&self) -> Range {
        GridMap::bounds(self)
    }

    #[inline]
    fn passable(&self, p: Point) -> bool {
        self.is_passable(p)
    }
}
