//! Finding the cells where solved routes cross each other.

use std::collections::BTreeSet;

use agv_core::Point;

/// Cells where segments of different routes intersect, plus (with
/// `include_self`) cells where a route crosses one of its own non-adjacent
/// segments.
///
/// Routes are split into consecutive-pair segments and tested with exact
/// integer arithmetic. Only crossings landing on an integer cell count.
/// Parallel and collinear segment pairs are not reported.
pub fn find_intersections<R: AsRef<[Point]>>(routes: &[R], include_self: bool) -> BTreeSet<Point> {
    let mut found = BTreeSet::new();
    for (i, a) in routes.iter().enumerate() {
        let a = a.as_ref();
        if include_self {
            for (j, sa) in a.windows(2).enumerate() {
                for sb in a.windows(2).skip(j + 2) {
                    found.extend(crossing(sa[0], sa[1], sb[0], sb[1]));
                }
            }
        }
        for b in &routes[i + 1..] {
            for sa in a.windows(2) {
                for sb in b.as_ref().windows(2) {
                    found.extend(crossing(sa[0], sa[1], sb[0], sb[1]));
                }
            }
        }
    }
    found
}

/// The integer cell where segment `p0-p1` meets segment `q0-q1`, if any.
fn crossing(p0: Point, p1: Point, q0: Point, q1: Point) -> Option<Point> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = r.cross(s);
    if denom == 0 {
        return None;
    }
    let qp = q0 - p0;
    let t_num = qp.cross(s);
    let u_num = qp.cross(r);
    // Normalize so the parameter test is 0 <= num <= denom.
    let (denom, t_num, u_num) = if denom < 0 {
        (-denom, -t_num, -u_num)
    } else {
        (denom, t_num, u_num)
    };
    if !(0..=denom).contains(&t_num) || !(0..=denom).contains(&u_num) {
        return None;
    }
    let dr = i64::from(r.row) * t_num;
    let dc = i64::from(r.col) * t_num;
    if dr % denom != 0 || dc % denom != 0 {
        return None;
    }
    Some(Point::new(
        p0.row + (dr / denom) as i32,
        p0.col + (dc / denom) as i32,
    ))
}
