// src/slice.rs
//
// x-z plane slices of cell-centred dump variables.
//
// Spherical grids: the phi = 0 slice (k = 0) fills x > 0 and the phi = pi
// slice (k = n3/2) is mirrored onto x < 0, giving the full meridional plane.
// Each native cell becomes a quadrilateral whose corners are its native
// faces mapped through the coordinate system.

use crate::dump::{Dump, DumpError};

pub type Point = (f64, f64);

/// Plot window [xmin, xmax] × [zmin, zmax] in embedding units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub xmin: f64,
    pub xmax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl From<[f64; 4]> for Window {
    fn from(w: [f64; 4]) -> Self {
        Self {
            xmin: w[0],
            xmax: w[1],
            zmin: w[2],
            zmax: w[3],
        }
    }
}

impl Window {
    pub fn contains(&self, p: Point) -> bool {
        p.0 >= self.xmin && p.0 <= self.xmax && p.1 >= self.zmin && p.1 <= self.zmax
    }

    /// True if the bounding box of `pts` overlaps the window.
    pub fn overlaps(&self, pts: &[Point]) -> bool {
        let (mut x0, mut x1, mut z0, mut z1) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for &(x, z) in pts {
            x0 = x0.min(x);
            x1 = x1.max(x);
            z0 = z0.min(z);
            z1 = z1.max(z);
        }
        x1 >= self.xmin && x0 <= self.xmax && z1 >= self.zmin && z0 <= self.zmax
    }
}

/// One cell of the slice: a quadrilateral in (x, z) and its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XzCell {
    pub corners: [Point; 4],
    pub value: f64,
}

/// Build the full x-z plane of `var` from `dump`.
pub fn xz_cells(dump: &Dump, var: &str) -> Result<Vec<XzCell>, DumpError> {
    let g = dump.grid;
    let cs = dump.coords;
    let right = dump.slice_k(var, 0)?;
    let left = if cs.is_spherical() {
        Some(dump.slice_k(var, g.opposite_k())?)
    } else {
        None
    };

    let mut cells = Vec::with_capacity(g.n1 * g.n2 * if left.is_some() { 2 } else { 1 });
    for j in 0..g.n2 {
        for i in 0..g.n1 {
            let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)].map(|(ci, cj)| {
                let (x1, x2) = g.corner(ci, cj);
                cs.xz(x1, x2)
            });
            cells.push(XzCell {
                corners,
                value: right[[j, i]],
            });
            if let Some(left) = &left {
                cells.push(XzCell {
                    corners: corners.map(|(x, z)| (-x, z)),
                    value: left[[j, i]],
                });
            }
        }
    }
    Ok(cells)
}

/// Split a sequence into maximal runs of kept points; runs of one point are dropped.
pub fn split_runs<P, I, F>(pts: I, keep: F) -> Vec<Vec<P>>
where
    P: Copy,
    I: IntoIterator<Item = P>,
    F: Fn(P) -> bool,
{
    let mut out = Vec::new();
    let mut run = Vec::new();
    for p in pts {
        if keep(p) {
            run.push(p);
        } else if run.len() > 1 {
            out.push(std::mem::take(&mut run));
        } else {
            run.clear();
        }
    }
    if run.len() > 1 {
        out.push(run);
    }
    out
}

/// Pieces of a polyline whose vertices lie inside the window.
pub fn clip_polyline(line: &[Point], w: &Window) -> Vec<Vec<Point>> {
    split_runs(line.iter().copied(), |p| w.contains(p))
}

/// Sutherland-Hodgman clip of a polygon against the window.
pub fn clip_polygon(poly: &[Point], w: &Window) -> Vec<Point> {
    // (inside test, intersection with the edge line)
    type Edge = (fn(Point, &Window) -> bool, fn(Point, Point, &Window) -> Point);

    fn lerp_x(a: Point, b: Point, x: f64) -> Point {
        let t = (x - a.0) / (b.0 - a.0);
        (x, a.1 + t * (b.1 - a.1))
    }
    fn lerp_z(a: Point, b: Point, z: f64) -> Point {
        let t = (z - a.1) / (b.1 - a.1);
        (a.0 + t * (b.0 - a.0), z)
    }

    let edges: [Edge; 4] = [
        (|p, w| p.0 >= w.xmin, |a, b, w| lerp_x(a, b, w.xmin)),
        (|p, w| p.0 <= w.xmax, |a, b, w| lerp_x(a, b, w.xmax)),
        (|p, w| p.1 >= w.zmin, |a, b, w| lerp_z(a, b, w.zmin)),
        (|p, w| p.1 <= w.zmax, |a, b, w| lerp_z(a, b, w.zmax)),
    ];

    let mut out: Vec<Point> = poly.to_vec();
    for (inside, cross) in edges {
        if out.is_empty() {
            break;
        }
        let input = std::mem::take(&mut out);
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            match (inside(prev, w), inside(cur, w)) {
                (true, true) => out.push(cur),
                (true, false) => out.push(cross(prev, cur, w)),
                (false, true) => {
                    out.push(cross(prev, cur, w));
                    out.push(cur);
                }
                (false, false) => {}
            }
            prev = cur;
        }
    }
    out
}
