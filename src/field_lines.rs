// src/field_lines.rs
//
// Poloidal magnetic field lines as contours of the flux function
//
//   A_phi(i, j) = int_0^{X1_i} gdet B2 dX1  -  int_0^{X2_j} gdet B1 dX2
//
// (trapezoidal rule over cell centres, phi-averaged B), shifted so that
// min A_phi = 0. Contours are traced in native coordinates and then mapped
// into the x-z plane.

use contour::ContourBuilder;
use ndarray::Array2;

use crate::dump::{Dump, DumpError};
use crate::slice::{split_runs, Point};

/// Trapezoidal integral of evenly spaced samples.
fn trapz(values: impl Iterator<Item = f64>, dx: f64) -> f64 {
    let mut sum = 0.0;
    let mut first = None;
    let mut last = 0.0;
    let mut n = 0usize;
    for v in values {
        first.get_or_insert(v);
        sum += v;
        last = v;
        n += 1;
    }
    match (n, first) {
        (0 | 1, _) | (_, None) => 0.0,
        (_, Some(f)) => dx * (sum - 0.5 * (f + last)),
    }
}

/// Flux function on cell centres, shape (n2, n1), with minimum 0.
pub fn flux_function(dump: &Dump) -> Result<Array2<f64>, DumpError> {
    let g = dump.grid;
    let b1 = dump.phi_average("B1")?;
    let b2 = dump.phi_average("B2")?;

    let gdet = Array2::from_shape_fn((g.n2, g.n1), |(j, i)| {
        let (x1, x2) = g.center(i, j);
        dump.coords.gdet(x1, x2)
    });

    let mut aphi = Array2::zeros((g.n2, g.n1));
    for j in 0..g.n2 {
        for i in 0..g.n1 {
            let along_x1 = trapz((0..=i).map(|ii| gdet[[j, ii]] * b2[[j, ii]]), g.dx[0]);
            let along_x2 = trapz((0..=j).map(|jj| gdet[[jj, i]] * b1[[jj, i]]), g.dx[1]);
            aphi[[j, i]] = along_x1 - along_x2;
        }
    }

    let min = aphi.iter().copied().filter(|v: &f64| v.is_finite()).fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        aphi.mapv_inplace(|v| v - min);
    }
    Ok(aphi)
}

/// `2 * nlines` evenly spaced levels in [0, max].
pub fn levels(max: f64, nlines: usize) -> Vec<f64> {
    let n = 2 * nlines;
    match n {
        0 => vec![],
        1 => vec![0.0],
        _ => (0..n).map(|k| max * k as f64 / (n - 1) as f64).collect(),
    }
}

/// Field lines of `dump` as polylines in the x-z plane.
///
/// Spherical dumps get both half-planes (x and -x).
pub fn field_lines(dump: &Dump, nlines: usize) -> Result<Vec<Vec<Point>>, DumpError> {
    let g = dump.grid;
    if g.n1 < 2 || g.n2 < 2 {
        return Ok(vec![]);
    }
    let aphi = flux_function(dump)?;
    let max = aphi.iter().copied().filter(|v: &f64| v.is_finite()).fold(0.0, f64::max);
    if max <= 0.0 {
        return Ok(vec![]);
    }
    let thresholds = levels(max, nlines);

    // value (i, j) sits at the centre of cell (i, j)
    let builder = ContourBuilder::new(g.n1, g.n2, true)
        .x_step(g.dx[0])
        .y_step(g.dx[1])
        .x_origin(g.startx[0])
        .y_origin(g.startx[1]);
    let values: Vec<f64> = aphi.iter().copied().collect();
    let contours = builder
        .lines(&values, &thresholds)
        .map_err(|e| DumpError::Unsupported(format!("contouring failed: {e}")))?;

    // The tracer closes isolines around the grid edge half a cell outside the
    // outermost centres; drop anything beyond the centre hull.
    let (c1_lo, c2_lo) = g.center(0, 0);
    let (c1_hi, c2_hi) = g.center(g.n1 - 1, g.n2 - 1);
    let (e1, e2) = (0.25 * g.dx[0], 0.25 * g.dx[1]);
    let inside = |x1: f64, x2: f64| {
        x1 >= c1_lo - e1 && x1 <= c1_hi + e1 && x2 >= c2_lo - e2 && x2 <= c2_hi + e2
    };

    let mut native: Vec<Vec<(f64, f64)>> = Vec::new();
    for line in &contours {
        for ls in line.geometry().0.iter() {
            native.extend(split_runs(ls.0.iter().map(|c| (c.x, c.y)), |(x1, x2)| inside(x1, x2)));
        }
    }

    let cs = dump.coords;
    let mut out = Vec::with_capacity(native.len() * 2);
    for run in native {
        let right: Vec<Point> = run.iter().map(|&(x1, x2)| cs.xz(x1, x2)).collect();
        if cs.is_spherical() {
            out.push(right.iter().map(|&(x, z)| (-x, z)).collect());
        }
        out.push(right);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monopole::bz_monopole;

    #[test]
    fn trapz_matches_hand_values() {
        assert_eq!(trapz([].into_iter(), 1.0), 0.0);
        assert_eq!(trapz([3.0].into_iter(), 1.0), 0.0);
        // (1 + 2)/2 + (2 + 3)/2 = 4
        assert!((trapz([1.0, 2.0, 3.0].into_iter(), 1.0) - 4.0).abs() < 1e-12);
        assert!((trapz([1.0, 2.0, 3.0].into_iter(), 0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn levels_span_zero_to_max() {
        let l = levels(2.0, 2);
        assert_eq!(l.len(), 4);
        assert_eq!(l[0], 0.0);
        assert!((l[3] - 2.0).abs() < 1e-12);
        assert!(levels(1.0, 0).is_empty());
    }

    #[test]
    fn monopole_flux_depends_on_theta_only() {
        let d = bz_monopole(0.0).unwrap();
        let a = flux_function(&d).unwrap();
        let g = d.grid;
        for j in 0..g.n2 {
            let row0 = a[[j, 0]];
            for i in 1..g.n1 {
                assert!(
                    (a[[j, i]] - row0).abs() < 1e-9,
                    "A_phi varies along X1 at j={j}: {} vs {}",
                    a[[j, i]],
                    row0
                );
            }
        }
        // decreasing from the north pole, zero at the south pole
        assert!(a[[g.n2 - 1, 0]].abs() < 1e-12);
        for j in 1..g.n2 {
            assert!(a[[j - 1, 0]] > a[[j, 0]], "A_phi not monotonic at j={j}");
        }
    }

    #[test]
    fn monopole_field_lines_are_radial() {
        let d = bz_monopole(0.0).unwrap();
        let lines = field_lines(&d, 8).unwrap();
        assert!(!lines.is_empty());
        for line in &lines {
            // every vertex of one line shares the polar angle
            let ang: Vec<f64> = line.iter().map(|&(x, z)| x.atan2(z)).collect();
            let a0 = ang[0];
            for a in &ang {
                assert!((a - a0).abs() < 1e-3, "line bends: {a} vs {a0}");
            }
        }
    }

    #[test]
    fn lines_are_mirrored_for_spherical_dumps() {
        let d = bz_monopole(0.0).unwrap();
        let lines = field_lines(&d, 4).unwrap();
        assert_eq!(lines.len() % 2, 0);
        for pair in lines.chunks(2) {
            assert_eq!(pair[0].len(), pair[1].len());
            assert!((pair[0][0].0 + pair[1][0].0).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_field_components_are_reported() {
        let full = bz_monopole(0.0).unwrap();
        let b1 = full.var("B1").unwrap().into_owned();
        let d = Dump::new(full.grid, full.coords, full.t)
            .with_field("B1", b1)
            .unwrap();
        assert!(matches!(
            flux_function(&d),
            Err(DumpError::MissingVariable(name)) if name == "B2"
        ));
    }
}
