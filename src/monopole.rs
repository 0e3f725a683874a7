// src/monopole.rs
//
// Analytic BZ monopole state on a spherical Kerr-Schild grid.
//
// Field from the vector potential A_phi = 1 - cos(th):
//   B1 = (1/gdet) dA/dX2 = sin(th) dth/dX2 / gdet
//   B2 = -(1/gdet) dA/dX1 = 0
// so poloidal field lines are purely radial.
// Atmosphere: rho = r^-3/2, u = r^-5/2 / 3 (Bondi-like power laws).
//
// Reference and test state only: it is not read from any dump. The unit
// tests and tests/batch.rs use it in place of a `.phdf` file so the slicing,
// field-line and rendering code can run without HDF5.

use ndarray::Array3;

use crate::coords::CoordinateSystem;
use crate::dump::{Dump, DumpError};
use crate::grid::NativeGrid;

/// Geometry of a synthetic monopole snapshot (test and reference use).
#[derive(Debug, Clone, Copy)]
pub struct MonopoleSetup {
    pub n: [usize; 3],
    pub a: f64,
    pub hslope: f64,
    pub r_in: f64,
    pub r_out: f64,
    pub t: f64,
}

impl Default for MonopoleSetup {
    fn default() -> Self {
        Self {
            n: [64, 32, 1],
            a: 0.9375,
            hslope: 0.3,
            r_in: 1.2,
            r_out: 100.0,
            t: 0.0,
        }
    }
}

impl MonopoleSetup {
    pub fn grid(&self) -> NativeGrid {
        let x1_in = self.r_in.ln();
        let x1_out = self.r_out.ln();
        NativeGrid::new(
            self.n,
            [x1_in, 0.0, 0.0],
            [
                (x1_out - x1_in) / self.n[0] as f64,
                1.0 / self.n[1] as f64,
                2.0 * std::f64::consts::PI / self.n[2] as f64,
            ],
        )
    }

    pub fn coords(&self) -> CoordinateSystem {
        CoordinateSystem::Mks {
            a: self.a,
            hslope: self.hslope,
        }
    }

    /// Build the dump with `rho`, `u`, `U1..U3` and `B1..B3`.
    pub fn build(&self) -> Result<Dump, DumpError> {
        let grid = self.grid();
        let coords = self.coords();
        let shape = (grid.n3, grid.n2, grid.n1);

        let mut rho = Array3::zeros(shape);
        let mut u = Array3::zeros(shape);
        let mut b1 = Array3::zeros(shape);

        for k in 0..grid.n3 {
            for j in 0..grid.n2 {
                for i in 0..grid.n1 {
                    let (x1, x2) = grid.center(i, j);
                    let (r, th) = coords.r_th(x1, x2);
                    // finite difference of th keeps B1 consistent with the
                    // discrete flux function used for field lines
                    let h = 1e-6;
                    let dth = (coords.r_th(x1, x2 + h).1 - coords.r_th(x1, x2 - h).1) / (2.0 * h);

                    rho[[k, j, i]] = r.powf(-1.5);
                    u[[k, j, i]] = r.powf(-2.5) / 3.0;
                    b1[[k, j, i]] = th.sin() * dth / coords.gdet(x1, x2);
                }
            }
        }

        let mut dump = Dump::new(grid, coords, self.t);
        let fields = [
            ("rho", rho),
            ("u", u),
            ("U1", Array3::zeros(shape)),
            ("U2", Array3::zeros(shape)),
            ("U3", Array3::zeros(shape)),
            ("B1", b1),
            ("B2", Array3::zeros(shape)),
            ("B3", Array3::zeros(shape)),
        ];
        for (name, data) in fields {
            dump.insert(name, data)?;
        }
        Ok(dump)
    }
}

/// Monopole dump with default geometry at time `t`.
pub fn bz_monopole(t: f64) -> Result<Dump, DumpError> {
    MonopoleSetup {
        t,
        ..MonopoleSetup::default()
    }
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::PRIM_NAMES;

    #[test]
    fn monopole_has_all_primitives() {
        let d = bz_monopole(1.5).unwrap();
        for name in PRIM_NAMES {
            assert!(d.has(name), "missing {name}");
        }
        assert_eq!(d.t, 1.5);
    }

    #[test]
    fn radial_flux_through_shells_is_constant() {
        // integral of gdet*B1 over X2 equals 2 (= [1 - cos th] from 0 to pi)
        let setup = MonopoleSetup::default();
        let d = setup.build().unwrap();
        let b1 = d.phi_average("B1").unwrap();
        let g = d.grid;
        for &i in &[0usize, g.n1 / 2, g.n1 - 1] {
            let mut flux = 0.0;
            for j in 0..g.n2 {
                let (x1, x2) = g.center(i, j);
                flux += d.coords.gdet(x1, x2) * b1[[j, i]] * g.dx[1];
            }
            assert!(
                (flux - 2.0).abs() < 1e-2,
                "flux at i={i} should be ~2, got {flux}"
            );
        }
    }

    #[test]
    fn density_falls_off_with_radius() {
        let d = bz_monopole(0.0).unwrap();
        let rho = d.slice_k("rho", 0).unwrap();
        assert!(rho[[8, 0]] > rho[[8, d.grid.n1 - 1]]);
    }
}
