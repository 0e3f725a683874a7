// src/grid.rs

/// Uniform logically-Cartesian grid in native coordinates (X1, X2, X3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeGrid {
    pub n1: usize,
    pub n2: usize,
    pub n3: usize,
    /// Coordinate of the first face in each direction.
    pub startx: [f64; 3],
    /// Cell width in each direction.
    pub dx: [f64; 3],
}

impl NativeGrid {
    /// Create a grid with n1 × n2 × n3 cells starting at `startx` with spacings `dx`.
    pub fn new(n: [usize; 3], startx: [f64; 3], dx: [f64; 3]) -> Self {
        Self {
            n1: n[0],
            n2: n[1],
            n3: n[2],
            startx,
            dx,
        }
    }

    /// Native (X1, X2) at the centre of cell (i, j).
    #[inline]
    pub fn center(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.startx[0] + (i as f64 + 0.5) * self.dx[0],
            self.startx[1] + (j as f64 + 0.5) * self.dx[1],
        )
    }

    /// Native (X1, X2) at the lower-left face corner of cell (i, j).
    /// `i == n1` / `j == n2` give the outer faces.
    #[inline]
    pub fn corner(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.startx[0] + i as f64 * self.dx[0],
            self.startx[1] + j as f64 * self.dx[1],
        )
    }

    /// Index of the φ = π slice used for the mirrored half-plane.
    pub fn opposite_k(&self) -> usize {
        self.n3 / 2
    }
}
