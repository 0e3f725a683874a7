// src/coords.rs
//
// Native -> embedding coordinate maps for the dumps we plot.
//
// Spherical systems use Kerr-Schild as the base metric:
//   r = exp(X1)
//   th = pi*X2                                   (EKS)
//   th = pi*X2 + 0.5*(1 - hslope)*sin(2*pi*X2)   (MKS)
// and sqrt(-g) = (r^2 + a^2 cos^2 th) |sin th| * dr/dX1 * dth/dX2.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateSystem {
    /// 2D grid already laid out in the x-z plane (X1 = x, X2 = z).
    Cartesian,
    /// Exponential Kerr-Schild.
    Eks { a: f64 },
    /// Modified Kerr-Schild: midplane-concentrated theta.
    Mks { a: f64, hslope: f64 },
}

impl CoordinateSystem {
    /// Parse a transform name as written in dump parameters.
    pub fn from_name(name: &str, a: f64, hslope: Option<f64>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cartesian" | "minkowski" | "null" => Some(Self::Cartesian),
            "eks" | "exponential" => Some(Self::Eks { a }),
            "mks" | "modified" => Some(Self::Mks {
                a,
                hslope: hslope.unwrap_or(1.0),
            }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cartesian => "cartesian",
            Self::Eks { .. } => "eks",
            Self::Mks { .. } => "mks",
        }
    }

    pub fn is_spherical(&self) -> bool {
        !matches!(self, Self::Cartesian)
    }

    /// Black hole spin (0 for flat systems).
    pub fn spin(&self) -> f64 {
        match *self {
            Self::Cartesian => 0.0,
            Self::Eks { a } | Self::Mks { a, .. } => a,
        }
    }

    /// (r, th) for spherical systems; (X1, X2) unchanged for Cartesian.
    #[inline]
    pub fn r_th(&self, x1: f64, x2: f64) -> (f64, f64) {
        match *self {
            Self::Cartesian => (x1, x2),
            Self::Eks { .. } => (x1.exp(), PI * x2),
            Self::Mks { hslope, .. } => (
                x1.exp(),
                PI * x2 + 0.5 * (1.0 - hslope) * (2.0 * PI * x2).sin(),
            ),
        }
    }

    /// Embedding (x, z) in the phi = 0 half-plane.
    #[inline]
    pub fn xz(&self, x1: f64, x2: f64) -> (f64, f64) {
        match self {
            Self::Cartesian => (x1, x2),
            _ => {
                let (r, th) = self.r_th(x1, x2);
                (r * th.sin(), r * th.cos())
            }
        }
    }

    #[inline]
    fn dth_dx2(&self, x2: f64) -> f64 {
        match *self {
            Self::Cartesian => 1.0,
            Self::Eks { .. } => PI,
            Self::Mks { hslope, .. } => PI * (1.0 + (1.0 - hslope) * (2.0 * PI * x2).cos()),
        }
    }

    /// Metric determinant sqrt(-g) in native coordinates.
    #[inline]
    pub fn gdet(&self, x1: f64, x2: f64) -> f64 {
        match self {
            Self::Cartesian => 1.0,
            _ => {
                let a = self.spin();
                let (r, th) = self.r_th(x1, x2);
                let cth = th.cos();
                let sigma = r * r + a * a * cth * cth;
                // dr/dX1 = r for the exponential radial map
                sigma * th.sin().abs() * r * self.dth_dx2(x2)
            }
        }
    }
}
