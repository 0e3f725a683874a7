// src/colormap.rs

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Named colour maps for scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Jet,
    Turbo,
    Viridis,
    Inferno,
    Plasma,
    RdYlBu,
}

// matplotlib "jet" sampled every 1/8
const JET_STOPS: [&str; 9] = [
    "#00007f", "#0000ff", "#007fff", "#00ffff", "#7fff7f", "#ffff00", "#ff7f00", "#ff0000",
    "#7f0000",
];

impl Colormap {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jet" => Some(Self::Jet),
            "turbo" => Some(Self::Turbo),
            "viridis" => Some(Self::Viridis),
            "inferno" => Some(Self::Inferno),
            "plasma" => Some(Self::Plasma),
            "rdylbu" | "rd_yl_bu" => Some(Self::RdYlBu),
            _ => None,
        }
    }

    pub fn gradient(&self) -> Result<Box<dyn colorgrad::Gradient>, String> {
        let g: Box<dyn colorgrad::Gradient> = match self {
            Self::Jet => Box::new(
                colorgrad::GradientBuilder::new()
                    .html_colors(&JET_STOPS)
                    .build::<colorgrad::LinearGradient>()
                    .map_err(|e| e.to_string())?,
            ),
            Self::Turbo => Box::new(colorgrad::preset::turbo()),
            Self::Viridis => Box::new(colorgrad::preset::viridis()),
            Self::Inferno => Box::new(colorgrad::preset::inferno()),
            Self::Plasma => Box::new(colorgrad::preset::plasma()),
            Self::RdYlBu => Box::new(colorgrad::preset::rd_yl_bu()),
        };
        Ok(g)
    }
}

/// Min/max over finite values; with `log`, only positive values count.
pub fn finite_range<'a, I>(values: I, log: bool) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        if !v.is_finite() || (log && v <= 0.0) {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// Maps values in [lo, hi] (optionally in log10 space) onto a colour map.
pub struct ColorScale {
    gradient: Box<dyn colorgrad::Gradient>,
    lo: f64,
    hi: f64,
    log: bool,
}

impl ColorScale {
    pub fn new(cmap: Colormap, lo: f64, hi: f64, log: bool) -> Result<Self, String> {
        let (mut lo, mut hi) = if log {
            (lo.max(f64::MIN_POSITIVE).log10(), hi.max(f64::MIN_POSITIVE).log10())
        } else {
            (lo, hi)
        };
        // Protect against lo ≈ hi (e.g. uniform field)
        if !lo.is_finite() || !hi.is_finite() {
            lo = -1.0;
            hi = 1.0;
        } else if (hi - lo).abs() < 1e-12 {
            lo -= 1.0;
            hi += 1.0;
        } else if hi < lo {
            std::mem::swap(&mut lo, &mut hi);
        }
        Ok(Self {
            gradient: cmap.gradient()?,
            lo,
            hi,
            log,
        })
    }

    /// Position of `v` in [0, 1]; non-finite values sit at 0.
    pub fn normalize(&self, v: f64) -> f64 {
        let v = if self.log { v.log10() } else { v };
        if !v.is_finite() {
            return 0.0;
        }
        ((v - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0)
    }

    pub fn color(&self, v: f64) -> RGBColor {
        self.color_at(self.normalize(v))
    }

    /// Colour at fraction `f` of the way from the low to the high end.
    pub fn color_at(&self, f: f64) -> RGBColor {
        let [r, g, b, _] = self.gradient.at(f.clamp(0.0, 1.0) as f32).to_rgba8();
        RGBColor(r, g, b)
    }

    /// Range on the colour axis (log10 units for a log scale).
    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jet_runs_from_dark_blue_to_dark_red() {
        let s = ColorScale::new(Colormap::Jet, 0.0, 1.0, false).unwrap();
        let RGBColor(r0, _, b0) = s.color(0.0);
        let RGBColor(r1, _, b1) = s.color(1.0);
        assert!(b0 > 100 && r0 < 20, "low end should be blue, got r={r0} b={b0}");
        assert!(r1 > 100 && b1 < 20, "high end should be red, got r={r1} b={b1}");
    }

    #[test]
    fn normalize_clamps_and_handles_nan() {
        let s = ColorScale::new(Colormap::Viridis, 0.0, 10.0, false).unwrap();
        assert_eq!(s.normalize(-5.0), 0.0);
        assert_eq!(s.normalize(50.0), 1.0);
        assert!((s.normalize(2.5) - 0.25).abs() < 1e-12);
        assert_eq!(s.normalize(f64::NAN), 0.0);
    }

    #[test]
    fn log_scale_normalizes_decades() {
        let s = ColorScale::new(Colormap::Turbo, 1e-4, 1.0, true).unwrap();
        assert!((s.normalize(1e-2) - 0.5).abs() < 1e-12);
        assert_eq!(s.normalize(0.0), 0.0);
        let (lo, hi) = s.bounds();
        assert!((lo + 4.0).abs() < 1e-12 && hi.abs() < 1e-12);
    }

    #[test]
    fn degenerate_range_is_widened() {
        let s = ColorScale::new(Colormap::Jet, 3.0, 3.0, false).unwrap();
        assert!((s.normalize(3.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reversed_limits_are_swapped() {
        let s = ColorScale::new(Colormap::Jet, 4.0, 2.0, false).unwrap();
        assert_eq!(s.bounds(), (2.0, 4.0));
        assert_eq!(s.color(2.0), s.color_at(0.0));
    }

    #[test]
    fn finite_range_skips_bad_values() {
        let v = [f64::NAN, -2.0, 0.0, 5.0, f64::INFINITY];
        assert_eq!(finite_range(&v, false), Some((-2.0, 5.0)));
        assert_eq!(finite_range(&v, true), Some((5.0, 5.0)));
        assert_eq!(finite_range(&[f64::NAN], false), None);
    }

    #[test]
    fn names_round_trip_through_serde() {
        let c: Colormap = serde_json::from_str("\"rdylbu\"").unwrap();
        assert_eq!(c, Colormap::RdYlBu);
        assert_eq!(Colormap::from_name("Jet"), Some(Colormap::Jet));
        assert_eq!(Colormap::from_name("hot"), None);
    }
}
