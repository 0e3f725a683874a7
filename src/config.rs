// src/config.rs
//
// Render settings. Every field defaults to what the BZ monopole check
// script does: rho in the x-z plane on a 7x7 inch (700 px) canvas,
// jet colours, window [-40, 40]^2 and 20 field lines.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::colormap::Colormap;

pub const DEFAULT_PATTERN: &str = "bz_monopole.out0.000*0.phdf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Glob for the dumps, relative to the working directory.
    pub pattern: String,
    /// Variable to colour by; `log_<name>` works too.
    pub var: String,
    /// Square canvas edge in pixels.
    pub size: u32,
    /// [xmin, xmax, zmin, zmax]
    pub window: [f64; 4],
    pub colormap: Colormap,
    /// Colour in log10 of the variable.
    pub log: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmax: Option<f64>,
    /// Field lines are drawn at 2*nlines flux levels.
    pub nlines: usize,
    /// Captions and tick labels (needs system fonts).
    pub labels: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            var: "rho".to_string(),
            size: 700,
            window: [-40.0, 40.0, -40.0, 40.0],
            colormap: Colormap::Jet,
            log: false,
            vmin: None,
            vmax: None,
            nlines: 20,
            labels: true,
        }
    }
}

impl RenderConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            return Err(anyhow!("File pattern must not be empty"));
        }
        if self.var.trim().is_empty() {
            return Err(anyhow!("Variable name must not be empty"));
        }
        if self.size < 64 {
            return Err(anyhow!("Canvas size must be at least 64 px (size={})", self.size));
        }
        let [x0, x1, z0, z1] = self.window;
        if !(x0 < x1 && z0 < z1) || self.window.iter().any(|v| !v.is_finite()) {
            return Err(anyhow!(
                "Window must be finite with xmin < xmax and zmin < zmax (window={:?})",
                self.window
            ));
        }
        if self.nlines == 0 {
            return Err(anyhow!("nlines must be at least 1"));
        }
        if let (Some(lo), Some(hi)) = (self.vmin, self.vmax) {
            if lo >= hi {
                return Err(anyhow!("vmin must be below vmax (vmin={lo}, vmax={hi})"));
            }
        }
        if self.log && (self.vmin.is_some_and(|v| v <= 0.0) || self.vmax.is_some_and(|v| v <= 0.0)) {
            return Err(anyhow!(
                "Log colour scale needs positive limits (vmin={:?}, vmax={:?})",
                self.vmin,
                self.vmax
            ));
        }
        Ok(())
    }
}
