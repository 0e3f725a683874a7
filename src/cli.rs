// src/cli.rs
//
// Command-line flags. Anything given here overrides the JSON config file,
// which in turn overrides the defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::colormap::Colormap;
use crate::config::RenderConfig;

fn parse_colormap(name: &str) -> Result<Colormap, String> {
    Colormap::from_name(name).ok_or_else(|| {
        format!("unknown colour map '{name}' (jet, turbo, viridis, inferno, plasma, rdylbu)")
    })
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Plot rho and field lines for BZ monopole dumps", long_about = None)]
pub struct Cli {
    /// Directory holding the dumps
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Glob for the dump file names
    #[arg(long)]
    pub pattern: Option<String>,

    /// Variable to colour by (`log_<name>` for log10)
    #[arg(long)]
    pub var: Option<String>,

    /// JSON render settings; flags given here override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of field lines (drawn at twice as many flux levels)
    #[arg(long)]
    pub nlines: Option<usize>,

    /// Canvas edge in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Colour map name
    #[arg(long, value_parser = parse_colormap)]
    pub colormap: Option<Colormap>,

    /// Log colour scale
    #[arg(long)]
    pub log: bool,

    /// Skip captions and tick labels
    #[arg(long)]
    pub no_labels: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags; validated.
    pub fn render_config(&self) -> Result<RenderConfig> {
        let mut cfg = match &self.config {
            Some(path) => RenderConfig::from_json_file(path)?,
            None => RenderConfig::default(),
        };
        if let Some(p) = &self.pattern {
            cfg.pattern = p.clone();
        }
        if let Some(v) = &self.var {
            cfg.var = v.clone();
        }
        if let Some(n) = self.nlines {
            cfg.nlines = n;
        }
        if let Some(s) = self.size {
            cfg.size = s;
        }
        if let Some(c) = self.colormap {
            cfg.colormap = c;
        }
        if self.log {
            cfg.log = true;
        }
        if self.no_labels {
            cfg.labels = false;
        }
        cfg.validate().context("invalid render settings")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_defaults() {
        let cli = Cli::parse_from(["bzplot"]);
        assert_eq!(cli.dir, PathBuf::from("."));
        assert_eq!(cli.render_config().unwrap(), RenderConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");
        std::fs::write(&path, r#"{"var": "u", "nlines": 5, "size": 300}"#).unwrap();

        let cli = Cli::parse_from([
            "bzplot",
            "--config",
            path.to_str().unwrap(),
            "--nlines",
            "12",
            "--colormap",
            "Inferno",
            "--log",
            "--no-labels",
        ]);
        let cfg = cli.render_config().unwrap();
        assert_eq!(cfg.var, "u");
        assert_eq!(cfg.size, 300);
        assert_eq!(cfg.nlines, 12);
        assert_eq!(cfg.colormap, Colormap::Inferno);
        assert!(cfg.log);
        assert!(!cfg.labels);
    }

    #[test]
    fn unknown_colormap_is_a_usage_error() {
        let err = Cli::try_parse_from(["bzplot", "--colormap", "hot"]).unwrap_err();
        assert!(err.to_string().contains("hot"), "{err}");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let cli = Cli::parse_from(["bzplot", "--nlines", "0"]);
        assert!(cli.render_config().is_err());
    }
}
