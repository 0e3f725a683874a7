// src/batch.rs
//
// Batch driver: find the dumps, render each one to `<dump>.png`, in order.
//
// Every file is loaded, drawn and written before the next one is touched;
// the first failure stops the run and earlier images stay on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::RenderConfig;
use crate::dump::{DumpError, DumpLoader};
use crate::visualisation::save_dump_plot;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Cannot list {path}: {source}")]
    Glob {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: DumpError,
    },

    #[error("Failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },
}

/// Image path for a dump: the dump path with `.png` appended.
pub fn output_path(input: &Path) -> PathBuf {
    let mut s: OsString = input.as_os_str().to_owned();
    s.push(".png");
    PathBuf::from(s)
}

/// Files in `dir` matching `pattern`, sorted lexicographically.
pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, BatchError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);
    let full = full.to_string_lossy();

    let entries = glob::glob(&full).map_err(|source| BatchError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(p) if p.is_file() => paths.push(p),
            Ok(p) => debug!("Skipping non-file match {}", p.display()),
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(BatchError::Glob {
                    path,
                    source: e.into(),
                });
            }
        }
    }
    paths.sort();
    Ok(paths)
}

/// Lengths of the digit runs in a file name, e.g. "out0.00010" -> [1, 5].
fn digit_runs(name: &str) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut len = 0;
    for c in name.chars() {
        if c.is_ascii_digit() {
            len += 1;
        } else if len > 0 {
            runs.push(len);
            len = 0;
        }
    }
    if len > 0 {
        runs.push(len);
    }
    runs
}

/// True when the matched names number their dumps with different widths,
/// in which case lexicographic order is not numeric order.
pub fn mixed_number_widths(paths: &[PathBuf]) -> bool {
    let mut widths = paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| digit_runs(&n.to_string_lossy()));
    match widths.next() {
        Some(first) => widths.any(|w| w != first),
        None => false,
    }
}

/// Render every dump in `dir` matching `cfg.pattern`.
///
/// Returns the written image paths in processing order.
pub fn render_all<L: DumpLoader>(
    dir: &Path,
    loader: &L,
    cfg: &RenderConfig,
) -> Result<Vec<PathBuf>, BatchError> {
    let inputs = discover(dir, &cfg.pattern)?;
    info!(
        "Found {} dump(s) matching '{}' in {}",
        inputs.len(),
        cfg.pattern,
        dir.display()
    );
    if mixed_number_widths(&inputs) {
        warn!("Dump numbers have differing widths; files are processed in lexicographic order, not numeric order");
    }

    let mut written = Vec::with_capacity(inputs.len());
    for input in &inputs {
        info!("Rendering {}", input.display());
        let dump = loader.load(input).map_err(|source| BatchError::Load {
            path: input.clone(),
            source,
        })?;

        let out = output_path(input);
        save_dump_plot(&dump, &out, cfg).map_err(|e| BatchError::Render {
            path: input.clone(),
            message: e.to_string(),
        })?;
        info!("Wrote {}", out.display());
        written.push(out);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn output_path_appends_png() {
        assert_eq!(
            output_path(Path::new("run/bz_monopole.out0.00010.phdf")),
            PathBuf::from("run/bz_monopole.out0.00010.phdf.png")
        );
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "bz_monopole.out0.00020.phdf",
            "bz_monopole.out0.00000.phdf",
            "bz_monopole.out0.00010.phdf",
            "bz_monopole.out0.00015.phdf",
            "bz_monopole.out1.00010.phdf",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("bz_monopole.out0.00030.phdf")).unwrap();

        let found = discover(dir.path(), "bz_monopole.out0.000*0.phdf").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "bz_monopole.out0.00000.phdf",
                "bz_monopole.out0.00010.phdf",
                "bz_monopole.out0.00020.phdf",
            ]
        );
    }

    #[test]
    fn discover_handles_glob_characters_in_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("run[1]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("bz_monopole.out0.00000.phdf"), b"").unwrap();
        assert_eq!(discover(&dir, "*.phdf").unwrap().len(), 1);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(dir.path(), "out[.phdf").unwrap_err();
        assert!(matches!(err, BatchError::Pattern { .. }));
    }

    #[test]
    fn mixed_widths_are_detected() {
        let same = [PathBuf::from("a.out0.00010.phdf"), PathBuf::from("a.out0.00020.phdf")];
        let mixed = [PathBuf::from("a.out0.990.phdf"), PathBuf::from("a.out0.1000.phdf")];
        assert!(!mixed_number_widths(&same));
        assert!(mixed_number_widths(&mixed));
        assert!(!mixed_number_widths(&[]));
        assert_eq!(digit_runs("out0.00010.phdf"), vec![1, 5]);
    }
}
