// src/main.rs
//
// Renders every BZ monopole dump in a directory to a PNG next to it.
//
// With no arguments this looks for `bz_monopole.out0.000*0.phdf` in the
// current directory and writes `<dump>.png` for each match: rho in the
// x-z plane, window [-40, 40]^2, with field lines on top.
//
// Examples:
//
//   cargo run --release --features hdf5
//       -> all matching dumps in the current directory
//
//   cargo run --release --features hdf5 -- --dir runs/a0.94 --var u --log
//       -> log10 of internal energy for the dumps in runs/a0.94
//
//   cargo run --release --features hdf5 -- --config render.json --nlines 10
//       -> settings from a JSON file, with the line count overridden
//
// The binary is only built with the `hdf5` feature (it links the system
// HDF5 library); the library and its tests build without it.
//
// Set RUST_LOG=debug for per-dataset details while reading dumps.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use bzplot::batch::render_all;
use bzplot::cli::Cli;
use bzplot::phdf::PhdfLoader;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = cli.render_config()?;

    let written = render_all(&cli.dir, &PhdfLoader, &cfg)
        .with_context(|| format!("rendering dumps in {}", cli.dir.display()))?;

    info!("Done: {} image(s) written", written.len());
    Ok(())
}
