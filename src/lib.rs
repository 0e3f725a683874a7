// src/lib.rs

pub mod batch;
pub mod cli;
pub mod colormap;
pub mod config;
pub mod coords;
pub mod dump;
pub mod field_lines;
pub mod grid;
pub mod monopole;
pub mod phdf;
pub mod slice;
pub mod visualisation;
