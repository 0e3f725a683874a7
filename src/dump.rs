// src/dump.rs
//
// In-memory snapshot of one GRMHD output dump.
//
// Fields are cell-centred and stored as Array3 indexed [k, j, i]
// (X3 slowest, X1 fastest), the same order the solver writes them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, Axis};
use thiserror::Error;

use crate::coords::CoordinateSystem;
use crate::grid::NativeGrid;

/// Primitive variable names, in the order of the packed primitive array.
pub const PRIM_NAMES: [&str; 8] = ["rho", "u", "U1", "U2", "U3", "B1", "B2", "B3"];

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dump {path}: {message}")]
    Format { path: PathBuf, message: String },

    #[error("Variable '{0}' is not present in the dump")]
    MissingVariable(String),

    #[error("Shape mismatch for '{name}': got {got:?}, expected {expected:?}")]
    Shape {
        name: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

impl DumpError {
    pub fn format<S: Into<String>>(path: &Path, message: S) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Anything that can turn a path into a `Dump`.
pub trait DumpLoader {
    fn load(&self, path: &Path) -> Result<Dump, DumpError>;
}

impl<L: DumpLoader + ?Sized> DumpLoader for &L {
    fn load(&self, path: &Path) -> Result<Dump, DumpError> {
        (**self).load(path)
    }
}

#[derive(Debug, Clone)]
pub struct Dump {
    pub grid: NativeGrid,
    pub coords: CoordinateSystem,
    /// Simulation time of the snapshot (code units).
    pub t: f64,
    fields: BTreeMap<String, Array3<f64>>,
}

impl Dump {
    pub fn new(grid: NativeGrid, coords: CoordinateSystem, t: f64) -> Self {
        Self {
            grid,
            coords,
            t,
            fields: BTreeMap::new(),
        }
    }

    fn expected_shape(&self) -> [usize; 3] {
        [self.grid.n3, self.grid.n2, self.grid.n1]
    }

    /// Add (or replace) a named field. The shape must be (n3, n2, n1).
    pub fn insert<S: Into<String>>(&mut self, name: S, data: Array3<f64>) -> Result<(), DumpError> {
        let name = name.into();
        let expected = self.expected_shape();
        if data.shape() != expected {
            return Err(DumpError::Shape {
                name,
                got: data.shape().to_vec(),
                expected: expected.to_vec(),
            });
        }
        self.fields.insert(name, data);
        Ok(())
    }

    /// Builder form of `insert`.
    pub fn with_field<S: Into<String>>(mut self, name: S, data: Array3<f64>) -> Result<Self, DumpError> {
        self.insert(name, data)?;
        Ok(self)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
            || name
                .strip_prefix("log_")
                .is_some_and(|base| self.fields.contains_key(base))
    }

    /// Look up a field by name. `log_<name>` gives log10 of `<name>`.
    pub fn var(&self, name: &str) -> Result<Cow<'_, Array3<f64>>, DumpError> {
        if let Some(v) = self.fields.get(name) {
            return Ok(Cow::Borrowed(v));
        }
        if let Some(base) = name.strip_prefix("log_") {
            if let Some(v) = self.fields.get(base) {
                return Ok(Cow::Owned(v.mapv(f64::log10)));
            }
        }
        Err(DumpError::MissingVariable(name.to_string()))
    }

    /// One phi slice of a field, shape (n2, n1).
    pub fn slice_k(&self, name: &str, k: usize) -> Result<Array2<f64>, DumpError> {
        let v = self.var(name)?;
        Ok(v.index_axis(Axis(0), k.min(self.grid.n3 - 1)).to_owned())
    }

    /// Phi-averaged field, shape (n2, n1).
    pub fn phi_average(&self, name: &str) -> Result<Array2<f64>, DumpError> {
        let v = self.var(name)?;
        v.mean_axis(Axis(0))
            .ok_or_else(|| DumpError::Unsupported(format!("'{name}' has an empty X3 axis")))
    }
}
