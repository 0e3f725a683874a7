// src/phdf.rs
//
// Reader for Parthenon ".phdf" dumps as written by KHARMA.
//
// Layout we rely on:
//   /Info          attrs: NumMeshBlocks, MeshBlockSize[3], Time, RootGridDomain[9]
//   /Params        attrs: "coordinates/a", "coordinates/hslope", "coordinates/transform"
//   /Locations/x   (nblocks, nb1+1) face coordinates, same for y, z
//   primitives, either
//     prims.rho, prims.u          (nblocks, nb3, nb2, nb1)
//     prims.uvec, prims.B         (nblocks, 3, nb3, nb2, nb1)
//   or packed
//     c.c.bulk.prims              (nblocks, nb3, nb2, nb1, 8)
//
// Each meshblock is copied into one global array using the offset of its
// first face. The HDF5 access itself needs the `hdf5` feature; geometry
// checks and block stitching below are plain Rust.

use std::path::Path;

use log::warn;
use ndarray::Array3;

use crate::coords::CoordinateSystem;
use crate::dump::{Dump, DumpError, DumpLoader};
use crate::grid::NativeGrid;

/// Loads `.phdf` files. Requires the `hdf5` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhdfLoader;

impl DumpLoader for PhdfLoader {
    fn load(&self, path: &Path) -> Result<Dump, DumpError> {
        #[cfg(feature = "hdf5")]
        {
            read::read_phdf(path)
        }
        #[cfg(not(feature = "hdf5"))]
        {
            Err(DumpError::Unsupported(format!(
                "cannot read {}: bzplot was built without the `hdf5` feature",
                path.display()
            )))
        }
    }
}

/// How one dataset lays out blocks, components and cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub block_size: [usize; 3],
    pub ncomp: usize,
    /// true: (block, k, j, i, comp); false: (block, comp, k, j, i)
    pub comp_last: bool,
}

impl BlockLayout {
    pub fn scalar(block_size: [usize; 3]) -> Self {
        Self {
            block_size,
            ncomp: 1,
            comp_last: false,
        }
    }

    fn cells(&self) -> usize {
        self.block_size.iter().product()
    }

    /// Number of values a dataset with `nblocks` blocks must hold.
    pub fn len(&self, nblocks: usize) -> usize {
        nblocks * self.ncomp * self.cells()
    }

    #[inline]
    fn offset(&self, b: usize, c: usize, k: usize, j: usize, i: usize) -> usize {
        let [b1, b2, _] = self.block_size;
        let cell = (k * b2 + j) * b1 + i;
        if self.comp_last {
            (b * self.cells() + cell) * self.ncomp + c
        } else {
            (b * self.ncomp + c) * self.cells() + cell
        }
    }
}

/// Offset (in cells) of a block whose first face sits at `face`.
fn block_offset(face: f64, start: f64, dx: f64, block_n: usize, global_n: usize) -> Option<usize> {
    let off = ((face - start) / dx).round();
    if !off.is_finite() || off < 0.0 {
        return None;
    }
    let off = off as usize;
    (off + block_n <= global_n).then_some(off)
}

/// Copy component `comp` of every block into one global (n3, n2, n1) array.
///
/// `origins[b]` is the first face of block `b` in (X1, X2, X3).
pub fn stitch_blocks(
    grid: &NativeGrid,
    layout: &BlockLayout,
    origins: &[[f64; 3]],
    data: &[f64],
    comp: usize,
) -> Result<Array3<f64>, String> {
    let nblocks = origins.len();
    if data.len() != layout.len(nblocks) {
        return Err(format!(
            "dataset holds {} values, expected {} ({} blocks of {:?} x {})",
            data.len(),
            layout.len(nblocks),
            nblocks,
            layout.block_size,
            layout.ncomp
        ));
    }
    if comp >= layout.ncomp {
        return Err(format!("component {comp} out of range (ncomp = {})", layout.ncomp));
    }

    let [b1, b2, b3] = layout.block_size;
    let global_n = [grid.n1, grid.n2, grid.n3];
    let mut out = Array3::<f64>::from_elem((grid.n3, grid.n2, grid.n1), f64::NAN);

    for (b, origin) in origins.iter().enumerate() {
        let mut off = [0usize; 3];
        for d in 0..3 {
            off[d] = block_offset(origin[d], grid.startx[d], grid.dx[d], layout.block_size[d], global_n[d])
                .ok_or_else(|| {
                    format!(
                        "block {b} starts at {:?}, outside the root grid in direction {}",
                        origin,
                        d + 1
                    )
                })?;
        }
        for k in 0..b3 {
            for j in 0..b2 {
                for i in 0..b1 {
                    out[[off[2] + k, off[1] + j, off[0] + i]] = data[layout.offset(b, comp, k, j, i)];
                }
            }
        }
    }

    if out.iter().any(|v| v.is_nan()) {
        return Err("meshblocks do not cover the root grid".to_string());
    }
    Ok(out)
}

/// Block origins and cell widths from the per-block face coordinates in
/// `/Locations/{x,y,z}` (`faces[d]` holds `block_size[d] + 1` faces per block).
pub fn block_origins(
    path: &Path,
    faces: [&[f64]; 3],
    nblocks: usize,
    block_size: [usize; 3],
) -> Result<(Vec<[f64; 3]>, [f64; 3]), DumpError> {
    if nblocks == 0 {
        return Err(DumpError::format(path, "no meshblocks"));
    }
    if block_size.contains(&0) {
        return Err(DumpError::format(
            path,
            format!("MeshBlockSize {block_size:?} has an empty direction"),
        ));
    }

    let mut origins = vec![[0.0; 3]; nblocks];
    let mut dx = [1.0; 3];
    for (d, axis) in ["x", "y", "z"].iter().enumerate() {
        let per_block = block_size[d] + 1;
        let f = faces[d];
        if f.len() != nblocks * per_block {
            return Err(DumpError::format(
                path,
                format!(
                    "Locations/{axis} has {} entries, expected {}",
                    f.len(),
                    nblocks * per_block
                ),
            ));
        }
        for (b, origin) in origins.iter_mut().enumerate() {
            origin[d] = f[b * per_block];
        }
        dx[d] = f[1] - f[0];
        if !(dx[d].is_finite() && dx[d] > 0.0) {
            return Err(DumpError::format(
                path,
                format!("Locations/{axis} faces are not increasing"),
            ));
        }
    }
    Ok((origins, dx))
}

/// Root grid from `RootGridDomain` ([x1min, x1max, x1rat, x2min, ...]) and
/// the cell widths.
pub fn root_grid(path: &Path, domain: &[f64], dx: [f64; 3]) -> Result<NativeGrid, DumpError> {
    if domain.len() < 9 {
        return Err(DumpError::format(path, "RootGridDomain needs 9 entries"));
    }
    let startx = [domain[0], domain[3], domain[6]];
    let mut n = [0usize; 3];
    for d in 0..3 {
        let cells = ((domain[3 * d + 1] - domain[3 * d]) / dx[d]).round();
        if !cells.is_finite() || cells < 1.0 {
            return Err(DumpError::format(
                path,
                format!("RootGridDomain is empty in direction {}", d + 1),
            ));
        }
        n[d] = cells as usize;
    }
    Ok(NativeGrid::new(n, startx, dx))
}

/// Coordinate system from the `coordinates/*` parameters.
///
/// A missing transform means MKS when `hslope` is present and EKS otherwise.
/// Transforms we cannot draw (e.g. `fmks`) are an error.
pub fn resolve_coordinates(
    path: &Path,
    transform: Option<&str>,
    a: Option<f64>,
    hslope: Option<f64>,
) -> Result<CoordinateSystem, DumpError> {
    let name = match transform {
        Some(t) => t.to_string(),
        None => {
            let guess = if hslope.is_some() { "mks" } else { "eks" };
            warn!(
                "{}: no coordinates/transform, assuming {guess}",
                path.display()
            );
            guess.to_string()
        }
    };
    let cs = CoordinateSystem::from_name(&name, a.unwrap_or(0.0), hslope).ok_or_else(|| {
        DumpError::Unsupported(format!(
            "{}: coordinate transform '{name}' is not supported",
            path.display()
        ))
    })?;
    if a.is_none() && cs.is_spherical() {
        warn!("{}: no coordinates/a, assuming a = 0", path.display());
    }
    Ok(cs)
}

#[cfg(feature = "hdf5")]
mod read {
    use std::path::Path;

    use hdf5::types::{VarLenAscii, VarLenUnicode};
    use log::debug;

    use super::{block_origins, resolve_coordinates, root_grid, stitch_blocks, BlockLayout};
    use crate::coords::CoordinateSystem;
    use crate::dump::{Dump, DumpError, PRIM_NAMES};

    fn attr_f64s(group: &hdf5::Group, name: &str) -> Result<Vec<f64>, DumpError> {
        Ok(group.attr(name)?.read_raw::<f64>()?)
    }

    fn attr_usizes(group: &hdf5::Group, name: &str) -> Result<Vec<usize>, DumpError> {
        Ok(group
            .attr(name)?
            .read_raw::<i64>()?
            .into_iter()
            .map(|v| v.max(0) as usize)
            .collect())
    }

    fn attr_string(group: &hdf5::Group, name: &str) -> Option<String> {
        let attr = group.attr(name).ok()?;
        if let Ok(s) = attr.read_scalar::<VarLenUnicode>() {
            return Some(s.as_str().to_string());
        }
        attr.read_scalar::<VarLenAscii>()
            .ok()
            .map(|s| s.as_str().to_string())
    }

    fn coordinates(file: &hdf5::File, path: &Path) -> Result<CoordinateSystem, DumpError> {
        let params = file
            .group("Params")
            .map_err(|_| DumpError::format(path, "no Params group"))?;
        let first = |name: &str| attr_f64s(&params, name).ok().and_then(|v| v.first().copied());
        let transform = attr_string(&params, "coordinates/transform");
        resolve_coordinates(
            path,
            transform.as_deref(),
            first("coordinates/a"),
            first("coordinates/hslope"),
        )
    }

    pub(super) fn read_phdf(path: &Path) -> Result<Dump, DumpError> {
        let file = hdf5::File::open(path)?;
        let info = file.group("Info")?;

        let nblocks = attr_usizes(&info, "NumMeshBlocks")?
            .first()
            .copied()
            .ok_or_else(|| DumpError::format(path, "empty NumMeshBlocks"))?;
        let bs = attr_usizes(&info, "MeshBlockSize")?;
        if bs.len() != 3 {
            return Err(DumpError::format(path, format!("MeshBlockSize has {} entries", bs.len())));
        }
        let block_size = [bs[0], bs[1], bs[2]];
        let t = attr_f64s(&info, "Time")?.first().copied().unwrap_or(0.0);
        let domain = attr_f64s(&info, "RootGridDomain")?;

        let mut faces = Vec::with_capacity(3);
        for axis in ["x", "y", "z"] {
            faces.push(file.dataset(&format!("Locations/{axis}"))?.read_raw::<f64>()?);
        }
        let (origins, dx) = block_origins(
            path,
            [faces[0].as_slice(), faces[1].as_slice(), faces[2].as_slice()],
            nblocks,
            block_size,
        )?;
        let grid = root_grid(path, &domain, dx)?;
        let n = [grid.n1, grid.n2, grid.n3];
        let coords = coordinates(&file, path)?;
        debug!(
            "{}: {} blocks of {:?}, grid {:?}, coords {}",
            path.display(),
            nblocks,
            block_size,
            n,
            coords.as_str()
        );

        let mut dump = Dump::new(grid, coords, t);
        let stitch = |layout: &BlockLayout, data: &[f64], comp: usize| {
            stitch_blocks(&grid, layout, &origins, data, comp).map_err(|m| DumpError::format(path, m))
        };

        if let Ok(packed) = file.dataset("c.c.bulk.prims") {
            let layout = BlockLayout {
                block_size,
                ncomp: PRIM_NAMES.len(),
                comp_last: true,
            };
            let data = packed.read_raw::<f64>()?;
            for (c, name) in PRIM_NAMES.iter().enumerate() {
                let field = stitch(&layout, &data, c)?;
                dump.insert(*name, field)?;
            }
            return Ok(dump);
        }

        for (dataset, names) in [
            ("prims.rho", &["rho"][..]),
            ("prims.u", &["u"][..]),
            ("prims.uvec", &["U1", "U2", "U3"][..]),
            ("prims.B", &["B1", "B2", "B3"][..]),
        ] {
            let Ok(ds) = file.dataset(dataset) else {
                debug!("{}: no {dataset}", path.display());
                continue;
            };
            let layout = BlockLayout {
                block_size,
                ncomp: names.len(),
                comp_last: false,
            };
            let data = ds.read_raw::<f64>()?;
            for (c, name) in names.iter().enumerate() {
                let field = stitch(&layout, &data, c)?;
                dump.insert(*name, field)?;
            }
        }

        if !dump.has("rho") {
            return Err(DumpError::format(path, "no primitive variables found"));
        }
        Ok(dump)
    }
}
