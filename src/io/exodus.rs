//! Exodus II mesh and model reader.
//!
//! Exodus II files are NetCDF underneath, so the reader is a thin layer
//! over the `netcdf` crate. It extracts vertex coordinates, the first
//! element block's connectivity, named side sets, and per-vertex nodal
//! variables (material parameters), and hands everything to the engine
//! as a [`MeshData`].
//!
//! Side-set side numbering follows the Exodus convention of 1-based side
//! ids per element; they are converted to the crate's 0-based local side
//! order, which matches the Exodus template ordering for all four shapes.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::mesh::MeshData;
use crate::reference::Shape;

fn io_err<E: std::fmt::Display>(context: &str) -> impl Fn(E) -> EngineError + '_ {
    move |e| EngineError::Io(format!("{context}: {e}"))
}

/// Read chars stored as a NetCDF [n][len] char variable into strings.
fn read_names(file: &netcdf::File, var: &str) -> Vec<String> {
    let Some(v) = file.variable(var) else {
        return Vec::new();
    };
    let Ok(raw) = v.get_values::<u8, _>(..) else {
        return Vec::new();
    };
    let count = v.dimensions().first().map(|d| d.len()).unwrap_or(0);
    if count == 0 {
        return Vec::new();
    }
    let width = raw.len() / count;
    (0..count)
        .map(|i| {
            let chunk = &raw[i * width..(i + 1) * width];
            let end = chunk.iter().position(|&c| c == 0).unwrap_or(width);
            String::from_utf8_lossy(&chunk[..end]).trim().to_string()
        })
        .collect()
}

fn read_f64(file: &netcdf::File, var: &str) -> Result<Vec<f64>> {
    file.variable(var)
        .ok_or_else(|| EngineError::Io(format!("variable '{var}' missing from Exodus file")))?
        .get_values::<f64, _>(..)
        .map_err(io_err(var))
}

fn read_i64(file: &netcdf::File, var: &str) -> Result<Vec<i64>> {
    file.variable(var)
        .ok_or_else(|| EngineError::Io(format!("variable '{var}' missing from Exodus file")))?
        .get_values::<i64, _>(..)
        .map_err(io_err(var))
}

/// Read the mesh skeleton and, from `model_path`, the per-vertex
/// material fields. Both paths usually name the same file.
pub fn read_exodus<P: AsRef<Path>>(path: P, model_path: P, dim: usize) -> Result<MeshData> {
    let file = netcdf::open(path.as_ref()).map_err(io_err("opening mesh file"))?;

    // Coordinates arrive either as one [dim][n] "coord" variable or as
    // separate coordx/coordy/coordz.
    let num_nodes = file
        .dimension("num_nodes")
        .ok_or_else(|| EngineError::Io("num_nodes dimension missing".into()))?
        .len();
    let vertices: Vec<[f64; 3]> = if file.variable("coord").is_some() {
        let flat = read_f64(&file, "coord")?;
        (0..num_nodes)
            .map(|i| {
                let mut p = [0.0; 3];
                for d in 0..dim {
                    p[d] = flat[d * num_nodes + i];
                }
                p
            })
            .collect()
    } else {
        let x = read_f64(&file, "coordx")?;
        let y = read_f64(&file, "coordy")?;
        let z = if dim == 3 {
            read_f64(&file, "coordz")?
        } else {
            vec![0.0; num_nodes]
        };
        (0..num_nodes).map(|i| [x[i], y[i], z[i]]).collect()
    };

    // Single-block meshes only: connect1 is [num_elem][verts_per_elem].
    let connect = file
        .variable("connect1")
        .ok_or_else(|| EngineError::Io("connect1 missing: multi-block meshes are not supported".into()))?;
    let verts_per_elem = connect
        .dimensions()
        .get(1)
        .map(|d| d.len())
        .ok_or_else(|| EngineError::Io("connect1 has no vertex dimension".into()))?;
    let flat = connect
        .get_values::<i64, _>(..)
        .map_err(io_err("connect1"))?;
    let shape = Shape::from_vertex_count(dim, verts_per_elem)?;
    let cells: Vec<Vec<usize>> = flat
        .chunks(verts_per_elem)
        .map(|c| c.iter().map(|&v| (v - 1) as usize).collect())
        .collect();

    // Side sets: elem_ss{k}/side_ss{k} with names in ss_names.
    let ss_names = read_names(&file, "ss_names");
    let mut sidesets = BTreeMap::new();
    let num_ss = file.dimension("num_side_sets").map(|d| d.len()).unwrap_or(0);
    for k in 0..num_ss {
        let elems = read_i64(&file, &format!("elem_ss{}", k + 1))?;
        let sides = read_i64(&file, &format!("side_ss{}", k + 1))?;
        let name = ss_names
            .get(k)
            .filter(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("sideset-{}", k + 1));
        let list: Vec<(usize, usize)> = elems
            .iter()
            .zip(sides.iter())
            .map(|(&e, &s)| ((e - 1) as usize, (s - 1) as usize))
            .collect();
        sidesets.insert(name, list);
    }

    // Nodal material fields from the model file.
    let model = netcdf::open(model_path.as_ref()).map_err(io_err("opening model file"))?;
    let var_names = read_names(&model, "name_nod_var");
    let mut materials = BTreeMap::new();
    for (i, name) in var_names.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        // Nodal variables are stored per time step; take the first.
        let var = format!("vals_nod_var{}", i + 1);
        if let Some(v) = model.variable(&var) {
            let all = v.get_values::<f64, _>(..).map_err(io_err(&var))?;
            let vals = all[all.len() - num_nodes..].to_vec();
            materials.insert(name.to_uppercase(), vals);
        }
    }

    Ok(MeshData {
        dim,
        shape,
        vertices,
        cells,
        sidesets,
        materials,
    })
}
