//! Unstructured mesh representation.
//!
//! The mesh stores vertex coordinates, element-vertex connectivity,
//! named side sets, and per-vertex material parameter fields. Edges and
//! (in 3D) faces are derived from connectivity in first-seen order; their
//! stored orientation is the canonical one the assembly layer resolves
//! per-element orientations against.
//!
//! Builders for uniform quad/tri/hex/tet meshes cover tests and demos;
//! production meshes arrive through the Exodus reader as a [`MeshData`].

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::reference::{Shape, HEX_FACES, QUAD_EDGES};

/// The narrow input interface: everything a mesh file provides.
pub struct MeshData {
    pub dim: usize,
    pub shape: Shape,
    pub vertices: Vec<[f64; 3]>,
    pub cells: Vec<Vec<usize>>,
    /// Side-set name → (cell, local side) pairs.
    pub sidesets: BTreeMap<String, Vec<(usize, usize)>>,
    /// Material parameter name → one value per vertex.
    pub materials: BTreeMap<String, Vec<f64>>,
}

impl MeshData {
    /// Attach a spatially constant material parameter.
    pub fn with_constant_material(mut self, name: &str, value: f64) -> Self {
        self.materials
            .insert(name.to_string(), vec![value; self.vertices.len()]);
        self
    }

    /// Attach a material parameter sampled at the vertices.
    pub fn with_material(mut self, name: &str, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), self.vertices.len());
        self.materials.insert(name.to_string(), values);
        self
    }
}

/// Local vertex indices of a codimension-1 side.
pub fn side_vertices(shape: Shape, side: usize) -> Vec<usize> {
    match shape {
        Shape::Quad => {
            let (a, b) = QUAD_EDGES[side];
            vec![a, b]
        }
        Shape::Tri => {
            let (a, b) = crate::basis::TRI_EDGES[side];
            vec![a, b]
        }
        Shape::Hex => HEX_FACES[side].to_vec(),
        Shape::Tet => {
            let (a, b, c) = crate::basis::TET_FACES[side];
            vec![a, b, c]
        }
    }
}

/// Mesh with derived topology.
pub struct Mesh {
    pub data: MeshData,
    /// Unique edges as stored (first-seen) vertex pairs.
    pub edges: Vec<(usize, usize)>,
    /// Per cell, per local edge: (edge id, runs opposite to stored?).
    pub cell_edges: Vec<Vec<(usize, bool)>>,
    /// 3D only: unique faces as stored vertex tuples.
    pub faces: Vec<Vec<usize>>,
    /// 3D only: per cell, per local face: face id.
    pub cell_faces: Vec<Vec<usize>>,
    /// Boundary name → element → local side ids.
    pub boundary_faces: BTreeMap<String, BTreeMap<usize, Vec<usize>>>,
}

impl Mesh {
    pub fn build(data: MeshData) -> Result<Mesh> {
        let shape = data.shape;
        for (c, cell) in data.cells.iter().enumerate() {
            if cell.len() != shape.num_vertices() {
                return Err(EngineError::Geometry {
                    element: c,
                    message: format!(
                        "cell has {} vertices, {} expects {}",
                        cell.len(),
                        shape.name(),
                        shape.num_vertices()
                    ),
                });
            }
        }

        // Edges, keyed by the unordered vertex pair.
        let mut edge_ids: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges = Vec::new();
        let mut cell_edges = Vec::with_capacity(data.cells.len());
        for cell in &data.cells {
            let mut local = Vec::with_capacity(shape.num_edges());
            for &(a, b) in shape.edges() {
                let (ga, gb) = (cell[a], cell[b]);
                let key = (ga.min(gb), ga.max(gb));
                let id = *edge_ids.entry(key).or_insert_with(|| {
                    edges.push((ga, gb));
                    edges.len() - 1
                });
                let reversed = edges[id] != (ga, gb);
                local.push((id, reversed));
            }
            cell_edges.push(local);
        }

        // Faces (3D), keyed by the sorted vertex tuple.
        let mut faces = Vec::new();
        let mut cell_faces = Vec::new();
        if shape.dim() == 3 {
            let mut face_ids: HashMap<Vec<usize>, usize> = HashMap::new();
            for cell in &data.cells {
                let mut local = Vec::with_capacity(shape.num_faces());
                for side in 0..shape.num_faces() {
                    let verts: Vec<usize> =
                        side_vertices(shape, side).iter().map(|&v| cell[v]).collect();
                    let mut key = verts.clone();
                    key.sort_unstable();
                    let id = *face_ids.entry(key).or_insert_with(|| {
                        faces.push(verts.clone());
                        faces.len() - 1
                    });
                    local.push(id);
                }
                cell_faces.push(local);
            }
        }

        // Boundary map: name → element → local sides.
        let mut boundary_faces: BTreeMap<String, BTreeMap<usize, Vec<usize>>> = BTreeMap::new();
        for (name, sides) in &data.sidesets {
            let entry = boundary_faces.entry(name.clone()).or_default();
            for &(cell, side) in sides {
                entry.entry(cell).or_default().push(side);
            }
        }

        Ok(Mesh {
            data,
            edges,
            cell_edges,
            faces,
            cell_faces,
            boundary_faces,
        })
    }

    pub fn num_cells(&self) -> usize {
        self.data.cells.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.data.vertices.len()
    }

    /// Vertex coordinates of one cell, in cell connectivity order.
    pub fn cell_vertices(&self, cell: usize) -> Vec<[f64; 3]> {
        self.data.cells[cell]
            .iter()
            .map(|&v| self.data.vertices[v])
            .collect()
    }

    /// Material values at the vertices of one cell.
    pub fn cell_material(&self, cell: usize, name: &str) -> Option<Vec<f64>> {
        let field = self.data.materials.get(name)?;
        Some(self.data.cells[cell].iter().map(|&v| field[v]).collect())
    }

    pub fn material_names(&self) -> Vec<&str> {
        self.data.materials.keys().map(|s| s.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Uniform mesh builders
// ---------------------------------------------------------------------------

/// Classify each once-seen (boundary) side into the axis-plane side sets
/// x0/x1/y0/y1[/z0/z1].
fn tag_boundary_sides(
    shape: Shape,
    vertices: &[[f64; 3]],
    cells: &[Vec<usize>],
    bounds: &[(f64, f64)],
) -> BTreeMap<String, Vec<(usize, usize)>> {
    let dim = shape.dim();
    let nsides = shape.num_sides();
    let mut seen: HashMap<Vec<usize>, Vec<(usize, usize)>> = HashMap::new();
    for (c, cell) in cells.iter().enumerate() {
        for side in 0..nsides {
            let mut key: Vec<usize> = side_vertices(shape, side).iter().map(|&v| cell[v]).collect();
            key.sort_unstable();
            seen.entry(key).or_default().push((c, side));
        }
    }
    let axis_names = [["x0", "x1"], ["y0", "y1"], ["z0", "z1"]];
    let tol = 1e-9;
    let mut sidesets: BTreeMap<String, Vec<(usize, usize)>> = BTreeMap::new();
    for (key, owners) in seen {
        if owners.len() != 1 {
            continue;
        }
        for d in 0..dim {
            let (lo, hi) = bounds[d];
            let span = (hi - lo).max(1.0);
            for (plane, name) in [(lo, axis_names[d][0]), (hi, axis_names[d][1])] {
                if key
                    .iter()
                    .all(|&v| (vertices[v][d] - plane).abs() < tol * span)
                {
                    sidesets
                        .entry(name.to_string())
                        .or_default()
                        .push(owners[0]);
                }
            }
        }
    }
    for sides in sidesets.values_mut() {
        sides.sort_unstable();
    }
    sidesets
}

/// Uniform quadrilateral mesh of [x0, x1] × [y0, y1], nx × ny cells, CCW
/// connectivity, side sets x0/x1/y0/y1.
pub fn uniform_quad(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> MeshData {
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push([
                x0 + (x1 - x0) * i as f64 / nx as f64,
                y0 + (y1 - y0) * j as f64 / ny as f64,
                0.0,
            ]);
        }
    }
    let vid = |i: usize, j: usize| j * (nx + 1) + i;
    let mut cells = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            cells.push(vec![vid(i, j), vid(i + 1, j), vid(i + 1, j + 1), vid(i, j + 1)]);
        }
    }
    let sidesets = tag_boundary_sides(Shape::Quad, &vertices, &cells, &[(x0, x1), (y0, y1)]);
    MeshData {
        dim: 2,
        shape: Shape::Quad,
        vertices,
        cells,
        sidesets,
        materials: BTreeMap::new(),
    }
}

/// Uniform triangle mesh: each quad cell of the nx × ny grid split along
/// its diagonal into two CCW triangles.
pub fn uniform_tri(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> MeshData {
    let quad = uniform_quad(x0, x1, y0, y1, nx, ny);
    let vertices = quad.vertices;
    let mut cells = Vec::with_capacity(2 * nx * ny);
    for q in quad.cells {
        cells.push(vec![q[0], q[1], q[2]]);
        cells.push(vec![q[0], q[2], q[3]]);
    }
    let sidesets = tag_boundary_sides(Shape::Tri, &vertices, &cells, &[(x0, x1), (y0, y1)]);
    MeshData {
        dim: 2,
        shape: Shape::Tri,
        vertices,
        cells,
        sidesets,
        materials: BTreeMap::new(),
    }
}

/// Uniform hexahedral mesh of a box, nx × ny × nz cells, side sets
/// x0/x1/y0/y1/z0/z1.
#[allow(clippy::too_many_arguments)]
pub fn uniform_hex(
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    z0: f64,
    z1: f64,
    nx: usize,
    ny: usize,
    nz: usize,
) -> MeshData {
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push([
                    x0 + (x1 - x0) * i as f64 / nx as f64,
                    y0 + (y1 - y0) * j as f64 / ny as f64,
                    z0 + (z1 - z0) * k as f64 / nz as f64,
                ]);
            }
        }
    }
    let vid = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;
    let mut cells = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                cells.push(vec![
                    vid(i, j, k),
                    vid(i + 1, j, k),
                    vid(i + 1, j + 1, k),
                    vid(i, j + 1, k),
                    vid(i, j, k + 1),
                    vid(i + 1, j, k + 1),
                    vid(i + 1, j + 1, k + 1),
                    vid(i, j + 1, k + 1),
                ]);
            }
        }
    }
    let sidesets = tag_boundary_sides(
        Shape::Hex,
        &vertices,
        &cells,
        &[(x0, x1), (y0, y1), (z0, z1)],
    );
    MeshData {
        dim: 3,
        shape: Shape::Hex,
        vertices,
        cells,
        sidesets,
        materials: BTreeMap::new(),
    }
}

/// Uniform tetrahedral mesh: each hex cell split into six tetrahedra
/// around its main diagonal (a conforming Kuhn decomposition).
#[allow(clippy::too_many_arguments)]
pub fn uniform_tet(
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    z0: f64,
    z1: f64,
    nx: usize,
    ny: usize,
    nz: usize,
) -> MeshData {
    let hexes = uniform_hex(x0, x1, y0, y1, z0, z1, nx, ny, nz);
    let vertices = hexes.vertices;
    // Walk the six faces adjacent to the main diagonal v0-v6; each
    // consecutive pair closes one positively oriented tetrahedron.
    let path = [1usize, 2, 3, 7, 4, 5, 1];
    let mut cells = Vec::with_capacity(6 * hexes.cells.len());
    for h in hexes.cells {
        for p in 0..6 {
            cells.push(vec![h[0], h[path[p]], h[path[p + 1]], h[6]]);
        }
    }
    let sidesets = tag_boundary_sides(
        Shape::Tet,
        &vertices,
        &cells,
        &[(x0, x1), (y0, y1), (z0, z1)],
    );
    MeshData {
        dim: 3,
        shape: Shape::Tet,
        vertices,
        cells,
        sidesets,
        materials: BTreeMap::new(),
    }
}
