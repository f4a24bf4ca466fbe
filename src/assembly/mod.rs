//! Global DoF section and element-closure scatter.
//!
//! The section assigns contiguous DoF ranges to mesh points (vertices,
//! edges, faces, cells) from the per-point counts of the reference
//! layout. Each element's closure map composes the shape's closure
//! permutation with the per-element edge and face orientation resolution,
//! so that gathering through it yields tensor-ordered element DoFs.
//!
//! Fields come in (local, global) pairs sharing the section layout. In
//! this single-process build the two coincide in size and the exchange
//! ops are plain copies, but the ADD/INSERT protocol of the distributed
//! original is kept so the time loop is written against it.

use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::mesh::{side_vertices, Mesh};
use crate::reference::{face_closure_nodes, hex_face_interior, Shape, Tables};

/// DoF section over the mesh points plus per-element closure maps.
pub struct Section {
    pub num_dofs: usize,
    /// closure_maps[cell][tensor_index] = global DoF.
    pub closure_maps: Vec<Vec<usize>>,
}

impl Section {
    pub fn build(mesh: &Mesh, tables: &Tables) -> Result<Section> {
        let shape = tables.shape;
        let layout = tables.layout;
        let nv = mesh.num_vertices();
        let ne = mesh.edges.len();
        let nf = mesh.faces.len();
        let nc = mesh.num_cells();

        // In 2D the cell interior is the layout's "face" block.
        let cell_dofs = if shape.dim() == 2 {
            layout.face
        } else {
            layout.volume
        };
        let face_dofs = if shape.dim() == 3 { layout.face } else { 0 };

        let vertex_offset = |v: usize| v * layout.vertex;
        let edge_base = nv * layout.vertex;
        let edge_offset = |e: usize| edge_base + e * layout.edge;
        let face_base = edge_base + ne * layout.edge;
        let face_offset = |f: usize| face_base + f * face_dofs;
        let cell_base = face_base + nf * face_dofs;
        let cell_offset = |c: usize| cell_base + c * cell_dofs;
        let num_dofs = cell_base + nc * cell_dofs;

        let mut closure_maps = Vec::with_capacity(nc);
        for cell in 0..nc {
            let conn = &mesh.data.cells[cell];
            let mut map = vec![usize::MAX; tables.num_points];
            let mut k = 0;

            for &v in conn.iter() {
                map[tables.closure[k]] = vertex_offset(v);
                k += 1;
            }

            for &(edge_id, reversed) in mesh.cell_edges[cell].iter() {
                for p in 0..layout.edge {
                    let within = if reversed { layout.edge - 1 - p } else { p };
                    map[tables.closure[k]] = edge_offset(edge_id) + within;
                    k += 1;
                }
            }

            if shape.dim() == 3 {
                for local_face in 0..shape.num_faces() {
                    let face_id = mesh.cell_faces[cell][local_face];
                    let stored = &mesh.faces[face_id];
                    let local_verts: Vec<usize> = side_vertices(shape, local_face)
                        .iter()
                        .map(|&v| conn[v])
                        .collect();
                    match shape {
                        Shape::Hex => {
                            let order = tables.order;
                            let m = order - 1;
                            let grid = face_grid_transform(&local_verts, stored, order, cell)?;
                            for (slot, (_, (a, b))) in
                                hex_face_interior(order, local_face).iter().enumerate()
                            {
                                let (sa, sb) = grid.apply(*a as i64, *b as i64);
                                let within = (sb as usize - 1) * m + (sa as usize - 1);
                                map[tables.closure[k + slot]] = face_offset(face_id) + within;
                            }
                            k += m * m;
                        }
                        Shape::Tet => {
                            // Face nodes are vertex-associated: node p goes
                            // with local face vertex p.
                            for p in 0..layout.face {
                                let within = if layout.face == 1 {
                                    0
                                } else {
                                    let g = local_verts[p];
                                    stored.iter().position(|&s| s == g).ok_or_else(|| {
                                        EngineError::Geometry {
                                            element: cell,
                                            message: "face vertex not in stored face".into(),
                                        }
                                    })?
                                };
                                map[tables.closure[k]] = face_offset(face_id) + within;
                                k += 1;
                            }
                            continue;
                        }
                        _ => unreachable!(),
                    }
                }
            }

            for p in 0..cell_dofs {
                map[tables.closure[k]] = cell_offset(cell) + p;
                k += 1;
            }
            debug_assert_eq!(k, tables.num_points);
            debug_assert!(map.iter().all(|&d| d != usize::MAX));
            closure_maps.push(map);
        }

        Ok(Section {
            num_dofs,
            closure_maps,
        })
    }

    /// Gather the element closure from a local vector, tensor order.
    pub fn closure_get(&self, local: &[f64], cell: usize) -> Vec<f64> {
        self.closure_maps[cell].iter().map(|&d| local[d]).collect()
    }

    /// Gather into a caller-provided buffer.
    pub fn closure_get_into(&self, local: &[f64], cell: usize, out: &mut [f64]) {
        for (o, &d) in out.iter_mut().zip(self.closure_maps[cell].iter()) {
            *o = local[d];
        }
    }

    /// Sum tensor-ordered element values into a local vector.
    pub fn closure_set_add(&self, local: &mut [f64], cell: usize, values: &[f64]) {
        for (&d, &v) in self.closure_maps[cell].iter().zip(values.iter()) {
            local[d] += v;
        }
    }

    /// Insert tensor-ordered element values into a local vector.
    pub fn closure_set_insert(&self, local: &mut [f64], cell: usize, values: &[f64]) {
        for (&d, &v) in self.closure_maps[cell].iter().zip(values.iter()) {
            local[d] = v;
        }
    }

    /// Global DoFs on one side of one element.
    pub fn side_dofs(&self, tables: &Tables, cell: usize, side: usize) -> Vec<usize> {
        face_closure_nodes(tables, side)
            .iter()
            .map(|&t| self.closure_maps[cell][t])
            .collect()
    }
}

/// Affine index map from an element's face grid onto the stored face
/// grid of a hexahedron face.
struct FaceGridTransform {
    origin: [i64; 2],
    u: [i64; 2],
    v: [i64; 2],
}

impl FaceGridTransform {
    fn apply(&self, a: i64, b: i64) -> (i64, i64) {
        let p = [a - self.origin[0], b - self.origin[1]];
        (
            p[0] * self.u[0] + p[1] * self.u[1],
            p[0] * self.v[0] + p[1] * self.v[1],
        )
    }
}

/// Derive the grid transform from the element-local face vertex tuple to
/// the stored face tuple. Both describe the same four vertices; the
/// element assigns grid corners (0,0), (N,0), (N,N), (0,N) in local
/// order, and the stored tuple defines the canonical axes a: s0→s1,
/// b: s0→s3.
fn face_grid_transform(
    local: &[usize],
    stored: &[usize],
    order: usize,
    cell: usize,
) -> Result<FaceGridTransform> {
    let n = order as i64;
    let corners = [[0, 0], [n, 0], [n, n], [0, n]];
    let pos = |g: usize| -> Result<[i64; 2]> {
        local
            .iter()
            .position(|&l| l == g)
            .map(|p| corners[p])
            .ok_or_else(|| EngineError::Geometry {
                element: cell,
                message: "stored face vertex missing from element face".into(),
            })
    };
    let p0 = pos(stored[0])?;
    let p1 = pos(stored[1])?;
    let p3 = pos(stored[3])?;
    // Unit axis vectors of the stored frame expressed in the local frame:
    // a = (p - p0)·u, b = (p - p0)·v with u, v rows of the inverse; for
    // grid-aligned ±axes the inverse is the transpose.
    let u = [(p1[0] - p0[0]) / n, (p1[1] - p0[1]) / n];
    let v = [(p3[0] - p0[0]) / n, (p3[1] - p0[1]) / n];
    Ok(FaceGridTransform {
        origin: p0,
        u,
        v,
    })
}

/// A named field: paired (local, global) vectors over the section.
pub struct Field {
    pub name: String,
    pub local: Vec<f64>,
    pub global: Vec<f64>,
}

impl Field {
    pub fn new(name: &str, num_dofs: usize) -> Field {
        Field {
            name: name.to_string(),
            local: vec![0.0; num_dofs],
            global: vec![0.0; num_dofs],
        }
    }

    pub fn zero_local(&mut self) {
        self.local.iter_mut().for_each(|v| *v = 0.0);
    }

    pub fn zero_global(&mut self) {
        self.global.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Sum the local partition into the global vector (the serial
    /// degenerate form of the begin/end neighbour exchange).
    pub fn local_to_global_add(&mut self) {
        for (g, l) in self.global.iter_mut().zip(self.local.iter()) {
            *g += l;
        }
    }

    /// Replicate the global vector into the local partition.
    pub fn global_to_local_insert(&mut self) {
        self.local.copy_from_slice(&self.global);
    }
}

/// Explicitly threaded field dictionary (no ambient singletons).
pub type FieldDict = BTreeMap<String, Field>;
