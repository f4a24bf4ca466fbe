//! Closure permutations and side/face node enumeration.
//!
//! Tensor-shape nodes live in "tensor order" (r fastest, then s, then t).
//! The topological ("closure") order lists vertices first, then the
//! interior nodes of each edge along its local direction, then face
//! interiors, then the cell interior. The permutation σ with
//! `closure[topo] = tensor` converts between the two; per-element edge
//! and face orientations are resolved by the assembly layer on top of σ.

use super::{Shape, Tables, TablesKind};

/// Local edges of the reference quadrilateral (CCW).
pub const QUAD_EDGES: [(usize, usize); 4] = [(0, 1), (1, 2), (2, 3), (3, 0)];

/// Local edges of the reference hexahedron: bottom ring, top ring,
/// vertical pillars.
pub const HEX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Local faces of the reference hexahedron. The face grid runs a along
/// v0→v1 and b along v0→v3 of each tuple.
pub const HEX_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // bottom  (t = -1)
    [4, 5, 6, 7], // top     (t = +1)
    [0, 1, 5, 4], // front   (s = -1)
    [1, 2, 6, 5], // right   (r = +1)
    [2, 3, 7, 6], // back    (s = +1)
    [3, 0, 4, 7], // left    (r = -1)
];

/// Conventional side-set names matching [`HEX_FACES`] order.
pub const HEX_FACE_NAMES: [&str; 6] = ["bottom", "top", "front", "right", "back", "left"];

/// Grid coordinates (units of N) of the reference vertices.
fn quad_vertex_grid(n: usize) -> [[i64; 2]; 4] {
    let n = n as i64;
    [[0, 0], [n, 0], [n, n], [0, n]]
}

fn hex_vertex_grid(n: usize) -> [[i64; 3]; 8] {
    let n = n as i64;
    [
        [0, 0, 0],
        [n, 0, 0],
        [n, n, 0],
        [0, n, 0],
        [0, 0, n],
        [n, 0, n],
        [n, n, n],
        [0, n, n],
    ]
}

fn quad_idx(g: [i64; 2], order: usize) -> usize {
    let n = (order + 1) as i64;
    (g[1] * n + g[0]) as usize
}

fn hex_idx(g: [i64; 3], order: usize) -> usize {
    let n = (order + 1) as i64;
    ((g[2] * n + g[1]) * n + g[0]) as usize
}

fn step2(a: [i64; 2], b: [i64; 2], order: usize) -> [i64; 2] {
    let n = order as i64;
    [(b[0] - a[0]) / n, (b[1] - a[1]) / n]
}

fn step3(a: [i64; 3], b: [i64; 3], order: usize) -> [i64; 3] {
    let n = order as i64;
    [
        (b[0] - a[0]) / n,
        (b[1] - a[1]) / n,
        (b[2] - a[2]) / n,
    ]
}

/// Build σ with `closure[topo] = tensor` for the given tables.
pub fn closure_permutation(tables: &Tables) -> Vec<usize> {
    match &tables.kind {
        TablesKind::Tensor(_) => match tables.shape {
            Shape::Quad => quad_closure(tables.order),
            Shape::Hex => hex_closure(tables.order),
            _ => unreachable!(),
        },
        TablesKind::Simplex(b) => {
            // The simplex node ordering is already vertex/edge/face/interior.
            let mut out = Vec::with_capacity(b.num_points);
            out.extend(0..tables.shape.num_vertices());
            for e in &b.edge_nodes {
                out.extend(e.iter().copied());
            }
            for f in &b.face_nodes {
                out.extend(f.iter().copied());
            }
            out.extend(b.interior_nodes.iter().copied());
            out
        }
    }
}

fn quad_closure(order: usize) -> Vec<usize> {
    let grid = quad_vertex_grid(order);
    let mut out = Vec::with_capacity((order + 1) * (order + 1));
    for v in grid {
        out.push(quad_idx(v, order));
    }
    for (a, b) in QUAD_EDGES {
        let d = step2(grid[a], grid[b], order);
        for p in 1..order {
            let g = [grid[a][0] + p as i64 * d[0], grid[a][1] + p as i64 * d[1]];
            out.push(quad_idx(g, order));
        }
    }
    for j in 1..order {
        for i in 1..order {
            out.push(quad_idx([i as i64, j as i64], order));
        }
    }
    out
}

fn hex_closure(order: usize) -> Vec<usize> {
    let grid = hex_vertex_grid(order);
    let n1 = order + 1;
    let mut out = Vec::with_capacity(n1 * n1 * n1);
    for v in grid {
        out.push(hex_idx(v, order));
    }
    for (a, b) in HEX_EDGES {
        let d = step3(grid[a], grid[b], order);
        for p in 1..order {
            let p = p as i64;
            let g = [
                grid[a][0] + p * d[0],
                grid[a][1] + p * d[1],
                grid[a][2] + p * d[2],
            ];
            out.push(hex_idx(g, order));
        }
    }
    for f in 0..6 {
        for (idx, _) in hex_face_interior(order, f) {
            out.push(idx);
        }
    }
    for k in 1..order {
        for j in 1..order {
            for i in 1..order {
                out.push(hex_idx([i as i64, j as i64, k as i64], order));
            }
        }
    }
    out
}

/// Interior nodes of a hexahedron face, with their (a, b) grid positions
/// on the face (a along v0→v1, b along v0→v3 of the local face tuple).
/// Ordered a-fastest.
pub fn hex_face_interior(order: usize, face: usize) -> Vec<(usize, (usize, usize))> {
    let grid = hex_vertex_grid(order);
    let [c0, c1, _, c3] = HEX_FACES[face];
    let u = step3(grid[c0], grid[c1], order);
    let v = step3(grid[c0], grid[c3], order);
    let mut out = Vec::with_capacity((order - 1) * (order - 1));
    for b in 1..order {
        for a in 1..order {
            let (ai, bi) = (a as i64, b as i64);
            let g = [
                grid[c0][0] + ai * u[0] + bi * v[0],
                grid[c0][1] + ai * u[1] + bi * v[1],
                grid[c0][2] + ai * u[2] + bi * v[2],
            ];
            out.push((hex_idx(g, order), (a, b)));
        }
    }
    out
}

/// All tensor-order nodes on a codimension-1 side, in the side's own
/// traversal order.
///
/// - quad edge: the N+1 nodes from the first edge vertex to the second;
/// - hex face: the full (N+1)² grid, a-fastest, on the local face axes;
/// - simplex sides: vertices, then edge interiors, then face nodes
///   (matching `SimplexBasis::side_nodes`).
pub fn face_closure_nodes(tables: &Tables, side: usize) -> Vec<usize> {
    match &tables.kind {
        TablesKind::Tensor(_) => match tables.shape {
            Shape::Quad => {
                let order = tables.order;
                let grid = quad_vertex_grid(order);
                let (a, b) = QUAD_EDGES[side];
                let d = step2(grid[a], grid[b], order);
                (0..=order)
                    .map(|p| {
                        let p = p as i64;
                        quad_idx([grid[a][0] + p * d[0], grid[a][1] + p * d[1]], order)
                    })
                    .collect()
            }
            Shape::Hex => {
                let order = tables.order;
                let grid = hex_vertex_grid(order);
                let [c0, c1, _, c3] = HEX_FACES[side];
                let u = step3(grid[c0], grid[c1], order);
                let v = step3(grid[c0], grid[c3], order);
                let mut out = Vec::with_capacity((order + 1) * (order + 1));
                for b in 0..=order {
                    for a in 0..=order {
                        let (ai, bi) = (a as i64, b as i64);
                        out.push(hex_idx(
                            [
                                grid[c0][0] + ai * u[0] + bi * v[0],
                                grid[c0][1] + ai * u[1] + bi * v[1],
                                grid[c0][2] + ai * u[2] + bi * v[2],
                            ],
                            order,
                        ));
                    }
                }
                out
            }
            _ => unreachable!(),
        },
        TablesKind::Simplex(b) => b.side_nodes(side),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Tables;

    #[test]
    fn test_quad_closure_corners() {
        let t = Tables::new(Shape::Quad, 3).unwrap();
        // v0..v3 occupy the first four closure slots.
        assert_eq!(t.closure[0], 0);
        assert_eq!(t.closure[1], 3);
        assert_eq!(t.closure[2], 15);
        assert_eq!(t.closure[3], 12);
    }

    #[test]
    fn test_hex_face_interior_counts() {
        for order in 2..=4 {
            for f in 0..6 {
                let nodes = hex_face_interior(order, f);
                assert_eq!(nodes.len(), (order - 1) * (order - 1));
            }
        }
    }

    #[test]
    fn test_face_closure_on_face_plane() {
        let t = Tables::new(Shape::Hex, 3).unwrap();
        // All nodes of face 0 (bottom) sit at t = -1.
        for idx in face_closure_nodes(&t, 0) {
            let p = t.node_coords(idx);
            assert!((p[2] + 1.0).abs() < 1e-14);
        }
        // All nodes of face 3 (right) sit at r = +1.
        for idx in face_closure_nodes(&t, 3) {
            let p = t.node_coords(idx);
            assert!((p[0] - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_quad_edge_traversal_order() {
        let t = Tables::new(Shape::Quad, 2).unwrap();
        // Edge 0 runs from v0 (tensor 0) to v1 (tensor 2).
        assert_eq!(face_closure_nodes(&t, 0), vec![0, 1, 2]);
        // Edge 2 runs from v2 (tensor 8) to v3 (tensor 6).
        assert_eq!(face_closure_nodes(&t, 2), vec![8, 7, 6]);
    }
}
