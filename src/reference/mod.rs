//! Reference-element tables.
//!
//! For each supported (shape, polynomial order) pair this module provides
//! the quintuple the rest of the engine consumes: nodes, integration
//! weights, interpolation at arbitrary reference points, derivative
//! tables, and the closure permutation between tensor and topological
//! orderings. Tables are pure functions of (shape, order); build them
//! once and share them behind an `Arc`.

mod closure;

pub use closure::{
    face_closure_nodes, hex_face_interior, HEX_EDGES, HEX_FACES, HEX_FACE_NAMES, QUAD_EDGES,
};

use std::sync::Arc;

use faer::Mat;

use crate::basis::{lagrange_derivative_matrix, lagrange_values, SimplexBasis};
use crate::error::{EngineError, Result};
use crate::polynomial::{gauss_lobatto_nodes, gauss_lobatto_weights};

/// Highest supported order on quadrilaterals.
pub const QUAD_MAX_ORDER: usize = 9;
/// Highest supported order on hexahedra.
pub const HEX_MAX_ORDER: usize = 7;

/// The four concrete element shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Quad,
    Hex,
    Tri,
    Tet,
}

impl Shape {
    pub fn dim(self) -> usize {
        match self {
            Shape::Quad | Shape::Tri => 2,
            Shape::Hex | Shape::Tet => 3,
        }
    }

    pub fn num_vertices(self) -> usize {
        match self {
            Shape::Tri => 3,
            Shape::Quad | Shape::Tet => 4,
            Shape::Hex => 8,
        }
    }

    pub fn num_edges(self) -> usize {
        match self {
            Shape::Tri => 3,
            Shape::Quad => 4,
            Shape::Tet => 6,
            Shape::Hex => 12,
        }
    }

    /// Codimension-1 sides: edges in 2D, faces in 3D.
    pub fn num_sides(self) -> usize {
        match self {
            Shape::Tri => 3,
            Shape::Quad => 4,
            Shape::Tet => 4,
            Shape::Hex => 6,
        }
    }

    /// 2D faces of a 3D shape (empty list in 2D).
    pub fn num_faces(self) -> usize {
        match self {
            Shape::Tet => 4,
            Shape::Hex => 6,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Quad => "quad",
            Shape::Hex => "hex",
            Shape::Tri => "triangle",
            Shape::Tet => "tetrahedron",
        }
    }

    pub fn is_tensor(self) -> bool {
        matches!(self, Shape::Quad | Shape::Hex)
    }

    /// Local edges as ordered vertex pairs.
    pub fn edges(self) -> &'static [(usize, usize)] {
        match self {
            Shape::Tri => &crate::basis::TRI_EDGES,
            Shape::Quad => &QUAD_EDGES,
            Shape::Tet => &crate::basis::TET_EDGES,
            Shape::Hex => &HEX_EDGES,
        }
    }

    pub fn from_vertex_count(dim: usize, n: usize) -> Result<Shape> {
        match (dim, n) {
            (2, 3) => Ok(Shape::Tri),
            (2, 4) => Ok(Shape::Quad),
            (3, 4) => Ok(Shape::Tet),
            (3, 8) => Ok(Shape::Hex),
            _ => Err(EngineError::UnsupportedShape(format!(
                "{}-vertex cell in {}d",
                n, dim
            ))),
        }
    }
}

/// DoF counts per mesh point class (vertex, edge, face, cell volume).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DofLayout {
    pub vertex: usize,
    pub edge: usize,
    pub face: usize,
    pub volume: usize,
}

/// 1D GLL tables consumed as tensor products by quads and hexes.
pub struct LineTables {
    pub order: usize,
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
    /// deriv[(i, j)] = ℓ_j'(x_i)
    pub deriv: Mat<f64>,
}

impl LineTables {
    pub fn new(order: usize, shape: Shape) -> Result<Self> {
        let max = match shape {
            Shape::Quad => QUAD_MAX_ORDER,
            Shape::Hex => HEX_MAX_ORDER,
            _ => unreachable!("line tables are for tensor shapes"),
        };
        if order == 0 || order > max {
            return Err(EngineError::UnsupportedOrder {
                shape: shape.name(),
                order,
                max,
            });
        }
        let nodes = gauss_lobatto_nodes(order);
        let weights = gauss_lobatto_weights(order, &nodes);
        let deriv = lagrange_derivative_matrix(&nodes);
        Ok(LineTables {
            order,
            nodes,
            weights,
            deriv,
        })
    }
}

pub enum TablesKind {
    Tensor(LineTables),
    Simplex(SimplexBasis),
}

/// Immutable reference tables for one (shape, order).
pub struct Tables {
    pub shape: Shape,
    pub order: usize,
    pub num_points: usize,
    pub kind: TablesKind,
    pub layout: DofLayout,
    /// Closure permutation σ: `closure[topo] = tensor` index.
    pub closure: Vec<usize>,
}

impl Tables {
    pub fn new(shape: Shape, order: usize) -> Result<Arc<Tables>> {
        let (kind, num_points, layout) = match shape {
            Shape::Quad => {
                let line = LineTables::new(order, shape)?;
                let n = order + 1;
                (
                    TablesKind::Tensor(line),
                    n * n,
                    DofLayout {
                        vertex: 1,
                        edge: order - 1,
                        face: (order - 1) * (order - 1),
                        volume: 0,
                    },
                )
            }
            Shape::Hex => {
                let line = LineTables::new(order, shape)?;
                let n = order + 1;
                (
                    TablesKind::Tensor(line),
                    n * n * n,
                    DofLayout {
                        vertex: 1,
                        edge: order - 1,
                        face: (order - 1) * (order - 1),
                        volume: (order - 1) * (order - 1) * (order - 1),
                    },
                )
            }
            Shape::Tri => {
                let basis = SimplexBasis::triangle(order)?;
                let n = basis.num_points;
                let layout = DofLayout {
                    vertex: 1,
                    edge: basis.edge_nodes[0].len(),
                    face: basis.interior_nodes.len(),
                    volume: 0,
                };
                (TablesKind::Simplex(basis), n, layout)
            }
            Shape::Tet => {
                let basis = SimplexBasis::tetrahedron(order)?;
                let n = basis.num_points;
                let layout = DofLayout {
                    vertex: 1,
                    edge: basis.edge_nodes[0].len(),
                    face: basis.face_nodes[0].len(),
                    volume: basis.interior_nodes.len(),
                };
                (TablesKind::Simplex(basis), n, layout)
            }
        };
        let mut tables = Tables {
            shape,
            order,
            num_points,
            kind,
            layout,
            closure: Vec::new(),
        };
        tables.closure = closure::closure_permutation(&tables);
        Ok(Arc::new(tables))
    }

    pub fn line(&self) -> &LineTables {
        match &self.kind {
            TablesKind::Tensor(l) => l,
            TablesKind::Simplex(_) => panic!("simplex tables have no 1D line"),
        }
    }

    pub fn simplex(&self) -> &SimplexBasis {
        match &self.kind {
            TablesKind::Simplex(b) => b,
            TablesKind::Tensor(_) => panic!("tensor tables have no simplex basis"),
        }
    }

    /// Number of nodes along one direction of a tensor shape.
    pub fn points_1d(&self) -> usize {
        self.order + 1
    }

    /// Reference coordinates of node `idx` in tensor order.
    pub fn node_coords(&self, idx: usize) -> [f64; 3] {
        match &self.kind {
            TablesKind::Tensor(line) => {
                let n = self.order + 1;
                match self.shape {
                    Shape::Quad => [line.nodes[idx % n], line.nodes[idx / n], 0.0],
                    Shape::Hex => [
                        line.nodes[idx % n],
                        line.nodes[(idx / n) % n],
                        line.nodes[idx / (n * n)],
                    ],
                    _ => unreachable!(),
                }
            }
            TablesKind::Simplex(b) => b.points[idx],
        }
    }

    /// Reference collocation weight of node `idx` (tensor order); the
    /// product of 1D weights for tensor shapes.
    pub fn weight(&self, idx: usize) -> f64 {
        match &self.kind {
            TablesKind::Tensor(line) => {
                let n = self.order + 1;
                match self.shape {
                    Shape::Quad => line.weights[idx % n] * line.weights[idx / n],
                    Shape::Hex => {
                        line.weights[idx % n]
                            * line.weights[(idx / n) % n]
                            * line.weights[idx / (n * n)]
                    }
                    _ => unreachable!(),
                }
            }
            TablesKind::Simplex(b) => b.weights[idx],
        }
    }

    /// Lagrange basis values at an arbitrary reference point, tensor order.
    pub fn interp(&self, xi: &[f64]) -> Vec<f64> {
        match &self.kind {
            TablesKind::Tensor(line) => {
                let lr = lagrange_values(&line.nodes, xi[0]);
                let ls = lagrange_values(&line.nodes, xi[1]);
                let n = self.order + 1;
                match self.shape {
                    Shape::Quad => {
                        let mut out = Vec::with_capacity(n * n);
                        for j in 0..n {
                            for i in 0..n {
                                out.push(lr[i] * ls[j]);
                            }
                        }
                        out
                    }
                    Shape::Hex => {
                        let lt = lagrange_values(&line.nodes, xi[2]);
                        let mut out = Vec::with_capacity(n * n * n);
                        for k in 0..n {
                            for j in 0..n {
                                for i in 0..n {
                                    out.push(lr[i] * ls[j] * lt[k]);
                                }
                            }
                        }
                        out
                    }
                    _ => unreachable!(),
                }
            }
            TablesKind::Simplex(b) => b.interpolate(xi),
        }
    }
}
