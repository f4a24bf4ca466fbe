//! Homogeneous Dirichlet boundary decoration.
//!
//! Wraps the inner physics: at setup it resolves the named side sets to
//! the global DoFs pinned on those faces; each step, after assembly and
//! the mass solve, it zeroes the pushed acceleration there. Zeroing the
//! assembled values on the face closures covers every contributor,
//! including elements that only touch the boundary at a vertex or edge.

use std::collections::BTreeSet;

use log::warn;

use crate::assembly::Section;
use crate::mesh::Mesh;
use crate::reference::Tables;

pub struct HomogeneousDirichlet {
    pinned: Vec<usize>,
}

impl HomogeneousDirichlet {
    /// Resolve boundary names against the mesh's side sets.
    pub fn new(names: &[String], mesh: &Mesh, section: &Section, tables: &Tables) -> Self {
        let mut pinned = BTreeSet::new();
        for name in names {
            match mesh.boundary_faces.get(name) {
                Some(elems) => {
                    for (&cell, sides) in elems {
                        for &side in sides {
                            for dof in section.side_dofs(tables, cell, side) {
                                pinned.insert(dof);
                            }
                        }
                    }
                }
                None => {
                    warn!("dirichlet boundary '{}' is not a side set of the mesh", name);
                }
            }
        }
        HomogeneousDirichlet {
            pinned: pinned.into_iter().collect(),
        }
    }

    pub fn num_pinned(&self) -> usize {
        self.pinned.len()
    }

    /// Zero a global field on the pinned DoFs.
    pub fn apply(&self, field: &mut [f64]) {
        for &d in &self.pinned {
            field[d] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::uniform_quad;
    use crate::reference::{Shape, Tables};

    #[test]
    fn test_pinned_dofs_cover_square_boundary() {
        let mesh = Mesh::build(uniform_quad(-1.0, 1.0, -1.0, 1.0, 2, 2)).unwrap();
        let tables = Tables::new(Shape::Quad, 3).unwrap();
        let section = Section::build(&mesh, &tables).unwrap();
        let names: Vec<String> = ["x0", "x1", "y0", "y1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let bc = HomogeneousDirichlet::new(&names, &mesh, &section, &tables);
        // The global grid of a 2x2 mesh at order 3 is 7x7; its perimeter
        // holds 7*7 - 5*5 = 24 nodes.
        assert_eq!(bc.num_pinned(), 24);

        let mut field = vec![1.0; section.num_dofs];
        bc.apply(&mut field);
        let zeros = field.iter().filter(|&&v| v == 0.0).count();
        assert_eq!(zeros, 24);
    }

    #[test]
    fn test_unknown_boundary_is_ignored() {
        let mesh = Mesh::build(uniform_quad(0.0, 1.0, 0.0, 1.0, 1, 1)).unwrap();
        let tables = Tables::new(Shape::Quad, 2).unwrap();
        let section = Section::build(&mesh, &tables).unwrap();
        let bc = HomogeneousDirichlet::new(&["nope".to_string()], &mesh, &section, &tables);
        assert_eq!(bc.num_pinned(), 0);
    }
}
