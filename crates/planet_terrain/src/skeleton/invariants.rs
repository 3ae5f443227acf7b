//! Structural checks over the whole skeleton, for tests and debug tooling.

use thiserror::Error;

use super::SubdivTriangleSkeleton;
use crate::ids::SkTriId;

/// A broken skeleton invariant.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
  #[error("leaf {tri:?} has {count} subdivided neighbors")]
  TooManySubdividedNeighbors { tri: SkTriId, count: usize },

  #[error("{tri:?} borders leaf {leaf:?} but its child {child:?} on that edge is subdivided")]
  SubdividedEdgeChild {
    tri: SkTriId,
    leaf: SkTriId,
    child: SkTriId,
  },

  #[error("{tri:?} links to {neighbor:?} which does not link back at the same level")]
  AsymmetricNeighbor { tri: SkTriId, neighbor: SkTriId },

  #[error("{tri:?} has no neighbor on edge {edge} although its parent's neighbor there is subdivided")]
  MissingNeighbor { tri: SkTriId, edge: usize },
}

impl SubdivTriangleSkeleton {
  /// Verify neighbor symmetry and Invariants A and B for every triangle.
  pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
    for tri in self.iter_tris() {
      let neighbors = self.neighbors(tri);

      for (edge, neighbor) in neighbors.iter().enumerate() {
        let Some(neighbor) = *neighbor else {
          let across = self
            .tri_parent(tri)
            .and_then(|parent| self.neighbors(parent)[edge]);
          if tri.sibling() != 3 && across.is_some_and(|across| !self.is_leaf(across)) {
            return Err(InvariantViolation::MissingNeighbor { tri, edge });
          }
          continue;
        };
        if self.tri_facing_edge(neighbor, tri).is_none() || self.level(neighbor) != self.level(tri) {
          return Err(InvariantViolation::AsymmetricNeighbor { tri, neighbor });
        }
      }

      match self.tri_children(tri) {
        None => {
          let count = self.subdivided_neighbor_count(tri);
          if count > 1 {
            return Err(InvariantViolation::TooManySubdividedNeighbors { tri, count });
          }
        }
        Some(group) => {
          for (edge, neighbor) in neighbors.iter().enumerate() {
            let Some(leaf) = neighbor.filter(|n| self.is_leaf(*n)) else {
              continue;
            };
            for sibling in [edge, (edge + 1) % 3] {
              let child = group.triangle(sibling as u8);
              if !self.is_leaf(child) {
                return Err(InvariantViolation::SubdividedEdgeChild { tri, leaf, child });
              }
            }
          }
        }
      }
    }
    Ok(())
  }
}
