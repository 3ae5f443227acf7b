//! Per-chunk record of which edges border a coarser chunk.

use crate::ids::SkTriId;
use crate::skeleton::SubdivTriangleSkeleton;

/// Stitch state of one chunk.
///
/// A coarse edge borders a chunk one level coarser. Its odd boundary
/// vertices have no counterpart on the other side, so the edge is
/// triangulated with fan faces over the even vertices only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkStitch {
  pub coarse_edges: [bool; 3],
}

impl ChunkStitch {
  pub const UNIFORM: Self = Self {
    coarse_edges: [false; 3],
  };

  /// Stitch state implied by the skeleton around leaf `tri`.
  pub fn from_skeleton(skeleton: &SubdivTriangleSkeleton, tri: SkTriId) -> Self {
    Self {
      coarse_edges: std::array::from_fn(|edge| skeleton.coarse_neighbor(tri, edge).is_some()),
    }
  }

  #[inline]
  pub fn is_uniform(&self) -> bool {
    *self == Self::UNIFORM
  }
}
