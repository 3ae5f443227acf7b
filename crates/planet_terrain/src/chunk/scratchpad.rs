//! Reusable record of chunk changes made during one tick.

use crate::ids::{ChunkId, SharedVrtxId, SkTriId, SkVrtxId};

/// Chunk layer deltas plus working buffers reused across ticks.
#[derive(Clone, Debug, Default)]
pub struct ChunkScratchpad {
  pub chunks_added: Vec<ChunkId>,
  pub chunks_removed: Vec<ChunkId>,
  pub shared_added: Vec<SharedVrtxId>,
  pub shared_removed: Vec<SharedVrtxId>,

  /// Leaves waiting for a chunk.
  pub leaves_to_chunk: Vec<SkTriId>,
  /// Chunks whose stitch state may have changed.
  pub restitch_candidates: Vec<ChunkId>,
  /// Interior vertices of one chunk edge.
  pub(crate) edge_vertices: Vec<SkVrtxId>,
}

impl ChunkScratchpad {
  /// Clear the delta lists. Working buffers keep their allocations.
  pub fn clear(&mut self) {
    self.chunks_added.clear();
    self.chunks_removed.clear();
    self.shared_added.clear();
    self.shared_removed.clear();
    self.leaves_to_chunk.clear();
    self.restitch_candidates.clear();
  }
}
