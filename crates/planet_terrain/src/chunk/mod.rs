//! Chunks: fixed-resolution mesh patches over leaf skeleton triangles.
//!
//! Each chunk covers one leaf with `w = 2^subdiv_level` segments per edge.
//! Its `3w` boundary vertices are skeleton vertices produced by recursive
//! edge midpoints, so two chunks on the same edge resolve the same skeleton
//! ids and therefore the same [`SharedVrtxId`]s. Shared vertices are
//! reference counted by the chunks using them.
//!
//! Boundary ring order: local id `e * w + t` is the `t`-th vertex of edge `e`,
//! starting at corner `e`.

use std::collections::HashMap;

use crate::ids::{ArenaId, ChunkId, ChunkLocalSharedId, IdRegistry, SharedVrtxId, SkTriId, SkVrtxId};
use crate::skeleton::{SubdivScratchpad, SubdivTriangleSkeleton};

pub mod generate;
pub mod layout;
pub mod scratchpad;
pub mod stitch;

pub use layout::{ChunkFillLayout, ChunkMeshBufferInfo};
pub use scratchpad::ChunkScratchpad;
pub use stitch::ChunkStitch;

/// Chunk and shared vertex bookkeeping.
#[derive(Clone, Debug)]
pub struct ChunkSkeleton {
  subdiv_level: u8,
  chunk_width: u32,
  chunk_shared_count: usize,

  chunk_ids: IdRegistry<ChunkId>,
  chunk_to_tri: Vec<SkTriId>,
  /// `chunk_shared_count` entries per chunk, in ring order.
  chunk_shared_used: Vec<SharedVrtxId>,
  chunk_stitch: Vec<ChunkStitch>,
  tri_to_chunk: HashMap<SkTriId, ChunkId>,

  shared_ids: IdRegistry<SharedVrtxId>,
  shared_ref_count: Vec<u32>,
  shared_to_skel: Vec<SkVrtxId>,
  skel_to_shared: HashMap<SkVrtxId, SharedVrtxId>,
}

impl ChunkSkeleton {
  pub fn new(subdiv_level: u8, max_chunks: usize, max_shared: usize) -> Self {
    let chunk_width = 1u32 << subdiv_level;
    let mut chunks = Self {
      subdiv_level,
      chunk_width,
      chunk_shared_count: chunk_width as usize * 3,
      chunk_ids: IdRegistry::new(),
      chunk_to_tri: Vec::new(),
      chunk_shared_used: Vec::new(),
      chunk_stitch: Vec::new(),
      tri_to_chunk: HashMap::new(),
      shared_ids: IdRegistry::new(),
      shared_ref_count: Vec::new(),
      shared_to_skel: Vec::new(),
      skel_to_shared: HashMap::new(),
    };
    chunks.reserve(max_chunks, max_shared);
    chunks
  }

  /// Grow chunk and shared vertex capacities. Never shrinks.
  pub fn reserve(&mut self, max_chunks: usize, max_shared: usize) {
    self.chunk_ids.reserve(max_chunks);
    let chunk_capacity = self.chunk_ids.capacity();
    self.chunk_to_tri.resize(chunk_capacity, SkTriId::default());
    self
      .chunk_shared_used
      .resize(chunk_capacity * self.chunk_shared_count, SharedVrtxId::default());
    self.chunk_stitch.resize(chunk_capacity, ChunkStitch::UNIFORM);

    self.shared_ids.reserve(max_shared);
    let shared_capacity = self.shared_ids.capacity();
    self.shared_ref_count.resize(shared_capacity, 0);
    self.shared_to_skel.resize(shared_capacity, SkVrtxId::default());
  }

  #[inline]
  pub fn subdiv_level(&self) -> u8 {
    self.subdiv_level
  }

  #[inline]
  pub fn chunk_width(&self) -> u32 {
    self.chunk_width
  }

  #[inline]
  pub fn chunk_shared_count(&self) -> usize {
    self.chunk_shared_count
  }

  #[inline]
  pub fn chunk_ids(&self) -> &IdRegistry<ChunkId> {
    &self.chunk_ids
  }

  #[inline]
  pub fn chunk_capacity(&self) -> usize {
    self.chunk_ids.capacity()
  }

  #[inline]
  pub fn shared_ids(&self) -> &IdRegistry<SharedVrtxId> {
    &self.shared_ids
  }

  #[inline]
  pub fn shared_capacity(&self) -> usize {
    self.shared_ids.capacity()
  }

  #[inline]
  pub fn chunk_at(&self, tri: SkTriId) -> Option<ChunkId> {
    self.tri_to_chunk.get(&tri).copied()
  }

  #[inline]
  pub fn chunk_tri(&self, chunk: ChunkId) -> SkTriId {
    self.chunk_to_tri[chunk.index()]
  }

  /// Boundary vertices of `chunk` in ring order.
  #[inline]
  pub fn shared_used(&self, chunk: ChunkId) -> &[SharedVrtxId] {
    let start = chunk.index() * self.chunk_shared_count;
    &self.chunk_shared_used[start..start + self.chunk_shared_count]
  }

  #[inline]
  pub fn shared_at(&self, chunk: ChunkId, local: ChunkLocalSharedId) -> SharedVrtxId {
    self.shared_used(chunk)[local.index()]
  }

  #[inline]
  pub fn chunk_stitch(&self, chunk: ChunkId) -> ChunkStitch {
    self.chunk_stitch[chunk.index()]
  }

  #[inline]
  pub fn set_stitch(&mut self, chunk: ChunkId, stitch: ChunkStitch) {
    self.chunk_stitch[chunk.index()] = stitch;
  }

  #[inline]
  pub fn shared_ref_count(&self, shared: SharedVrtxId) -> u32 {
    self.shared_ref_count[shared.index()]
  }

  #[inline]
  pub fn shared_skeleton_vertex(&self, shared: SharedVrtxId) -> SkVrtxId {
    self.shared_to_skel[shared.index()]
  }

  #[inline]
  pub fn find_shared(&self, vrtx: SkVrtxId) -> Option<SharedVrtxId> {
    self.skel_to_shared.get(&vrtx).copied()
  }

  fn shared_get_or_create(
    &mut self,
    vrtx: SkVrtxId,
    skeleton: &mut SubdivTriangleSkeleton,
    sp: &mut ChunkScratchpad,
  ) -> SharedVrtxId {
    if let Some(shared) = self.find_shared(vrtx) {
      self.shared_ref_count[shared.index()] += 1;
      return shared;
    }
    assert!(
      self.shared_ids.size() < self.shared_ids.capacity(),
      "shared vertex capacity ({}) exhausted",
      self.shared_ids.capacity()
    );
    let shared = self.shared_ids.create();
    self.shared_ref_count[shared.index()] = 1;
    self.shared_to_skel[shared.index()] = vrtx;
    self.skel_to_shared.insert(vrtx, shared);
    skeleton.vrtx_ref_add(vrtx);
    sp.shared_added.push(shared);
    shared
  }

  fn shared_release(
    &mut self,
    shared: SharedVrtxId,
    skeleton: &mut SubdivTriangleSkeleton,
    sp: &mut ChunkScratchpad,
    subdiv_sp: &mut SubdivScratchpad,
  ) {
    let count = &mut self.shared_ref_count[shared.index()];
    debug_assert!(*count > 0, "releasing unreferenced shared vertex {shared:?}");
    *count -= 1;
    if *count != 0 {
      return;
    }
    let vrtx = self.shared_to_skel[shared.index()];
    self.skel_to_shared.remove(&vrtx);
    self.shared_ids.remove(shared);
    skeleton.vrtx_ref_release(vrtx, subdiv_sp);
    sp.shared_removed.push(shared);
  }

  /// Create a chunk over leaf `tri`.
  ///
  /// Edge vertices missing from the skeleton are created; they need
  /// positions before the chunk is filled. The full ring is referenced
  /// whatever the stitch, so a restitch never allocates: odd vertices of a
  /// coarse edge stay reserved, unused by faces, until the coarse neighbor
  /// splits and its children pick them up.
  ///
  /// # Panics
  ///
  /// If `tri` already has a chunk or a capacity is exhausted.
  pub fn chunk_create(
    &mut self,
    tri: SkTriId,
    skeleton: &mut SubdivTriangleSkeleton,
    sp: &mut ChunkScratchpad,
    subdiv_sp: &mut SubdivScratchpad,
  ) -> ChunkId {
    debug_assert!(skeleton.is_leaf(tri), "chunks only cover leaves");
    assert!(!self.tri_to_chunk.contains_key(&tri), "{tri:?} already has a chunk");
    assert!(
      self.chunk_ids.size() < self.chunk_ids.capacity(),
      "chunk capacity ({}) exhausted",
      self.chunk_ids.capacity()
    );

    let chunk = self.chunk_ids.create();
    let w = self.chunk_width as usize;
    let corners = skeleton.tri(tri).vertices;
    let base = chunk.index() * self.chunk_shared_count;

    let mut edge_vertices = std::mem::take(&mut sp.edge_vertices);
    edge_vertices.clear();
    edge_vertices.resize(w - 1, SkVrtxId::default());
    for edge in 0..3 {
      let (a, b) = (corners[edge], corners[(edge + 1) % 3]);
      skeleton.vrtx_create_chunk_edge_recurse(self.subdiv_level, a, b, &mut edge_vertices, subdiv_sp);
      let start = base + edge * w;
      self.chunk_shared_used[start] = self.shared_get_or_create(a, skeleton, sp);
      for (t, &vrtx) in edge_vertices.iter().enumerate() {
        self.chunk_shared_used[start + 1 + t] = self.shared_get_or_create(vrtx, skeleton, sp);
      }
    }
    sp.edge_vertices = edge_vertices;

    self.chunk_to_tri[chunk.index()] = tri;
    self.chunk_stitch[chunk.index()] = ChunkStitch::from_skeleton(skeleton, tri);
    self.tri_to_chunk.insert(tri, chunk);
    sp.chunks_added.push(chunk);
    chunk
  }

  /// Delete a chunk, releasing its shared vertices.
  pub fn chunk_delete(
    &mut self,
    chunk: ChunkId,
    skeleton: &mut SubdivTriangleSkeleton,
    sp: &mut ChunkScratchpad,
    subdiv_sp: &mut SubdivScratchpad,
  ) {
    debug_assert!(self.chunk_ids.exists(chunk));
    let tri = self.chunk_to_tri[chunk.index()];
    self.tri_to_chunk.remove(&tri);

    let base = chunk.index() * self.chunk_shared_count;
    for local in 0..self.chunk_shared_count {
      let shared = self.chunk_shared_used[base + local];
      self.shared_release(shared, skeleton, sp, subdiv_sp);
    }

    self.chunk_stitch[chunk.index()] = ChunkStitch::UNIFORM;
    self.chunk_ids.remove(chunk);
    sp.chunks_removed.push(chunk);
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
