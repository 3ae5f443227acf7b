//! Precomputed triangulation of one chunk resolution.
//!
//! Chunk grid coordinates `(r, c)` with `0 <= c <= r <= w` address the
//! point `v0 + r/w * (v1 - v0) + c/w * (v2 - v1)` of the chunk triangle.
//! The outer ring (`c == 0`, `r == w` or `c == r`) is made of shared
//! vertices. Everything else is a fill vertex private to the chunk.
//!
//! Faces are split in two parts:
//!
//! - the inner grid between fill vertices, identical for every chunk,
//! - a ring strip per edge zipping the outer edge to the matching inner side
//!   (see [`super::generate`]).

use crate::chunk::ChunkSkeleton;
use crate::ids::{ArenaId, ChunkId, SharedVrtxId};

/// Index into a chunk's fill vertices.
pub type FillLocalId = u32;

/// Interior layout for chunks with `2^subdiv_level` segments per edge.
#[derive(Clone, Debug)]
pub struct ChunkFillLayout {
  width: u32,
  fill_coords: Vec<[u32; 2]>,
  inner_faces: Vec<[FillLocalId; 3]>,
  inner_sides: [Vec<FillLocalId>; 3],
}

impl ChunkFillLayout {
  pub fn new(subdiv_level: u8) -> Self {
    let width = 1u32 << subdiv_level;
    assert!(width >= 4, "chunks need at least 4 segments per edge");
    let w = width;

    let mut fill_coords = Vec::with_capacity(fill_count_for(w) as usize);
    for r in 2..w {
      for c in 1..r {
        fill_coords.push([r, c]);
      }
    }

    let index = |r: u32, c: u32| -> FillLocalId {
      debug_assert!(r >= 2 && c >= 1 && c < r && r < w);
      let row = r - 2;
      row * (row + 1) / 2 + (c - 1)
    };

    let mut inner_faces = Vec::new();
    for r in 2..w - 1 {
      for c in 1..r {
        inner_faces.push([index(r, c), index(r + 1, c), index(r + 1, c + 1)]);
        if c + 1 < r {
          inner_faces.push([index(r, c), index(r + 1, c + 1), index(r, c + 1)]);
        }
      }
    }

    // Each side runs parallel to the outer edge of the same index and in
    // the same direction.
    let inner_sides = [
      (2..w).map(|r| index(r, 1)).collect(),
      (1..w - 1).map(|c| index(w - 1, c)).collect(),
      (2..w).rev().map(|r| index(r, r - 1)).collect(),
    ];

    Self {
      width,
      fill_coords,
      inner_faces,
      inner_sides,
    }
  }

  /// Segments per chunk edge.
  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  pub fn fill_count(&self) -> u32 {
    self.fill_coords.len() as u32
  }

  /// Grid coordinates `(r, c)` of every fill vertex.
  #[inline]
  pub fn fill_coords(&self) -> &[[u32; 2]] {
    &self.fill_coords
  }

  /// Faces between fill vertices, wound like the chunk triangle.
  #[inline]
  pub fn inner_faces(&self) -> &[[FillLocalId; 3]] {
    &self.inner_faces
  }

  /// Fill vertices along the inner ring facing edge `edge`.
  #[inline]
  pub fn inner_side(&self, edge: usize) -> &[FillLocalId] {
    &self.inner_sides[edge]
  }

  /// Number of shared vertices on a chunk's boundary.
  #[inline]
  pub fn shared_count(&self) -> u32 {
    self.width * 3
  }
}

#[inline]
fn fill_count_for(w: u32) -> u32 {
  (w - 1) * (w - 2) / 2
}

/// Sizes and offsets of the flat geometry buffers.
///
/// The vertex buffer holds every chunk's fill vertices first, then one slot
/// per shared vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkMeshBufferInfo {
  pub chunk_max_face_count: u32,
  /// Upper bound of distinct shared vertices touched by fan faces.
  pub fan_max_shared_count: u32,
  pub chunk_shared_count: u32,
  pub fill_vrtx_count: u32,
  pub max_chunks: u32,
  /// Shared vertex slots. Every chunk holds its whole ring, so the odd
  /// vertices of fanned edges count here even though no face uses them.
  pub max_shared: u32,
  pub vbuf_fill_offset: u32,
  pub vbuf_shared_offset: u32,
  pub vbuf_size: u32,
}

impl ChunkMeshBufferInfo {
  pub fn new(layout: &ChunkFillLayout, max_chunks: usize, max_shared: usize) -> Self {
    let w = layout.width();
    let fill_vrtx_count = layout.fill_count();
    let max_chunks = max_chunks as u32;
    let max_shared = max_shared as u32;
    let vbuf_shared_offset = max_chunks * fill_vrtx_count;
    Self {
      chunk_max_face_count: w * w,
      fan_max_shared_count: 3 * (w / 2 + 1),
      chunk_shared_count: layout.shared_count(),
      fill_vrtx_count,
      max_chunks,
      max_shared,
      vbuf_fill_offset: 0,
      vbuf_shared_offset,
      vbuf_size: vbuf_shared_offset + max_shared,
    }
  }

  pub fn from_chunks(layout: &ChunkFillLayout, chunks: &ChunkSkeleton) -> Self {
    Self::new(layout, chunks.chunk_capacity(), chunks.shared_capacity())
  }

  #[inline]
  pub fn fill_vertex(&self, chunk: ChunkId, local: FillLocalId) -> u32 {
    self.vbuf_fill_offset + chunk.index() as u32 * self.fill_vrtx_count + local
  }

  #[inline]
  pub fn shared_vertex(&self, shared: SharedVrtxId) -> u32 {
    self.vbuf_shared_offset + shared.0
  }

  /// Range of `chunk`'s fill vertices in the vertex buffer.
  #[inline]
  pub fn fill_range(&self, chunk: ChunkId) -> std::ops::Range<usize> {
    let start = self.fill_vertex(chunk, 0) as usize;
    start..start + self.fill_vrtx_count as usize
  }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;
