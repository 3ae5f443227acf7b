//! Flat mesh buffers and incremental vertex normals.
//!
//! Fill vertex normals are private to one chunk and recomputed whenever the
//! chunk is filled. Shared vertex normals are sums over every face touching
//! them across all chunks; each chunk remembers what it added (fill
//! contributions by ring position, fan contributions as
//! [`FanNormalContrib`] records) so it can subtract exactly that when it is
//! cleared. Changed sums are marked dirty and renormalized into `vbuf_nrm`
//! by [`TerrainGeometry::sync_shared_normals`].

use glam::{DVec3, UVec3, Vec3};

use crate::bit_vector::BitVector;
use crate::chunk::{generate, ChunkFillLayout, ChunkMeshBufferInfo, ChunkSkeleton};
use crate::ids::{ArenaId, ChunkId, SharedVrtxId};
use crate::shape::SurfaceShape;
use crate::skeleton::{SkeletonVertexData, SubdivTriangleSkeleton};

mod face_writer;

pub use face_writer::{FaceWriter, FanNormalContrib, TerrainFaceWriter, VertexIdx, FAN_CONTRIB_SEARCH_WINDOW};

/// Shared sums shorter than this are subtraction leftovers, not normals.
pub const MIN_NORMAL_SUM_SQUARED: f32 = 1e-6;

/// Vertex, normal and index buffers for every chunk.
#[derive(Clone, Debug, Default)]
pub struct TerrainGeometry {
  /// Planet-centered positions in meters.
  pub vbuf_pos: Vec<Vec3>,
  pub vbuf_nrm: Vec<Vec3>,
  /// `chunk_max_face_count` slots per chunk; the first
  /// `chunk_face_count[chunk]` are live.
  pub ibuf: Vec<UVec3>,
  pub chunk_face_count: Vec<u32>,

  /// `fan_max_shared_count` slots per chunk.
  pub chunk_fan_normal_contrib: Vec<FanNormalContrib>,
  pub chunk_fan_contrib_count: Vec<u32>,
  /// `chunk_shared_count` entries per chunk, parallel to its shared list.
  pub chunk_fill_shared_normals: Vec<Vec3>,

  /// Non-normalized normal sum per shared vertex.
  pub shared_normals: Vec<Vec3>,
  pub shared_normals_dirty: BitVector,
}

fn grow<T: Clone>(buf: &mut Vec<T>, len: usize, value: T) {
  if buf.len() < len {
    buf.resize(len, value);
  }
}

impl TerrainGeometry {
  /// Size every buffer for the capacities in `info`. Never shrinks, and
  /// leaves existing contents alone.
  pub fn resize(&mut self, info: &ChunkMeshBufferInfo) {
    let max_chunks = info.max_chunks as usize;
    let max_shared = info.max_shared as usize;

    grow(&mut self.vbuf_pos, info.vbuf_size as usize, Vec3::ZERO);
    grow(&mut self.vbuf_nrm, info.vbuf_size as usize, Vec3::ZERO);
    grow(
      &mut self.ibuf,
      max_chunks * info.chunk_max_face_count as usize,
      UVec3::ZERO,
    );
    grow(&mut self.chunk_face_count, max_chunks, 0);
    grow(
      &mut self.chunk_fan_normal_contrib,
      max_chunks * info.fan_max_shared_count as usize,
      FanNormalContrib::default(),
    );
    grow(&mut self.chunk_fan_contrib_count, max_chunks, 0);
    grow(
      &mut self.chunk_fill_shared_normals,
      max_chunks * info.chunk_shared_count as usize,
      Vec3::ZERO,
    );
    grow(&mut self.shared_normals, max_shared, Vec3::ZERO);
    self.shared_normals_dirty.resize(max_shared);
  }

  /// Copy skeleton positions of new shared vertices into the vertex buffer.
  pub fn write_shared_positions(
    &mut self,
    shared: &[SharedVrtxId],
    chunks: &ChunkSkeleton,
    sk_data: &SkeletonVertexData,
    info: &ChunkMeshBufferInfo,
  ) {
    for &id in shared {
      if !chunks.shared_ids().exists(id) {
        continue;
      }
      let vrtx = chunks.shared_skeleton_vertex(id);
      let vertex = info.shared_vertex(id) as usize;
      self.vbuf_pos[vertex] = sk_data.position_meters(vrtx).as_vec3();
      self.vbuf_nrm[vertex] = sk_data.normals[vrtx.index()];
    }
  }

  /// Reset the normal state of freed shared vertices.
  pub fn clear_shared(&mut self, shared: &[SharedVrtxId], info: &ChunkMeshBufferInfo) {
    for &id in shared {
      self.shared_normals[id.index()] = Vec3::ZERO;
      self.shared_normals_dirty.reset(id.index());
      self.vbuf_nrm[info.shared_vertex(id) as usize] = Vec3::ZERO;
    }
  }

  /// Compute fill positions and emit every face of `chunk`.
  ///
  /// The chunk's shared vertices must already have positions and the chunk
  /// must hold no contributions (fresh or cleared).
  #[allow(clippy::too_many_arguments)]
  pub fn chunk_fill<S: SurfaceShape>(
    &mut self,
    chunk: ChunkId,
    chunks: &ChunkSkeleton,
    skeleton: &SubdivTriangleSkeleton,
    sk_data: &SkeletonVertexData,
    shape: &S,
    layout: &ChunkFillLayout,
    info: &ChunkMeshBufferInfo,
  ) {
    debug_assert_eq!(self.chunk_face_count[chunk.index()], 0);
    debug_assert_eq!(self.chunk_fan_contrib_count[chunk.index()], 0);

    let tri = chunks.chunk_tri(chunk);
    let [v0, v1, v2] = skeleton.tri(tri).vertices.map(|v| sk_data.position_meters(v));
    let w = layout.width() as f64;
    let fill_range = info.fill_range(chunk);
    for (&[r, c], vertex) in layout.fill_coords().iter().zip(fill_range.clone()) {
      let p: DVec3 = v0 + (v1 - v0) * (r as f64 / w) + (v2 - v1) * (c as f64 / w);
      self.vbuf_pos[vertex] = shape.project(p).as_vec3();
    }
    self.vbuf_nrm[fill_range.clone()].fill(Vec3::ZERO);

    let face_slots = slot_range(chunk, info.chunk_max_face_count);
    let fan_slots = slot_range(chunk, info.fan_max_shared_count);
    let fill_slots = slot_range(chunk, info.chunk_shared_count);

    let mut writer = TerrainFaceWriter::new(
      &self.vbuf_pos,
      &mut self.vbuf_nrm,
      &mut self.shared_normals,
      &mut self.shared_normals_dirty,
      chunks.shared_used(chunk),
      &mut self.chunk_fill_shared_normals[fill_slots],
      &mut self.chunk_fan_normal_contrib[fan_slots],
      &mut self.ibuf[face_slots],
    );
    generate::fill_chunk(
      &mut writer,
      layout,
      info,
      chunk,
      chunks.shared_used(chunk),
      chunks.chunk_stitch(chunk),
    );
    let face_count = writer.face_count() as u32;
    let contrib_count = writer.contrib_count() as u32;

    self.chunk_face_count[chunk.index()] = face_count;
    self.chunk_fan_contrib_count[chunk.index()] = contrib_count;
    for normal in &mut self.vbuf_nrm[fill_range] {
      *normal = normal.normalize_or_zero();
    }
  }

  /// Subtract everything `chunk` contributed to shared normals and drop its
  /// faces.
  pub fn chunk_clear(&mut self, chunk: ChunkId, chunks: &ChunkSkeleton, info: &ChunkMeshBufferInfo) {
    let fill_slots = slot_range(chunk, info.chunk_shared_count);
    let shared_used = chunks.shared_used(chunk);
    for (contrib, &shared) in self.chunk_fill_shared_normals[fill_slots]
      .iter_mut()
      .zip(shared_used)
    {
      if *contrib != Vec3::ZERO {
        self.shared_normals[shared.index()] -= *contrib;
        self.shared_normals_dirty.set(shared.index());
        *contrib = Vec3::ZERO;
      }
    }

    let fan_start = slot_range(chunk, info.fan_max_shared_count).start;
    let fan_count = self.chunk_fan_contrib_count[chunk.index()] as usize;
    for record in &mut self.chunk_fan_normal_contrib[fan_start..fan_start + fan_count] {
      self.shared_normals[record.shared.index()] -= record.sum;
      self.shared_normals_dirty.set(record.shared.index());
      *record = FanNormalContrib::default();
    }

    self.chunk_fan_contrib_count[chunk.index()] = 0;
    self.chunk_face_count[chunk.index()] = 0;
  }

  /// Normalize every dirty shared normal into `vbuf_nrm` and clear the dirty
  /// bits. Returns the number of vertices updated.
  ///
  /// A sum no face contributes to (an odd vertex of a fanned edge) keeps the
  /// normal it already has.
  pub fn sync_shared_normals(&mut self, info: &ChunkMeshBufferInfo) -> usize {
    let mut count = 0;
    for shared in self.shared_normals_dirty.iter_ones() {
      let vertex = info.shared_vertex(SharedVrtxId::from_index(shared)) as usize;
      let sum = self.shared_normals[shared];
      if sum.length_squared() > MIN_NORMAL_SUM_SQUARED {
        self.vbuf_nrm[vertex] = sum.normalize();
      }
      count += 1;
    }
    self.shared_normals_dirty.clear_all();
    count
  }

  /// Live faces of `chunk`.
  pub fn chunk_faces(&self, chunk: ChunkId, info: &ChunkMeshBufferInfo) -> &[UVec3] {
    let start = slot_range(chunk, info.chunk_max_face_count).start;
    &self.ibuf[start..start + self.chunk_face_count[chunk.index()] as usize]
  }

  /// Fan contributions currently held by `chunk`.
  pub fn chunk_fan_contribs(&self, chunk: ChunkId, info: &ChunkMeshBufferInfo) -> &[FanNormalContrib] {
    let start = slot_range(chunk, info.fan_max_shared_count).start;
    &self.chunk_fan_normal_contrib[start..start + self.chunk_fan_contrib_count[chunk.index()] as usize]
  }
}

#[inline]
fn slot_range(chunk: ChunkId, per_chunk: u32) -> std::ops::Range<usize> {
  let start = chunk.index() * per_chunk as usize;
  start..start + per_chunk as usize
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
