//! Face emission protocol and the normal-accumulating writer.

use glam::{UVec3, Vec3};

use crate::bit_vector::BitVector;
use crate::ids::{ArenaId, ChunkLocalSharedId, SharedVrtxId};

/// Index into the vertex buffer.
pub type VertexIdx = u32;

/// Records and fan contributions searched at each end of a chunk's fan list.
pub const FAN_CONTRIB_SEARCH_WINDOW: usize = 4;

/// Receives the faces of one chunk.
///
/// Every `*_add_face` is followed by one `*_add_normal_*` call per corner,
/// which adds that face's normal to the corner.
pub trait FaceWriter {
  /// Face whose shared corners all belong to uniform edges.
  fn fill_add_face(&mut self, a: VertexIdx, b: VertexIdx, c: VertexIdx);

  fn fill_add_normal_shared(&mut self, vertex: VertexIdx, local: ChunkLocalSharedId);

  /// Corner is a fill vertex private to the chunk.
  fn fill_add_normal_filled(&mut self, vertex: VertexIdx);

  /// Face stitching a coarse edge.
  fn fan_add_face(&mut self, a: VertexIdx, b: VertexIdx, c: VertexIdx);

  fn fan_add_normal_shared(&mut self, vertex: VertexIdx, shared: SharedVrtxId);
}

/// What one chunk's fan faces added to one shared vertex normal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FanNormalContrib {
  pub shared: SharedVrtxId,
  pub sum: Vec3,
}

/// [`FaceWriter`] over one chunk's slices of [`super::TerrainGeometry`].
pub struct TerrainFaceWriter<'a> {
  vbuf_pos: &'a [Vec3],
  vbuf_nrm: &'a mut [Vec3],
  shared_normals: &'a mut [Vec3],
  shared_normals_dirty: &'a mut BitVector,
  /// This chunk's shared list.
  shared_used: &'a [SharedVrtxId],
  /// Parallel to `shared_used`.
  fill_normal_contrib: &'a mut [Vec3],
  fan_normal_contrib: &'a mut [FanNormalContrib],
  faces: &'a mut [UVec3],

  face_count: usize,
  contrib_count: usize,
  selected_face_normal: Vec3,
}

impl<'a> TerrainFaceWriter<'a> {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    vbuf_pos: &'a [Vec3],
    vbuf_nrm: &'a mut [Vec3],
    shared_normals: &'a mut [Vec3],
    shared_normals_dirty: &'a mut BitVector,
    shared_used: &'a [SharedVrtxId],
    fill_normal_contrib: &'a mut [Vec3],
    fan_normal_contrib: &'a mut [FanNormalContrib],
    faces: &'a mut [UVec3],
  ) -> Self {
    debug_assert_eq!(shared_used.len(), fill_normal_contrib.len());
    Self {
      vbuf_pos,
      vbuf_nrm,
      shared_normals,
      shared_normals_dirty,
      shared_used,
      fill_normal_contrib,
      fan_normal_contrib,
      faces,
      face_count: 0,
      contrib_count: 0,
      selected_face_normal: Vec3::ZERO,
    }
  }

  #[inline]
  pub fn face_count(&self) -> usize {
    self.face_count
  }

  #[inline]
  pub fn contrib_count(&self) -> usize {
    self.contrib_count
  }

  fn add_face(&mut self, a: VertexIdx, b: VertexIdx, c: VertexIdx) {
    let [pa, pb, pc] = [a, b, c].map(|v| self.vbuf_pos[v as usize]);
    self.selected_face_normal = (pb - pa).cross(pc - pa).normalize_or_zero();

    assert!(
      self.face_count < self.faces.len(),
      "chunk face capacity ({}) exhausted",
      self.faces.len()
    );
    self.faces[self.face_count] = UVec3::new(a, b, c);
    self.face_count += 1;
  }

  /// Find this chunk's fan record for `shared`.
  ///
  /// Only the last and first [`FAN_CONTRIB_SEARCH_WINDOW`] records are
  /// searched: fan faces touch a shared vertex consecutively, and the ring
  /// closes on the first records.
  fn find_fan_contrib(&self, shared: SharedVrtxId) -> Option<usize> {
    let count = self.contrib_count;
    let recent = count.saturating_sub(FAN_CONTRIB_SEARCH_WINDOW);
    let records = &self.fan_normal_contrib[..count];

    if let Some(i) = records[recent..].iter().rposition(|r| r.shared == shared) {
      return Some(recent + i);
    }
    let first = FAN_CONTRIB_SEARCH_WINDOW.min(recent);
    if let Some(i) = records[..first].iter().position(|r| r.shared == shared) {
      return Some(i);
    }
    debug_assert!(
      !records.iter().any(|r| r.shared == shared),
      "fan contribution for {shared:?} is outside the search window"
    );
    None
  }

  #[inline]
  fn mark_dirty(&mut self, shared: SharedVrtxId) {
    self.shared_normals_dirty.set(shared.index());
  }
}

impl FaceWriter for TerrainFaceWriter<'_> {
  fn fill_add_face(&mut self, a: VertexIdx, b: VertexIdx, c: VertexIdx) {
    self.add_face(a, b, c);
  }

  fn fill_add_normal_shared(&mut self, _vertex: VertexIdx, local: ChunkLocalSharedId) {
    let shared = self.shared_used[local.index()];
    let normal = self.selected_face_normal;
    self.fill_normal_contrib[local.index()] += normal;
    self.shared_normals[shared.index()] += normal;
    self.mark_dirty(shared);
  }

  fn fill_add_normal_filled(&mut self, vertex: VertexIdx) {
    self.vbuf_nrm[vertex as usize] += self.selected_face_normal;
  }

  fn fan_add_face(&mut self, a: VertexIdx, b: VertexIdx, c: VertexIdx) {
    self.add_face(a, b, c);
  }

  fn fan_add_normal_shared(&mut self, _vertex: VertexIdx, shared: SharedVrtxId) {
    let normal = self.selected_face_normal;
    let index = match self.find_fan_contrib(shared) {
      Some(index) => index,
      None => {
        assert!(
          self.contrib_count < self.fan_normal_contrib.len(),
          "fan contribution capacity ({}) exhausted",
          self.fan_normal_contrib.len()
        );
        let index = self.contrib_count;
        self.fan_normal_contrib[index] = FanNormalContrib {
          shared,
          sum: Vec3::ZERO,
        };
        self.contrib_count += 1;
        index
      }
    };
    self.fan_normal_contrib[index].sum += normal;
    self.shared_normals[shared.index()] += normal;
    self.mark_dirty(shared);
  }
}

#[cfg(test)]
#[path = "face_writer_test.rs"]
mod face_writer_test;
