use std::collections::HashSet;

use super::*;
use crate::chunk::{generate, ChunkFillLayout, ChunkMeshBufferInfo, ChunkStitch};
use crate::ids::ChunkId;

/// Owned buffers for driving a writer without a full terrain.
struct Buffers {
  pos: Vec<Vec3>,
  nrm: Vec<Vec3>,
  shared_normals: Vec<Vec3>,
  dirty: BitVector,
  shared_used: Vec<SharedVrtxId>,
  fill_contrib: Vec<Vec3>,
  fan_contrib: Vec<FanNormalContrib>,
  faces: Vec<UVec3>,
}

impl Buffers {
  fn new(vertices: usize, shared: usize, fan_slots: usize, face_slots: usize) -> Self {
    Self {
      pos: vec![Vec3::ZERO; vertices],
      nrm: vec![Vec3::ZERO; vertices],
      shared_normals: vec![Vec3::ZERO; shared],
      dirty: BitVector::new(shared),
      shared_used: (0..shared as u32).map(SharedVrtxId).collect(),
      fill_contrib: vec![Vec3::ZERO; shared],
      fan_contrib: vec![FanNormalContrib::default(); fan_slots],
      faces: vec![UVec3::ZERO; face_slots],
    }
  }

  fn writer(&mut self) -> TerrainFaceWriter<'_> {
    TerrainFaceWriter::new(
      &self.pos,
      &mut self.nrm,
      &mut self.shared_normals,
      &mut self.dirty,
      &self.shared_used,
      &mut self.fill_contrib,
      &mut self.fan_contrib,
      &mut self.faces,
    )
  }
}

/// Unit right triangle in the XY plane, counter-clockwise from +Z.
fn xy_triangle(buffers: &mut Buffers) {
  buffers.pos[0] = Vec3::new(0.0, 0.0, 0.0);
  buffers.pos[1] = Vec3::new(1.0, 0.0, 0.0);
  buffers.pos[2] = Vec3::new(0.0, 1.0, 0.0);
}

// =============================================================================
// Normal accumulation
// =============================================================================

/// Face normals follow the winding.
#[test]
fn test_face_normal_winding() {
  let mut buffers = Buffers::new(3, 1, 4, 4);
  xy_triangle(&mut buffers);
  let mut writer = buffers.writer();
  writer.fill_add_face(0, 1, 2);
  writer.fill_add_normal_filled(0);
  writer.fill_add_face(0, 2, 1);
  writer.fill_add_normal_filled(1);
  assert_eq!(writer.face_count(), 2);
  drop(writer);

  assert_eq!(buffers.nrm[0], Vec3::Z);
  assert_eq!(buffers.nrm[1], -Vec3::Z);
  assert_eq!(buffers.faces[1], UVec3::new(0, 2, 1));
}

/// Fill contributions land in both the shared sum and the chunk's record.
#[test]
fn test_fill_shared_contribution() {
  let mut buffers = Buffers::new(3, 2, 4, 4);
  xy_triangle(&mut buffers);
  let mut writer = buffers.writer();
  writer.fill_add_face(0, 1, 2);
  writer.fill_add_normal_shared(1, ChunkLocalSharedId(1));
  drop(writer);

  assert_eq!(buffers.shared_normals[1], Vec3::Z);
  assert_eq!(buffers.fill_contrib[1], Vec3::Z);
  assert!(buffers.dirty.test(1));
  assert!(!buffers.dirty.test(0));
}

/// Repeated fan contributions to one shared vertex share one record.
#[test]
fn test_fan_contrib_merges() {
  let mut buffers = Buffers::new(3, 3, 4, 4);
  xy_triangle(&mut buffers);
  let mut writer = buffers.writer();
  for _ in 0..3 {
    writer.fan_add_face(0, 1, 2);
    writer.fan_add_normal_shared(0, SharedVrtxId(2));
  }
  assert_eq!(writer.contrib_count(), 1);
  drop(writer);

  assert_eq!(buffers.fan_contrib[0].shared, SharedVrtxId(2));
  assert_eq!(buffers.fan_contrib[0].sum, Vec3::Z * 3.0);
  assert_eq!(buffers.shared_normals[2], Vec3::Z * 3.0);
}

// =============================================================================
// Bounded fan lookup
// =============================================================================

/// Records in the first window are found after many appends.
#[test]
fn test_fan_lookup_finds_first_records() {
  let mut buffers = Buffers::new(3, 12, 12, 32);
  xy_triangle(&mut buffers);
  let mut writer = buffers.writer();
  for shared in 0..10 {
    writer.fan_add_face(0, 1, 2);
    writer.fan_add_normal_shared(0, SharedVrtxId(shared));
  }
  writer.fan_add_face(0, 1, 2);
  writer.fan_add_normal_shared(0, SharedVrtxId(0));
  writer.fan_add_normal_shared(0, SharedVrtxId(9));
  assert_eq!(writer.contrib_count(), 10);
  drop(writer);

  assert_eq!(buffers.fan_contrib[0].sum, Vec3::Z * 2.0);
  assert_eq!(buffers.fan_contrib[9].sum, Vec3::Z * 2.0);
}

/// The debug scan catches records the window misses.
#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "outside the search window")]
fn test_fan_lookup_window_miss_asserts() {
  let mut buffers = Buffers::new(3, 12, 12, 32);
  xy_triangle(&mut buffers);
  let mut writer = buffers.writer();
  for shared in 0..10 {
    writer.fan_add_face(0, 1, 2);
    writer.fan_add_normal_shared(0, SharedVrtxId(shared));
  }
  writer.fan_add_normal_shared(0, SharedVrtxId(5));
}

/// A fully fanned 32-wide chunk produces exactly one record per touched
/// shared vertex, all within the bounded window.
#[test]
fn test_fan_lookup_wide_chunk() {
  let layout = ChunkFillLayout::new(5);
  let shared_count = layout.shared_count() as usize;
  let info = ChunkMeshBufferInfo::new(&layout, 1, shared_count);
  let mut buffers = Buffers::new(
    info.vbuf_size as usize,
    shared_count,
    info.fan_max_shared_count as usize,
    info.chunk_max_face_count as usize,
  );
  // Flat chunk so every face has a usable normal.
  let w = layout.width() as f32;
  for (local, &[r, c]) in layout.fill_coords().iter().enumerate() {
    buffers.pos[info.fill_vertex(ChunkId(0), local as u32) as usize] = Vec3::new(r as f32 - 0.5 * c as f32, c as f32, 0.0);
  }
  for k in 0..shared_count {
    let (edge, t) = (k / layout.width() as usize, (k % layout.width() as usize) as f32);
    let (r, c) = match edge {
      0 => (t, 0.0),
      1 => (w, t),
      _ => (w - t, w - t),
    };
    buffers.pos[info.shared_vertex(SharedVrtxId(k as u32)) as usize] = Vec3::new(r - 0.5 * c, c, 0.0);
  }

  let stitch = ChunkStitch {
    coarse_edges: [true; 3],
  };
  let shared_used = buffers.shared_used.clone();
  let mut writer = buffers.writer();
  generate::fill_chunk(&mut writer, &layout, &info, ChunkId(0), &shared_used, stitch);
  let contribs = writer.contrib_count();
  drop(writer);

  let distinct: HashSet<_> = buffers.fan_contrib[..contribs].iter().map(|r| r.shared).collect();
  assert_eq!(distinct.len(), contribs, "duplicate fan records");
  assert_eq!(contribs, 48);
  for record in &buffers.fan_contrib[..contribs] {
    assert!(record.sum.z > 0.0, "{:?} normal points down", record.shared);
  }
}
