use super::*;
use crate::skeleton::{create_skeleton_icosahedron, IcoSphereTris, SkeletonVertexData};

struct Setup {
  skeleton: SubdivTriangleSkeleton,
  ico: IcoSphereTris,
  chunks: ChunkSkeleton,
  sp: ChunkScratchpad,
  subdiv_sp: SubdivScratchpad,
}

fn setup(level: u8, max_chunks: usize, max_shared: usize) -> Setup {
  let mut skeleton = SubdivTriangleSkeleton::new();
  let mut sk_data = SkeletonVertexData::new(10);
  let ico = create_skeleton_icosahedron(&mut skeleton, &mut sk_data, 1000.0);
  Setup {
    skeleton,
    ico,
    chunks: ChunkSkeleton::new(level, max_chunks, max_shared),
    sp: ChunkScratchpad::default(),
    subdiv_sp: SubdivScratchpad::default(),
  }
}

impl Setup {
  fn create(&mut self, tri: SkTriId) -> ChunkId {
    self
      .chunks
      .chunk_create(tri, &mut self.skeleton, &mut self.sp, &mut self.subdiv_sp)
  }

  fn delete(&mut self, chunk: ChunkId) {
    self
      .chunks
      .chunk_delete(chunk, &mut self.skeleton, &mut self.sp, &mut self.subdiv_sp);
  }
}

// =============================================================================
// Shared vertices
// =============================================================================

/// Two chunks on one edge see the same shared vertices, in opposite order.
#[test]
fn test_adjacent_chunks_share_edge() {
  let mut s = setup(3, 32, 1024);
  let w = s.chunks.chunk_width() as usize;
  let ring = 3 * w;

  let a = s.ico.tris[0];
  for edge in 0..3 {
    let Some(b) = s.skeleton.neighbors(a)[edge] else {
      panic!("icosahedron triangle {a:?} is missing a neighbor");
    };
    let facing = s.skeleton.tri_facing_edge(b, a).unwrap();

    let chunk_a = s.chunks.chunk_at(a).unwrap_or_else(|| s.create(a));
    let chunk_b = s.chunks.chunk_at(b).unwrap_or_else(|| s.create(b));

    for t in 0..=w {
      let ours = s.chunks.shared_used(chunk_a)[(edge * w + t) % ring];
      let theirs = s.chunks.shared_used(chunk_b)[(facing * w + w - t) % ring];
      assert_eq!(ours, theirs, "edge {edge} vertex {t}");
    }
  }
}

/// Ring vertices map back to the skeleton vertices they were created for.
#[test]
fn test_ring_starts_at_corners() {
  let mut s = setup(2, 32, 1024);
  let tri = s.ico.tris[5];
  let chunk = s.create(tri);
  let w = s.chunks.chunk_width() as usize;

  let corners = s.skeleton.tri(tri).vertices;
  for (edge, corner) in corners.into_iter().enumerate() {
    let shared = s.chunks.shared_used(chunk)[edge * w];
    assert_eq!(s.chunks.shared_skeleton_vertex(shared), corner);
    assert_eq!(s.chunks.find_shared(corner), Some(shared));
  }

  let [v0, v1, _] = corners;
  let middle = s.skeleton.vrtx_find_middle(v0, v1).unwrap();
  let shared = s.chunks.shared_used(chunk)[w / 2];
  assert_eq!(s.chunks.shared_skeleton_vertex(shared), middle);
}

/// A fully chunked icosahedron references corners 5 times and edge vertices
/// twice.
#[test]
fn test_shared_ref_counts() {
  let mut s = setup(2, 32, 1024);
  for tri in s.ico.tris {
    s.create(tri);
  }
  let w = s.chunks.chunk_width() as usize;

  assert_eq!(s.chunks.chunk_ids().size(), 20);
  assert_eq!(s.chunks.shared_ids().size(), 12 + 30 * (w - 1));
  assert_eq!(s.sp.chunks_added.len(), 20);
  assert_eq!(s.sp.shared_added.len(), 12 + 30 * (w - 1));

  for shared in s.chunks.shared_ids().iter() {
    let vrtx = s.chunks.shared_skeleton_vertex(shared);
    let expected = if s.ico.vertices.contains(&vrtx) { 5 } else { 2 };
    assert_eq!(s.chunks.shared_ref_count(shared), expected, "{shared:?}");
  }
}

// =============================================================================
// Deletion
// =============================================================================

/// Deleting every chunk frees all shared vertices and every edge vertex the
/// chunks created.
#[test]
fn test_delete_frees_everything() {
  let mut s = setup(3, 32, 1024);
  let created: Vec<ChunkId> = s.ico.tris.into_iter().map(|tri| s.create(tri)).collect();
  assert!(s.skeleton.vrtx_ids().size() > 12);

  for chunk in created {
    s.delete(chunk);
  }

  assert!(s.chunks.chunk_ids().is_empty());
  assert!(s.chunks.shared_ids().is_empty());
  assert_eq!(s.skeleton.vrtx_ids().size(), 12);
  assert_eq!(s.sp.chunks_removed.len(), 20);
  assert_eq!(s.sp.shared_removed.len(), s.sp.shared_added.len());
  for tri in s.ico.tris {
    assert_eq!(s.chunks.chunk_at(tri), None);
  }
}

/// Deleting one chunk keeps vertices still used by its neighbors.
#[test]
fn test_delete_keeps_neighbor_vertices() {
  let mut s = setup(2, 32, 1024);
  let a = s.ico.tris[0];
  let b = s.skeleton.neighbors(a)[0].unwrap();
  let chunk_a = s.create(a);
  let chunk_b = s.create(b);
  let before: Vec<SharedVrtxId> = s.chunks.shared_used(chunk_b).to_vec();

  s.delete(chunk_a);

  assert_eq!(s.chunks.shared_used(chunk_b), before.as_slice());
  for shared in before {
    assert!(s.chunks.shared_ids().exists(shared));
    assert_eq!(s.chunks.shared_ref_count(shared), 1);
  }
}

/// Freed chunk slots are reused.
#[test]
fn test_chunk_slot_reuse() {
  let mut s = setup(2, 32, 1024);
  let first = s.create(s.ico.tris[0]);
  s.delete(first);
  let second = s.create(s.ico.tris[1]);
  assert_eq!(first, second);
  assert_eq!(s.chunks.chunk_tri(second), s.ico.tris[1]);
}

// =============================================================================
// Capacity
// =============================================================================

#[test]
#[should_panic(expected = "chunk capacity")]
fn test_chunk_capacity_exhausted() {
  let mut s = setup(2, 2, 1024);
  for tri in &s.ico.tris.clone()[..3] {
    s.create(*tri);
  }
}

#[test]
#[should_panic(expected = "shared vertex capacity")]
fn test_shared_capacity_exhausted() {
  let mut s = setup(2, 32, 10);
  s.create(s.ico.tris[0]);
}

#[test]
#[should_panic(expected = "already has a chunk")]
fn test_double_create_panics() {
  let mut s = setup(2, 32, 1024);
  s.create(s.ico.tris[0]);
  s.create(s.ico.tris[0]);
}

/// Reserving more room keeps existing chunks intact.
#[test]
fn test_reserve_grows() {
  let mut s = setup(2, 4, 64);
  let chunk = s.create(s.ico.tris[0]);
  let ring: Vec<SharedVrtxId> = s.chunks.shared_used(chunk).to_vec();

  s.chunks.reserve(64, 2048);

  assert!(s.chunks.chunk_capacity() >= 64);
  assert!(s.chunks.shared_capacity() >= 2048);
  assert_eq!(s.chunks.shared_used(chunk), ring.as_slice());
}
