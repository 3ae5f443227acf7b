use std::collections::HashSet;

use super::*;

/// Fill vertex and inner face counts follow the grid size.
#[test]
fn test_layout_counts() {
  for level in 2..=6u8 {
    let layout = ChunkFillLayout::new(level);
    let w = layout.width();
    let s = w - 3;
    assert_eq!(layout.fill_count(), (w - 1) * (w - 2) / 2, "level {level}");
    assert_eq!(layout.inner_faces().len() as u32, s * s, "level {level}");
    for edge in 0..3 {
      assert_eq!(layout.inner_side(edge).len() as u32, w - 2, "level {level}");
    }
  }
}

/// Fill indices are dense and match their coordinates.
#[test]
fn test_layout_fill_indices_dense() {
  let layout = ChunkFillLayout::new(4);
  let coords = layout.fill_coords();
  let unique: HashSet<_> = coords.iter().collect();
  assert_eq!(unique.len(), coords.len());
  for face in layout.inner_faces() {
    for &v in face {
      assert!(v < layout.fill_count());
    }
  }
}

/// Inner sides meet at the inner ring corners.
#[test]
fn test_layout_inner_sides_close() {
  let layout = ChunkFillLayout::new(3);
  for edge in 0..3 {
    let side = layout.inner_side(edge);
    let next = layout.inner_side((edge + 1) % 3);
    assert_eq!(side.last(), next.first(), "side {edge} does not meet the next one");
  }
}

/// The smallest layout has a single inner face.
#[test]
fn test_layout_minimum() {
  let layout = ChunkFillLayout::new(2);
  assert_eq!(layout.width(), 4);
  assert_eq!(layout.fill_count(), 3);
  assert_eq!(layout.inner_faces(), &[[0, 1, 2]]);
}

/// Buffer offsets put shared vertices after every chunk's fill vertices.
#[test]
fn test_buffer_info_offsets() {
  let layout = ChunkFillLayout::new(3);
  let info = ChunkMeshBufferInfo::new(&layout, 10, 100);

  assert_eq!(info.chunk_max_face_count, 64);
  assert_eq!(info.fan_max_shared_count, 15);
  assert_eq!(info.fill_vrtx_count, 21);
  assert_eq!(info.vbuf_shared_offset, 210);
  assert_eq!(info.vbuf_size, 310);
  assert_eq!(info.fill_vertex(ChunkId(2), 5), 47);
  assert_eq!(info.shared_vertex(SharedVrtxId(3)), 213);
  assert_eq!(info.fill_range(ChunkId(1)), 21..42);
}
