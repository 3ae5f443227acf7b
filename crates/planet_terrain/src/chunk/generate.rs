//! Chunk triangulation.
//!
//! Emits the inner grid, then one ring strip per edge in ring order. A strip
//! zips the outer edge (`x = 0, 1, .. w` along the edge) to the inner side
//! (`x = 1.5, 2.5, .. w - 1.5`), always advancing whichever side has the
//! nearer next vertex. Coarse edges only use the even outer vertices and
//! produce fan faces; everything else produces fill faces.
//!
//! A shared vertex is touched by consecutive faces of a strip, and only the
//! corners are revisited by the next strip. Fan contribution lookups rely on
//! this order.

use super::layout::{ChunkFillLayout, ChunkMeshBufferInfo};
use super::stitch::ChunkStitch;
use crate::geometry::FaceWriter;
use crate::ids::{ChunkId, ChunkLocalSharedId, SharedVrtxId};

#[derive(Clone, Copy)]
enum StripVertex {
  Outer(usize),
  Inner(u32),
}

/// Emit every face of `chunk` through `writer`.
///
/// `shared_used` is the chunk's boundary in ring order.
pub fn fill_chunk<W: FaceWriter>(
  writer: &mut W,
  layout: &ChunkFillLayout,
  info: &ChunkMeshBufferInfo,
  chunk: ChunkId,
  shared_used: &[SharedVrtxId],
  stitch: ChunkStitch,
) {
  debug_assert_eq!(shared_used.len(), layout.shared_count() as usize);

  for face in layout.inner_faces() {
    let [a, b, c] = face.map(|local| info.fill_vertex(chunk, local));
    writer.fill_add_face(a, b, c);
    for vertex in [a, b, c] {
      writer.fill_add_normal_filled(vertex);
    }
  }

  for edge in 0..3 {
    fill_edge_strip(
      writer,
      layout,
      info,
      chunk,
      shared_used,
      edge,
      stitch.coarse_edges[edge],
    );
  }
}

fn fill_edge_strip<W: FaceWriter>(
  writer: &mut W,
  layout: &ChunkFillLayout,
  info: &ChunkMeshBufferInfo,
  chunk: ChunkId,
  shared_used: &[SharedVrtxId],
  edge: usize,
  coarse: bool,
) {
  let w = layout.width() as usize;
  let step = if coarse { 2 } else { 1 };
  let outer_count = w / step;
  let inner = layout.inner_side(edge);
  let inner_count = inner.len() - 1;

  let outer_local = |a: usize| (edge * w + a * step) % (3 * w);

  let (mut a, mut b) = (0, 0);
  while a < outer_count || b < inner_count {
    // Doubled coordinates: outer vertex `a` sits at `2 * a * step`, inner
    // vertex `b` at `3 + 2 * b`.
    let advance_outer = b == inner_count || (a < outer_count && 2 * (a + 1) * step <= 3 + 2 * (b + 1));
    let face = if advance_outer {
      a += 1;
      [
        StripVertex::Outer(outer_local(a - 1)),
        StripVertex::Outer(outer_local(a)),
        StripVertex::Inner(inner[b]),
      ]
    } else {
      b += 1;
      [
        StripVertex::Outer(outer_local(a)),
        StripVertex::Inner(inner[b]),
        StripVertex::Inner(inner[b - 1]),
      ]
    };

    let [i0, i1, i2] = face.map(|v| match v {
      StripVertex::Outer(local) => info.shared_vertex(shared_used[local]),
      StripVertex::Inner(local) => info.fill_vertex(chunk, local),
    });

    if coarse {
      writer.fan_add_face(i0, i1, i2);
    } else {
      writer.fill_add_face(i0, i1, i2);
    }
    for (vertex, index) in face.into_iter().zip([i0, i1, i2]) {
      match vertex {
        StripVertex::Outer(local) if coarse => writer.fan_add_normal_shared(index, shared_used[local]),
        StripVertex::Outer(local) => {
          writer.fill_add_normal_shared(index, ChunkLocalSharedId(local as u32))
        }
        StripVertex::Inner(_) => writer.fill_add_normal_filled(index),
      }
    }
  }
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod generate_test;
