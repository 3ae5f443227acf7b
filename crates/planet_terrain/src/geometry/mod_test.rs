use super::*;
use crate::chunk::ChunkStitch;
use crate::config::TerrainConfig;
use crate::terrain::Terrain;

const RADIUS: f64 = 1000.0;

fn icosphere(level: u8) -> Terrain {
  let config = TerrainConfig::default()
    .with_radius(RADIUS)
    .with_chunk_subdiv_level(level)
    .with_max_chunks(256)
    .with_max_shared_vertices(16_384);
  let mut terrain = Terrain::new_icosphere(config).unwrap();
  terrain.update();
  terrain
}

fn assert_normals_close(before: &[Vec3], after: &[Vec3]) {
  assert_eq!(before.len(), after.len());
  for (i, (a, b)) in before.iter().zip(after).enumerate() {
    let tolerance = 1e-3 * a.length().max(1.0);
    assert!((*a - *b).length() <= tolerance, "shared {i}: {a} != {b}");
  }
}

// =============================================================================
// Buffer sizing
// =============================================================================

/// Resize sizes every buffer from the capacities and never shrinks.
#[test]
fn test_resize_grow_only() {
  let layout = ChunkFillLayout::new(3);
  let big = ChunkMeshBufferInfo::new(&layout, 16, 512);
  let small = ChunkMeshBufferInfo::new(&layout, 4, 64);

  let mut geometry = TerrainGeometry::default();
  geometry.resize(&big);
  assert_eq!(geometry.vbuf_pos.len(), big.vbuf_size as usize);
  assert_eq!(geometry.ibuf.len(), 16 * big.chunk_max_face_count as usize);
  assert_eq!(geometry.shared_normals.len(), 512);
  assert_eq!(geometry.shared_normals_dirty.len(), 512);

  geometry.vbuf_pos[7] = Vec3::ONE;
  geometry.resize(&small);
  geometry.resize(&big);
  assert_eq!(geometry.vbuf_pos.len(), big.vbuf_size as usize);
  assert_eq!(geometry.vbuf_pos[7], Vec3::ONE);
}

// =============================================================================
// Fill
// =============================================================================

/// Fill vertices lie on the surface and faces stay inside the chunk's
/// vertices.
#[test]
fn test_fill_positions_and_faces() {
  let terrain = icosphere(3);
  let info = &terrain.chunk_info;

  for chunk in terrain.chunks.chunk_ids().iter() {
    for vertex in info.fill_range(chunk) {
      let distance = terrain.geometry.vbuf_pos[vertex].length() as f64;
      assert!((distance - RADIUS).abs() < 1e-2, "fill vertex {vertex} at {distance}");
    }

    let shared: Vec<u32> = terrain
      .chunks
      .shared_used(chunk)
      .iter()
      .map(|&s| info.shared_vertex(s))
      .collect();
    let faces = terrain.geometry.chunk_faces(chunk, info);
    assert_eq!(faces.len(), (terrain.chunk_layout.width() * terrain.chunk_layout.width()) as usize);
    for face in faces {
      for index in face.to_array() {
        assert!(
          info.fill_range(chunk).contains(&(index as usize)) || shared.contains(&index),
          "{chunk:?} face uses foreign vertex {index}"
        );
      }
    }
  }
}

/// Synced normals are unit length and point away from the planet center.
#[test]
fn test_sync_produces_radial_normals() {
  let terrain = icosphere(3);
  let info = &terrain.chunk_info;

  assert_eq!(terrain.geometry.shared_normals_dirty.count_ones(), 0);
  for shared in terrain.chunks.shared_ids().iter() {
    let vertex = info.shared_vertex(shared) as usize;
    let normal = terrain.geometry.vbuf_nrm[vertex];
    let radial = terrain.geometry.vbuf_pos[vertex].normalize();
    assert!((normal.length() - 1.0).abs() < 1e-4);
    assert!(normal.dot(radial) > 0.95, "{shared:?} normal {normal} vs {radial}");
  }
  for chunk in terrain.chunks.chunk_ids().iter() {
    for vertex in info.fill_range(chunk) {
      let normal = terrain.geometry.vbuf_nrm[vertex];
      assert!(normal.dot(terrain.geometry.vbuf_pos[vertex].normalize()) > 0.95);
    }
  }
}

// =============================================================================
// Contribution bookkeeping
// =============================================================================

/// Clearing and refilling a chunk restores every shared normal sum.
#[test]
fn test_clear_refill_conserves_sums() {
  let mut terrain = icosphere(3);
  let before = terrain.geometry.shared_normals.clone();
  let chunk = terrain.chunks.chunk_at(terrain.ico.tris[4]).unwrap();

  terrain.geometry.chunk_clear(chunk, &terrain.chunks, &terrain.chunk_info);
  assert_eq!(terrain.geometry.chunk_face_count[chunk.index()], 0);
  assert!(terrain.geometry.shared_normals_dirty.count_ones() > 0);
  for &shared in terrain.chunks.shared_used(chunk) {
    assert!(terrain.geometry.shared_normals_dirty.test(shared.index()));
  }

  terrain.geometry.chunk_fill(
    chunk,
    &terrain.chunks,
    &terrain.skeleton,
    &terrain.sk_data,
    &terrain.shape,
    &terrain.chunk_layout,
    &terrain.chunk_info,
  );
  assert_normals_close(&before, &terrain.geometry.shared_normals);
}

/// Fan stitching records fan contributions; going back to uniform removes
/// them exactly.
#[test]
fn test_restitch_conserves_sums() {
  let mut terrain = icosphere(3);
  let before = terrain.geometry.shared_normals.clone();
  let chunk = terrain.chunks.chunk_at(terrain.ico.tris[9]).unwrap();

  terrain.chunk_restitch(
    chunk,
    ChunkStitch {
      coarse_edges: [true, false, true],
    },
  );
  let contribs = terrain.geometry.chunk_fan_contribs(chunk, &terrain.chunk_info);
  assert!(!contribs.is_empty());
  assert!(contribs.len() <= terrain.chunk_info.fan_max_shared_count as usize);
  for record in contribs {
    assert!(terrain.chunks.shared_used(chunk).contains(&record.shared));
  }
  assert!(terrain.sync_normals() > 0);

  terrain.chunk_restitch(chunk, ChunkStitch::UNIFORM);
  assert!(terrain.geometry.chunk_fan_contribs(chunk, &terrain.chunk_info).is_empty());
  assert_normals_close(&before, &terrain.geometry.shared_normals);
}

/// Sync touches exactly the dirty vertices and clears them.
#[test]
fn test_sync_clears_dirty() {
  let mut terrain = icosphere(2);
  let chunk = terrain.chunks.chunk_at(terrain.ico.tris[0]).unwrap();
  let ring_len = terrain.chunks.shared_used(chunk).len();

  terrain.geometry.chunk_clear(chunk, &terrain.chunks, &terrain.chunk_info);
  let dirty = terrain.geometry.shared_normals_dirty.count_ones();
  assert_eq!(dirty, ring_len);

  assert_eq!(terrain.sync_normals(), dirty);
  assert_eq!(terrain.geometry.shared_normals_dirty.count_ones(), 0);
  assert_eq!(terrain.sync_normals(), 0);
}

/// Freed shared vertices leave no normal state behind.
#[test]
fn test_clear_shared_resets() {
  let mut terrain = icosphere(2);
  let chunk = terrain.chunks.chunk_at(terrain.ico.tris[0]).unwrap();
  let shared = terrain.chunks.shared_used(chunk)[1];

  terrain.geometry.clear_shared(&[shared], &terrain.chunk_info);
  assert_eq!(terrain.geometry.shared_normals[shared.index()], Vec3::ZERO);
  assert!(!terrain.geometry.shared_normals_dirty.test(shared.index()));
  assert_eq!(
    terrain.geometry.vbuf_nrm[terrain.chunk_info.shared_vertex(shared) as usize],
    Vec3::ZERO
  );
}

/// A sum with nothing left in it does not overwrite the vertex normal.
#[test]
fn test_sync_skips_empty_sums() {
  let mut terrain = icosphere(2);
  let chunk = terrain.chunks.chunk_at(terrain.ico.tris[0]).unwrap();
  let ring = terrain.chunks.shared_used(chunk).to_vec();
  let (empty, leftover) = (ring[1], ring[2]);
  let normal = Vec3::new(0.0, 0.6, 0.8);

  for (shared, sum) in [(empty, Vec3::ZERO), (leftover, Vec3::splat(2e-5))] {
    terrain.geometry.shared_normals[shared.index()] = sum;
    terrain.geometry.vbuf_nrm[terrain.chunk_info.shared_vertex(shared) as usize] = normal;
    terrain.geometry.shared_normals_dirty.set(shared.index());
  }
  assert_eq!(terrain.sync_normals(), 2);

  for shared in [empty, leftover] {
    assert_eq!(terrain.geometry.vbuf_nrm[terrain.chunk_info.shared_vertex(shared) as usize], normal);
  }
}
