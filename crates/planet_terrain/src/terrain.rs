//! Terrain context: skeleton, chunks and geometry kept consistent together.
//!
//! Per tick:
//!
//! 1. [`Terrain::split`] / [`Terrain::unsplit`] / [`Terrain::unsplit_batch`]
//!    mutate the skeleton; chunks of triangles that stop being leaves are
//!    deleted right away.
//! 2. [`Terrain::update_chunks`] chunks every new leaf and restitches chunks
//!    whose neighbors changed level.
//! 3. [`Terrain::sync_normals`] renormalizes dirty shared normals.
//!
//! [`Terrain::update`] runs steps 2 and 3.

use glam::{DVec3, Vec3};
use web_time::Instant;

use crate::chunk::{ChunkFillLayout, ChunkMeshBufferInfo, ChunkScratchpad, ChunkSkeleton, ChunkStitch};
use crate::config::{ConfigError, TerrainConfig};
use crate::geometry::TerrainGeometry;
use crate::ids::{ArenaId, ChunkId, SharedVrtxId, SkTriId};
use crate::shape::{SphereShape, SurfaceShape};
use crate::skeleton::{
  create_skeleton_icosahedron, IcoSphereTris, SkeletonVertexData, SubdivScratchpad, SubdivTriangleSkeleton,
};

/// Counts from one [`Terrain::update_chunks`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkUpdateStats {
  pub chunks_created: usize,
  /// Including deletions made by splits and unsplits since the last update.
  pub chunks_deleted: usize,
  pub chunks_restitched: usize,
  pub shared_created: usize,
  pub shared_deleted: usize,
}

/// Counts and timing from one [`Terrain::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerrainUpdateStats {
  pub chunks: ChunkUpdateStats,
  pub normals_synced: usize,
  pub elapsed_us: u64,
}

/// A planet's terrain with all of its working storage.
pub struct Terrain<S: SurfaceShape = SphereShape> {
  pub config: TerrainConfig,
  pub shape: S,

  pub skeleton: SubdivTriangleSkeleton,
  pub sk_data: SkeletonVertexData,
  pub ico: IcoSphereTris,

  pub chunks: ChunkSkeleton,
  pub chunk_layout: ChunkFillLayout,
  pub chunk_info: ChunkMeshBufferInfo,
  pub geometry: TerrainGeometry,

  pub subdiv_sp: SubdivScratchpad,
  pub chunk_sp: ChunkScratchpad,
}

impl Terrain<SphereShape> {
  /// Icosahedron planet with every root triangle queued for chunking.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "terrain::new_icosphere"))]
  pub fn new_icosphere(config: TerrainConfig) -> Result<Self, ConfigError> {
    config.validate()?;

    let shape = SphereShape::new(config.radius);
    let mut skeleton = SubdivTriangleSkeleton::new();
    let mut sk_data = SkeletonVertexData::new(config.precision);
    let ico = create_skeleton_icosahedron(&mut skeleton, &mut sk_data, config.radius);

    let chunks = ChunkSkeleton::new(
      config.chunk_subdiv_level,
      config.max_chunks,
      config.max_shared_vertices,
    );
    let chunk_layout = ChunkFillLayout::new(config.chunk_subdiv_level);
    let chunk_info = ChunkMeshBufferInfo::from_chunks(&chunk_layout, &chunks);
    let mut geometry = TerrainGeometry::default();
    geometry.resize(&chunk_info);

    let mut chunk_sp = ChunkScratchpad::default();
    chunk_sp.leaves_to_chunk.extend(ico.tris);

    #[cfg(feature = "tracing")]
    tracing::debug!(
      radius = config.radius,
      vbuf_size = chunk_info.vbuf_size,
      "created icosphere terrain"
    );

    Ok(Self {
      config,
      shape,
      skeleton,
      sk_data,
      ico,
      chunks,
      chunk_layout,
      chunk_info,
      geometry,
      subdiv_sp: SubdivScratchpad::default(),
      chunk_sp,
    })
  }
}

impl<S: SurfaceShape> Terrain<S> {
  // ---------------------------------------------------------------------------
  // Queries
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn tri_center_meters(&self, tri: SkTriId) -> DVec3 {
    self.sk_data.center_meters(tri)
  }

  #[inline]
  pub fn tri_edge_length(&self, tri: SkTriId) -> f64 {
    self.config.tri_edge_length(self.skeleton.level(tri))
  }

  // ---------------------------------------------------------------------------
  // Skeleton changes
  // ---------------------------------------------------------------------------

  fn place_new_vertices(&mut self) {
    self
      .sk_data
      .place_new_vertices(&self.skeleton, &self.shape, &self.subdiv_sp.vertices_created);
    self.subdiv_sp.vertices_created.clear();
  }

  /// Split a leaf (with cascades). Returns `false` if `tri` is not a leaf.
  pub fn split(&mut self, tri: SkTriId) -> bool {
    let first = self.subdiv_sp.splits.len();
    if self.skeleton.split(tri, &mut self.subdiv_sp).is_none() {
      return false;
    }
    self.place_new_vertices();
    self.sk_data.update_tri_centers(
      &self.skeleton,
      &self.shape,
      self.subdiv_sp.splits[first..].iter().map(|&(_, group)| group),
    );

    for i in first..self.subdiv_sp.splits.len() {
      let (parent, _) = self.subdiv_sp.splits[i];
      if let Some(chunk) = self.chunks.chunk_at(parent) {
        self.chunk_delete(chunk);
      }
    }
    true
  }

  fn delete_children_chunks(&mut self, tri: SkTriId) {
    let Some(group) = self.skeleton.tri_children(tri) else {
      return;
    };
    for child in group.triangles() {
      if let Some(chunk) = self.chunks.chunk_at(child) {
        self.chunk_delete(chunk);
      }
    }
  }

  /// Unsplit `tri` if the skeleton allows it.
  pub fn unsplit(&mut self, tri: SkTriId) -> bool {
    if !self.skeleton.can_unsplit(tri) {
      return false;
    }
    self.delete_children_chunks(tri);
    self.skeleton.unsplit(tri, &mut self.subdiv_sp)
  }

  /// Unsplit the largest subset of `candidates` that can go together.
  pub fn unsplit_batch(&mut self, candidates: &[SkTriId]) -> usize {
    let selected = self.skeleton.select_unsplittable(candidates);
    for &tri in &selected {
      self.delete_children_chunks(tri);
    }
    self.skeleton.unsplit_batch(&selected, &mut self.subdiv_sp)
  }

  // ---------------------------------------------------------------------------
  // Chunks
  // ---------------------------------------------------------------------------

  /// Create and fill a chunk over leaf `tri`.
  pub fn chunk_create(&mut self, tri: SkTriId) -> ChunkId {
    let first_added = self.chunk_sp.shared_added.len();
    let chunk = self
      .chunks
      .chunk_create(tri, &mut self.skeleton, &mut self.chunk_sp, &mut self.subdiv_sp);
    self.place_new_vertices();
    self.geometry.write_shared_positions(
      &self.chunk_sp.shared_added[first_added..],
      &self.chunks,
      &self.sk_data,
      &self.chunk_info,
    );
    self.geometry.chunk_fill(
      chunk,
      &self.chunks,
      &self.skeleton,
      &self.sk_data,
      &self.shape,
      &self.chunk_layout,
      &self.chunk_info,
    );
    chunk
  }

  /// Retract a chunk's geometry and delete it.
  pub fn chunk_delete(&mut self, chunk: ChunkId) {
    self.geometry.chunk_clear(chunk, &self.chunks, &self.chunk_info);
    let first_removed = self.chunk_sp.shared_removed.len();
    self
      .chunks
      .chunk_delete(chunk, &mut self.skeleton, &mut self.chunk_sp, &mut self.subdiv_sp);
    self
      .geometry
      .clear_shared(&self.chunk_sp.shared_removed[first_removed..], &self.chunk_info);
  }

  /// Refill a chunk with a new stitch state.
  pub fn chunk_restitch(&mut self, chunk: ChunkId, stitch: ChunkStitch) {
    self.geometry.chunk_clear(chunk, &self.chunks, &self.chunk_info);
    self.chunks.set_stitch(chunk, stitch);
    self.geometry.chunk_fill(
      chunk,
      &self.chunks,
      &self.skeleton,
      &self.sk_data,
      &self.shape,
      &self.chunk_layout,
      &self.chunk_info,
    );
  }

  /// Chunk every new leaf and restitch chunks whose neighbors changed level,
  /// then clear both scratchpads.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "terrain::update_chunks"))]
  pub fn update_chunks(&mut self) -> ChunkUpdateStats {
    let mut stats = ChunkUpdateStats::default();

    let mut leaves = std::mem::take(&mut self.chunk_sp.leaves_to_chunk);
    for &(_, group) in &self.subdiv_sp.splits {
      if self.skeleton.tri_group_ids().exists(group) {
        leaves.extend(group.triangles());
      }
    }
    for &(tri, _) in &self.subdiv_sp.unsplits {
      leaves.push(tri);
    }
    for tri in leaves.drain(..) {
      if self.skeleton.tri_exists(tri) && self.skeleton.is_leaf(tri) && self.chunks.chunk_at(tri).is_none() {
        self.chunk_create(tri);
        stats.chunks_created += 1;
      }
    }
    self.chunk_sp.leaves_to_chunk = leaves;

    // Only children of a changed triangle's subdivided neighbors can see a
    // neighbor change level.
    let mut candidates = std::mem::take(&mut self.chunk_sp.restitch_candidates);
    let changed = self.subdiv_sp.splits.iter().chain(&self.subdiv_sp.unsplits);
    for &(tri, _) in changed {
      if !self.skeleton.tri_exists(tri) {
        continue;
      }
      for neighbor in self.skeleton.neighbors(tri).into_iter().flatten() {
        let Some(group) = self.skeleton.tri_children(neighbor) else {
          continue;
        };
        candidates.extend(group.triangles().into_iter().filter_map(|c| self.chunks.chunk_at(c)));
      }
    }
    candidates.sort_unstable();
    candidates.dedup();
    for chunk in candidates.drain(..) {
      let stitch = ChunkStitch::from_skeleton(&self.skeleton, self.chunks.chunk_tri(chunk));
      if stitch != self.chunks.chunk_stitch(chunk) {
        self.chunk_restitch(chunk, stitch);
        stats.chunks_restitched += 1;
      }
    }
    self.chunk_sp.restitch_candidates = candidates;

    stats.chunks_deleted = self.chunk_sp.chunks_removed.len();
    stats.shared_created = self.chunk_sp.shared_added.len();
    stats.shared_deleted = self.chunk_sp.shared_removed.len();

    #[cfg(feature = "tracing")]
    tracing::debug!(
      created = stats.chunks_created,
      deleted = stats.chunks_deleted,
      restitched = stats.chunks_restitched,
      "chunks updated"
    );

    self.subdiv_sp.clear();
    self.chunk_sp.clear();
    stats
  }

  /// Renormalize dirty shared vertex normals.
  pub fn sync_normals(&mut self) -> usize {
    self.geometry.sync_shared_normals(&self.chunk_info)
  }

  /// [`Self::update_chunks`] followed by [`Self::sync_normals`].
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "terrain::update"))]
  pub fn update(&mut self) -> TerrainUpdateStats {
    let start = Instant::now();
    let chunks = self.update_chunks();
    let normals_synced = self.sync_normals();
    TerrainUpdateStats {
      chunks,
      normals_synced,
      elapsed_us: start.elapsed().as_micros() as u64,
    }
  }

  /// Grow chunk and shared vertex capacities.
  ///
  /// Shared vertices sit after every chunk's fill vertices, so growing the
  /// chunk capacity moves them; every live chunk is refilled.
  pub fn reserve(&mut self, max_chunks: usize, max_shared: usize) {
    self.chunks.reserve(max_chunks, max_shared);
    let info = ChunkMeshBufferInfo::from_chunks(&self.chunk_layout, &self.chunks);
    if info == self.chunk_info {
      return;
    }
    self.chunk_info = info;
    self.geometry.resize(&info);

    let shared: Vec<SharedVrtxId> = self.chunks.shared_ids().iter().collect();
    self
      .geometry
      .write_shared_positions(&shared, &self.chunks, &self.sk_data, &info);
    for id in &shared {
      if self.geometry.shared_normals[id.index()] != Vec3::ZERO {
        self.geometry.shared_normals_dirty.set(id.index());
      }
    }

    let live: Vec<ChunkId> = self.chunks.chunk_ids().iter().collect();
    for chunk in live {
      let stitch = self.chunks.chunk_stitch(chunk);
      self.chunk_restitch(chunk, stitch);
    }
  }
}

#[cfg(test)]
#[path = "terrain_test.rs"]
mod terrain_test;
