//! Terrain statistics for debug overlays and profiling.
//!
//! Feature-gated and runtime-toggled; without the `metrics` feature every
//! `record_*`/`update_*` call is a no-op.
//!
//! # Usage
//!
//! ```ignore
//! use planet_terrain::metrics::{TerrainMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let output = refine(&mut terrain, &input);
//! metrics.record_refinement(&output.stats, refine_us);
//! metrics.record_update(&terrain.update());
//! metrics.update_from_terrain(&terrain);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::config::MAX_SKELETON_LEVEL;
use crate::ids::ArenaId;
use crate::refinement::RefinementStats;
use crate::shape::SurfaceShape;
use crate::terrain::{Terrain, TerrainUpdateStats};

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = self.buffer.iter().min()?;
    let max = self.buffer.iter().max()?;
    Some((*min, *max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128) // ~2 seconds at 60fps
  }
}

const LEVELS: usize = MAX_SKELETON_LEVEL as usize + 1;

/// Terrain-level statistics, refreshed once per tick.
#[derive(Debug, Clone)]
pub struct TerrainMetrics {
  // Skeleton
  /// Leaf triangles at each skeleton level.
  pub leaves_per_level: [u32; LEVELS],
  pub skeleton_vertices: u32,

  // Chunks
  /// Live chunks at each skeleton level.
  pub chunks_per_level: [u32; LEVELS],
  /// Chunks with at least one fan-stitched edge.
  pub fanned_chunks: u32,
  pub shared_vertices: u32,
  pub faces: u64,

  // Memory
  /// Vertex, normal and index buffer sizes.
  pub buffer_memory_bytes: u64,

  // Timing
  pub update_timings: RollingWindow<u64>,
  pub refine_timings: RollingWindow<u64>,

  // Cumulative
  pub total_chunks_created: u64,
  pub total_chunks_restitched: u64,
  pub total_splits: u64,
  pub total_unsplits: u64,
}

impl Default for TerrainMetrics {
  fn default() -> Self {
    Self {
      leaves_per_level: [0; LEVELS],
      skeleton_vertices: 0,
      chunks_per_level: [0; LEVELS],
      fanned_chunks: 0,
      shared_vertices: 0,
      faces: 0,
      buffer_memory_bytes: 0,
      update_timings: RollingWindow::default(),
      refine_timings: RollingWindow::default(),
      total_chunks_created: 0,
      total_chunks_restitched: 0,
      total_splits: 0,
      total_unsplits: 0,
    }
  }
}

impl TerrainMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Recount the snapshot fields from the terrain.
  pub fn update_from_terrain<S: SurfaceShape>(&mut self, terrain: &Terrain<S>) {
    if !is_enabled() {
      return;
    }

    self.leaves_per_level.fill(0);
    for leaf in terrain.skeleton.iter_leaves() {
      let level = (terrain.skeleton.level(leaf) as usize).min(LEVELS - 1);
      self.leaves_per_level[level] += 1;
    }
    self.skeleton_vertices = terrain.skeleton.vrtx_ids().size() as u32;

    self.chunks_per_level.fill(0);
    self.fanned_chunks = 0;
    self.faces = 0;
    for chunk in terrain.chunks.chunk_ids().iter() {
      let level = (terrain.skeleton.level(terrain.chunks.chunk_tri(chunk)) as usize).min(LEVELS - 1);
      self.chunks_per_level[level] += 1;
      if !terrain.chunks.chunk_stitch(chunk).is_uniform() {
        self.fanned_chunks += 1;
      }
      self.faces += terrain.geometry.chunk_face_count[chunk.index()] as u64;
    }
    self.shared_vertices = terrain.chunks.shared_ids().size() as u32;

    let geometry = &terrain.geometry;
    self.buffer_memory_bytes = ((geometry.vbuf_pos.len() + geometry.vbuf_nrm.len()) * 12 + geometry.ibuf.len() * 12) as u64;
  }

  /// Record one [`Terrain::update`].
  pub fn record_update(&mut self, stats: &TerrainUpdateStats) {
    if !is_enabled() {
      return;
    }
    self.update_timings.push(stats.elapsed_us);
    self.total_chunks_created += stats.chunks.chunks_created as u64;
    self.total_chunks_restitched += stats.chunks.chunks_restitched as u64;
  }

  /// Record one refinement tick.
  pub fn record_refinement(&mut self, stats: &RefinementStats, timing_us: u64) {
    if !is_enabled() {
      return;
    }
    self.refine_timings.push(timing_us);
    self.total_splits += stats.total_splits() as u64;
    self.total_unsplits += stats.unsplits_performed as u64;
  }

  pub fn total_leaves(&self) -> u32 {
    self.leaves_per_level.iter().sum()
  }

  pub fn total_chunks(&self) -> u32 {
    self.chunks_per_level.iter().sum()
  }

  /// Deepest level with a leaf.
  pub fn max_leaf_level(&self) -> Option<usize> {
    self.leaves_per_level.iter().rposition(|&count| count > 0)
  }

  pub fn avg_update_timing_us(&self) -> f64 {
    self.update_timings.average()
  }

  pub fn avg_refine_timing_us(&self) -> f64 {
    self.refine_timings.average()
  }
}
