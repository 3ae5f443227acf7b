//! Terrain configuration and validation.

use thiserror::Error;

/// Edge length of an icosahedron inscribed in the unit sphere.
pub const ICO_EDGE_RATIO: f64 = 1.051_462_224_238_267_3;

pub const MIN_CHUNK_SUBDIV_LEVEL: u8 = 2;
pub const MAX_CHUNK_SUBDIV_LEVEL: u8 = 8;

/// Deepest skeleton level the refinement driver will split to.
pub const MAX_SKELETON_LEVEL: u8 = 24;

/// Bits of `i64` left free for midpoint sums and differences.
const POSITION_HEADROOM_BITS: f64 = 2.0;

/// Invalid configuration values.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
  #[error("radius must be positive and finite, got {0}")]
  InvalidRadius(f64),

  #[error("precision {precision} overflows 64-bit positions for a radius of {radius} m")]
  PrecisionOverflow { precision: i32, radius: f64 },

  #[error("chunk subdivision level {0} is outside 2..=8")]
  ChunkSubdivLevel(u8),

  #[error("max_chunks must be at least {min}, got {got}")]
  TooFewChunks { min: usize, got: usize },

  #[error("max_shared_vertices must be at least {min}, got {got}")]
  TooFewSharedVertices { min: usize, got: usize },

  #[error("max level {0} exceeds 24")]
  MaxLevel(u8),

  #[error("unsplit hysteresis must be at least 1.0, got {0}")]
  InvalidHysteresis(f64),
}

/// Distance policy for the refinement driver.
#[derive(Clone, Debug, PartialEq)]
pub struct LodConfig {
  /// Deepest level a requested split may produce.
  pub max_level: u8,

  /// LOD exponent: scales distance thresholds.
  /// threshold = edge_length * 2^lod_exponent
  pub lod_exponent: f64,

  /// Unsplit once farther than `threshold * unsplit_hysteresis`, so
  /// triangles near the threshold do not flip every tick.
  pub unsplit_hysteresis: f64,
}

impl Default for LodConfig {
  fn default() -> Self {
    Self {
      max_level: 12,
      lod_exponent: 1.0,
      unsplit_hysteresis: 1.5,
    }
  }
}

impl LodConfig {
  /// Split leaves at `level` closer than this.
  #[inline]
  pub fn split_threshold(&self, edge_length: f64) -> f64 {
    edge_length * 2.0_f64.powf(self.lod_exponent)
  }

  /// Unsplit triangles at `level` farther than this.
  #[inline]
  pub fn unsplit_threshold(&self, edge_length: f64) -> f64 {
    self.split_threshold(edge_length) * self.unsplit_hysteresis
  }

  pub fn with_max_level(mut self, level: u8) -> Self {
    self.max_level = level;
    self
  }

  pub fn with_lod_exponent(mut self, exponent: f64) -> Self {
    self.lod_exponent = exponent;
    self
  }

  pub fn with_unsplit_hysteresis(mut self, hysteresis: f64) -> Self {
    self.unsplit_hysteresis = hysteresis;
    self
  }
}

/// Everything needed to build a [`crate::Terrain`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainConfig {
  /// Planet radius in meters.
  pub radius: f64,

  /// Skeleton positions use `2^precision` units per meter.
  pub precision: i32,

  /// Chunks have `2^chunk_subdiv_level` segments per edge.
  pub chunk_subdiv_level: u8,

  pub max_chunks: usize,
  pub max_shared_vertices: usize,

  pub lod: LodConfig,
}

impl Default for TerrainConfig {
  fn default() -> Self {
    Self {
      radius: 50_000.0,
      precision: 10,
      chunk_subdiv_level: 4,
      max_chunks: 1024,
      max_shared_vertices: 32_768,
      lod: LodConfig::default(),
    }
  }
}

impl TerrainConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_radius(mut self, radius: f64) -> Self {
    self.radius = radius;
    self
  }

  pub fn with_precision(mut self, precision: i32) -> Self {
    self.precision = precision;
    self
  }

  pub fn with_chunk_subdiv_level(mut self, level: u8) -> Self {
    self.chunk_subdiv_level = level;
    self
  }

  pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
    self.max_chunks = max_chunks;
    self
  }

  pub fn with_max_shared_vertices(mut self, max_shared: usize) -> Self {
    self.max_shared_vertices = max_shared;
    self
  }

  pub fn with_lod(mut self, lod: LodConfig) -> Self {
    self.lod = lod;
    self
  }

  /// Chunk edge segments.
  #[inline]
  pub fn chunk_width(&self) -> usize {
    1 << self.chunk_subdiv_level
  }

  /// Shared vertices of the icosahedron fully chunked: 12 corners plus the
  /// interior vertices of 30 edges.
  #[inline]
  pub fn min_shared_vertices(&self) -> usize {
    12 + 30 * (self.chunk_width() - 1)
  }

  /// Edge length in meters of a skeleton triangle at `level`.
  #[inline]
  pub fn tri_edge_length(&self, level: u8) -> f64 {
    self.radius * ICO_EDGE_RATIO / (1u64 << level) as f64
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(self.radius.is_finite() && self.radius > 0.0) {
      return Err(ConfigError::InvalidRadius(self.radius));
    }
    if self.radius.log2() + self.precision as f64 + POSITION_HEADROOM_BITS >= 63.0 {
      return Err(ConfigError::PrecisionOverflow {
        precision: self.precision,
        radius: self.radius,
      });
    }
    if !(MIN_CHUNK_SUBDIV_LEVEL..=MAX_CHUNK_SUBDIV_LEVEL).contains(&self.chunk_subdiv_level) {
      return Err(ConfigError::ChunkSubdivLevel(self.chunk_subdiv_level));
    }
    if self.max_chunks < 20 {
      return Err(ConfigError::TooFewChunks {
        min: 20,
        got: self.max_chunks,
      });
    }
    if self.max_shared_vertices < self.min_shared_vertices() {
      return Err(ConfigError::TooFewSharedVertices {
        min: self.min_shared_vertices(),
        got: self.max_shared_vertices,
      });
    }
    if self.lod.max_level > MAX_SKELETON_LEVEL {
      return Err(ConfigError::MaxLevel(self.lod.max_level));
    }
    if self.lod.unsplit_hysteresis.is_nan() || self.lod.unsplit_hysteresis < 1.0 {
      return Err(ConfigError::InvalidHysteresis(self.lod.unsplit_hysteresis));
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
