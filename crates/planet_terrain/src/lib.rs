//! planet_terrain - Seamless level-of-detail terrain for whole planets
//!
//! A planet starts as an icosahedron whose triangles are subdivided where
//! detail is needed. Every leaf triangle carries a chunk: a triangular grid
//! of `2^n` segments per edge whose border vertices are shared with the
//! neighboring chunks, so the mesh has no cracks. Where a neighbor is one
//! level coarser the chunk fans its edge onto every other border vertex.
//!
//! # Features
//!
//! - **Subdivision skeleton**: 4-way triangle splits with neighbor links,
//!   cascading splits that keep adjacent leaves within one level, and
//!   guarded unsplits
//! - **Chunk stitching**: shared border vertices with reference counts and
//!   fan stitching along coarser edges
//! - **Incremental normals**: per-chunk contribution records so chunks can
//!   be added, removed or restitched without recomputing the planet
//! - **Distance refinement**: budgeted split/unsplit driver with hysteresis
//!
//! Optional cargo features: `tracing` (spans and events) and `metrics`
//! (terrain statistics).
//!
//! # Example
//!
//! ```ignore
//! use planet_terrain::{refine, RefinementInput, Terrain, TerrainConfig};
//!
//! let mut terrain = Terrain::new_icosphere(TerrainConfig::default())?;
//!
//! // Each tick
//! let output = refine(&mut terrain, &RefinementInput::new(viewer_pos));
//! let stats = terrain.update();
//!
//! // Upload terrain.geometry.vbuf_pos / vbuf_nrm and the live faces of each
//! // chunk from terrain.geometry.chunk_faces(chunk, &terrain.chunk_info).
//! ```

pub mod bit_vector;
pub mod config;
pub mod ids;
pub mod shape;

pub use bit_vector::BitVector;
pub use config::{ConfigError, LodConfig, TerrainConfig};
pub use ids::{ArenaId, ChunkId, ChunkLocalSharedId, IdRegistry, SharedVrtxId, SkTriGroupId, SkTriId, SkVrtxId};
pub use shape::{SphereShape, SurfaceShape};

// Subdivision skeleton
pub mod skeleton;
pub use skeleton::{InvariantViolation, SkeletonVertexData, SubdivScratchpad, SubdivTriangleSkeleton};

// Chunks over leaf triangles
pub mod chunk;
pub use chunk::{ChunkFillLayout, ChunkMeshBufferInfo, ChunkScratchpad, ChunkSkeleton, ChunkStitch};

// Mesh buffers and normals
pub mod geometry;
pub use geometry::{FaceWriter, TerrainGeometry};

// Terrain context
pub mod terrain;
pub use terrain::{ChunkUpdateStats, Terrain, TerrainUpdateStats};

// Distance-driven refinement
pub mod refinement;
pub use refinement::{
  refine, RefinementBudget, RefinementInput, RefinementOutput, RefinementStats, SkeletonTransition, TransitionType,
};

pub mod metrics;
