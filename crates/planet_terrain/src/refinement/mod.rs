//! Distance-driven skeleton refinement.
//!
//! Decides which leaves to split (closer to the viewer than their split
//! threshold) and which triangles to unsplit (all children are leaves and
//! the triangle is farther than its threshold times the hysteresis), then
//! applies the changes to a [`Terrain`].
//!
//! # Scheduling Strategy
//!
//! Unsplits are processed FIRST (farthest first) and splits SECOND (closest
//! first), both budget-limited. Splits cascade to keep neighbors within one
//! level; cascades are never limited.
//!
//! Chunks are not touched beyond what [`Terrain::split`] and
//! [`Terrain::unsplit_batch`] do themselves. Call [`Terrain::update`]
//! afterwards to chunk the new leaves.

use glam::DVec3;

use crate::ids::SkTriId;
use crate::shape::SurfaceShape;
use crate::terrain::Terrain;

pub mod budget;
pub mod transition;

pub use budget::{RefinementBudget, RefinementStats};
pub use transition::{SkeletonTransition, TransitionType};

/// Input for one refinement tick.
#[derive(Clone, Copy, Debug)]
pub struct RefinementInput {
  /// Viewer position in planet space, meters.
  pub viewer_pos: DVec3,
  /// Budget configuration for rate limiting.
  pub budget: RefinementBudget,
}

impl RefinementInput {
  pub fn new(viewer_pos: DVec3) -> Self {
    Self {
      viewer_pos,
      budget: RefinementBudget::default(),
    }
  }

  pub fn with_budget(mut self, budget: RefinementBudget) -> Self {
    self.budget = budget;
    self
  }
}

/// Output from one refinement tick.
#[derive(Clone, Debug, Default)]
pub struct RefinementOutput {
  /// Every split and unsplit applied, cascades included, sorted by
  /// proximity. Transitions with the same key keep their application order.
  pub transitions: Vec<SkeletonTransition>,
  /// Statistics from refinement execution.
  pub stats: RefinementStats,
}

/// Leaves a split at `level` may add through its cascade chain.
fn split_leaf_reserve(level: u8) -> usize {
  3 * (4 + 3 * level as usize)
}

/// Whether `leaves` leaf chunks plausibly fit the chunk and shared vertex
/// capacities. Shared vertices are estimated at half a ring per chunk.
fn fits_capacity<S: SurfaceShape>(terrain: &Terrain<S>, leaves: usize) -> bool {
  let shared_estimate = leaves * (terrain.chunks.chunk_shared_count() / 2 + 1);
  leaves <= terrain.chunks.chunk_capacity() && shared_estimate <= terrain.chunks.shared_capacity()
}

/// Refine the skeleton around `input.viewer_pos`.
///
/// # Algorithm
///
/// 1. **Identify candidates**: leaves below `max_level` inside their split
///    threshold; subdivided triangles with leaf children outside their
///    unsplit threshold
/// 2. **Validate unsplits**: keep the subset that can collapse together
///    without breaking the neighbor invariants
/// 3. **Sort by priority**: splits closest-first, unsplits farthest-first
/// 4. **Apply unsplits**: shed distant detail first (budget-limited)
/// 5. **Apply splits**: add nearby detail (budget-limited), skipping
///    triangles a cascade already split and splits that would overrun the
///    chunk capacities
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "terrain::refine"))]
pub fn refine<S: SurfaceShape>(terrain: &mut Terrain<S>, input: &RefinementInput) -> RefinementOutput {
  let viewer_pos = input.viewer_pos;
  let lod = terrain.config.lod.clone();
  let mut stats = RefinementStats::default();

  let first_split = terrain.subdiv_sp.splits.len();
  let first_unsplit = terrain.subdiv_sp.unsplits.len();

  let mut to_split: Vec<SkTriId> = Vec::new();
  let mut unsplit_candidates: Vec<SkTriId> = Vec::new();
  let mut leaves = 0usize;

  // Phase 1: Identify candidates
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("identify_candidates").entered();
    for tri in terrain.skeleton.iter_tris() {
      let level = terrain.skeleton.level(tri);
      let dist = viewer_pos.distance(terrain.tri_center_meters(tri));
      let edge_length = terrain.config.tri_edge_length(level);

      match terrain.skeleton.tri_children(tri) {
        None => {
          leaves += 1;
          if level < lod.max_level && dist < lod.split_threshold(edge_length) {
            to_split.push(tri);
          }
        }
        Some(group) => {
          let children_are_leaves = group.triangles().iter().all(|&c| terrain.skeleton.is_leaf(c));
          if children_are_leaves && dist >= lod.unsplit_threshold(edge_length) {
            unsplit_candidates.push(tri);
          }
        }
      }
    }
  }

  // Phase 2: Validate unsplits
  let mut valid_unsplits = {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("validate_unsplits").entered();
    terrain.skeleton.select_unsplittable(&unsplit_candidates)
  };

  // Phase 3: Sort by priority
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("sort_by_priority").entered();
    let dist_sq = |tri: &SkTriId| viewer_pos.distance_squared(terrain.tri_center_meters(*tri));

    // Splits: closest first (highest priority)
    to_split.sort_by(|a, b| dist_sq(a).total_cmp(&dist_sq(b)));

    // Unsplits: farthest first (shed distant load)
    valid_unsplits.sort_by(|a, b| dist_sq(b).total_cmp(&dist_sq(a)));
  }

  // Phase 4: Apply unsplits first (shed load)
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("apply_unsplits").entered();
    valid_unsplits.truncate(input.budget.unsplit_allowance(valid_unsplits.len()));
    // Truncation can cut a ring that only collapses as a whole; the batch
    // drops what no longer fits.
    stats.unsplits_performed = terrain.unsplit_batch(&valid_unsplits);
    leaves -= 3 * stats.unsplits_performed;
  }

  // Phase 5: Apply splits
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("apply_splits").entered();
    for tri in to_split {
      if !input.budget.can_split(stats.splits_performed) {
        break;
      }
      // Skip if already split by a cascade or removed by an unsplit
      if !terrain.skeleton.tri_exists(tri) || !terrain.skeleton.is_leaf(tri) {
        continue;
      }
      if !fits_capacity(terrain, leaves + split_leaf_reserve(terrain.skeleton.level(tri))) {
        #[cfg(feature = "tracing")]
        tracing::debug!(leaves, "chunk capacity reached, deferring splits");
        break;
      }

      let before = terrain.subdiv_sp.splits.len();
      if !terrain.split(tri) {
        continue;
      }
      let performed = terrain.subdiv_sp.splits.len() - before;
      leaves += 3 * performed;
      stats.splits_performed += 1;
      stats.cascade_splits_performed += performed - 1;

      #[cfg(feature = "tracing")]
      if performed > 1 {
        tracing::trace!(?tri, cascades = performed - 1, "split cascaded");
      }
    }
  }

  let mut transitions: Vec<SkeletonTransition> = terrain.subdiv_sp.unsplits[first_unsplit..]
    .iter()
    .map(|&(parent, group)| SkeletonTransition::new_unsplit(parent, group))
    .chain(
      terrain.subdiv_sp.splits[first_split..]
        .iter()
        .map(|&(parent, group)| SkeletonTransition::new_split(parent, group)),
    )
    .collect();

  // Sort transitions by proximity (for presentation priority)
  transitions.sort_by(|a, b| {
    let da = viewer_pos.distance_squared(terrain.tri_center_meters(a.group_key));
    let db = viewer_pos.distance_squared(terrain.tri_center_meters(b.group_key));
    da.total_cmp(&db)
  });

  #[cfg(feature = "tracing")]
  tracing::debug!(
    splits = stats.splits_performed,
    cascades = stats.cascade_splits_performed,
    unsplits = stats.unsplits_performed,
    "refined"
  );

  RefinementOutput { transitions, stats }
}
