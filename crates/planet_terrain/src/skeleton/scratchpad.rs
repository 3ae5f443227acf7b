//! Reusable record of skeleton changes made during one tick.

use crate::ids::{SkTriGroupId, SkTriId, SkVrtxId};

/// Everything the skeleton created or destroyed since the last [`clear`].
///
/// Cascaded splits are recorded like requested ones. Lists keep their
/// allocations across ticks.
///
/// [`clear`]: SubdivScratchpad::clear
#[derive(Clone, Debug, Default)]
pub struct SubdivScratchpad {
  /// In creation order; parents always precede their midpoints.
  pub vertices_created: Vec<SkVrtxId>,
  pub vertices_removed: Vec<SkVrtxId>,
  /// `(parent, children)` per split.
  pub splits: Vec<(SkTriId, SkTriGroupId)>,
  /// `(parent, removed children)` per unsplit.
  pub unsplits: Vec<(SkTriId, SkTriGroupId)>,
}

impl SubdivScratchpad {
  pub fn clear(&mut self) {
    self.vertices_created.clear();
    self.vertices_removed.clear();
    self.splits.clear();
    self.unsplits.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.vertices_created.is_empty()
      && self.vertices_removed.is_empty()
      && self.splits.is_empty()
      && self.unsplits.is_empty()
  }
}
