//! Rate limiting configuration for skeleton refinement.
//!
//! Prevents frame spikes by limiting the number of requested splits and
//! unsplits per tick. Cascaded splits are mandatory for correctness and are
//! never limited, only counted.

/// Rate limiting configuration for skeleton refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefinementBudget {
  /// Maximum requested splits per tick (0 = unlimited).
  pub max_splits: usize,
  /// Maximum unsplits per tick (0 = unlimited).
  pub max_unsplits: usize,
}

impl RefinementBudget {
  /// Default budget with reasonable limits.
  pub const DEFAULT: Self = Self {
    max_splits: 32,
    max_unsplits: 32,
  };

  /// Unlimited budget for testing or initial loads.
  pub const UNLIMITED: Self = Self {
    max_splits: usize::MAX,
    max_unsplits: usize::MAX,
  };

  /// Check if more splits can be performed.
  #[inline]
  pub fn can_split(&self, performed: usize) -> bool {
    self.max_splits == 0 || performed < self.max_splits
  }

  /// How many of `candidates` unsplits fit in the budget.
  #[inline]
  pub fn unsplit_allowance(&self, candidates: usize) -> usize {
    if self.max_unsplits == 0 {
      candidates
    } else {
      candidates.min(self.max_unsplits)
    }
  }
}

impl Default for RefinementBudget {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Statistics from refinement execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefinementStats {
  /// Number of requested splits performed.
  pub splits_performed: usize,
  /// Number of unsplits performed.
  pub unsplits_performed: usize,
  /// Splits triggered by cascades to keep neighbors within one level.
  pub cascade_splits_performed: usize,
}

impl RefinementStats {
  /// Total number of transitions performed.
  #[inline]
  pub fn total_transitions(&self) -> usize {
    self.splits_performed + self.unsplits_performed + self.cascade_splits_performed
  }

  /// Total splits including cascades.
  #[inline]
  pub fn total_splits(&self) -> usize {
    self.splits_performed + self.cascade_splits_performed
  }
}
