//! SkeletonTransition - one split or unsplit as seen by presentation.
//!
//! A transition is either a split (1 parent → 4 children) or an unsplit
//! (4 children → 1 parent). Cascaded splits produce their own transitions.

use smallvec::SmallVec;

use crate::ids::{SkTriGroupId, SkTriId};

/// Type of skeleton transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionType {
  /// 1 parent → 4 children (finer detail)
  Split,
  /// 4 children → 1 parent (coarser detail)
  Unsplit,
}

/// Atomic skeleton state change.
///
/// Group key is always the parent triangle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkeletonTransition {
  pub transition_type: TransitionType,

  /// The parent triangle (for both split and unsplit).
  pub group_key: SkTriId,

  /// Leaves added.
  /// - Split: 4 children
  /// - Unsplit: the parent
  pub tris_to_add: SmallVec<[SkTriId; 4]>,

  /// Leaves removed.
  /// - Split: the parent
  /// - Unsplit: 4 children
  pub tris_to_remove: SmallVec<[SkTriId; 4]>,
}

impl SkeletonTransition {
  /// Split transition: parent → its 4 children.
  pub fn new_split(parent: SkTriId, children: SkTriGroupId) -> Self {
    Self {
      transition_type: TransitionType::Split,
      group_key: parent,
      tris_to_add: SmallVec::from_buf(children.triangles()),
      tris_to_remove: smallvec::smallvec![parent],
    }
  }

  /// Unsplit transition: 4 removed children → parent.
  ///
  /// The children ids are already freed and may be reused.
  pub fn new_unsplit(parent: SkTriId, children: SkTriGroupId) -> Self {
    Self {
      transition_type: TransitionType::Unsplit,
      group_key: parent,
      tris_to_add: smallvec::smallvec![parent],
      tris_to_remove: SmallVec::from_buf(children.triangles()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_transition() {
    let parent = SkTriId(2);
    let children = SkTriGroupId(9);
    let transition = SkeletonTransition::new_split(parent, children);

    assert_eq!(transition.transition_type, TransitionType::Split);
    assert_eq!(transition.group_key, parent);
    assert_eq!(transition.tris_to_add.as_slice(), &children.triangles());
    assert_eq!(transition.tris_to_remove.as_slice(), &[parent]);
    assert!(!transition.tris_to_add.spilled());
  }

  #[test]
  fn test_unsplit_transition() {
    let parent = SkTriId(2);
    let children = SkTriGroupId(9);
    let transition = SkeletonTransition::new_unsplit(parent, children);

    assert_eq!(transition.transition_type, TransitionType::Unsplit);
    assert_eq!(transition.tris_to_add.as_slice(), &[parent]);
    assert_eq!(transition.tris_to_remove.len(), 4);
  }
}
