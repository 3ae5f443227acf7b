use super::*;

// =============================================================================
// Triangle id packing
// =============================================================================

/// Triangle ids pack group and sibling.
#[test]
fn test_tri_id_group_roundtrip() {
  let group = SkTriGroupId(7);
  for sibling in 0..4u8 {
    let tri = group.triangle(sibling);
    assert_eq!(tri.group(), group);
    assert_eq!(tri.sibling(), sibling);
  }
  assert_eq!(group.triangles()[3], SkTriId(31));
}

// =============================================================================
// Registry
// =============================================================================

/// Fresh registries hand out ascending ids.
#[test]
fn test_registry_create_ascending() {
  let mut registry = IdRegistry::<ChunkId>::new();
  let ids: Vec<_> = (0..4).map(|_| registry.create()).collect();
  assert_eq!(ids, vec![ChunkId(0), ChunkId(1), ChunkId(2), ChunkId(3)]);
  assert_eq!(registry.size(), 4);
  assert_eq!(registry.capacity(), 4);
}

/// Removed ids are recycled and capacity does not grow.
#[test]
fn test_registry_recycles_removed() {
  let mut registry = IdRegistry::<SharedVrtxId>::new();
  let a = registry.create();
  let b = registry.create();
  registry.remove(a);
  assert!(!registry.exists(a));
  assert!(registry.exists(b));
  assert_eq!(registry.size(), 1);

  let c = registry.create();
  assert_eq!(c, a, "freed slot should be reused");
  assert_eq!(registry.capacity(), 2);
}

/// Reserved slots are used lowest first.
#[test]
fn test_registry_reserve() {
  let mut registry = IdRegistry::<ChunkId>::with_capacity(8);
  assert_eq!(registry.capacity(), 8);
  assert!(registry.is_empty());
  assert_eq!(registry.create(), ChunkId(0));
  assert_eq!(registry.create(), ChunkId(1));

  registry.reserve(4);
  assert_eq!(registry.capacity(), 8, "reserve never shrinks");
}

/// Iteration only yields live ids.
#[test]
fn test_registry_iter_live() {
  let mut registry = IdRegistry::<SkVrtxId>::new();
  let ids: Vec<_> = (0..5).map(|_| registry.create()).collect();
  registry.remove(ids[1]);
  registry.remove(ids[3]);
  let live: Vec<_> = registry.iter().collect();
  assert_eq!(live, vec![ids[0], ids[2], ids[4]]);
}

/// Ids past capacity do not exist.
#[test]
fn test_registry_exists_out_of_range() {
  let registry = IdRegistry::<SkVrtxId>::with_capacity(2);
  assert!(!registry.exists(SkVrtxId(0)));
  assert!(!registry.exists(SkVrtxId(100)));
}
