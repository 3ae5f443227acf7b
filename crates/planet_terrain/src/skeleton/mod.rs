//! Subdivision triangle skeleton.
//!
//! A forest of triangles where every triangle is either a leaf or split into
//! a group of 4 children. Triangles keep links to their same-level
//! neighbors; a missing link means the region across that edge is coarser
//! (or the mesh is open).
//!
//! # Child layout
//!
//! For a parent `(v0, v1, v2)` with midpoints `m0 = mid(v0, v1)`,
//! `m1 = mid(v1, v2)` and `m2 = mid(v2, v0)`:
//!
//! ```text
//!              v0
//!              /\
//!             / 0\
//!         m0 /____\ m2
//!           /\ 3  /\
//!          / 1\  / 2\
//!         /____\/____\
//!       v1     m1     v2
//! ```
//!
//! Edge `e` of a triangle runs from corner `e` to corner `e + 1`. Children
//! `e` and `e + 1` lie along parent edge `e`, each on its own edge `e`.
//!
//! # Invariants
//!
//! - **A**: a leaf has at most one subdivided neighbor.
//! - **B**: a subdivided triangle next to a leaf has leaf children along the
//!   shared edge.
//!
//! Together they keep neighboring leaves within one level of each other.
//! [`SubdivTriangleSkeleton::split`] cascades to preserve them and
//! [`SubdivTriangleSkeleton::unsplit`] refuses anything that would break
//! them. [`SubdivTriangleSkeleton::unsplit_batch`] coarsens a set of
//! triangles atomically, which is the only way to collapse a closed ring.

use std::collections::{HashMap, HashSet};

use crate::ids::{ArenaId, IdRegistry, SkTriGroupId, SkTriId, SkVrtxId};

pub mod icosahedron;
mod invariants;
pub mod scratchpad;
pub mod vertex_data;

pub use icosahedron::{create_skeleton_icosahedron, IcoSphereTris};
pub use invariants::InvariantViolation;
pub use scratchpad::SubdivScratchpad;
pub use vertex_data::SkeletonVertexData;

/// One triangle of a group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkeletonTriangle {
  pub vertices: [SkVrtxId; 3],
  /// Same-level neighbor across each edge.
  pub neighbors: [Option<SkTriId>; 3],
  pub children: Option<SkTriGroupId>,
}

/// 4 sibling triangles allocated together.
#[derive(Clone, Debug, Default)]
pub struct SkTriGroup {
  pub triangles: [SkeletonTriangle; 4],
  /// `None` for root groups.
  pub parent: Option<SkTriId>,
  pub depth: u8,
}

#[inline]
fn edge_key(a: SkVrtxId, b: SkVrtxId) -> [SkVrtxId; 2] {
  if a <= b {
    [a, b]
  } else {
    [b, a]
  }
}

/// Arena of skeleton vertices and triangle groups.
#[derive(Default)]
pub struct SubdivTriangleSkeleton {
  vrtx_ids: IdRegistry<SkVrtxId>,
  vrtx_ref_count: Vec<u32>,
  vrtx_parents: Vec<Option<[SkVrtxId; 2]>>,
  vrtx_middles: HashMap<[SkVrtxId; 2], SkVrtxId>,

  tri_group_ids: IdRegistry<SkTriGroupId>,
  tri_groups: Vec<SkTriGroup>,
}

impl SubdivTriangleSkeleton {
  pub fn new() -> Self {
    Self::default()
  }

  // ---------------------------------------------------------------------------
  // Vertices
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn vrtx_ids(&self) -> &IdRegistry<SkVrtxId> {
    &self.vrtx_ids
  }

  #[inline]
  pub fn vrtx_ref_count(&self, vrtx: SkVrtxId) -> u32 {
    self.vrtx_ref_count[vrtx.index()]
  }

  /// The two endpoints `vrtx` is the midpoint of, `None` for root vertices.
  #[inline]
  pub fn vrtx_parents(&self, vrtx: SkVrtxId) -> Option<[SkVrtxId; 2]> {
    self.vrtx_parents[vrtx.index()]
  }

  fn vrtx_create(
    &mut self,
    parents: Option<[SkVrtxId; 2]>,
    sp: Option<&mut SubdivScratchpad>,
  ) -> SkVrtxId {
    let vrtx = self.vrtx_ids.create();
    let capacity = self.vrtx_ids.capacity();
    if self.vrtx_ref_count.len() < capacity {
      self.vrtx_ref_count.resize(capacity, 0);
      self.vrtx_parents.resize(capacity, None);
    }
    self.vrtx_ref_count[vrtx.index()] = 0;
    self.vrtx_parents[vrtx.index()] = parents;
    if let Some([a, b]) = parents {
      self.vrtx_middles.insert(edge_key(a, b), vrtx);
    }
    if let Some(sp) = sp {
      sp.vertices_created.push(vrtx);
    }
    vrtx
  }

  /// Create a vertex with no parents. Used when bootstrapping a mesh.
  ///
  /// Root vertices start unreferenced; the triangles created on them hold
  /// the references.
  pub fn vrtx_create_root(&mut self) -> SkVrtxId {
    self.vrtx_create(None, None)
  }

  pub fn vrtx_find_middle(&self, a: SkVrtxId, b: SkVrtxId) -> Option<SkVrtxId> {
    self.vrtx_middles.get(&edge_key(a, b)).copied()
  }

  /// Midpoint of edge `(a, b)`, created if it does not exist.
  ///
  /// Lookup is order independent, so both triangles on an edge resolve the
  /// same vertex.
  pub fn vrtx_get_or_create_middle(
    &mut self,
    a: SkVrtxId,
    b: SkVrtxId,
    sp: &mut SubdivScratchpad,
  ) -> SkVrtxId {
    match self.vrtx_find_middle(a, b) {
      Some(middle) => middle,
      None => self.vrtx_create(Some([a, b]), Some(sp)),
    }
  }

  #[inline]
  pub fn vrtx_ref_add(&mut self, vrtx: SkVrtxId) {
    debug_assert!(self.vrtx_ids.exists(vrtx));
    self.vrtx_ref_count[vrtx.index()] += 1;
  }

  /// Drop a reference, freeing the vertex when none remain.
  pub fn vrtx_ref_release(&mut self, vrtx: SkVrtxId, sp: &mut SubdivScratchpad) {
    let count = &mut self.vrtx_ref_count[vrtx.index()];
    debug_assert!(*count > 0, "releasing unreferenced vertex {vrtx:?}");
    *count -= 1;
    if *count != 0 {
      return;
    }
    if let Some([a, b]) = self.vrtx_parents[vrtx.index()].take() {
      self.vrtx_middles.remove(&edge_key(a, b));
    }
    self.vrtx_ids.remove(vrtx);
    sp.vertices_removed.push(vrtx);
  }

  /// Fill `out` with the `2^level - 1` interior vertices of edge `(a, b)` in
  /// order from `a` to `b`, creating midpoints recursively.
  ///
  /// Newly created vertices are unreferenced; the caller takes references.
  pub fn vrtx_create_chunk_edge_recurse(
    &mut self,
    level: u8,
    a: SkVrtxId,
    b: SkVrtxId,
    out: &mut [SkVrtxId],
    sp: &mut SubdivScratchpad,
  ) {
    if level == 0 {
      return;
    }
    debug_assert_eq!(out.len(), (1usize << level) - 1);
    let middle = self.vrtx_get_or_create_middle(a, b, sp);
    let half = out.len() / 2;
    out[half] = middle;
    let (first, rest) = out.split_at_mut(half);
    self.vrtx_create_chunk_edge_recurse(level - 1, a, middle, first, sp);
    self.vrtx_create_chunk_edge_recurse(level - 1, middle, b, &mut rest[1..], sp);
  }

  // ---------------------------------------------------------------------------
  // Triangles
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn tri_group_ids(&self) -> &IdRegistry<SkTriGroupId> {
    &self.tri_group_ids
  }

  #[inline]
  pub fn tri_group(&self, group: SkTriGroupId) -> &SkTriGroup {
    debug_assert!(self.tri_group_ids.exists(group));
    &self.tri_groups[group.index()]
  }

  #[inline]
  pub fn tri_exists(&self, tri: SkTriId) -> bool {
    self.tri_group_ids.exists(tri.group())
  }

  #[inline]
  pub fn tri(&self, tri: SkTriId) -> &SkeletonTriangle {
    &self.tri_group(tri.group()).triangles[tri.sibling() as usize]
  }

  #[inline]
  fn tri_mut(&mut self, tri: SkTriId) -> &mut SkeletonTriangle {
    &mut self.tri_groups[tri.group().index()].triangles[tri.sibling() as usize]
  }

  #[inline]
  pub fn is_leaf(&self, tri: SkTriId) -> bool {
    self.tri(tri).children.is_none()
  }

  #[inline]
  pub fn level(&self, tri: SkTriId) -> u8 {
    self.tri_group(tri.group()).depth
  }

  #[inline]
  pub fn neighbors(&self, tri: SkTriId) -> [Option<SkTriId>; 3] {
    self.tri(tri).neighbors
  }

  #[inline]
  pub fn tri_parent(&self, tri: SkTriId) -> Option<SkTriId> {
    self.tri_group(tri.group()).parent
  }

  #[inline]
  pub fn tri_children(&self, tri: SkTriId) -> Option<SkTriGroupId> {
    self.tri(tri).children
  }

  /// Edge of `tri` that faces `neighbor`.
  pub fn tri_facing_edge(&self, tri: SkTriId, neighbor: SkTriId) -> Option<usize> {
    self.tri(tri).neighbors.iter().position(|n| *n == Some(neighbor))
  }

  pub fn subdivided_neighbor_count(&self, tri: SkTriId) -> usize {
    self
      .tri(tri)
      .neighbors
      .iter()
      .flatten()
      .filter(|n| !self.is_leaf(**n))
      .count()
  }

  /// The coarser leaf across `edge` when `tri` has no same-level neighbor
  /// there.
  pub fn coarse_neighbor(&self, tri: SkTriId, edge: usize) -> Option<SkTriId> {
    if self.tri(tri).neighbors[edge].is_some() {
      return None;
    }
    let parent = self.tri_parent(tri)?;
    // Center children are surrounded by their siblings.
    debug_assert_ne!(tri.sibling(), 3);
    let across = self.tri(parent).neighbors[edge]?;
    debug_assert!(
      self.is_leaf(across),
      "{tri:?} is unlinked from the children of {across:?}"
    );
    self.is_leaf(across).then_some(across)
  }

  /// Live triangles in id order.
  pub fn iter_tris(&self) -> impl Iterator<Item = SkTriId> + '_ {
    self.tri_group_ids.iter().flat_map(|group| group.triangles())
  }

  pub fn iter_leaves(&self) -> impl Iterator<Item = SkTriId> + '_ {
    self.iter_tris().filter(|tri| self.is_leaf(*tri))
  }

  fn tri_group_create(
    &mut self,
    parent: Option<SkTriId>,
    depth: u8,
    corners: [[SkVrtxId; 3]; 4],
  ) -> SkTriGroupId {
    let group = self.tri_group_ids.create();
    if self.tri_groups.len() < self.tri_group_ids.capacity() {
      self
        .tri_groups
        .resize_with(self.tri_group_ids.capacity(), SkTriGroup::default);
    }
    let mut triangles = [SkeletonTriangle::default(); 4];
    for (tri, vertices) in triangles.iter_mut().zip(corners) {
      tri.vertices = vertices;
      for vrtx in vertices {
        self.vrtx_ref_add(vrtx);
      }
    }
    self.tri_groups[group.index()] = SkTriGroup {
      triangles,
      parent,
      depth,
    };
    group
  }

  fn tri_group_remove(&mut self, group: SkTriGroupId, sp: &mut SubdivScratchpad) {
    let removed = std::mem::take(&mut self.tri_groups[group.index()]);
    for tri in removed.triangles {
      debug_assert!(tri.children.is_none());
      for vrtx in tri.vertices {
        self.vrtx_ref_release(vrtx, sp);
      }
    }
    self.tri_group_ids.remove(group);
  }

  /// Create a parentless group of 4 leaves. Neighbors start unlinked; see
  /// [`Self::tri_connect_edges`].
  pub fn tri_group_create_root(&mut self, corners: [[SkVrtxId; 3]; 4]) -> SkTriGroupId {
    self.tri_group_create(None, 0, corners)
  }

  /// Link triangles that share an edge in opposite directions.
  pub fn tri_connect_edges(&mut self, tris: &[SkTriId]) {
    let mut open: HashMap<[SkVrtxId; 2], (SkTriId, usize)> = HashMap::new();
    for &tri in tris {
      for edge in 0..3 {
        let vertices = self.tri(tri).vertices;
        let (a, b) = (vertices[edge], vertices[(edge + 1) % 3]);
        match open.remove(&[b, a]) {
          Some((other, other_edge)) => {
            self.tri_mut(tri).neighbors[edge] = Some(other);
            self.tri_mut(other).neighbors[other_edge] = Some(tri);
          }
          None => {
            open.insert([a, b], (tri, edge));
          }
        }
      }
    }
  }

  // ---------------------------------------------------------------------------
  // Split / unsplit
  // ---------------------------------------------------------------------------

  /// Subdivide a leaf into 4 children.
  ///
  /// Coarser leaves bordering `tri` are split first, and same-level leaves
  /// left with two subdivided neighbors are split afterwards, recursively.
  /// Returns `None` without changes if `tri` is already subdivided.
  pub fn split(&mut self, tri: SkTriId, sp: &mut SubdivScratchpad) -> Option<SkTriGroupId> {
    if !self.is_leaf(tri) {
      return None;
    }

    for edge in 0..3 {
      if let Some(coarse) = self.coarse_neighbor(tri, edge) {
        #[cfg(feature = "tracing")]
        tracing::trace!(?tri, ?coarse, "split cascades to coarser neighbor");
        self.split(coarse, sp);
      }
    }
    debug_assert!(self.is_leaf(tri));

    let parent = *self.tri(tri);
    let [v0, v1, v2] = parent.vertices;
    let m0 = self.vrtx_get_or_create_middle(v0, v1, sp);
    let m1 = self.vrtx_get_or_create_middle(v1, v2, sp);
    let m2 = self.vrtx_get_or_create_middle(v2, v0, sp);

    let depth = self.level(tri) + 1;
    let group = self.tri_group_create(
      Some(tri),
      depth,
      [[v0, m0, m2], [m0, v1, m1], [m2, m1, v2], [m1, m2, m0]],
    );
    self.tri_mut(tri).children = Some(group);

    let children = group.triangles();
    for corner in 0..3 {
      let edge = (corner + 1) % 3;
      self.tri_mut(children[corner]).neighbors[edge] = Some(children[3]);
      self.tri_mut(children[3]).neighbors[edge] = Some(children[corner]);
    }

    for edge in 0..3 {
      let Some(neighbor) = parent.neighbors[edge] else {
        continue;
      };
      let Some(neighbor_group) = self.tri(neighbor).children else {
        continue;
      };
      let Some(facing) = self.tri_facing_edge(neighbor, tri) else {
        debug_assert!(false, "{neighbor:?} does not link back to {tri:?}");
        continue;
      };
      // Our first half pairs with their second half and vice versa.
      let pairs = [
        (children[edge], neighbor_group.triangle(((facing + 1) % 3) as u8)),
        (children[(edge + 1) % 3], neighbor_group.triangle(facing as u8)),
      ];
      for (ours, theirs) in pairs {
        self.tri_mut(ours).neighbors[edge] = Some(theirs);
        self.tri_mut(theirs).neighbors[facing] = Some(ours);
      }
    }

    sp.splits.push((tri, group));

    for neighbor in parent.neighbors.into_iter().flatten() {
      if self.is_leaf(neighbor) && self.subdivided_neighbor_count(neighbor) > 1 {
        #[cfg(feature = "tracing")]
        tracing::trace!(?tri, ?neighbor, "split cascades to surrounded neighbor");
        self.split(neighbor, sp);
      }
    }

    Some(group)
  }

  /// Whether unsplitting `tri` keeps both invariants, assuming every
  /// triangle for which `together` returns true is unsplit at the same time.
  fn unsplit_allowed(&self, tri: SkTriId, together: impl Fn(SkTriId) -> bool) -> bool {
    let Some(group) = self.tri(tri).children else {
      return false;
    };
    if !group.triangles().iter().all(|child| self.is_leaf(*child)) {
      return false;
    }

    let mut subdivided = 0;
    for neighbor in self.tri(tri).neighbors.into_iter().flatten() {
      if together(neighbor) {
        continue;
      }
      let Some(neighbor_group) = self.tri(neighbor).children else {
        continue;
      };
      subdivided += 1;
      let Some(facing) = self.tri_facing_edge(neighbor, tri) else {
        return false;
      };
      // Their children along the edge would border a leaf.
      let along_edge = [
        neighbor_group.triangle(facing as u8),
        neighbor_group.triangle(((facing + 1) % 3) as u8),
      ];
      if !along_edge.iter().all(|child| self.is_leaf(*child)) {
        return false;
      }
    }
    subdivided <= 1
  }

  /// Whether [`Self::unsplit`] would succeed.
  pub fn can_unsplit(&self, tri: SkTriId) -> bool {
    self.unsplit_allowed(tri, |_| false)
  }

  fn unsplit_unchecked(&mut self, tri: SkTriId, sp: &mut SubdivScratchpad) {
    let Some(group) = self.tri(tri).children else {
      return;
    };

    for neighbor in self.tri(tri).neighbors.into_iter().flatten() {
      let Some(neighbor_group) = self.tri(neighbor).children else {
        continue;
      };
      if let Some(facing) = self.tri_facing_edge(neighbor, tri) {
        for sibling in [facing, (facing + 1) % 3] {
          self.tri_mut(neighbor_group.triangle(sibling as u8)).neighbors[facing] = None;
        }
      }
    }

    self.tri_group_remove(group, sp);
    self.tri_mut(tri).children = None;
    sp.unsplits.push((tri, group));
  }

  /// Remove the children of `tri`, making it a leaf again.
  ///
  /// Returns `false` without changes if the children are not all leaves or
  /// if the result would break an invariant. A ring of subdivided triangles
  /// can never be coarsened one at a time; use [`Self::unsplit_batch`].
  pub fn unsplit(&mut self, tri: SkTriId, sp: &mut SubdivScratchpad) -> bool {
    if !self.can_unsplit(tri) {
      return false;
    }
    self.unsplit_unchecked(tri, sp);
    true
  }

  /// Largest subset of `candidates` that can be unsplit together, in
  /// candidate order without duplicates.
  pub fn select_unsplittable(&self, candidates: &[SkTriId]) -> Vec<SkTriId> {
    let mut selected: HashSet<SkTriId> = candidates
      .iter()
      .copied()
      .filter(|tri| self.tri_exists(*tri) && !self.is_leaf(*tri))
      .collect();

    loop {
      let rejected: Vec<SkTriId> = selected
        .iter()
        .copied()
        .filter(|tri| !self.unsplit_allowed(*tri, |n| selected.contains(&n)))
        .collect();
      if rejected.is_empty() {
        break;
      }
      for tri in rejected {
        selected.remove(&tri);
      }
    }

    candidates
      .iter()
      .copied()
      .filter(|tri| selected.remove(tri))
      .collect()
  }

  /// Unsplit as many of `candidates` as can go together without breaking an
  /// invariant at any point visible to callers. Returns the count unsplit.
  pub fn unsplit_batch(&mut self, candidates: &[SkTriId], sp: &mut SubdivScratchpad) -> usize {
    let selected = self.select_unsplittable(candidates);
    for &tri in &selected {
      self.unsplit_unchecked(tri, sp);
    }
    selected.len()
  }
}
