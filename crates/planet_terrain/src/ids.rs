//! Integer handles into the terrain arenas.
//!
//! Every entity in the skeleton, chunk and geometry layers is addressed by a
//! small copyable id. Ids index flat `Vec`s directly, so a freed id is
//! recycled by its [`IdRegistry`] instead of shrinking the pools behind it.

use std::fmt;
use std::marker::PhantomData;

/// Handle types that index into flat pools.
pub trait ArenaId: Copy + Eq + Ord + fmt::Debug {
  fn from_index(index: usize) -> Self;
  fn index(self) -> usize;
}

macro_rules! arena_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
    pub struct $name(pub u32);

    impl ArenaId for $name {
      #[inline]
      fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize);
        Self(index as u32)
      }

      #[inline]
      fn index(self) -> usize {
        self.0 as usize
      }
    }
  };
}

arena_id!(
  /// Skeleton vertex.
  SkVrtxId
);
arena_id!(
  /// Skeleton triangle, `group * 4 + sibling`.
  SkTriId
);
arena_id!(
  /// Group of 4 sibling triangles sharing one parent.
  SkTriGroupId
);
arena_id!(
  /// Chunk boundary vertex, shared between neighboring chunks.
  SharedVrtxId
);
arena_id!(
  /// Mesh patch covering one leaf triangle.
  ChunkId
);
arena_id!(
  /// Position within a chunk's boundary ring, `0..3 * chunk_width`.
  ChunkLocalSharedId
);

impl SkTriId {
  #[inline]
  pub fn from_group(group: SkTriGroupId, sibling: u8) -> Self {
    debug_assert!(sibling < 4);
    Self(group.0 * 4 + sibling as u32)
  }

  #[inline]
  pub fn group(self) -> SkTriGroupId {
    SkTriGroupId(self.0 / 4)
  }

  /// Index within the group. 3 is the center child.
  #[inline]
  pub fn sibling(self) -> u8 {
    (self.0 % 4) as u8
  }
}

impl SkTriGroupId {
  #[inline]
  pub fn triangle(self, sibling: u8) -> SkTriId {
    SkTriId::from_group(self, sibling)
  }

  #[inline]
  pub fn triangles(self) -> [SkTriId; 4] {
    [self.triangle(0), self.triangle(1), self.triangle(2), self.triangle(3)]
  }
}

/// Free-list id allocator.
///
/// Tracks which ids are alive. `capacity` is the number of slots ever
/// handed out (or reserved); pools keyed by the id are sized to it.
#[derive(Clone, Debug)]
pub struct IdRegistry<Id: ArenaId> {
  alive: Vec<bool>,
  free: Vec<u32>,
  size: usize,
  _id: PhantomData<Id>,
}

impl<Id: ArenaId> Default for IdRegistry<Id> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Id: ArenaId> IdRegistry<Id> {
  pub fn new() -> Self {
    Self {
      alive: Vec::new(),
      free: Vec::new(),
      size: 0,
      _id: PhantomData,
    }
  }

  pub fn with_capacity(capacity: usize) -> Self {
    let mut registry = Self::new();
    registry.reserve(capacity);
    registry
  }

  /// Grow to at least `capacity` slots. Never shrinks.
  pub fn reserve(&mut self, capacity: usize) {
    let old = self.alive.len();
    if capacity <= old {
      return;
    }
    self.alive.resize(capacity, false);
    // Reversed so the lowest new slot is popped first.
    self.free.extend((old..capacity).rev().map(|i| i as u32));
  }

  /// Allocate an id, reusing a freed slot when one exists.
  pub fn create(&mut self) -> Id {
    let index = match self.free.pop() {
      Some(index) => index as usize,
      None => {
        self.alive.push(false);
        self.alive.len() - 1
      }
    };
    self.alive[index] = true;
    self.size += 1;
    Id::from_index(index)
  }

  pub fn remove(&mut self, id: Id) {
    debug_assert!(self.exists(id), "removing dead id {id:?}");
    self.alive[id.index()] = false;
    self.free.push(id.index() as u32);
    self.size -= 1;
  }

  #[inline]
  pub fn exists(&self, id: Id) -> bool {
    self.alive.get(id.index()).copied().unwrap_or(false)
  }

  /// Number of slots; every live id is below this.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.alive.len()
  }

  /// Number of live ids.
  #[inline]
  pub fn size(&self) -> usize {
    self.size
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  /// Live ids in ascending order.
  pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
    self
      .alive
      .iter()
      .enumerate()
      .filter(|(_, alive)| **alive)
      .map(|(index, _)| Id::from_index(index))
  }
}

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;
