//! Growable bit set used for dirty flags.

/// Fixed-length bit vector backed by `u64` words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitVector {
  words: Vec<u64>,
  len: usize,
}

impl BitVector {
  pub fn new(len: usize) -> Self {
    Self {
      words: vec![0; len.div_ceil(64)],
      len,
    }
  }

  /// Grow to `len` bits, keeping existing bits. Never shrinks.
  pub fn resize(&mut self, len: usize) {
    if len <= self.len {
      return;
    }
    self.words.resize(len.div_ceil(64), 0);
    self.len = len;
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub fn set(&mut self, index: usize) {
    debug_assert!(index < self.len);
    self.words[index / 64] |= 1 << (index % 64);
  }

  #[inline]
  pub fn reset(&mut self, index: usize) {
    debug_assert!(index < self.len);
    self.words[index / 64] &= !(1 << (index % 64));
  }

  #[inline]
  pub fn test(&self, index: usize) -> bool {
    index < self.len && self.words[index / 64] & (1 << (index % 64)) != 0
  }

  pub fn clear_all(&mut self) {
    self.words.fill(0);
  }

  pub fn count_ones(&self) -> usize {
    self.words.iter().map(|w| w.count_ones() as usize).sum()
  }

  /// Indices of set bits in ascending order.
  pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
    self
      .words
      .iter()
      .enumerate()
      .flat_map(|(i, &word)| SetBits { word, base: i * 64 })
  }
}

struct SetBits {
  word: u64,
  base: usize,
}

impl Iterator for SetBits {
  type Item = usize;

  #[inline]
  fn next(&mut self) -> Option<usize> {
    if self.word == 0 {
      return None;
    }
    let bit = self.word.trailing_zeros() as usize;
    self.word &= self.word - 1;
    Some(self.base + bit)
  }
}
