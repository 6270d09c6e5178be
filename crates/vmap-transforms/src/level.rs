//! # Vmap levels
//!
//! Every nested vmap call is assigned a level, and levels increase with nesting
//! depth. A [`LevelSet`] records which levels have batch dimensions on a given
//! physical tensor.
//!
//! The ascending order of a level set is the canonical front-to-back placement
//! order of batch dimensions: the lowest level always lands in physical dim `0`,
//! the next lowest in dim `1`, and so on. Both transforms and
//! [`PhysicalView::new_logical_from_physical`](crate::PhysicalView::new_logical_from_physical)
//! rely on [`LevelSet::iter`] for that order.
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{BitOr, BitOrAssign};

use crate::batched::BatchDim;
use crate::constant::VMAP_NUM_LEVELS;

/// An integer tag identifying one nesting depth of vectorized execution.
pub type VmapLevel = usize;

const _: () = assert!(VMAP_NUM_LEVELS <= u64::BITS as usize);

/// A fixed-capacity set of vmap levels.
///
/// Bit `i` is set when level `i` is present. The capacity is
/// [`VMAP_NUM_LEVELS`]. The set is `Copy`, so iterating it never consumes it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LevelSet {
    bits: u64,
}

impl LevelSet {
    /// The set with no levels.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Builds the level set of an ordered batch-dim list.
    pub fn from_batch_dims(bdims: &[BatchDim]) -> Self {
        bdims.iter().map(BatchDim::level).collect()
    }

    /// Returns a copy of this set with `level` added.
    ///
    /// # Panics
    ///
    /// Panics if `level >= VMAP_NUM_LEVELS`. Levels are validated when a batched
    /// value is constructed, so reaching this is a bug in the caller.
    pub fn insert(self, level: VmapLevel) -> Self {
        assert!(
            level < VMAP_NUM_LEVELS,
            "vmap level {level} does not fit in a level set of capacity {VMAP_NUM_LEVELS}"
        );
        Self {
            bits: self.bits | (1 << level),
        }
    }

    pub fn contains(&self, level: VmapLevel) -> bool {
        level < VMAP_NUM_LEVELS && self.bits & (1 << level) != 0
    }

    pub fn union(&self, other: &LevelSet) -> LevelSet {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Number of levels in the set.
    ///
    /// On a [`PhysicalView`](crate::PhysicalView) this equals the number of
    /// leading batch dimensions.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates the levels from lowest to highest.
    pub fn iter(&self) -> Levels {
        Levels { remaining: self.bits }
    }
}

impl fmt::Debug for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for LevelSet {
    type Output = LevelSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(&rhs)
    }
}

impl BitOrAssign for LevelSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl FromIterator<VmapLevel> for LevelSet {
    fn from_iter<I: IntoIterator<Item = VmapLevel>>(iter: I) -> Self {
        iter.into_iter()
            .fold(LevelSet::empty(), |set, level| set.insert(level))
    }
}

impl IntoIterator for LevelSet {
    type Item = VmapLevel;
    type IntoIter = Levels;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &LevelSet {
    type Item = VmapLevel;
    type IntoIter = Levels;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the levels of a [`LevelSet`].
#[derive(Clone, Debug)]
pub struct Levels {
    remaining: u64,
}

impl Iterator for Levels {
    type Item = VmapLevel;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let level = self.remaining.trailing_zeros() as usize;
        // clear lowest set bit
        self.remaining &= self.remaining - 1;
        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.remaining.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Levels {}

impl FusedIterator for Levels {}
