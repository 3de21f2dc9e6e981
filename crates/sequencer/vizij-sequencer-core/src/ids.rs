//! Keyframe identifiers and their allocator.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeId(pub u32);

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kf{}", self.0)
    }
}

/// Monotonic allocator for KeyframeId.
/// Ids are never handed out twice for the lifetime of a store, including across `clear()`.
/// Once `u32::MAX` has been handed out or reserved the allocator is exhausted.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_keyframe: u32,
    exhausted: bool,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` once the id space is used up.
    #[inline]
    pub fn alloc_keyframe(&mut self) -> Option<KeyframeId> {
        let id = self.peek()?;
        self.advance_past(id.0);
        Some(id)
    }

    /// Make sure the next allocation is strictly greater than `seen`.
    /// Used when keyframes with existing ids are loaded from a document.
    #[inline]
    pub fn reserve_past(&mut self, seen: KeyframeId) {
        if !self.exhausted && seen.0 >= self.next_keyframe {
            self.advance_past(seen.0);
        }
    }

    #[inline]
    pub fn peek(&self) -> Option<KeyframeId> {
        (!self.exhausted).then_some(KeyframeId(self.next_keyframe))
    }

    fn advance_past(&mut self, id: u32) {
        match id.checked_add(1) {
            Some(next) => self.next_keyframe = next,
            None => self.exhausted = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_keyframe(), Some(KeyframeId(0)));
        assert_eq!(alloc.alloc_keyframe(), Some(KeyframeId(1)));
        assert_eq!(alloc.peek(), Some(KeyframeId(2)));
    }

    #[test]
    fn reserve_past_skips_loaded_ids() {
        let mut alloc = IdAllocator::new();
        alloc.reserve_past(KeyframeId(7));
        assert_eq!(alloc.alloc_keyframe(), Some(KeyframeId(8)));
        // Reserving below the cursor is a no-op.
        alloc.reserve_past(KeyframeId(3));
        assert_eq!(alloc.alloc_keyframe(), Some(KeyframeId(9)));
    }

    #[test]
    fn reserving_the_last_id_exhausts_the_allocator() {
        let mut alloc = IdAllocator::new();
        alloc.reserve_past(KeyframeId(u32::MAX));
        assert_eq!(alloc.peek(), None);
        assert_eq!(alloc.alloc_keyframe(), None);
        // Never wraps back to a low id.
        alloc.reserve_past(KeyframeId(0));
        assert_eq!(alloc.alloc_keyframe(), None);
    }

    #[test]
    fn handing_out_the_last_id_exhausts_the_allocator() {
        let mut alloc = IdAllocator::new();
        alloc.reserve_past(KeyframeId(u32::MAX - 1));
        assert_eq!(alloc.alloc_keyframe(), Some(KeyframeId(u32::MAX)));
        assert_eq!(alloc.alloc_keyframe(), None);
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(KeyframeId(12).to_string(), "kf12");
    }
}
