//! Raw heap interface (component A, concrete instance per §4.J).
//!
//! This is the external collaborator spec.md calls out as out of scope for
//! the allocator's core: a primitive that extends the process heap and
//! reports its bounds. `RawHeap` wraps `libc::sbrk` directly, the same way
//! `rallocator::BumpAllocator` calls `sbrk` inline — there is no abstraction
//! layer to swap implementations, because this crate only ever targets a
//! POSIX `sbrk`-capable host.
//!
//! Successive successful calls to [`RawHeap::extend`] return contiguous
//! address ranges, which is the only contract the rest of the allocator
//! relies on.

use libc::{intptr_t, sbrk};

/// Tracks the bounds of the region this allocator instance has claimed via
/// `sbrk`. Not safe to share across allocator instances or threads — see
/// spec §5: the caller serializes access.
pub struct RawHeap {
  lo: Option<usize>,
  hi: usize,
}

impl RawHeap {
  pub const fn new() -> Self {
    Self { lo: None, hi: 0 }
  }

  /// Extends the heap by exactly `n` bytes, returning the address of the
  /// first new byte (the previous break), or `None` if `sbrk` failed.
  ///
  /// # Safety
  /// Must not be called concurrently with another `extend` on the same
  /// `RawHeap` (or another `RawHeap`/caller sharing the same process break).
  pub unsafe fn extend(&mut self, n: usize) -> Option<usize> {
    unsafe {
      let raw = sbrk(n as intptr_t);
      if raw as isize == -1 {
        return None;
      }
      let addr = raw as usize;
      if self.lo.is_none() {
        self.lo = Some(addr);
      }
      self.hi = addr + n;
      Some(addr)
    }
  }

  /// Inclusive-exclusive low bound of the heap: `lo()` is the first byte
  /// this `RawHeap` ever handed out. Panics if nothing has been extended
  /// yet — callers must initialize before querying bounds.
  pub fn lo(&self) -> usize {
    self.lo.expect("heap_lo queried before first extension")
  }

  /// One past the last byte this `RawHeap` has committed.
  pub fn hi(&self) -> usize {
    self.hi
  }

  pub fn is_initialized(&self) -> bool {
    self.lo.is_some()
  }
}

impl Default for RawHeap {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn successive_extends_are_contiguous() {
    let mut heap = RawHeap::new();
    unsafe {
      let a = heap.extend(64).expect("sbrk should succeed in a test process");
      let b = heap.extend(128).expect("sbrk should succeed in a test process");
      assert_eq!(b, a + 64);
      assert_eq!(heap.hi(), b + 128);
      assert_eq!(heap.lo(), a);
    }
  }
}
