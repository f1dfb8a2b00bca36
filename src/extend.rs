//! Heap extender (component H).
//!
//! Grows the heap by converting the current epilogue into the header of a
//! fresh free block, appending a new epilogue after it, and coalescing the
//! new block with whatever free block (if any) immediately precedes it.
//!
//! The source this crate is modeled on is known to read `size` before it's
//! computed in this exact function when the previous block is free — see
//! spec §9. `size` is computed first here, before anything else touches
//! memory, which sidesteps that bug entirely.

use crate::align::MIN_BLOCK;
use crate::block::write_u32;
use crate::block::{pack, read_u32, unpack_prev_alloc};
use crate::freelist::add;
use crate::heap::RawHeap;
use crate::release::coalesce;

/// Extends the heap by (at least) `words` 4-byte words, seeding a new free
/// block and returning its post-coalesce payload pointer.
///
/// # Safety
/// `base`/`dir_base` must describe a live, initialized heap whose current
/// top is exactly the address `raw_heap` is about to extend from.
pub unsafe fn extend(
  raw_heap: &mut RawHeap,
  base: usize,
  dir_base: usize,
  words: usize,
) -> Option<usize> {
  unsafe {
    let size = (words * 4).max(MIN_BLOCK);
    let size = crate::align::round_up(size);

    // Free-list links are 32-bit offsets from `base` (see freelist.rs); a
    // heap that grew past 4 GiB above base would make those offsets
    // ambiguous, so refuse the extension instead of silently wrapping.
    if raw_heap.is_initialized() {
      let prospective_hi = raw_heap.hi() + size;
      if prospective_hi - base > u32::MAX as usize {
        return None;
      }
    }

    let bp = raw_heap.extend(size)?;

    // bp - 4 is exactly where the old (zero-sized) epilogue header lived;
    // read it before overwriting so we can carry its prev-alloc bit.
    let old_epilogue = read_u32(bp - 4);
    let prev_alloc = unpack_prev_alloc(old_epilogue);

    write_u32(bp - 4, pack(size, prev_alloc, false));
    write_u32(bp + size - 8, pack(size, prev_alloc, false));
    write_u32(bp + size - 4, pack(0, false, true));

    if size >= MIN_BLOCK {
      add(base, dir_base, bp);
    }

    Some(coalesce(base, dir_base, bp))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::SEG_NUM;
  use crate::block::{is_alloc, size_of_block};

  #[test]
  fn extend_seeds_a_free_block_bounded_by_an_epilogue() {
    let mut raw_heap = RawHeap::new();
    unsafe {
      let dir_base = raw_heap.extend(SEG_NUM * 8).unwrap();
      for slot in 0..SEG_NUM {
        write_u32((dir_base + slot * 8) as usize, 0);
        write_u32((dir_base + slot * 8 + 4) as usize, 0);
      }
      let base = dir_base;

      // Minimal prologue+epilogue scaffold so extend() has a predecessor
      // header to read.
      let scaffold = raw_heap.extend(16).unwrap();
      write_u32(scaffold + 4, pack(16, true, true)); // prologue header
      write_u32(scaffold + 8, pack(16, true, true)); // prologue footer
      write_u32(scaffold + 12, pack(0, true, true)); // epilogue header

      let bp = extend(&mut raw_heap, base, dir_base, 116).unwrap();
      assert!(!is_alloc(bp));
      assert_eq!(size_of_block(bp), 464);
    }
  }
}
