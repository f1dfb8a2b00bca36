//! Heap checker (component I).
//!
//! A read-only sweep validating the invariants of spec §3 and §8. Never
//! called on the hot path — only from tests and from
//! [`crate::Allocator::checkheap`], which prints violations rather than
//! panicking, the way `checkheap(lineno)` is specified to behave.

use crate::align::DSIZE;
use crate::block::{is_alloc, next_block, size_of_block, unpack_alloc, unpack_size, read_u32};
use crate::freelist::{class_count, get_head, next_of, prev_of, walk_class};
use crate::sizeclass::classify;

/// One broken invariant, described for humans.
#[derive(Debug, PartialEq, Eq)]
pub struct Violation(pub String);

/// Walks the whole heap (directory is not block-addressable, so the sweep
/// starts at the first real block) and every free list, collecting every
/// invariant violation it finds instead of stopping at the first one — a
/// corrupted heap is more useful to debug when every symptom is visible at
/// once.
///
/// # Safety
/// `base`/`dir_base`/`blocks_header_base` must describe a heap that is at
/// least nominally alive (may be structurally broken — that's what this
/// function is for).
pub unsafe fn check(
  base: usize,
  dir_base: usize,
  blocks_header_base: usize,
  hi: usize,
) -> Vec<Violation> {
  unsafe {
    let mut violations = Vec::new();

    // The prologue header lives permanently at blocks_header_base - 8: the
    // address blocks_header_base itself is the *epilogue* slot extend()
    // overwrites into the first real block's header the moment init()
    // finishes, so it must never be read here as if it were the prologue.
    let prologue_addr = blocks_header_base - 8;
    let prologue_word = read_u32(prologue_addr);
    if unpack_size(prologue_word) != 16 || !unpack_alloc(prologue_word) {
      violations.push(Violation(format!(
        "prologue header at {prologue_addr:#x} is not (size=16, alloc=1)"
      )));
    }

    let mut size_sum = 0usize;
    let mut bp = blocks_header_base + 4; // first real block's payload pointer
    let mut prev_was_free = false;

    loop {
      let header = read_u32(bp - 4);
      let size = unpack_size(header);
      let alloc = unpack_alloc(header);

      if size == 0 {
        // Epilogue.
        if !alloc {
          violations.push(Violation(format!("epilogue at {bp:#x} is not allocated")));
        }
        break;
      }

      if size % DSIZE != 0 || size < crate::align::MIN_BLOCK {
        violations.push(Violation(format!(
          "block at {bp:#x} has invalid size {size} (must be a multiple of 8, >= 16)"
        )));
      }
      if (bp as usize) % DSIZE != 0 {
        violations.push(Violation(format!("block at {bp:#x} is not 8-byte aligned")));
      }

      if !alloc {
        if prev_was_free {
          violations.push(Violation(format!(
            "block at {bp:#x} is free immediately after another free block"
          )));
        }
        let footer = read_u32(bp + size - 8);
        if footer != header {
          violations.push(Violation(format!(
            "block at {bp:#x} footer {footer:#010x} != header {header:#010x}"
          )));
        }
        let class = classify(size);
        let max_steps = (hi - base) / crate::align::MIN_BLOCK + 1;
        if !list_contains(base, dir_base, class, bp, max_steps) {
          violations.push(Violation(format!(
            "free block at {bp:#x} of size {size} (class {class}) is not in its free list"
          )));
        }
      }

      size_sum += size;

      let next = next_block(bp);
      let next_header = read_u32(next - 4);
      if crate::block::unpack_prev_alloc(next_header) != alloc {
        violations.push(Violation(format!(
          "successor of {bp:#x} has prev-alloc={} but this block's alloc={}",
          crate::block::unpack_prev_alloc(next_header),
          alloc
        )));
      }

      prev_was_free = !alloc;
      bp = next;

      if bp >= hi {
        violations.push(Violation(
            "address-order sweep ran past the heap's high end without finding the epilogue"
                .to_string(),
        ));
        break;
      }
    }

    if size_sum + 4 != hi - blocks_header_base {
      violations.push(Violation(format!(
        "sum of block sizes ({size_sum}) + epilogue header (4) != heap_hi - blocks_base ({})",
        hi - blocks_header_base
      )));
    }

    let mut free_in_lists = 0usize;
    for class in 0..class_count() {
      let max_steps = (hi - base) / crate::align::MIN_BLOCK + 1;
      let mut count_here = 0usize;
      let walk_result = walk_class(base, dir_base, class, max_steps, |list_bp| {
        count_here += 1;
        if classify(size_of_block(list_bp)) != class {
          violations.push(Violation(format!(
            "block at {list_bp:#x} lives in class {class} but classify(size) says otherwise"
          )));
        }
        if is_alloc(list_bp) {
          violations.push(Violation(format!(
            "allocated block at {list_bp:#x} found in free list {class}"
          )));
        }
      });
      if let Err(msg) = walk_result {
        violations.push(Violation(format!("class {class}: {msg}")));
      }
      check_doubly_linked(base, dir_base, class, &mut violations);
      free_in_lists += count_here;
    }

    let free_in_sweep = count_free_blocks_in_sweep(blocks_header_base);
    if free_in_lists != free_in_sweep {
      violations.push(Violation(format!(
        "free lists contain {free_in_lists} blocks but address-order sweep saw {free_in_sweep}"
      )));
    }

    violations
  }
}

unsafe fn list_contains(
  base: usize,
  dir_base: usize,
  class: usize,
  target: usize,
  max_steps: usize,
) -> bool {
  unsafe {
    let mut found = false;
    let _ = walk_class(base, dir_base, class, max_steps, |bp| {
      if bp == target {
        found = true;
      }
    });
    found
  }
}

unsafe fn check_doubly_linked(
  base: usize,
  dir_base: usize,
  class: usize,
  violations: &mut Vec<Violation>,
) {
  unsafe {
    let head = get_head(dir_base, class);
    if let Some(head) = head {
      if prev_of(base, head).is_some() {
        violations.push(Violation(format!(
          "list head of class {class} at {head:#x} has a non-null prev link"
        )));
      }
    }
    let max_steps = 1 << 20;
    let _ = walk_class(base, dir_base, class, max_steps, |bp| {
      if let Some(next) = next_of(base, bp) {
        if prev_of(base, next) != Some(bp) {
          violations.push(Violation(format!(
            "prev(next({bp:#x})) != {bp:#x}: doubly-linked invariant broken"
          )));
        }
      }
    });
  }
}

unsafe fn count_free_blocks_in_sweep(blocks_header_base: usize) -> usize {
  unsafe {
    let mut bp = blocks_header_base + 4;
    let mut count = 0;
    loop {
      let header = read_u32(bp - 4);
      let size = unpack_size(header);
      if size == 0 {
        break;
      }
      if !unpack_alloc(header) {
        count += 1;
      }
      bp = next_block(bp);
    }
    count
  }
}
