//! Placement policy — find-fit (component E).
//!
//! Small requests (below the 960-byte cutoff) use first-fit: the first block
//! in the candidate list that's big enough wins, keeping expected-case search
//! O(1) for the size classes that dominate allocation count. Requests at or
//! above the cutoff use best-fit: the whole list is scanned for the smallest
//! adequate block, trading a longer search for less wasted space on the
//! rarer, larger allocations. Either way, if the starting class has no fit
//! the search continues into successively larger classes.

use crate::align::SEG_NUM;
use crate::block::size_of_block;
use crate::freelist::{next_of, get_head};
use crate::sizeclass::{classify, FIRST_FIT_CUTOFF};

/// Finds a free block of size `>= a`, or `None` if the whole directory has
/// nothing adequate.
///
/// # Safety
/// `base`/`dir_base` must describe a live, well-formed heap.
pub unsafe fn find_fit(base: usize, dir_base: usize, a: usize) -> Option<usize> {
  unsafe {
    let first_fit = classify(a) < FIRST_FIT_CUTOFF;
    for class in classify(a)..SEG_NUM {
      if let Some(found) = search_list(base, dir_base, class, a, first_fit) {
        return Some(found);
      }
    }
    None
  }
}

/// # Safety
/// `base`/`dir_base` must describe a live, well-formed heap.
unsafe fn search_list(
  base: usize,
  dir_base: usize,
  class: usize,
  a: usize,
  first_fit: bool,
) -> Option<usize> {
  unsafe {
    let mut best: Option<(usize, usize)> = None;
    let mut node = get_head(dir_base, class);

    while let Some(bp) = node {
      let size = size_of_block(bp);
      if size >= a {
        if first_fit {
          return Some(bp);
        }
        if size == a {
          return Some(bp);
        }
        best = match best {
          None => Some((bp, size)),
          Some((_, best_size)) if size < best_size => Some((bp, size)),
          same => same,
        };
      }
      node = next_of(base, bp);
    }

    best.map(|(bp, _)| bp)
  }
}

#[cfg(test)]
mod tests {
  #[test]
  fn cutoff_is_960() {
    use crate::sizeclass::classify;
    assert!(classify(959) < super::FIRST_FIT_CUTOFF);
    assert!(classify(960) >= super::FIRST_FIT_CUTOFF);
  }
}
