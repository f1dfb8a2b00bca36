//! # seglistalloc — a segregated-free-list dynamic memory allocator
//!
//! This crate implements the classic `malloc`/`free`/`realloc`/`calloc`
//! interface over a single, contiguous, monotonically-growable heap
//! obtained from the OS via `sbrk`. Unlike a plain bump allocator, freed
//! memory is tracked and reused: blocks are grouped into fourteen
//! size-classed free lists, adjacent free blocks are coalesced immediately,
//! and placement uses first-fit for common small requests and best-fit for
//! larger ones.
//!
//! ## Heap layout
//!
//! ```text
//!   ┌───────────────┬───────────┬─────────────────────────────────┬───────────┐
//!   │ directory zone │ prologue  │            blocks zone           │ epilogue  │
//!   │  14 x 8 bytes  │ (16 bytes,│  allocated and free blocks, in   │ (0 bytes, │
//!   │  list heads    │  alloc=1) │  address order                   │  alloc=1) │
//!   └───────────────┴───────────┴─────────────────────────────────┴───────────┘
//! ```
//!
//! Every block carries a 4-byte header encoding its size and two alloc
//! bits. Free blocks additionally carry two 4-byte free-list links and a
//! 4-byte footer; allocated blocks carry neither — the next block's
//! prev-alloc bit takes the footer's place, which is what lets this
//! allocator get away with 8 bytes of overhead on most allocated blocks
//! instead of the naive 16.
//!
//! ## Crate structure
//!
//! ```text
//!   seglistalloc
//!   ├── align      - 8-byte rounding and block-size constants
//!   ├── heap       - sbrk-backed raw heap interface (component A)
//!   ├── block      - header/footer encode-decode, block navigation (component B)
//!   ├── sizeclass  - size-class classifier (component C)
//!   ├── freelist   - segregated doubly-linked free lists (component D)
//!   ├── placement  - find-fit: first-fit / best-fit hybrid (component E)
//!   ├── split      - place: split-and-mark-allocated (component F)
//!   ├── release    - free + coalesce (component G)
//!   ├── extend     - heap growth (component H)
//!   ├── check      - heap consistency checker (component I)
//!   └── allocator  - Allocator: malloc/free/realloc/calloc/checkheap
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use seglistalloc::Allocator;
//!
//! let mut heap = Allocator::new();
//! let p = heap.malloc(64).expect("out of memory");
//! unsafe { (p as *mut u64).write(0x1122334455667788) };
//! heap.free(Some(p));
//! ```
//!
//! ## Non-goals
//!
//! Thread safety, per-thread caching, NUMA awareness, hardening against
//! adversarial heap-metadata corruption, huge-page/mmap fallback, and
//! returning memory to the OS. The heap only grows; see [`Allocator`]'s
//! docs and `DESIGN.md` for the reasoning.
//!
//! ## Safety
//!
//! This crate manages raw memory directly: reads and writes of block
//! headers/footers/links go through raw pointers with no bounds checking
//! beyond what each function's safety contract documents. Callers must
//! serialize all access to a given `Allocator` — there is no internal
//! locking.

pub mod align;
mod allocator;
mod block;
mod check;
mod extend;
mod freelist;
mod heap;
mod placement;
mod release;
mod sizeclass;
mod split;

pub use allocator::Allocator;
pub use check::Violation;
