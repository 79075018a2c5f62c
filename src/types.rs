use core::mem::size_of;
use core::ptr::null_mut;

use crate::internal::aligned_size;

// ------------------------------------------------------
// Tuning constants
// ------------------------------------------------------

/// Payload and header alignment quantum.
pub const ALIGNMENT: usize = 8;

/// Requests whose header plus payload exceed this are served from a
/// dedicated anonymous mapping instead of the heap region.
pub const MMAP_THRESHOLD: usize = 128 * 1024;

/// One-shot data-segment preallocation performed on the first heap-backed
/// request.
pub const INIT_MEM_ALLOC: usize = 128 * 1024;

/// In-band header length, rounded up so every payload starts aligned.
pub const HEADER_SIZE: usize = aligned_size(size_of::<Block>());

// ------------------------------------------------------
// Main data structures
// ------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Free,   // reusable heap block
    Alloc,  // heap block in use
    Mapped, // lives in its own anonymous mapping, never on the heap list
}

/// Metadata prefixed to every allocation. Heap blocks form a doubly-linked
/// list in ascending address order that covers the heap region exactly;
/// mapped blocks leave the links unused.
#[repr(C)]
pub struct Block {
    pub size: usize,       // payload bytes, excluding the header
    pub status: Status,
    pub prev: *mut Block,
    pub next: *mut Block,
}

/// Allocator context. All process-wide state lives here so hosts and tests
/// can run explicit instances; the `GlobalAlloc` front end drives one
/// process-wide `Heap`.
///
/// A `Heap` assumes it is the sole user of the program break.
pub struct Heap {
    pub(crate) heap_start: *mut Block, // first heap block; null until the first heap-backed request
    pub(crate) pagesize: usize,        // cached kernel page size; 0 until first zero-allocation
}

impl Heap {
    pub const fn new() -> Self {
        Heap {
            heap_start: null_mut(),
            pagesize: 0,
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}
