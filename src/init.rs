use core::ptr::addr_of_mut;

use crate::types::Heap;

// --------------------------------------------------------
// Statically allocate the process-wide heap backing the
// `GlobalAlloc` front end, so the allocator can serve its
// first request without any setup call. All lazily
// initialized state (heap start, page size) lives inside.
// --------------------------------------------------------

static mut GLOBAL_HEAP: Heap = Heap::new();

#[inline]
pub(crate) unsafe fn global() -> &'static mut Heap {
    &mut *addr_of_mut!(GLOBAL_HEAP)
}
