use core::cmp::min;
use core::ptr::{copy_nonoverlapping, null_mut};

use crate::heap::{coalesce, merge, split, zero_payload};
use crate::internal::{aligned_size, block_of, payload_of};
use crate::os;
use crate::types::{Block, Heap, Status, HEADER_SIZE, MMAP_THRESHOLD};

/* -----------------------------------------------------------
  The public operations. Each runs to completion on the
  caller's thread; the host serializes if it has threads.
----------------------------------------------------------- */

impl Heap {
    /// Allocate `size` bytes and return an 8-byte-aligned payload address.
    ///
    /// Returns null for a zero-size request. Requests above the mapping
    /// threshold get a dedicated anonymous mapping; everything else is
    /// served from the heap region, reusing the best-fitting freed block
    /// before the segment is grown. Aborts if the kernel refuses memory.
    pub unsafe fn malloc(&mut self, size: usize) -> *mut u8 {
        let size = aligned_size(size);
        if size == 0 {
            return null_mut();
        }

        if size + HEADER_SIZE > MMAP_THRESHOLD {
            return payload_of(self.alloc_block(null_mut(), size + HEADER_SIZE, MMAP_THRESHOLD));
        }

        if self.heap_start.is_null() {
            return payload_of(self.prealloc(size + HEADER_SIZE));
        }

        coalesce(self.heap_start);
        let block = self.find_best(size + HEADER_SIZE);
        if !block.is_null() {
            return payload_of(block);
        }
        payload_of(self.grow(size, MMAP_THRESHOLD))
    }

    /// Release a payload address returned by this allocator.
    ///
    /// Null is a no-op, as is freeing a block that is already free. Mapped
    /// blocks are returned to the kernel immediately; heap blocks are marked
    /// free and merged with their neighbours on the next allocator call.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let block = block_of(ptr);
        match (*block).status {
            Status::Free => {}
            Status::Mapped => os::unmap(block as *mut u8, HEADER_SIZE + (*block).size),
            Status::Alloc => (*block).status = Status::Free,
        }
    }

    /// Allocate zeroed storage for `count` elements of `size` bytes each.
    ///
    /// Returns null if either argument is zero or the product overflows.
    /// The mapping threshold is the kernel page size: large requests get
    /// kernel-zeroed pages, heap-backed ones are zero-filled explicitly.
    pub unsafe fn calloc(&mut self, count: usize, size: usize) -> *mut u8 {
        if count == 0 || size == 0 {
            return null_mut();
        }
        let total = match count.checked_mul(size) {
            Some(total) => aligned_size(total),
            None => return null_mut(),
        };

        if self.pagesize == 0 {
            self.pagesize = os::page_size();
        }
        let threshold = self.pagesize;

        if total + HEADER_SIZE > threshold {
            // fresh mappings are already zeroed by the kernel
            return payload_of(self.alloc_block(null_mut(), total + HEADER_SIZE, threshold));
        }

        if self.heap_start.is_null() {
            let block = self.prealloc(total + HEADER_SIZE);
            zero_payload(block);
            return payload_of(block);
        }

        coalesce(self.heap_start);
        let mut block = self.find_best(total + HEADER_SIZE);
        if block.is_null() {
            block = self.grow(total, threshold);
        }
        zero_payload(block);
        payload_of(block)
    }

    /// Resize the allocation at `ptr` to `size` bytes.
    ///
    /// Null delegates to `malloc`, zero size frees and returns null, and a
    /// pointer to a freed block yields null. The block is resized in place
    /// whenever shrinking, extending the heap tail, or absorbing free
    /// successors suffices; otherwise the payload moves to a fresh block and
    /// the old one is freed.
    pub unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> *mut u8 {
        let size = aligned_size(size);
        if size == 0 {
            self.free(ptr);
            return null_mut();
        }
        if ptr.is_null() {
            return self.malloc(size);
        }

        let block = block_of(ptr);
        match (*block).status {
            Status::Free => return null_mut(),
            Status::Mapped => return self.relocate(block, size),
            Status::Alloc => {}
        }

        if size == (*block).size {
            return ptr;
        }

        if size < (*block).size {
            split(block, size + HEADER_SIZE);
            return ptr;
        }

        if (*block).next.is_null() {
            // the block ends at the break; extend it in place
            os::break_to(ptr.add(size));
            (*block).size = size;
            return ptr;
        }

        while !(*block).next.is_null() && (*(*block).next).status == Status::Free {
            merge(block, (*block).next);
            if (*block).size >= size {
                split(block, size + HEADER_SIZE);
                return ptr;
            }
        }

        self.relocate(block, size)
    }

    // Allocate fresh, carry the payload over, release the source.
    unsafe fn relocate(&mut self, block: *mut Block, size: usize) -> *mut u8 {
        let dest = self.malloc(size);
        let n = min((*block_of(dest)).size, (*block).size);
        copy_nonoverlapping(payload_of(block), dest, n);
        self.free(payload_of(block));
        dest
    }
}
