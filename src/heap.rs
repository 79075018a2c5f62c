use core::ptr::{null_mut, write_bytes};

use crate::internal::payload_of;
use crate::os;
use crate::types::{Block, Heap, Status, HEADER_SIZE, INIT_MEM_ALLOC};

/* -----------------------------------------------------------
  Heap list primitives
  The heap is one contiguous region between `heap_start` and
  the program break, covered exactly by a doubly-linked list
  of blocks in ascending address order. Every operation here
  keeps adjacency intact: a block's header plus payload ends
  where its successor's header begins.
----------------------------------------------------------- */

// Split `block` so its header plus payload occupy exactly `total` bytes,
// installing a FREE block over the remainder. Left untouched when the
// remainder could not carry a header and any payload.
pub(crate) unsafe fn split(block: *mut Block, total: usize) {
    if (*block).size <= total {
        return;
    }

    let trailing = (block as *mut u8).add(total) as *mut Block;
    (*trailing).size = (*block).size - total;
    (*trailing).status = Status::Free;
    (*trailing).prev = block;
    (*trailing).next = (*block).next;

    (*block).size = total - HEADER_SIZE;
    (*block).next = trailing;
    if !(*trailing).next.is_null() {
        (*(*trailing).next).prev = trailing;
    }
}

// Absorb `second` into `first`. Caller guarantees `first.next == second`.
pub(crate) unsafe fn merge(first: *mut Block, second: *mut Block) {
    (*first).size += HEADER_SIZE + (*second).size;
    (*first).next = (*second).next;
    if !(*first).next.is_null() {
        (*(*first).next).prev = first;
    }
}

// Single forward pass merging every run of adjacent FREE blocks.
pub(crate) unsafe fn coalesce(head: *mut Block) {
    if head.is_null() {
        return;
    }
    let mut cur = head;
    while !(*cur).next.is_null() {
        if (*cur).status == Status::Free && (*(*cur).next).status == Status::Free {
            merge(cur, (*cur).next);
        } else {
            cur = (*cur).next;
        }
    }
}

// Zero a block's payload, for heap blocks handed out by `calloc`.
pub(crate) unsafe fn zero_payload(block: *mut Block) {
    write_bytes(payload_of(block), 0, (*block).size);
}

/* -----------------------------------------------------------
  Growing the heap
----------------------------------------------------------- */

impl Heap {
    // Birth of a block: carve `total` bytes out of the data segment, or map
    // them privately when `total` exceeds `threshold`.
    pub(crate) unsafe fn alloc_block(
        &mut self,
        prev: *mut Block,
        total: usize,
        threshold: usize,
    ) -> *mut Block {
        let block = if total > threshold {
            let block = os::map_anon(total) as *mut Block;
            (*block).status = Status::Mapped;
            block
        } else {
            let block = os::extend_break(total) as *mut Block;
            (*block).status = Status::Alloc;
            block
        };
        (*block).size = total - HEADER_SIZE;
        (*block).prev = prev;
        (*block).next = null_mut();
        if !prev.is_null() {
            (*prev).next = block;
        }
        block
    }

    // One-shot preallocation for the first heap-backed request: install a
    // single block over the fresh region, then split it down to the request.
    pub(crate) unsafe fn prealloc(&mut self, total: usize) -> *mut Block {
        let bytes = if total > INIT_MEM_ALLOC {
            total
        } else {
            INIT_MEM_ALLOC
        };
        let block = os::extend_break(bytes) as *mut Block;
        (*block).size = bytes - HEADER_SIZE;
        (*block).status = Status::Free;
        (*block).prev = null_mut();
        (*block).next = null_mut();
        split(block, total);
        (*block).status = Status::Alloc;
        self.heap_start = block;
        block
    }

    // Best-fit search: the FREE block whose header plus payload can hold
    // `total` bytes with the smallest payload, earliest in the list on ties.
    // The winner is split down to `total` and marked in use.
    pub(crate) unsafe fn find_best(&mut self, total: usize) -> *mut Block {
        let mut best: *mut Block = null_mut();
        let mut cur = self.heap_start;
        while !cur.is_null() {
            if (*cur).status == Status::Free
                && HEADER_SIZE + (*cur).size >= total
                && (best.is_null() || (*cur).size < (*best).size)
            {
                best = cur;
            }
            cur = (*cur).next;
        }
        if !best.is_null() {
            split(best, total);
            (*best).status = Status::Alloc;
        }
        best
    }

    pub(crate) unsafe fn tail(&self) -> *mut Block {
        let mut cur = self.heap_start;
        while !(*cur).next.is_null() {
            cur = (*cur).next;
        }
        cur
    }

    // No FREE block fits: grow at the tail. A FREE tail is extended in place
    // by exactly the missing payload; otherwise a fresh block is appended.
    pub(crate) unsafe fn grow(&mut self, payload: usize, threshold: usize) -> *mut Block {
        let tail = self.tail();
        if (*tail).status == Status::Free {
            os::extend_break(payload - (*tail).size);
            (*tail).size = payload;
            (*tail).status = Status::Alloc;
            tail
        } else {
            self.alloc_block(tail, HEADER_SIZE + payload, threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Block, Status, HEADER_SIZE};
    use core::ptr::null_mut;

    const ARENA: usize = 1024;

    #[repr(align(8))]
    struct Arena([u8; ARENA]);

    impl Arena {
        fn new() -> Self {
            Arena([0; ARENA])
        }

        // Install a single FREE block covering the whole buffer.
        unsafe fn install(&mut self) -> *mut Block {
            let block = self.0.as_mut_ptr() as *mut Block;
            (*block).size = ARENA - HEADER_SIZE;
            (*block).status = Status::Free;
            (*block).prev = null_mut();
            (*block).next = null_mut();
            block
        }
    }

    #[test]
    fn split_carves_a_trailing_free_block() {
        let mut arena = Arena::new();
        unsafe {
            let block = arena.install();
            split(block, 96);

            assert_eq!((*block).size, 96 - HEADER_SIZE);
            let trailing = (*block).next;
            assert!(!trailing.is_null());
            assert_eq!(trailing as usize, block as usize + 96);
            assert_eq!((*trailing).size, ARENA - HEADER_SIZE - 96);
            assert_eq!((*trailing).status, Status::Free);
            assert_eq!((*trailing).prev, block);
            assert!((*trailing).next.is_null());
        }
    }

    #[test]
    fn split_leaves_useless_remainders_in_place() {
        let mut arena = Arena::new();
        unsafe {
            let block = arena.install();
            let size = (*block).size;

            // remainder would be zero payload bytes
            split(block, size);
            assert_eq!((*block).size, size);
            assert!((*block).next.is_null());

            // request larger than the block
            split(block, ARENA + 64);
            assert_eq!((*block).size, size);
            assert!((*block).next.is_null());
        }
    }

    #[test]
    fn split_relinks_an_existing_successor() {
        let mut arena = Arena::new();
        unsafe {
            let block = arena.install();
            split(block, 512);
            let last = (*block).next;

            split(block, 96);
            let middle = (*block).next;
            assert_eq!((*middle).next, last);
            assert_eq!((*last).prev, middle);
        }
    }

    #[test]
    fn merge_absorbs_the_successor() {
        let mut arena = Arena::new();
        unsafe {
            let block = arena.install();
            split(block, 96);
            let trailing = (*block).next;

            merge(block, trailing);
            assert_eq!((*block).size, ARENA - HEADER_SIZE);
            assert!((*block).next.is_null());
        }
    }

    #[test]
    fn coalesce_merges_runs_of_free_blocks() {
        let mut arena = Arena::new();
        unsafe {
            let block = arena.install();
            split(block, 96);
            split((*block).next, 96);
            // three FREE blocks now cover the arena

            coalesce(block);
            assert_eq!((*block).size, ARENA - HEADER_SIZE);
            assert!((*block).next.is_null());
        }
    }

    #[test]
    fn coalesce_stops_at_blocks_in_use() {
        let mut arena = Arena::new();
        unsafe {
            let block = arena.install();
            split(block, 96);
            let middle = (*block).next;
            split(middle, 96);
            (*middle).status = Status::Alloc;

            coalesce(block);
            assert_eq!((*block).next, middle);
            assert_eq!((*middle).status, Status::Alloc);
            assert!(!(*middle).next.is_null());
            assert_eq!((*(*middle).next).status, Status::Free);
        }
    }
}
