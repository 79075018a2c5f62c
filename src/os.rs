use core::ptr::null_mut;

use libc::{c_void, intptr_t, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, _SC_PAGESIZE};
use log::{error, warn};

/* -----------------------------------------------------------
  Kernel memory primitives: the data segment and anonymous
  mappings. Everything above this module works on raw byte
  regions handed out here.
----------------------------------------------------------- */

// Grow the data segment by `delta` bytes and return the previous break,
// i.e. the start of the fresh region.
pub unsafe fn extend_break(delta: usize) -> *mut u8 {
    let prev = libc::sbrk(delta as intptr_t);
    if prev == usize::max_value() as *mut c_void {
        die("sbrk failed");
    }
    prev as *mut u8
}

// Move the program break to an absolute address inside the current heap.
pub unsafe fn break_to(addr: *mut u8) {
    if libc::brk(addr as *mut c_void) != 0 {
        die("brk failed");
    }
}

// Fresh anonymous private mapping, readable and writable. The kernel rounds
// the length up to whole pages and hands the pages out zeroed.
pub unsafe fn map_anon(bytes: usize) -> *mut u8 {
    let p = libc::mmap(
        null_mut(),
        bytes,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
    );
    if p == MAP_FAILED {
        die("mmap failed");
    }
    p as *mut u8
}

// Release a mapping returned by `map_anon`.
pub unsafe fn unmap(addr: *mut u8, bytes: usize) {
    if libc::munmap(addr as *mut c_void, bytes) == -1 {
        warn!(
            "munmap failed: {}, addr {:p}, size {}",
            errno::errno(),
            addr,
            bytes
        );
    }
}

// Kernel page size, falling back to 4kb if the query is refused.
pub fn page_size() -> usize {
    let result = unsafe { libc::sysconf(_SC_PAGESIZE) };
    if result > 0 {
        result as usize
    } else {
        4096
    }
}

// The kernel refused to hand out memory. Out-of-memory is not surfaced to
// callers as a null return; diagnose and abort.
fn die(what: &str) -> ! {
    error!("{}: {}", what, errno::errno());
    unsafe { libc::abort() }
}
