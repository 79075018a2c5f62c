use crate::types::{Block, ALIGNMENT, HEADER_SIZE};

// Round a byte count up to the alignment quantum.
#[inline]
pub const fn aligned_size(bytes: usize) -> usize {
    (bytes + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

// Payload address of a block header.
#[inline]
pub unsafe fn payload_of(block: *mut Block) -> *mut u8 {
    (block as *mut u8).add(HEADER_SIZE)
}

// Recover the block header from a payload address handed out earlier.
#[inline]
pub unsafe fn block_of(ptr: *mut u8) -> *mut Block {
    ptr.sub(HEADER_SIZE) as *mut Block
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    #[test]
    fn aligned_size_rounds_up_to_the_quantum() {
        let cases = [
            (0, 0),
            (1, 8),
            (7, 8),
            (8, 8),
            (9, 16),
            (13, 16),
            (64, 64),
            (100, 104),
        ];
        for &(bytes, expected) in cases.iter() {
            assert_eq!(aligned_size(bytes), expected);
        }
    }

    #[test]
    fn header_is_aligned_and_holds_the_metadata() {
        assert_eq!(HEADER_SIZE % ALIGNMENT, 0);
        assert!(HEADER_SIZE >= size_of::<Block>());
    }

    #[test]
    fn payload_and_header_addresses_round_trip() {
        let block = 0x1000 as *mut Block;
        unsafe {
            let payload = payload_of(block);
            assert_eq!(payload as usize, 0x1000 + HEADER_SIZE);
            assert_eq!(block_of(payload), block);
        }
    }
}
