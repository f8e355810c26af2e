//! Backing storage for allocatable and pointer descriptors.
//!
//! Storage comes from the C heap so that foreign code may release what this
//! crate allocates, and the other way around.

use std::ptr::NonNull;

use fbind_common::{Result, error::Error};

/// Allocates zero-initialized storage for `count` elements of `elem_len`
/// bytes each. At least one byte is always requested, so a successful
/// allocation is never null even for zero-sized arrays.
pub(crate) fn allocate_zeroed(count: usize, elem_len: usize) -> Result<NonNull<u8>> {
    let bytes = count
        .checked_mul(elem_len)
        .ok_or_else(|| Error::mem_allocation(usize::MAX))?;
    let ptr = unsafe { libc::calloc(bytes.max(1), 1) };
    match NonNull::new(ptr.cast::<u8>()) {
        Some(ptr) => {
            log::debug!("allocated {bytes} bytes ({count} x {elem_len}) at {ptr:p}");
            Ok(ptr)
        }
        None => Err(Error::mem_allocation(bytes)),
    }
}

/// Releases storage obtained from the C heap.
///
/// # Safety
///
/// `ptr` must have been returned by [`allocate_zeroed`] or by the C
/// allocator, and must not be used after this call.
pub(crate) unsafe fn release(ptr: NonNull<u8>) {
    log::debug!("releasing storage at {ptr:p}");
    unsafe { libc::free(ptr.as_ptr().cast()) };
}
