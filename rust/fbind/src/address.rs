//! Address resolution: subscript tuple to element address.

use std::ptr::NonNull;

use fbind_common::{Result, error::Error};

use crate::descriptor::Descriptor;
use crate::layout;

impl Descriptor {
    /// Returns the address of the element designated by `subscripts`, one
    /// per dimension, each relative to its axis lower bound.
    ///
    /// For a scalar the subscripts must be empty and the base address is
    /// returned unchanged. Subscripts are bounds checked in caller order and
    /// the first offending axis is reported.
    ///
    /// The returned pointer is only computed, never dereferenced; whether it
    /// may be read or written depends on the storage the descriptor refers to.
    pub fn address(&self, subscripts: &[isize]) -> Result<NonNull<u8>> {
        let base_addr = self.base_addr.ok_or_else(|| {
            Error::base_addr_null("cannot resolve an address through an unassociated descriptor")
        })?;
        if subscripts.len() != self.rank() {
            return Err(Error::invalid_rank(format!(
                "expected {} subscripts, got {}",
                self.rank(),
                subscripts.len()
            )));
        }
        if self.rank() == 0 {
            return Ok(base_addr);
        }

        for (axis, (dim, &subscript)) in self.dims.iter().zip(subscripts).enumerate() {
            if !dim.contains(subscript) {
                return Err(Error::out_of_bounds(
                    format_args!("subscripts[{axis}]"),
                    subscript,
                    dim.lower_bound,
                    dim.upper_bound(),
                ));
            }
        }

        let offset = layout::byte_offset(&self.dims, subscripts);
        NonNull::new(base_addr.as_ptr().wrapping_offset(offset)).ok_or_else(|| {
            Error::invalid_descriptor(format!("element offset {offset} wraps to a null address"))
        })
    }
}
