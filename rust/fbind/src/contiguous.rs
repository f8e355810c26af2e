//! Contiguity check: whether the elements occupy one gap-free block.

use fbind_common::{Result, error::Error};

use crate::descriptor::Descriptor;
use crate::types::Attribute;

impl Descriptor {
    /// Returns `true` if the array elements form one unbroken run of memory.
    ///
    /// Any axis whose stride multiplier differs from the element length makes
    /// the array non-contiguous. Otherwise only allocatable arrays are
    /// reported contiguous: for pointer and other arrays the stride equality
    /// alone does not certify the layout of storage they do not own.
    pub fn is_contiguous(&self) -> Result<bool> {
        if self.base_addr.is_none() {
            return Err(Error::base_addr_null(
                "contiguity is undefined for an unassociated descriptor",
            ));
        }
        if self.rank() == 0 {
            return Err(Error::invalid_rank("a scalar is not an array"));
        }
        let elem_len = self.elem_len as isize;
        if self.dims.iter().any(|dim| dim.sm != elem_len) {
            return Ok(false);
        }
        Ok(self.attribute == Attribute::Allocatable)
    }
}
