//! Part selection: a view of one component or substring of every element.

use std::ptr::NonNull;

use fbind_common::{Result, error::Error, verify};

use crate::descriptor::{Descriptor, Dimension};
use crate::types::Attribute;

impl Descriptor {
    /// Makes this descriptor describe the part of every `source` element that
    /// starts `displacement` bytes into the element, such as one component of
    /// a derived type or a substring.
    ///
    /// For character result types the element length is taken from
    /// `elem_len`; otherwise this descriptor's element length is kept. The
    /// part must lie entirely within one source element. The result aliases
    /// the source storage and must never be deallocated.
    pub fn select_part(
        &mut self,
        source: &Descriptor,
        displacement: usize,
        elem_len: usize,
    ) -> Result<()> {
        verify!(InvalidAttribute, self.attribute != Attribute::Allocatable);
        let Some(base_addr) = source.base_addr else {
            return Err(Error::base_addr_null(
                "cannot select a part of an unassociated source",
            ));
        };
        if self.rank() != source.rank() {
            return Err(Error::invalid_rank(format!(
                "result rank {} differs from source rank {}",
                self.rank(),
                source.rank()
            )));
        }
        if source.dims.last().is_some_and(Dimension::is_assumed_size) {
            return Err(Error::invalid_descriptor(
                "the source must not be an assumed-size array",
            ));
        }

        let part_len = if self.type_code.is_character() {
            elem_len
        } else {
            self.elem_len
        };
        if source.elem_len == 0 || displacement > source.elem_len - 1 {
            return Err(Error::out_of_bounds(
                "displacement",
                displacement,
                0,
                source.elem_len.saturating_sub(1),
            ));
        }
        let part_end = displacement.checked_add(part_len);
        if part_end.is_none_or(|end| end > source.elem_len) {
            return Err(Error::out_of_bounds(
                "displacement + result element length",
                displacement.saturating_add(part_len),
                0,
                source.elem_len,
            ));
        }

        let overflow = || Error::invalid_stride("adjusted stride multiplier overflows");
        let source_len = isize::try_from(source.elem_len).map_err(|_| overflow())?;
        let displacement_bytes = displacement as isize;
        let mut dims = self.dims.clone();
        for (dim, src) in dims.iter_mut().zip(&source.dims) {
            let sm = (src.sm / source_len - 1)
                .checked_mul(displacement_bytes)
                .and_then(|adjust| adjust.checked_add(src.sm))
                .ok_or_else(overflow)?;
            *dim = Dimension::new(src.lower_bound, src.extent, sm);
        }
        let part_addr = NonNull::new(base_addr.as_ptr().wrapping_add(displacement))
            .ok_or_else(|| Error::invalid_descriptor("part address wraps to null"))?;
        self.dims = dims;
        self.elem_len = part_len;
        self.base_addr = Some(part_addr);
        Ok(())
    }
}
