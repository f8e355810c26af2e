//! Pointer association: pointing a descriptor at another array or at nothing.

use fbind_common::{Result, error::Error};

use crate::config::VERSION;
use crate::descriptor::{Descriptor, Dimension};
use crate::types::Attribute;

impl Descriptor {
    /// Makes this descriptor a pointer aliasing the storage of `source`, or a
    /// disassociated pointer when `source` is `None`.
    ///
    /// Element length, rank and type must already match `source`. The
    /// dimension table is copied from `source`; when `lower_bounds` is given
    /// it replaces every lower bound, re-basing the index origin without
    /// moving memory.
    pub fn set_pointer(
        &mut self,
        source: Option<&Descriptor>,
        lower_bounds: Option<&[isize]>,
    ) -> Result<()> {
        let Some(source) = source else {
            self.base_addr = None;
            self.attribute = Attribute::Pointer;
            self.version = VERSION;
            return Ok(());
        };

        if self.elem_len != source.elem_len {
            return Err(Error::invalid_elem_len(format!(
                "pointer element length {} differs from target element length {}",
                self.elem_len, source.elem_len
            )));
        }
        if self.rank() != source.rank() {
            return Err(Error::invalid_rank(format!(
                "pointer rank {} differs from target rank {}",
                self.rank(),
                source.rank()
            )));
        }
        if self.type_code != source.type_code {
            return Err(Error::invalid_type(format!(
                "pointer type {} differs from target type {}",
                self.type_code.as_raw(),
                source.type_code.as_raw()
            )));
        }
        if let Some(lower) = lower_bounds {
            if lower.len() < source.rank() {
                return Err(Error::invalid_extent(format!(
                    "expected {} lower bounds, got {}",
                    source.rank(),
                    lower.len()
                )));
            }
        }

        for (axis, (dim, src)) in self.dims.iter_mut().zip(&source.dims).enumerate() {
            let lower_bound = lower_bounds.map_or(src.lower_bound, |lower| lower[axis]);
            *dim = Dimension::new(lower_bound, src.extent, src.sm);
        }
        self.base_addr = if source.is_disassociated_pointer() {
            None
        } else {
            source.base_addr
        };
        self.version = source.version;
        self.attribute = Attribute::Pointer;
        Ok(())
    }
}
