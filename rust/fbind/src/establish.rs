//! Descriptor establishment over caller-supplied storage or no storage.

use std::ptr::NonNull;

use fbind_common::{Result, error::Error, verify};

use crate::config::VERSION;
use crate::descriptor::{Descriptor, Dimension, zeroed_dims};
use crate::types::{Attribute, TypeCode};

impl Descriptor {
    /// Initializes this descriptor to describe an entity of the given
    /// attribute, type and rank, located at `base_addr` or unassociated when
    /// `base_addr` is `None`.
    ///
    /// `elem_len` is honored only for character, struct and other types; for
    /// every other type it is derived from the type tag. When `base_addr` is
    /// given and `rank > 0`, `extents` must hold one extent per dimension.
    /// Lower bounds are 0 for pointers and 1 otherwise, and every stride
    /// multiplier equals the element length.
    ///
    /// Fails without modifying the descriptor if it currently describes an
    /// allocated allocatable, or if storage is given for an allocatable.
    pub fn establish(
        &mut self,
        base_addr: Option<NonNull<u8>>,
        attribute: Attribute,
        type_code: TypeCode,
        elem_len: usize,
        rank: usize,
        extents: Option<&[isize]>,
    ) -> Result<()> {
        let mut dims = zeroed_dims(rank)?;
        if self.attribute == Attribute::Allocatable && self.base_addr.is_some() {
            return Err(Error::invalid_descriptor(
                "an allocated allocatable must be deallocated before it is established again",
            ));
        }
        verify!(
            InvalidAttribute,
            attribute != Attribute::Allocatable || base_addr.is_none()
        );

        let elem_len = type_code.elem_len(elem_len);
        match extents {
            Some(extents) if rank > 0 => {
                if extents.len() < rank {
                    return Err(Error::invalid_extent(format!(
                        "expected {rank} extents, got {}",
                        extents.len()
                    )));
                }
                let lower_bound = if attribute == Attribute::Pointer { 0 } else { 1 };
                for (dim, &extent) in dims.iter_mut().zip(extents) {
                    *dim = Dimension::new(lower_bound, extent, elem_len as isize);
                }
            }
            None if rank > 0 && base_addr.is_some() => {
                return Err(Error::invalid_extent(format!(
                    "extents are required to establish a rank-{rank} entity over existing storage"
                )));
            }
            _ => (),
        }

        self.base_addr = base_addr;
        self.elem_len = elem_len;
        self.version = VERSION;
        self.attribute = attribute;
        self.type_code = type_code;
        self.dims = dims;
        Ok(())
    }
}
