//! Allocation and release of the storage owned by allocatable and pointer
//! descriptors.

use fbind_common::{Result, error::Error, verify};

use crate::descriptor::{Descriptor, Dimension};
use crate::storage;

impl Descriptor {
    /// Allocates zero-initialized storage for the shape given by
    /// `lower_bounds` and `upper_bounds` (inclusive) and binds it as the base
    /// address.
    ///
    /// The bounds are ignored for scalars and required otherwise. For
    /// character types the element length is replaced by `elem_len` first.
    /// Freshly allocated storage is densely packed: every stride multiplier
    /// equals the element length.
    ///
    /// On failure the descriptor is left untouched and unassociated.
    pub fn allocate(
        &mut self,
        lower_bounds: Option<&[isize]>,
        upper_bounds: Option<&[isize]>,
        elem_len: usize,
    ) -> Result<()> {
        if self.base_addr.is_some() {
            return Err(Error::base_addr_not_null(
                "cannot allocate a descriptor that is already associated",
            ));
        }
        verify!(InvalidAttribute, self.attribute.can_own_storage());

        let elem_len = if self.type_code.is_character() {
            elem_len
        } else {
            self.elem_len
        };
        let rank = self.rank();
        let mut dims = self.dims.clone();
        let mut count = 1usize;
        if rank > 0 {
            let (Some(lower), Some(upper)) = (lower_bounds, upper_bounds) else {
                return Err(Error::invalid_extent(format!(
                    "lower and upper bounds are required to allocate a rank-{rank} array"
                )));
            };
            if lower.len() < rank || upper.len() < rank {
                return Err(Error::invalid_extent(format!(
                    "expected {rank} lower and upper bounds, got {} and {}",
                    lower.len(),
                    upper.len()
                )));
            }
            for (axis, dim) in dims.iter_mut().enumerate() {
                let extent = upper[axis]
                    .checked_sub(lower[axis])
                    .and_then(|diff| diff.checked_add(1))
                    .filter(|&extent| extent >= 0)
                    .ok_or_else(|| {
                        Error::invalid_extent(format!(
                            "bounds [{}, {}] of dimension {axis} do not describe an extent",
                            lower[axis], upper[axis]
                        ))
                    })?;
                *dim = Dimension::new(lower[axis], extent, elem_len as isize);
                count = count
                    .checked_mul(extent as usize)
                    .ok_or_else(|| Error::mem_allocation(usize::MAX))?;
            }
        }

        let base_addr = storage::allocate_zeroed(count, elem_len)?;
        self.elem_len = elem_len;
        self.dims = dims;
        self.base_addr = Some(base_addr);
        Ok(())
    }

    /// Releases the storage this descriptor refers to and leaves it
    /// unassociated, ready to be allocated or established again.
    ///
    /// # Safety
    ///
    /// The base address must refer to storage obtained from
    /// [`Descriptor::allocate`] or from the C heap, and no other descriptor
    /// may access that storage afterwards. Sections, parts and pointers
    /// derived from this descriptor become dangling.
    pub unsafe fn deallocate(&mut self) -> Result<()> {
        let base_addr = self.base_addr.ok_or_else(|| {
            Error::base_addr_null("the descriptor is not associated with any storage")
        })?;
        verify!(InvalidAttribute, self.attribute.can_own_storage());
        unsafe { storage::release(base_addr) };
        self.base_addr = None;
        Ok(())
    }
}
