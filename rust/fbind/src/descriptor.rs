//! The descriptor: shape, strides, element size and storage association of
//! an array or scalar.

use std::ptr::NonNull;

use fbind_common::{Result, error::Error};
use tinyvec::ArrayVec;

use crate::config::{ASSUMED_SIZE, MAX_RANK, VERSION};
use crate::types::{Attribute, TypeCode};

/// Per-axis metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
    /// Index of the first element along the axis.
    pub lower_bound: isize,
    /// Number of elements along the axis, or [`ASSUMED_SIZE`].
    pub extent: isize,
    /// Byte distance between consecutive elements along the axis.
    pub sm: isize,
}

impl Dimension {
    pub fn new(lower_bound: isize, extent: isize, sm: isize) -> Dimension {
        Dimension {
            lower_bound,
            extent,
            sm,
        }
    }

    /// Index of the last element along the axis, saturated to the `isize`
    /// range.
    pub fn upper_bound(&self) -> isize {
        let last = self.lower_bound as i128 + self.extent as i128 - 1;
        last.clamp(isize::MIN as i128, isize::MAX as i128) as isize
    }

    pub fn is_assumed_size(&self) -> bool {
        self.extent == ASSUMED_SIZE
    }

    /// Returns `true` if `index` designates an element of this axis.
    pub fn contains(&self, index: isize) -> bool {
        let offset = index as i128 - self.lower_bound as i128;
        offset >= 0 && offset < self.extent as i128
    }
}

pub(crate) type Dims = ArrayVec<[Dimension; MAX_RANK]>;

/// Describes an array (or scalar) living in memory the caller owns.
///
/// A descriptor is plain metadata: cloning it never copies or shares
/// ownership of the storage, and dropping it never releases storage. Only
/// [`Descriptor::deallocate`] releases what [`Descriptor::allocate`] obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub(crate) base_addr: Option<NonNull<u8>>,
    pub(crate) elem_len: usize,
    pub(crate) version: i32,
    pub(crate) attribute: Attribute,
    pub(crate) type_code: TypeCode,
    pub(crate) dims: Dims,
}

impl Descriptor {
    /// Creates an unassociated descriptor with room for `rank` dimensions,
    /// all zeroed. Its attribute is [`Attribute::Other`] and its type
    /// [`TypeCode::OTHER`] until established or assigned.
    pub fn new(rank: usize) -> Result<Descriptor> {
        Ok(Descriptor {
            base_addr: None,
            elem_len: 0,
            version: VERSION,
            attribute: Attribute::Other,
            type_code: TypeCode::OTHER,
            dims: zeroed_dims(rank)?,
        })
    }

    pub fn base_addr(&self) -> Option<NonNull<u8>> {
        self.base_addr
    }

    /// Returns `true` if the descriptor refers to storage.
    pub fn is_associated(&self) -> bool {
        self.base_addr.is_some()
    }

    pub fn elem_len(&self) -> usize {
        self.elem_len
    }

    pub fn set_elem_len(&mut self, elem_len: usize) {
        self.elem_len = elem_len;
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    pub fn set_attribute(&mut self, attribute: Attribute) {
        self.attribute = attribute;
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn set_type_code(&mut self, type_code: TypeCode) {
        self.type_code = type_code;
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dims_mut(&mut self) -> &mut [Dimension] {
        &mut self.dims
    }

    pub fn dim(&self, axis: usize) -> Option<&Dimension> {
        self.dims.get(axis)
    }

    /// Total number of elements described, or `None` if any axis is
    /// assumed-size or has a negative extent. A scalar counts as one element.
    pub fn element_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |count, dim| {
            let extent = usize::try_from(dim.extent).ok()?;
            count.checked_mul(extent)
        })
    }

    /// Returns `true` if the descriptor describes a pointer that is not
    /// associated with any target.
    pub(crate) fn is_disassociated_pointer(&self) -> bool {
        self.attribute == Attribute::Pointer && self.base_addr.is_none()
    }
}

pub(crate) fn zeroed_dims(rank: usize) -> Result<Dims> {
    if rank > MAX_RANK {
        return Err(Error::invalid_rank(format!(
            "expected 0 <= rank <= {MAX_RANK}, got {rank}"
        )));
    }
    let mut dims = Dims::default();
    dims.resize(rank, Dimension::default());
    Ok(dims)
}
