//! C ABI entry points and the descriptor memory layout shared with foreign
//! callers.
//!
//! Foreign code allocates descriptor memory itself (typically a
//! [`CfiCdescN`] sized for the rank it needs) and passes pointers to it.
//! Every entry point copies the foreign descriptor into a [`Descriptor`],
//! runs the corresponding safe operation and writes the outcome back, so the
//! foreign memory is only modified when the operation succeeds.
//!
//! # Calling Convention
//!
//! All functions use the C calling convention and are `no_mangle` so the
//! symbol names are stable for linking. Failures are reported through the
//! returned status code and logged at `error` level; no process-wide error
//! state is kept.

#![allow(non_snake_case)]

use std::ffi::{c_int, c_void};
use std::ptr::{self, NonNull};
use std::slice;

use bytemuck::{Pod, Zeroable};
use fbind_common::{
    Result,
    error::{Error, ErrorKind},
};

use crate::config::{MAX_RANK, VERSION};
use crate::descriptor::{Descriptor, Dimension, Dims};
use crate::section::SectionBounds;
use crate::types::{Attribute, TypeCode};

pub type CfiIndex = isize;
pub type CfiRank = i8;
pub type CfiAttribute = i8;
pub type CfiType = i16;

pub const CFI_SUCCESS: c_int = 0;
pub const CFI_FAILURE: c_int = 1;
pub const CFI_ERROR_BASE_ADDR_NULL: c_int = 2;
pub const CFI_ERROR_BASE_ADDR_NOT_NULL: c_int = 3;
pub const CFI_INVALID_ELEM_LEN: c_int = 4;
pub const CFI_INVALID_RANK: c_int = 5;
pub const CFI_INVALID_TYPE: c_int = 6;
pub const CFI_INVALID_ATTRIBUTE: c_int = 7;
pub const CFI_INVALID_EXTENT: c_int = 8;
pub const CFI_INVALID_DESCRIPTOR: c_int = 9;
pub const CFI_ERROR_MEM_ALLOCATION: c_int = 10;
pub const CFI_ERROR_OUT_OF_BOUNDS: c_int = 11;
pub const CFI_INVALID_STRIDE: c_int = 12;

/// One entry of a foreign descriptor's dimension table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct CfiDim {
    pub lower_bound: CfiIndex,
    pub extent: CfiIndex,
    pub sm: CfiIndex,
}

impl From<CfiDim> for Dimension {
    fn from(dim: CfiDim) -> Dimension {
        Dimension::new(dim.lower_bound, dim.extent, dim.sm)
    }
}

impl From<Dimension> for CfiDim {
    fn from(dim: Dimension) -> CfiDim {
        CfiDim {
            lower_bound: dim.lower_bound,
            extent: dim.extent,
            sm: dim.sm,
        }
    }
}

/// Header of a foreign descriptor, followed in memory by `rank` dimension
/// entries.
#[derive(Debug)]
#[repr(C)]
pub struct CfiCdesc {
    pub base_addr: *mut c_void,
    pub elem_len: usize,
    pub version: c_int,
    pub rank: CfiRank,
    pub attribute: CfiAttribute,
    pub type_: CfiType,
    pub dim: [CfiDim; 0],
}

/// A foreign descriptor with room for `R` dimensions.
///
/// The header fields are laid out exactly as in [`CfiCdesc`], so a pointer
/// to this type may be passed wherever a `CfiCdesc` pointer is expected.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct CfiCdescN<const R: usize> {
    pub base_addr: *mut c_void,
    pub elem_len: usize,
    pub version: c_int,
    pub rank: CfiRank,
    pub attribute: CfiAttribute,
    pub type_: CfiType,
    pub dim: [CfiDim; R],
}

// SAFETY: every field is a number, a raw pointer or an array of `Pod`
// entries, and all of them are valid when zeroed.
unsafe impl<const R: usize> Zeroable for CfiCdescN<R> {}

impl<const R: usize> CfiCdescN<R> {
    pub fn as_ptr(&self) -> *const CfiCdesc {
        (self as *const Self).cast()
    }

    pub fn as_mut_ptr(&mut self) -> *mut CfiCdesc {
        (self as *mut Self).cast()
    }

    /// Reads this foreign descriptor into a [`Descriptor`].
    pub fn to_descriptor(&self) -> Result<Descriptor> {
        if self.rank < 0 || self.rank as usize > R {
            return Err(Error::invalid_rank(format!(
                "stored rank {} exceeds the {R} dimensions this descriptor holds",
                self.rank
            )));
        }
        unsafe { load(self.as_ptr()) }
    }
}

/// Maps an error to the status code reported across the C ABI.
pub fn status_code(err: &Error) -> c_int {
    match err.kind() {
        ErrorKind::InvalidDescriptor(_) => CFI_INVALID_DESCRIPTOR,
        ErrorKind::InvalidAttribute(_) => CFI_INVALID_ATTRIBUTE,
        ErrorKind::InvalidRank(_) => CFI_INVALID_RANK,
        ErrorKind::InvalidExtent(_) => CFI_INVALID_EXTENT,
        ErrorKind::InvalidType(_) => CFI_INVALID_TYPE,
        ErrorKind::InvalidElemLen(_) => CFI_INVALID_ELEM_LEN,
        ErrorKind::InvalidStride(_) => CFI_INVALID_STRIDE,
        ErrorKind::OutOfBounds(_) => CFI_ERROR_OUT_OF_BOUNDS,
        ErrorKind::BaseAddrNull(_) => CFI_ERROR_BASE_ADDR_NULL,
        ErrorKind::BaseAddrNotNull(_) => CFI_ERROR_BASE_ADDR_NOT_NULL,
        ErrorKind::MemAllocation { .. } => CFI_ERROR_MEM_ALLOCATION,
    }
}

fn report(entry_point: &str, result: Result<()>) -> c_int {
    match result {
        Ok(()) => CFI_SUCCESS,
        Err(err) => {
            let status = status_code(&err);
            log::error!("{entry_point}: {err} (status {status})");
            status
        }
    }
}

fn null_descriptor(name: &str) -> Error {
    Error::invalid_descriptor(format!("{name} is a null pointer"))
}

/// Reads a foreign descriptor, validating its rank and attribute before any
/// dimension entry is touched.
///
/// # Safety
///
/// `dv` must be null or point to a readable descriptor whose dimension table
/// holds at least `rank` entries.
unsafe fn load(dv: *const CfiCdesc) -> Result<Descriptor> {
    if dv.is_null() {
        return Err(null_descriptor("dv"));
    }
    let header = unsafe { &*dv };
    let rank = usize::try_from(header.rank)
        .ok()
        .filter(|&rank| rank <= MAX_RANK)
        .ok_or_else(|| {
            Error::invalid_rank(format!(
                "expected 0 <= rank <= {MAX_RANK}, got {}",
                header.rank
            ))
        })?;
    let attribute = Attribute::try_from(header.attribute)?;

    let entries = unsafe { slice::from_raw_parts(ptr::addr_of!((*dv).dim).cast::<CfiDim>(), rank) };
    let mut dims = Dims::default();
    dims.extend(entries.iter().map(|&dim| Dimension::from(dim)));

    Ok(Descriptor {
        base_addr: NonNull::new(header.base_addr.cast()),
        elem_len: header.elem_len,
        version: header.version,
        attribute,
        type_code: TypeCode(header.type_),
        dims,
    })
}

/// Writes `desc` over a foreign descriptor.
///
/// # Safety
///
/// `dv` must point to a writable descriptor whose dimension table holds at
/// least `desc.rank()` entries.
unsafe fn store(dv: *mut CfiCdesc, desc: &Descriptor) {
    unsafe {
        (*dv).base_addr = desc.base_addr.map_or(ptr::null_mut(), |p| p.as_ptr().cast());
        (*dv).elem_len = desc.elem_len;
        (*dv).version = desc.version;
        (*dv).rank = desc.rank() as CfiRank;
        (*dv).attribute = desc.attribute.as_raw();
        (*dv).type_ = desc.type_code.as_raw();
        let entries = ptr::addr_of_mut!((*dv).dim).cast::<CfiDim>();
        for (axis, &dim) in desc.dims.iter().enumerate() {
            entries.add(axis).write(dim.into());
        }
    }
}

/// Views an optional foreign index array of `len` entries.
///
/// # Safety
///
/// `indices` must be null or point to at least `len` readable entries that
/// outlive the returned slice.
unsafe fn optional<'a>(indices: *const CfiIndex, len: usize) -> Option<&'a [CfiIndex]> {
    if indices.is_null() {
        None
    } else {
        Some(unsafe { slice::from_raw_parts(indices, len) })
    }
}

/// Returns the address of the element of `dv` designated by `subscripts`,
/// or null on failure.
///
/// # Safety
///
/// `dv` must be null or point to a valid descriptor. For rank > 0,
/// `subscripts` must point to `rank` readable indices.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_address(
    dv: *const CfiCdesc,
    subscripts: *const CfiIndex,
) -> *mut c_void {
    let result = unsafe { load(dv) }.and_then(|desc| {
        let subscripts = match desc.rank() {
            0 => &[][..],
            rank => unsafe { optional(subscripts, rank) }
                .ok_or_else(|| Error::invalid_descriptor("subscripts is a null pointer"))?,
        };
        desc.address(subscripts)
    });
    match result {
        Ok(addr) => addr.as_ptr().cast(),
        Err(err) => {
            log::error!("CFI_address: {err} (status {})", status_code(&err));
            ptr::null_mut()
        }
    }
}

/// Initializes `dv` to describe an entity of the given attribute, type and
/// rank located at `base_addr`, or unassociated when `base_addr` is null.
///
/// Only the base address and attribute of the current contents of `dv` are
/// read, so it may otherwise be uninitialized.
///
/// # Safety
///
/// `dv` must be null or point to writable descriptor memory with room for
/// `rank` dimensions. `extents` must be null or point to `rank` indices.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_establish(
    dv: *mut CfiCdesc,
    base_addr: *mut c_void,
    attribute: CfiAttribute,
    type_: CfiType,
    elem_len: usize,
    rank: CfiRank,
    extents: *const CfiIndex,
) -> c_int {
    let result = (|| -> Result<()> {
        if dv.is_null() {
            return Err(null_descriptor("dv"));
        }
        let rank = usize::try_from(rank)
            .ok()
            .filter(|&rank| rank <= MAX_RANK)
            .ok_or_else(|| {
                Error::invalid_rank(format!("expected 0 <= rank <= {MAX_RANK}, got {rank}"))
            })?;
        let attribute = Attribute::try_from(attribute)?;

        let mut desc = Descriptor::new(0)?;
        unsafe {
            desc.base_addr = NonNull::new((*dv).base_addr.cast());
            desc.attribute = Attribute::try_from((*dv).attribute).unwrap_or(Attribute::Other);
        }
        let extents = unsafe { optional(extents, rank) };
        desc.establish(
            NonNull::new(base_addr.cast()),
            attribute,
            TypeCode(type_),
            elem_len,
            rank,
            extents,
        )?;
        unsafe { store(dv, &desc) };
        Ok(())
    })();
    report("CFI_establish", result)
}

/// Allocates zero-initialized storage for `dv` with the given inclusive
/// bounds.
///
/// # Safety
///
/// `dv` must be null or point to a valid descriptor. The bound arrays must
/// be null or point to `rank` indices each.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_allocate(
    dv: *mut CfiCdesc,
    lower_bounds: *const CfiIndex,
    upper_bounds: *const CfiIndex,
    elem_len: usize,
) -> c_int {
    let result = unsafe { load(dv) }.and_then(|mut desc| {
        let rank = desc.rank();
        let (lower, upper) = unsafe { (optional(lower_bounds, rank), optional(upper_bounds, rank)) };
        desc.allocate(lower, upper, elem_len)?;
        unsafe { store(dv, &desc) };
        Ok(())
    });
    report("CFI_allocate", result)
}

/// Releases the storage of `dv` and nulls its base address.
///
/// # Safety
///
/// `dv` must be null or point to a valid descriptor whose storage came from
/// the C heap and is not used through any other descriptor afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_deallocate(dv: *mut CfiCdesc) -> c_int {
    let result = unsafe { load(dv) }.and_then(|mut desc| {
        unsafe { desc.deallocate() }?;
        unsafe { store(dv, &desc) };
        Ok(())
    });
    report("CFI_deallocate", result)
}

/// Returns [`CFI_SUCCESS`] if `dv` describes contiguous storage,
/// [`CFI_FAILURE`] if it does not, or an error status.
///
/// # Safety
///
/// `dv` must be null or point to a valid descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_is_contiguous(dv: *const CfiCdesc) -> c_int {
    match unsafe { load(dv) }.and_then(|desc| desc.is_contiguous()) {
        Ok(true) => CFI_SUCCESS,
        Ok(false) => CFI_FAILURE,
        Err(err) => report("CFI_is_contiguous", Err(err)),
    }
}

/// Makes `result` describe a section of `source`.
///
/// # Safety
///
/// Both descriptors must be null or valid; `result` must have room for its
/// stored rank. Each bound array must be null or hold `source` rank indices.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_section(
    result: *mut CfiCdesc,
    source: *const CfiCdesc,
    lower_bounds: *const CfiIndex,
    upper_bounds: *const CfiIndex,
    strides: *const CfiIndex,
) -> c_int {
    let outcome = (|| -> Result<()> {
        if source.is_null() {
            return Err(null_descriptor("source"));
        }
        if result.is_null() {
            return Err(null_descriptor("result"));
        }
        let source_desc = unsafe { load(source) }?;
        let mut result_desc = unsafe { load(result) }?;
        let rank = source_desc.rank();
        let bounds = unsafe {
            SectionBounds {
                lower_bounds: optional(lower_bounds, rank),
                upper_bounds: optional(upper_bounds, rank),
                strides: optional(strides, rank),
            }
        };
        result_desc.section(&source_desc, &bounds)?;
        unsafe { store(result, &result_desc) };
        Ok(())
    })();
    report("CFI_section", outcome)
}

/// Makes `result` describe the part of each `source` element starting
/// `displacement` bytes into it.
///
/// # Safety
///
/// Both descriptors must be null or valid, with equal rank.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_select_part(
    result: *mut CfiCdesc,
    source: *const CfiCdesc,
    displacement: usize,
    elem_len: usize,
) -> c_int {
    let outcome = (|| -> Result<()> {
        if source.is_null() {
            return Err(null_descriptor("source"));
        }
        if result.is_null() {
            return Err(null_descriptor("result"));
        }
        let source_desc = unsafe { load(source) }?;
        let mut result_desc = unsafe { load(result) }?;
        result_desc.select_part(&source_desc, displacement, elem_len)?;
        unsafe { store(result, &result_desc) };
        Ok(())
    })();
    report("CFI_select_part", outcome)
}

/// Makes `result` a pointer aliasing `source`, or a disassociated pointer
/// when `source` is null. In the latter case only `base_addr`, `version`
/// and `attribute` of `result` are written and nothing else is read.
///
/// # Safety
///
/// `result` must be null or valid, `source` null or valid, and
/// `lower_bounds` null or hold `source` rank indices.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn CFI_setpointer(
    result: *mut CfiCdesc,
    source: *const CfiCdesc,
    lower_bounds: *const CfiIndex,
) -> c_int {
    let outcome = (|| -> Result<()> {
        if result.is_null() {
            return Err(null_descriptor("result"));
        }
        if source.is_null() {
            // Only the header is written, so `result` may be uninitialized.
            unsafe {
                (*result).base_addr = ptr::null_mut();
                (*result).version = VERSION;
                (*result).attribute = Attribute::Pointer.as_raw();
            }
            return Ok(());
        }
        let source_desc = unsafe { load(source) }?;
        let mut result_desc = unsafe { load(result) }?;
        let lower = unsafe { optional(lower_bounds, source_desc.rank()) };
        result_desc.set_pointer(Some(&source_desc), lower)?;
        unsafe { store(result, &result_desc) };
        Ok(())
    })();
    report("CFI_setpointer", outcome)
}
