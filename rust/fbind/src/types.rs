//! Type tags and storage attributes of a descriptor.

use std::ffi::{c_char, c_int, c_long, c_longlong, c_short};
use std::mem::size_of;

use fbind_common::{Result, error::Error};

use crate::config::{EXTENDED_KIND, EXTENDED_KIND_STORAGE, TYPE_KIND_SHIFT, TYPE_MASK};

/// Storage-ownership category of the entity a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Attribute {
    /// Data pointer; may be allocated, deallocated and re-associated.
    Pointer = 1,
    /// Allocatable; owns its storage once allocated.
    Allocatable = 2,
    /// Neither pointer nor allocatable; never owns storage.
    Other = 3,
}

impl Attribute {
    pub fn as_raw(self) -> i8 {
        self as i8
    }

    /// Returns `true` for the attributes that may own storage.
    pub fn can_own_storage(self) -> bool {
        matches!(self, Attribute::Pointer | Attribute::Allocatable)
    }
}

impl TryFrom<i8> for Attribute {
    type Error = Error;

    fn try_from(value: i8) -> Result<Attribute> {
        match value {
            1 => Ok(Attribute::Pointer),
            2 => Ok(Attribute::Allocatable),
            3 => Ok(Attribute::Other),
            _ => Err(Error::invalid_attribute(format!(
                "unknown attribute code {value}"
            ))),
        }
    }
}

/// Encoded type tag: a base type code in the low byte and, for intrinsic
/// types, the kind (storage size in bytes) above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TypeCode(pub i16);

const fn kinded(base: TypeCode, kind: usize) -> TypeCode {
    TypeCode(base.0 + ((kind as i16) << TYPE_KIND_SHIFT))
}

const POINTER_SIZE: usize = size_of::<*const ()>();

impl TypeCode {
    pub const INTEGER: TypeCode = TypeCode(1);
    pub const LOGICAL: TypeCode = TypeCode(2);
    pub const REAL: TypeCode = TypeCode(3);
    pub const COMPLEX: TypeCode = TypeCode(4);
    pub const CHARACTER: TypeCode = TypeCode(5);
    pub const STRUCT: TypeCode = TypeCode(6);
    pub const OTHER: TypeCode = TypeCode(-1);

    pub const CPTR: TypeCode = TypeCode(7 + ((POINTER_SIZE as i16) << TYPE_KIND_SHIFT));
    pub const CFUNPTR: TypeCode = TypeCode(8 + ((POINTER_SIZE as i16) << TYPE_KIND_SHIFT));

    pub const SIGNED_CHAR: TypeCode = kinded(Self::CHARACTER, size_of::<c_char>());
    pub const CHAR: TypeCode = kinded(Self::CHARACTER, size_of::<c_char>());
    pub const UCS4_CHAR: TypeCode = kinded(Self::CHARACTER, 4);

    pub const SHORT: TypeCode = kinded(Self::INTEGER, size_of::<c_short>());
    pub const INT: TypeCode = kinded(Self::INTEGER, size_of::<c_int>());
    pub const LONG: TypeCode = kinded(Self::INTEGER, size_of::<c_long>());
    pub const LONG_LONG: TypeCode = kinded(Self::INTEGER, size_of::<c_longlong>());
    pub const SIZE_T: TypeCode = kinded(Self::INTEGER, size_of::<usize>());
    pub const INT8: TypeCode = kinded(Self::INTEGER, 1);
    pub const INT16: TypeCode = kinded(Self::INTEGER, 2);
    pub const INT32: TypeCode = kinded(Self::INTEGER, 4);
    pub const INT64: TypeCode = kinded(Self::INTEGER, 8);
    pub const INTMAX: TypeCode = kinded(Self::INTEGER, size_of::<i64>());
    pub const INTPTR: TypeCode = kinded(Self::INTEGER, size_of::<isize>());
    pub const PTRDIFF: TypeCode = kinded(Self::INTEGER, size_of::<isize>());

    pub const BOOL: TypeCode = kinded(Self::LOGICAL, size_of::<bool>());

    pub const FLOAT: TypeCode = kinded(Self::REAL, size_of::<f32>());
    pub const DOUBLE: TypeCode = kinded(Self::REAL, size_of::<f64>());
    pub const LONG_DOUBLE: TypeCode = kinded(Self::REAL, EXTENDED_KIND);
    pub const FLOAT128: TypeCode = kinded(Self::REAL, 16);

    pub const FLOAT_COMPLEX: TypeCode = kinded(Self::COMPLEX, size_of::<f32>());
    pub const DOUBLE_COMPLEX: TypeCode = kinded(Self::COMPLEX, size_of::<f64>());
    pub const LONG_DOUBLE_COMPLEX: TypeCode = kinded(Self::COMPLEX, EXTENDED_KIND);
    pub const FLOAT128_COMPLEX: TypeCode = kinded(Self::COMPLEX, 16);

    pub fn as_raw(self) -> i16 {
        self.0
    }

    /// Base type code with the kind field masked off.
    pub fn base_type(self) -> TypeCode {
        TypeCode(self.0 & TYPE_MASK)
    }

    /// Kind field of the tag, i.e. the nominal storage size in bytes.
    pub fn kind(self) -> usize {
        usize::try_from((self.0 - self.base_type().0) >> TYPE_KIND_SHIFT).unwrap_or(0)
    }

    pub fn is_character(self) -> bool {
        self.base_type() == TypeCode::CHARACTER
    }

    /// Tags whose element length cannot be derived from the kind field and
    /// must be supplied by the caller.
    pub fn takes_explicit_elem_len(self) -> bool {
        self.is_character() || self == TypeCode::STRUCT || self == TypeCode::OTHER
    }

    /// Element length of this type in bytes. `requested` is used verbatim for
    /// character, struct and other tags and ignored for everything else.
    pub fn elem_len(self, requested: usize) -> usize {
        if self.takes_explicit_elem_len() {
            return requested;
        }
        let mut size = self.kind();
        if size == EXTENDED_KIND {
            size = EXTENDED_KIND_STORAGE;
        }
        if self.base_type() == TypeCode::COMPLEX {
            size *= 2;
        }
        size
    }
}
