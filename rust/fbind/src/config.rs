//! Fixed constants of the descriptor data contract.
//!
//! These values are shared with foreign callers that allocate and inspect
//! descriptor memory directly, so none of them is tunable at runtime.

/// Descriptor layout version written by every operation that refreshes it.
pub const VERSION: i32 = 1;

/// Maximum number of dimensions a descriptor can describe.
pub const MAX_RANK: usize = 15;

/// Extent sentinel of an assumed-size axis (upper bound unknown).
pub const ASSUMED_SIZE: isize = -1;

/// Mask selecting the base type code from a type tag.
pub const TYPE_MASK: i16 = 0xFF;

/// Shift of the kind (storage size) field inside a type tag.
pub const TYPE_KIND_SHIFT: u32 = 8;

/// Kind value of the extended-precision real types.
pub const EXTENDED_KIND: usize = 10;

/// Storage size in bytes reserved for an [`EXTENDED_KIND`] element.
pub const EXTENDED_KIND_STORAGE: usize = 64;
