//! # fbind: array descriptors for C interoperability
//!
//! A descriptor records where an array (or scalar) lives, how large its
//! elements are, its storage-ownership attribute, its type tag and, per
//! dimension, the lower bound, extent and byte stride. The operations on
//! [`Descriptor`] form a small algebra over that metadata:
//!
//! * [`Descriptor::address`] resolves a subscript tuple to an element address.
//! * [`Descriptor::establish`] initializes a descriptor over existing storage
//!   or no storage.
//! * [`Descriptor::allocate`] and [`Descriptor::deallocate`] attach and
//!   release zero-initialized C heap storage.
//! * [`Descriptor::is_contiguous`] reports whether the elements form one
//!   unbroken run of memory.
//! * [`Descriptor::section`], [`Descriptor::select_part`] and
//!   [`Descriptor::set_pointer`] derive non-owning views of another
//!   descriptor's storage.
//!
//! The [`ffi`] module exposes the same operations through the C ABI, over
//! descriptor memory owned by foreign callers.

pub mod config;
pub mod descriptor;
pub mod ffi;
pub mod section;
pub mod types;

mod address;
mod allocate;
mod contiguous;
mod establish;
mod layout;
mod select_part;
mod set_pointer;
mod storage;

pub use descriptor::{Descriptor, Dimension};
pub use fbind_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use section::SectionBounds;
pub use types::{Attribute, TypeCode};
