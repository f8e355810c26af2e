use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if retrying the same request may succeed once resources
    /// are freed. Every other failure is a misuse that must be fixed by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::MemAllocation { .. })
    }

    pub fn invalid_descriptor(message: impl Into<String>) -> Error {
        ErrorKind::InvalidDescriptor(message.into()).into()
    }

    pub fn invalid_attribute(message: impl Into<String>) -> Error {
        ErrorKind::InvalidAttribute(message.into()).into()
    }

    pub fn invalid_rank(message: impl Into<String>) -> Error {
        ErrorKind::InvalidRank(message.into()).into()
    }

    pub fn invalid_extent(message: impl Into<String>) -> Error {
        ErrorKind::InvalidExtent(message.into()).into()
    }

    pub fn invalid_type(message: impl Into<String>) -> Error {
        ErrorKind::InvalidType(message.into()).into()
    }

    pub fn invalid_elem_len(message: impl Into<String>) -> Error {
        ErrorKind::InvalidElemLen(message.into()).into()
    }

    pub fn invalid_stride(message: impl Into<String>) -> Error {
        ErrorKind::InvalidStride(message.into()).into()
    }

    pub fn base_addr_null(message: impl Into<String>) -> Error {
        ErrorKind::BaseAddrNull(message.into()).into()
    }

    pub fn base_addr_not_null(message: impl Into<String>) -> Error {
        ErrorKind::BaseAddrNotNull(message.into()).into()
    }

    /// A value (subscript, section bound, displacement) outside its permitted
    /// closed range `[lower, upper]`.
    pub fn out_of_bounds<V: Display>(name: impl Display, value: V, lower: V, upper: V) -> Error {
        ErrorKind::OutOfBounds(format!(
            "{name} = {value}, expected {lower} <= {name} <= {upper}"
        ))
        .into()
    }

    pub fn mem_allocation(bytes: usize) -> Error {
        ErrorKind::MemAllocation { bytes }.into()
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("invalid rank: {0}")]
    InvalidRank(String),

    #[error("invalid extent: {0}")]
    InvalidExtent(String),

    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("invalid element length: {0}")]
    InvalidElemLen(String),

    #[error("invalid stride: {0}")]
    InvalidStride(String),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("base address is null: {0}")]
    BaseAddrNull(String),

    #[error("base address is not null: {0}")]
    BaseAddrNotNull(String),

    #[error("failed to allocate {bytes} bytes")]
    MemAllocation { bytes: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = Error::out_of_bounds("subscripts[1]", 5isize, 1, 4);
        assert!(matches!(err.kind(), ErrorKind::OutOfBounds(_)));
        assert_eq!(
            err.to_string(),
            "out of bounds: subscripts[1] = 5, expected 1 <= subscripts[1] <= 4"
        );
    }

    #[test]
    fn test_only_allocation_failure_is_transient() {
        assert!(Error::mem_allocation(1 << 20).is_transient());
        assert!(!Error::invalid_rank("rank").is_transient());
        assert!(!Error::base_addr_null("dv").is_transient());
        assert_eq!(
            Error::mem_allocation(64).into_kind().to_string(),
            "failed to allocate 64 bytes"
        );
    }
}
