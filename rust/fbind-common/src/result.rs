use crate::error::ErrorKind;

pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Checks a precondition and returns early with an error of the named
/// [`ErrorKind`] variant when it does not hold. The error message is the
/// stringified condition.
///
/// ```
/// use fbind_common::{verify, Result};
///
/// fn check_rank(rank: usize) -> Result<()> {
///     verify!(InvalidRank, rank <= 15);
///     Ok(())
/// }
///
/// assert!(check_rank(3).is_ok());
/// assert!(check_rank(16).is_err());
/// ```
#[macro_export]
macro_rules! verify {
    ($kind:ident, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify(
            result,
            $crate::error::ErrorKind::$kind,
            stringify!($expr),
        )?;
    }};
}

#[inline]
pub fn verify(predicate: bool, kind: fn(String) -> ErrorKind, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        violated(kind, condition)
    }
}

#[cold]
pub fn violated(kind: fn(String) -> ErrorKind, condition: &str) -> Result<()> {
    Err(kind(format!("expected {condition}")).into())
}
