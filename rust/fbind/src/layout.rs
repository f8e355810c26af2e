//! Subscript-to-offset mapping shared by every operation that resolves an
//! element address.

use crate::descriptor::Dimension;

/// Byte offset of the element designated by `subscripts`, relative to the
/// base address of a descriptor with dimensions `dims`.
///
/// Subscripts are given in caller order. The axes are walked in reverse so
/// that the last declared axis varies fastest; each axis contributes its
/// normalized subscript scaled by its stride multiplier and by the number of
/// elements spanned by the faster axes. Subscripts must already be bounds
/// checked.
pub(crate) fn byte_offset(dims: &[Dimension], subscripts: &[isize]) -> isize {
    debug_assert_eq!(dims.len(), subscripts.len());
    let mut offset = 0isize;
    let mut span = 1isize;
    for (dim, &subscript) in dims.iter().zip(subscripts).rev() {
        offset = offset.wrapping_add(
            subscript
                .wrapping_sub(dim.lower_bound)
                .wrapping_mul(span)
                .wrapping_mul(dim.sm),
        );
        span = span.wrapping_mul(dim.extent);
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_axis_varies_fastest() {
        let dims = [Dimension::new(1, 3, 8), Dimension::new(1, 4, 8)];
        assert_eq!(byte_offset(&dims, &[1, 1]), 0);
        assert_eq!(byte_offset(&dims, &[1, 2]), 8);
        assert_eq!(byte_offset(&dims, &[2, 1]), 32);
        assert_eq!(byte_offset(&dims, &[3, 4]), 88);
    }

    #[test]
    fn test_lower_bounds_are_normalized() {
        let dims = [
            Dimension::new(-5, 2, 4),
            Dimension::new(10, 3, 4),
            Dimension::new(0, 2, 4),
        ];
        assert_eq!(byte_offset(&dims, &[-5, 10, 0]), 0);
        assert_eq!(byte_offset(&dims, &[-4, 12, 1]), (6 + 2 * 2 + 1) * 4);
    }

    #[test]
    fn test_stride_multiplier_scales_axis() {
        // Every other element along the fastest axis.
        let dims = [Dimension::new(1, 2, 4), Dimension::new(1, 3, 8)];
        assert_eq!(byte_offset(&dims, &[1, 3]), 16);
        assert_eq!(byte_offset(&dims, &[2, 1]), 12);
    }
}
