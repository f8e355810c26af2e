//! Array sections: rectangular, strided, possibly rank-reducing views of an
//! existing array.

use fbind_common::{Result, error::Error, verify};

use crate::config::MAX_RANK;
use crate::descriptor::{Descriptor, Dimension, Dims};
use crate::types::Attribute;

/// Optional per-axis bounds and strides selecting a section.
///
/// Every array that is given must hold one entry per source dimension.
/// Missing lower bounds default to the source lower bounds, missing upper
/// bounds to the source upper bounds, and missing strides to 1. A stride of
/// zero removes the axis from the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionBounds<'a> {
    pub lower_bounds: Option<&'a [isize]>,
    pub upper_bounds: Option<&'a [isize]>,
    pub strides: Option<&'a [isize]>,
}

impl<'a> SectionBounds<'a> {
    pub fn new() -> SectionBounds<'a> {
        Default::default()
    }

    pub fn lower(mut self, lower_bounds: &'a [isize]) -> Self {
        self.lower_bounds = Some(lower_bounds);
        self
    }

    pub fn upper(mut self, upper_bounds: &'a [isize]) -> Self {
        self.upper_bounds = Some(upper_bounds);
        self
    }

    pub fn strides(mut self, strides: &'a [isize]) -> Self {
        self.strides = Some(strides);
        self
    }
}

impl Descriptor {
    /// Makes this descriptor describe the section of `source` selected by
    /// `bounds`.
    ///
    /// This descriptor must not be allocatable and must already carry the
    /// element length and type of `source`, and a rank equal to the source
    /// rank minus the number of zero strides. The result aliases the source
    /// storage and must never be deallocated. Nothing is modified unless all
    /// checks pass.
    ///
    /// Each result axis keeps `stride * sm` of its source axis, and addresses
    /// scale every axis by the extents of the faster result axes. The result
    /// therefore designates the same elements as the source only while every
    /// axis after the first retained one keeps its full extent with unit
    /// stride and is not reduced. The first retained axis may be restricted,
    /// strided or reversed, and any axes before it may be reduced. Sections
    /// restricting a later axis resolve to other elements of the source.
    pub fn section(&mut self, source: &Descriptor, bounds: &SectionBounds<'_>) -> Result<()> {
        if source.base_addr.is_none() {
            return Err(Error::base_addr_null("cannot take a section of an unassociated source"));
        }
        verify!(InvalidAttribute, self.attribute != Attribute::Allocatable);
        verify!(InvalidRank, source.rank() > 0);
        if self.elem_len != source.elem_len {
            return Err(Error::invalid_elem_len(format!(
                "result element length {} differs from source element length {}",
                self.elem_len, source.elem_len
            )));
        }
        if self.type_code != source.type_code {
            return Err(Error::invalid_type(format!(
                "result type {} differs from source type {}",
                self.type_code.as_raw(),
                source.type_code.as_raw()
            )));
        }

        let rank = source.rank();
        for (name, values) in [
            ("lower_bounds", bounds.lower_bounds),
            ("upper_bounds", bounds.upper_bounds),
        ] {
            if values.is_some_and(|values| values.len() < rank) {
                return Err(Error::invalid_extent(format!(
                    "{name} must hold {rank} entries"
                )));
            }
        }
        if bounds.strides.is_some_and(|strides| strides.len() < rank) {
            return Err(Error::invalid_stride(format!("strides must hold {rank} entries")));
        }

        let reduced = bounds
            .strides
            .map_or(0, |strides| strides[..rank].iter().filter(|&&s| s == 0).count());
        if self.rank() != rank - reduced {
            return Err(Error::invalid_rank(format!(
                "result rank {} must equal source rank {rank} minus {reduced} zero strides",
                self.rank()
            )));
        }

        let mut lower = [0isize; MAX_RANK];
        let mut upper = [0isize; MAX_RANK];
        let mut stride = [1isize; MAX_RANK];
        for (axis, dim) in source.dims.iter().enumerate() {
            lower[axis] = bounds.lower_bounds.map_or(dim.lower_bound, |lb| lb[axis]);
            upper[axis] = match bounds.upper_bounds {
                Some(ub) => ub[axis],
                None if dim.is_assumed_size() => {
                    return Err(Error::invalid_extent(format!(
                        "upper_bounds are required: source dimension {axis} is assumed-size"
                    )));
                }
                None => dim.upper_bound(),
            };
            if let Some(strides) = bounds.strides {
                stride[axis] = strides[axis];
            }
            if stride[axis] == 0 && lower[axis] != upper[axis] {
                return Err(Error::invalid_stride(format!(
                    "strides[{axis}] = 0 requires equal bounds, got {} and {}",
                    lower[axis], upper[axis]
                )));
            }
        }

        for (axis, dim) in source.dims.iter().enumerate() {
            if bounds.lower_bounds.is_some() && !dim.contains(lower[axis]) {
                return Err(Error::out_of_bounds(
                    format_args!("lower_bounds[{axis}]"),
                    lower[axis],
                    dim.lower_bound,
                    dim.upper_bound(),
                ));
            }
            if bounds.upper_bounds.is_some() && !dim.contains(upper[axis]) {
                return Err(Error::out_of_bounds(
                    format_args!("upper_bounds[{axis}]"),
                    upper[axis],
                    dim.lower_bound,
                    dim.upper_bound(),
                ));
            }
            if upper[axis] < lower[axis] && stride[axis] >= 0 {
                return Err(Error::invalid_stride(format!(
                    "upper_bounds[{axis}] = {} < lower_bounds[{axis}] = {} requires a negative stride, got {}",
                    upper[axis], lower[axis], stride[axis]
                )));
            }
        }

        let base_addr = source.address(&lower[..rank])?;
        let mut dims = Dims::default();
        for (axis, dim) in source.dims.iter().enumerate() {
            if stride[axis] == 0 {
                continue;
            }
            let overflow = || {
                Error::invalid_stride(format!(
                    "strides[{axis}] = {} overflows the section of dimension {axis}",
                    stride[axis]
                ))
            };
            let extent = upper[axis]
                .checked_sub(lower[axis])
                .and_then(|distance| distance.checked_div(stride[axis]))
                .and_then(|steps| steps.checked_add(1))
                .ok_or_else(overflow)?
                .max(0);
            let sm = stride[axis].checked_mul(dim.sm).ok_or_else(overflow)?;
            dims.push(Dimension::new(lower[axis], extent, sm));
        }

        self.base_addr = Some(base_addr);
        self.dims = dims;
        Ok(())
    }
}
