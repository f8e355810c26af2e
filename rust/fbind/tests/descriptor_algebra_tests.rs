use std::collections::HashMap;
use std::ptr::NonNull;

use fbind::{Attribute, Descriptor, Dimension, ErrorKind, SectionBounds, TypeCode};

fn allocatable(type_code: TypeCode, rank: usize) -> Descriptor {
    let mut dv = Descriptor::new(rank).unwrap();
    dv.establish(None, Attribute::Allocatable, type_code, 0, rank, None)
        .unwrap();
    dv
}

/// Visits every subscript tuple of `dims`, the last axis varying fastest.
fn for_each_subscript(dims: &[Dimension], mut visit: impl FnMut(&[isize])) {
    if dims.iter().any(|dim| dim.extent <= 0) {
        return;
    }
    let mut subscripts: Vec<isize> = dims.iter().map(|dim| dim.lower_bound).collect();
    loop {
        visit(&subscripts);
        let mut axis = dims.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            if subscripts[axis] < dims[axis].upper_bound() {
                subscripts[axis] += 1;
                break;
            }
            subscripts[axis] = dims[axis].lower_bound;
        }
    }
}

/// Allocates a random `INT64` array and stores a running counter in its
/// elements, visited in declared order. Returns the counter value written
/// at each subscript tuple.
fn numbered_array(rank: usize) -> (Descriptor, HashMap<Vec<isize>, i64>) {
    let lower: Vec<isize> = (0..rank).map(|_| fastrand::isize(-3..=3)).collect();
    let upper: Vec<isize> = lower.iter().map(|l| l + fastrand::isize(0..=3)).collect();
    let mut dv = allocatable(TypeCode::INT64, rank);
    dv.allocate(Some(lower.as_slice()), Some(upper.as_slice()), 0)
        .unwrap();

    let mut values = HashMap::new();
    let mut next = 0i64;
    for_each_subscript(dv.dims(), |subscripts| {
        unsafe { dv.address(subscripts).unwrap().cast::<i64>().write(next) };
        values.insert(subscripts.to_vec(), next);
        next += 1;
    });
    (dv, values)
}

fn read(dv: &Descriptor, subscripts: &[isize]) -> i64 {
    unsafe { dv.address(subscripts).unwrap().cast::<i64>().read() }
}

fn random_in(dim: &Dimension) -> isize {
    fastrand::isize(dim.lower_bound..=dim.upper_bound())
}

#[test]
fn test_matrix_allocate_and_section() {
    let mut matrix = Descriptor::new(2).unwrap();
    matrix
        .establish(None, Attribute::Allocatable, TypeCode::DOUBLE, 0, 2, Some(&[3, 4]))
        .unwrap();
    matrix.allocate(Some(&[1, 1]), Some(&[3, 4]), 0).unwrap();
    assert_eq!(matrix.element_count(), Some(12));
    for dim in matrix.dims() {
        assert_eq!(dim.sm, matrix.elem_len() as isize);
    }

    let mut rows = Descriptor::new(2).unwrap();
    rows.establish(None, Attribute::Other, TypeCode::DOUBLE, 0, 2, None)
        .unwrap();
    rows.section(
        &matrix,
        &SectionBounds::new()
            .lower(&[2, 1])
            .upper(&[3, 4])
            .strides(&[1, 1]),
    )
    .unwrap();
    assert_eq!(rows.address(&[2, 1]).unwrap(), matrix.address(&[2, 1]).unwrap());
    for row in 2..=3 {
        for col in 1..=4 {
            assert_eq!(
                rows.address(&[row, col]).unwrap(),
                matrix.address(&[row, col]).unwrap()
            );
        }
    }
    assert!(rows.address(&[1, 1]).is_err());

    unsafe { matrix.deallocate() }.unwrap();
}

#[test]
fn test_dense_elements_follow_declared_order() {
    fastrand::seed(8_301_122_457);
    for _ in 0..100 {
        let rank = fastrand::usize(0..=6);
        let (mut dv, _) = numbered_array(rank);
        let count = dv.element_count().unwrap();
        let stored = unsafe {
            std::slice::from_raw_parts(dv.base_addr().unwrap().as_ptr().cast::<i64>(), count)
        };
        assert!(
            stored.iter().copied().eq(0..count as i64),
            "rank {rank}, dims {:?}",
            dv.dims()
        );
        unsafe { dv.deallocate() }.unwrap();
    }
}

#[test]
fn test_sections_of_the_slowest_retained_axis_read_source_elements() {
    fastrand::seed(5_550_123);
    for _ in 0..100 {
        let rank = fastrand::usize(1..=4);
        let (mut owner, values) = numbered_array(rank);
        let dims = owner.dims().to_vec();

        // Axes before `first` are reduced, `first` is restricted and strided,
        // later axes are kept whole.
        let first = fastrand::usize(0..rank);
        let mut lower: Vec<isize> = dims.iter().map(|d| d.lower_bound).collect();
        let mut upper: Vec<isize> = dims.iter().map(Dimension::upper_bound).collect();
        let mut strides = vec![1isize; rank];
        for axis in 0..first {
            lower[axis] = random_in(&dims[axis]);
            upper[axis] = lower[axis];
            strides[axis] = 0;
        }
        lower[first] = random_in(&dims[first]);
        upper[first] = random_in(&dims[first]);
        let step = fastrand::isize(1..=2);
        strides[first] = if upper[first] < lower[first] { -step } else { step };

        let mut section = Descriptor::new(rank - first).unwrap();
        section
            .establish(None, Attribute::Other, TypeCode::INT64, 0, rank - first, None)
            .unwrap();
        let bounds = SectionBounds::new()
            .lower(&lower)
            .upper(&upper)
            .strides(&strides);
        section.section(&owner, &bounds).unwrap();

        let to_source = |subscripts: &[isize]| -> Vec<isize> {
            let mut source = lower[..first].to_vec();
            source.push(lower[first] + (subscripts[0] - lower[first]) * strides[first]);
            source.extend_from_slice(&subscripts[1..]);
            source
        };
        for_each_subscript(section.dims(), |subscripts| {
            assert_eq!(
                read(&section, subscripts),
                values[&to_source(subscripts)],
                "dims {dims:?}, lower {lower:?}, upper {upper:?}, strides {strides:?}, at {subscripts:?}"
            );
        });

        // A section of the section, again over its slowest axis.
        let outer = section.dims().to_vec();
        let mut nested_lower: Vec<isize> = outer.iter().map(|d| d.lower_bound).collect();
        let mut nested_upper: Vec<isize> = outer.iter().map(Dimension::upper_bound).collect();
        let mut nested_strides = vec![1isize; outer.len()];
        nested_lower[0] = random_in(&outer[0]);
        nested_upper[0] = random_in(&outer[0]);
        let step = fastrand::isize(1..=3);
        nested_strides[0] = if nested_upper[0] < nested_lower[0] { -step } else { step };

        let mut nested = Descriptor::new(outer.len()).unwrap();
        nested
            .establish(None, Attribute::Other, TypeCode::INT64, 0, outer.len(), None)
            .unwrap();
        let bounds = SectionBounds::new()
            .lower(&nested_lower)
            .upper(&nested_upper)
            .strides(&nested_strides);
        nested.section(&section, &bounds).unwrap();
        for_each_subscript(nested.dims(), |subscripts| {
            let mut through = subscripts.to_vec();
            through[0] = nested_lower[0] + (subscripts[0] - nested_lower[0]) * nested_strides[0];
            assert_eq!(
                read(&nested, subscripts),
                values[&to_source(through.as_slice())],
                "nested {nested_lower:?}..{nested_upper:?} by {nested_strides:?}, at {subscripts:?}"
            );
        });

        unsafe { owner.deallocate() }.unwrap();
    }
}

#[test]
fn test_address_is_invariant_to_how_strides_were_produced() {
    fastrand::seed(41_977);
    for _ in 0..50 {
        let rank = fastrand::usize(1..=4);
        let lower: Vec<isize> = (0..rank).map(|_| fastrand::isize(-2..=2)).collect();
        let upper: Vec<isize> = lower.iter().map(|l| l + fastrand::isize(0..=3)).collect();

        let mut owner = allocatable(TypeCode::FLOAT, rank);
        owner
            .allocate(Some(lower.as_slice()), Some(upper.as_slice()), 0)
            .unwrap();

        let extents: Vec<isize> = owner.dims().iter().map(|d| d.extent).collect();
        let mut established = Descriptor::new(rank).unwrap();
        established
            .establish(
                owner.base_addr(),
                Attribute::Other,
                TypeCode::FLOAT,
                0,
                rank,
                Some(extents.as_slice()),
            )
            .unwrap();
        for (dim, owned) in established.dims_mut().iter_mut().zip(owner.dims()) {
            dim.lower_bound = owned.lower_bound;
        }

        let mut alias = Descriptor::new(rank).unwrap();
        alias
            .establish(None, Attribute::Pointer, TypeCode::FLOAT, 0, rank, None)
            .unwrap();
        alias.set_pointer(Some(&owner), None).unwrap();

        let mut identity = Descriptor::new(rank).unwrap();
        identity
            .establish(None, Attribute::Other, TypeCode::FLOAT, 0, rank, None)
            .unwrap();
        identity.section(&owner, &SectionBounds::new()).unwrap();

        let subscripts: Vec<isize> = lower
            .iter()
            .zip(&upper)
            .map(|(&l, &u)| fastrand::isize(l..=u))
            .collect();
        let expected = owner.address(&subscripts).unwrap();
        assert_eq!(established.address(&subscripts).unwrap(), expected);
        assert_eq!(identity.address(&subscripts).unwrap(), expected);
        assert_eq!(alias.address(&subscripts).unwrap(), expected);

        unsafe { owner.deallocate() }.unwrap();
    }
}

#[test]
fn test_allocate_deallocate_round_trip() {
    let mut dv = allocatable(TypeCode::LONG_DOUBLE, 3);
    dv.allocate(Some(&[0, -1, 5]), Some(&[1, 1, 5]), 0).unwrap();
    assert!(dv.is_associated());
    let extents: Vec<isize> = dv.dims().iter().map(|d| d.extent).collect();
    assert_eq!(extents, [2, 3, 1]);
    assert!(dv.dims().iter().all(|d| d.sm == dv.elem_len() as isize));
    assert!(dv.is_contiguous().unwrap());

    let count = dv.element_count().unwrap();
    let bytes = unsafe {
        std::slice::from_raw_parts(dv.base_addr().unwrap().as_ptr(), count * dv.elem_len())
    };
    assert!(bytes.iter().all(|&b| b == 0));

    unsafe { dv.deallocate() }.unwrap();
    assert!(!dv.is_associated());
    let err = unsafe { dv.deallocate() }.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BaseAddrNull(_)));

    dv.allocate(Some(&[1, 1, 1]), Some(&[2, 2, 2]), 0).unwrap();
    unsafe { dv.deallocate() }.unwrap();
}

#[test]
fn test_subscripts_just_outside_bounds() {
    let mut dv = allocatable(TypeCode::INT, 3);
    dv.allocate(Some(&[1, -2, 0]), Some(&[3, 2, 4]), 0).unwrap();

    for axis in 0..dv.rank() {
        let dim = *dv.dim(axis).unwrap();
        for outside in [dim.lower_bound - 1, dim.lower_bound + dim.extent] {
            let mut subscripts: Vec<isize> = dv.dims().iter().map(|d| d.lower_bound).collect();
            subscripts[axis] = outside;
            let err = dv.address(&subscripts).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::OutOfBounds(_)));
            assert!(err.to_string().contains(&format!("subscripts[{axis}]")));
        }
    }

    unsafe { dv.deallocate() }.unwrap();
}

#[test]
fn test_strided_column_of_records() {
    #[allow(dead_code)]
    #[repr(C)]
    struct Sample {
        time: f64,
        value: f64,
    }

    let mut samples: Vec<Sample> = (0..8)
        .map(|i| Sample {
            time: i as f64,
            value: i as f64 * 10.0,
        })
        .collect();
    let mut table = Descriptor::new(1).unwrap();
    table
        .establish(
            NonNull::new(samples.as_mut_ptr().cast()),
            Attribute::Other,
            TypeCode::STRUCT,
            size_of::<Sample>(),
            1,
            Some(&[8]),
        )
        .unwrap();

    let mut values = Descriptor::new(1).unwrap();
    values
        .establish(None, Attribute::Other, TypeCode::DOUBLE, 0, 1, None)
        .unwrap();
    values.select_part(&table, size_of::<f64>(), 0).unwrap();

    let mut every_other = Descriptor::new(1).unwrap();
    every_other
        .establish(None, Attribute::Other, TypeCode::DOUBLE, 0, 1, None)
        .unwrap();
    every_other
        .section(
            &values,
            &SectionBounds::new().lower(&[2]).upper(&[8]).strides(&[2]),
        )
        .unwrap();
    assert_eq!(every_other.dim(0).unwrap().extent, 4);
    assert!(!every_other.is_contiguous().unwrap());

    let read: Vec<f64> = (0..4)
        .map(|i| {
            let index = every_other.dim(0).unwrap().lower_bound + i;
            unsafe { every_other.address(&[index]).unwrap().cast::<f64>().read() }
        })
        .collect();
    assert_eq!(read, [10.0, 30.0, 50.0, 70.0]);
}
