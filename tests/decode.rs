use npy_array::{
    decode_npy, f16, read_npy, write_npy, Array, ArrayView, ArrayViewMut, AxisOrderPolicy,
    DecodeNpyError, Element, NpyDecoder, ParseHeaderError, ReadNpyExt, ScalarType,
    ViewMutNpyExt, ViewNpyExt, WriteNpyExt,
};
use std::fs;

/// Builds a version 1.0 `.npy` buffer by hand, padded to 64 bytes like numpy
/// does.
fn npy_bytes(descr: &str, fortran_order: bool, shape: &[i64], payload: &[u8]) -> Vec<u8> {
    let shape = match shape {
        [n] => format!("({n},)"),
        _ => format!(
            "({})",
            shape.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
        ),
    };
    let fortran = if fortran_order { "True" } else { "False" };
    npy_bytes_with_dict(
        format!("{{'descr': '{descr}', 'fortran_order': {fortran}, 'shape': {shape}, }}"),
        payload,
    )
}

fn npy_bytes_with_dict(mut dict: String, payload: &[u8]) -> Vec<u8> {
    while (10 + dict.len() + 1) % 64 != 0 {
        dict.push(' ');
    }
    dict.push('\n');

    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend_from_slice(payload);
    out
}

fn f32_payload(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn decode_c_order_float32() {
    let values = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
    let bytes = npy_bytes("<f4", false, &[2, 3], &f32_payload(&values));

    let array = decode_npy(&bytes).unwrap();
    assert_eq!(array.scalar_type(), ScalarType::Float32);
    assert_eq!(array.rank(), 2);
    assert_eq!(array.shape().extents(), vec![3, 2]);
    assert_eq!(array.shape().strides(), vec![1, 3]);
    assert_eq!(array.total_size_bytes(), 24);

    // numpy's a[r, c] is at [c, r] here.
    for r in 0..2 {
        for c in 0..3 {
            assert_eq!(array.at::<f32>(&[c, r]), values[(r * 3 + c) as usize]);
        }
    }
    // Flat positions follow the payload order.
    for (n, index) in array.shape().indices().enumerate() {
        assert_eq!(array.shape().flat_index(&index), n as i64);
        assert_eq!(array.at::<f32>(&index), values[n]);
    }
}

#[test]
fn decode_fortran_order_keeps_shape() {
    let values = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
    let bytes = npy_bytes("<f4", true, &[2, 3], &f32_payload(&values));
    let array = decode_npy(&bytes).unwrap();
    assert_eq!(array.shape().extents(), vec![2, 3]);
    assert_eq!(array.at::<f32>(&[1, 0]), 1.0);
    assert_eq!(array.at::<f32>(&[0, 1]), 2.0);
}

#[test]
fn alternative_axis_order_policies() {
    let bytes = npy_bytes("<i2", false, &[2, 3], &[0; 12]);
    assert_eq!(extents_of(&bytes, AxisOrderPolicy::ReverseUnlessFortran), vec![3, 2]);
    assert_eq!(extents_of(&bytes, AxisOrderPolicy::ReverseIfFortran), vec![2, 3]);
    assert_eq!(extents_of(&bytes, AxisOrderPolicy::AsWritten), vec![2, 3]);
    assert_eq!(decode_npy(&bytes).unwrap().shape().extents(), vec![3, 2]);

    let bytes = npy_bytes("<i2", true, &[2, 3], &[0; 12]);
    assert_eq!(extents_of(&bytes, AxisOrderPolicy::ReverseUnlessFortran), vec![2, 3]);
    assert_eq!(extents_of(&bytes, AxisOrderPolicy::ReverseIfFortran), vec![3, 2]);
    assert_eq!(extents_of(&bytes, AxisOrderPolicy::AsWritten), vec![2, 3]);
}

fn extents_of(bytes: &[u8], policy: AxisOrderPolicy) -> Vec<i64> {
    NpyDecoder::new().with_axis_order(policy).view(bytes).unwrap().shape().extents()
}

/// Mirrors numpy's `np.fromfunction(lambda *i: sum(i), (1, 2, ..., rank))`.
fn check_ranks<T>(descr: &str, from_sum: impl Fn(i64) -> T)
where
    T: Element + PartialEq + std::fmt::Debug,
{
    let width = T::SCALAR_TYPE.width_in_bytes();
    for rank in 0..6usize {
        let numpy_shape: Vec<i64> = (1..=rank as i64).collect();
        // Row-major walk over numpy's shape.
        let count: i64 = numpy_shape.iter().product();
        let mut payload = vec![0u8; count as usize * width];
        for n in 0..count {
            let mut rem = n;
            let mut sum = 0;
            for &extent in numpy_shape.iter().rev() {
                sum += rem % extent;
                rem /= extent;
            }
            from_sum(sum).write_le(&mut payload[n as usize * width..]);
        }
        let bytes = npy_bytes(descr, false, &numpy_shape, &payload);

        let decoded = decode_npy(&bytes).unwrap();
        for array in [decoded.view().to_owned(), Array::read_npy(&bytes[..]).unwrap()] {
            assert_eq!(array.scalar_type(), T::SCALAR_TYPE);
            assert_eq!(array.rank(), rank);
            assert!(!array.is_empty());
            for d in 0..rank {
                assert_eq!(array.shape().min(d), 0);
                assert_eq!(array.shape().extent(d), (rank - d) as i64);
            }
            for index in array.shape().indices() {
                assert_eq!(array.at::<T>(&index), from_sum(index.iter().sum()));
            }
        }

        let view = ArrayView::view_npy(&bytes).unwrap();
        assert_eq!(view.num_elements(), count);
        if rank == 0 {
            assert_eq!(view.at::<T>(&[]), from_sum(0));
        }
    }

    let empty = npy_bytes(descr, false, &[0], &[]);
    let array = decode_npy(&empty).unwrap();
    assert_eq!(array.scalar_type(), T::SCALAR_TYPE);
    assert!(array.is_empty());
    assert!(ArrayView::view_npy(&empty).unwrap().is_empty());
}

#[test]
fn all_supported_types_and_ranks() {
    check_ranks("|i1", |s| s as i8);
    check_ranks("<i2", |s| s as i16);
    check_ranks("<i4", |s| s as i32);
    check_ranks("<i8", |s| s);
    check_ranks("|u1", |s| s as u8);
    check_ranks("<u2", |s| s as u16);
    check_ranks("<u4", |s| s as u32);
    check_ranks("<u8", |s| s as u64);
    check_ranks("<f2", |s| f16::from_f32(s as f32));
    check_ranks("<f4", |s| s as f32);
    check_ranks("<f8", |s| s as f64);
}

#[test]
fn truncated_payload() {
    let bytes = npy_bytes("<f4", false, &[2, 3], &f32_payload(&[0.0; 6]));
    let short = &bytes[..bytes.len() - 1];
    assert!(matches!(
        decode_npy(short),
        Err(DecodeNpyError::Truncated { expected: 24, available: 23 })
    ));
    assert!(matches!(
        ArrayView::view_npy(short),
        Err(DecodeNpyError::Truncated { .. })
    ));
}

#[test]
fn trailing_bytes_are_ignored() {
    let mut bytes = npy_bytes("<f4", false, &[2], &f32_payload(&[1.0, 2.0]));
    bytes.extend_from_slice(b"trailing");
    let array = decode_npy(&bytes).unwrap();
    assert_eq!(array.as_bytes().len(), 8);
    assert_eq!(array.at::<f32>(&[1]), 2.0);
}

#[test]
fn corrupted_magic() {
    let mut bytes = npy_bytes("<f4", false, &[2], &f32_payload(&[1.0, 2.0]));
    bytes[0] = b'N';
    assert!(matches!(
        decode_npy(&bytes),
        Err(DecodeNpyError::Header(ParseHeaderError::MagicString))
    ));
    assert!(matches!(
        decode_npy(b"\x93NUM"),
        Err(DecodeNpyError::Header(ParseHeaderError::UnexpectedEnd { .. }))
    ));
}

#[test]
fn unsupported_version() {
    let mut bytes = npy_bytes("<f4", false, &[2], &f32_payload(&[1.0, 2.0]));
    bytes[6] = 9;
    let err = decode_npy(&bytes).unwrap_err();
    assert!(matches!(
        err,
        DecodeNpyError::Header(ParseHeaderError::Version { major: 9, minor: 0 })
    ));
    assert!(err.to_string().contains("9.0"), "{err}");
}

#[test]
fn version_2_header() {
    let v1 = npy_bytes("<i4", false, &[2], &[1, 0, 0, 0, 2, 0, 0, 0]);
    let header_len = u16::from_le_bytes([v1[8], v1[9]]) as u32;
    let mut v2 = b"\x93NUMPY\x02\x00".to_vec();
    v2.extend_from_slice(&(header_len).to_le_bytes());
    v2.extend_from_slice(&v1[10..]);
    let array = decode_npy(&v2).unwrap();
    assert_eq!(array.at::<i32>(&[1]), 2);
}

#[test]
fn malformed_header_text() {
    let bytes = npy_bytes("<f4", false, &[2], &[0; 8]);
    let text_start = 10;
    let mut broken = bytes.clone();
    broken[text_start] = b'[';
    assert!(matches!(decode_npy(&broken), Err(DecodeNpyError::Header(_))));

    let missing_shape = {
        let dict = "{'descr': '<f4', 'fortran_order': False}\n";
        let mut out = b"\x93NUMPY\x01\x00".to_vec();
        out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        out.extend_from_slice(dict.as_bytes());
        out
    };
    assert!(matches!(
        decode_npy(&missing_shape),
        Err(DecodeNpyError::Header(ParseHeaderError::MissingKey("shape")))
    ));
}

#[test]
fn unsupported_dtypes() {
    for descr in ["<c8", "|b1", "<U4", "<f16", "|V8", "<M8[ns]"] {
        let bytes = npy_bytes(descr, false, &[1], &[0; 16]);
        match decode_npy(&bytes) {
            Err(DecodeNpyError::UnsupportedDtype { descr: d }) => assert_eq!(d, descr),
            other => panic!("{descr}: unexpected {other:?}"),
        }
    }
}

#[test]
fn structured_dtype_is_unsupported() {
    let bytes = npy_bytes_with_dict(
        "{'descr': [('x', '<i4'), ('y', '<f4')], 'fortran_order': False, 'shape': (1,), }".into(),
        &[0; 8],
    );
    match decode_npy(&bytes) {
        Err(DecodeNpyError::UnsupportedDtype { descr }) => {
            assert!(descr.contains("'x'"), "{descr}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn big_endian_is_rejected() {
    let bytes = npy_bytes(">i4", false, &[1], &[0; 4]);
    assert!(matches!(decode_npy(&bytes), Err(DecodeNpyError::BigEndian { .. })));
    // No byte order for single bytes.
    let bytes = npy_bytes(">u1", false, &[1], &[7]);
    assert_eq!(decode_npy(&bytes).unwrap().at::<u8>(&[0]), 7);
}

#[test]
fn negative_extent() {
    let bytes = npy_bytes("<f4", false, &[2, -3], &[]);
    assert!(matches!(
        decode_npy(&bytes),
        Err(DecodeNpyError::NegativeExtent { axis: 0, extent: -3 })
    ));
}

#[test]
fn huge_shape_overflows() {
    let bytes = npy_bytes("<f8", false, &[i64::MAX, 4], &[]);
    assert!(matches!(decode_npy(&bytes), Err(DecodeNpyError::LengthOverflow)));
}

#[test]
fn empty_array_with_huge_extents() {
    let bytes = npy_bytes("<f8", false, &[0, 1 << 40, 1 << 40], &[]);
    let array = decode_npy(&bytes).unwrap();
    assert_eq!(array.shape().extents(), vec![1 << 40, 1 << 40, 0]);
    assert!(array.is_empty());
    assert!(array.as_bytes().is_empty());

    let view = ArrayView::view_npy(&bytes).unwrap();
    assert!(view.is_empty());
    assert_eq!(view.to_owned(), array);
}

#[test]
fn view_aliases_buffer() {
    let bytes = npy_bytes("<i2", false, &[3], &[1, 0, 2, 0, 3, 0]);
    let view = ArrayView::view_npy(&bytes).unwrap();
    let payload_start = bytes.len() - 6;
    assert_eq!(view.as_bytes().as_ptr(), bytes[payload_start..].as_ptr());
    assert_eq!(view.at::<i16>(&[2]), 3);
}

#[test]
fn mutable_view_writes_through() {
    let mut bytes = npy_bytes("<i2", false, &[3], &[1, 0, 2, 0, 3, 0]);
    {
        let mut view = ArrayViewMut::view_mut_npy(&mut bytes).unwrap();
        view.set(&[0], -5i16);
        assert_eq!(view.at::<i16>(&[0]), -5);
    }
    assert_eq!(decode_npy(&bytes).unwrap().at::<i16>(&[0]), -5);
}

#[test]
fn write_then_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("array.npy");

    let mut array = Array::new(ScalarType::Float64, &[2, 3, 4]);
    for (n, index) in array.shape().clone().indices().enumerate() {
        array.set(&index, n as f64 * 0.5);
    }
    write_npy(&path, &array).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 128 + 2 * 3 * 4 * 8);
    let text = String::from_utf8_lossy(&bytes[10..128]);
    assert!(text.contains("(4, 3, 2)"), "{text}");
    assert!(text.contains("<f8"), "{text}");

    let read = read_npy(&path).unwrap();
    assert_eq!(read, array);
}

#[test]
fn write_strided_view() {
    // A reversed view of [10, 20, 30].
    let mut array = Array::new(ScalarType::Int32, &[3]);
    for (i, v) in [10i32, 20, 30].into_iter().enumerate() {
        array.set(&[i as i64], v);
    }
    let reversed = npy_array::Shape::from_parts(&[0], &[3], &[-1]);
    let view = ArrayView::with_origin(array.as_bytes(), 8, ScalarType::Int32, reversed);
    assert_eq!(view.at::<i32>(&[0]), 30);

    let mut bytes = Vec::new();
    view.write_npy(&mut bytes).unwrap();
    let decoded = decode_npy(&bytes).unwrap();
    assert_eq!(decoded.at::<i32>(&[0]), 30);
    assert_eq!(decoded.at::<i32>(&[2]), 10);
}

#[test]
fn memory_mapped_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapped.npy");
    let mut array = Array::new(ScalarType::UInt32, &[4, 4]);
    array.set(&[3, 2], 42u32);
    write_npy(&path, &array).unwrap();

    let file = fs::File::open(&path).unwrap();
    let mmap = unsafe { memmap2::Mmap::map(&file).unwrap() };
    let view = ArrayView::view_npy(&mmap).unwrap();
    assert_eq!(view.at::<u32>(&[3, 2]), 42);
    assert_eq!(view.at::<u32>(&[2, 3]), 0);
}
