use nalgebra::{DMatrix, Matrix2x3, SMatrix};
use npy_array::{Array, ArrayView, ScalarType, Shape};

#[test]
fn matrix_roundtrip() {
    let m = Matrix2x3::new(1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0);
    let array = Array::from(&m);
    assert_eq!(array.shape().extents(), vec![2, 3]);
    assert_eq!(array.shape().rows(), 2);
    assert_eq!(array.shape().cols(), 3);
    assert_eq!(array.at::<f64>(&[1, 0]), 4.0);
    // Column-major storage is the planar layout.
    assert_eq!(array.as_bytes(), le_bytes(m.as_slice()));

    assert_eq!(array.to_smatrix::<f64, 2, 3>(), Some(m));
    assert_eq!(array.to_dmatrix::<f64>().unwrap(), DMatrix::from_column_slice(2, 3, m.as_slice()));
}

fn le_bytes(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn mismatches_are_rejected() {
    let array = Array::new(ScalarType::Int32, &[2, 3]);
    assert!(array.to_dmatrix::<f32>().is_none());
    assert!(array.to_smatrix::<i32, 3, 2>().is_none());
    assert!(Array::new(ScalarType::Int32, &[6]).to_dmatrix::<i32>().is_none());
}

#[test]
fn view_with_offset_mins() {
    let data: Vec<u8> = (0..4u16).flat_map(|v| v.to_le_bytes()).collect();
    let shape = Shape::from_parts(&[5, 7], &[2, 2], &[2, 1]);
    let view = ArrayView::new(&data, ScalarType::UInt16, shape);
    let m: SMatrix<u16, 2, 2> = view.to_smatrix().unwrap();
    // Row stride 2, column stride 1: the transpose of the planar reading.
    assert_eq!(m, SMatrix::<u16, 2, 2>::new(0, 1, 2, 3));
}
