//! Runtime-typed arrays over raw little-endian bytes.
//!
//! - [`ArrayView`] borrows `&'a [u8]`, [`ArrayViewMut`] borrows `&'a mut [u8]`.
//! - [`Array`] owns a planar, zero-initialised buffer.
//!
//! All three pair a [`ScalarType`] with a [`Shape`]. Typed access takes the
//! element type as a type parameter and asserts that it matches the runtime
//! tag.

use crate::{scalar_type::Element, shape::Shape, ScalarType};
use std::{fmt, ops::Range};

/// Byte range of the element at `indices`.
///
/// `origin` is the byte offset of the element at flat index 0, which lets
/// negative strides address memory before it.
fn element_range(
    len: usize,
    origin: usize,
    scalar_type: ScalarType,
    shape: &Shape,
    indices: &[i64],
) -> Range<usize> {
    let width = scalar_type.width_in_bytes();
    let flat = shape.flat_index(indices);
    let start = i64::try_from(origin)
        .ok()
        .and_then(|origin| flat.checked_mul(width as i64)?.checked_add(origin))
        .and_then(|start| usize::try_from(start).ok());
    match start {
        Some(start) if start + width <= len => start..start + width,
        _ => panic!(
            "index {indices:?} (flat index {flat}) is outside the {len}-byte buffer"
        ),
    }
}

fn assert_element_type<T: Element>(scalar_type: ScalarType) {
    assert_eq!(
        T::SCALAR_TYPE,
        scalar_type,
        "element type {} does not match array scalar type {}",
        T::SCALAR_TYPE,
        scalar_type
    );
}

/// A read-only, runtime-typed view of borrowed bytes.
#[derive(Clone)]
pub struct ArrayView<'a> {
    data: &'a [u8],
    origin: usize,
    scalar_type: ScalarType,
    shape: Shape,
}

/// A mutable, runtime-typed view of borrowed bytes.
pub struct ArrayViewMut<'a> {
    data: &'a mut [u8],
    origin: usize,
    scalar_type: ScalarType,
    shape: Shape,
}

/// An owned, runtime-typed N-dimensional array with a planar layout.
///
/// `Clone` copies the buffer. [`Default`] is an empty array of
/// [`ScalarType::Undefined`], which is what [`std::mem::take`] leaves behind.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Array {
    scalar_type: ScalarType,
    shape: Shape,
    data: Vec<u8>,
}

impl<'a> ArrayView<'a> {
    /// Creates a view of `data`, with flat index 0 at byte 0.
    ///
    /// The shape is trusted; accesses outside `data` panic.
    pub fn new(data: &'a [u8], scalar_type: ScalarType, shape: Shape) -> Self {
        Self::with_origin(data, 0, scalar_type, shape)
    }

    /// Creates a view of `data` where flat index 0 is at byte `origin`.
    pub fn with_origin(
        data: &'a [u8],
        origin: usize,
        scalar_type: ScalarType,
        shape: Shape,
    ) -> Self {
        Self { data, origin, scalar_type, shape }
    }

    /// The element type.
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// The shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Number of elements.
    pub fn num_elements(&self) -> i64 {
        self.shape.num_elements()
    }

    /// Returns `true` if there are no elements. A rank-0 view has one.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Bytes per element.
    pub fn element_size_bytes(&self) -> usize {
        self.scalar_type.width_in_bytes()
    }

    /// `num_elements() * element_size_bytes()`.
    pub fn total_size_bytes(&self) -> i64 {
        self.num_elements() * self.element_size_bytes() as i64
    }

    /// The whole borrowed buffer.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Byte offset of flat index 0 within [`as_bytes`](Self::as_bytes).
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The bytes of the element at `indices`.
    ///
    /// # Panics
    ///
    /// Panics if the index count is not the rank or the element lies outside
    /// the buffer.
    pub fn element_bytes(&self, indices: &[i64]) -> &'a [u8] {
        let data = self.data;
        &data[element_range(data.len(), self.origin, self.scalar_type, &self.shape, indices)]
    }

    /// Reads the element at `indices`.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match [`scalar_type`](Self::scalar_type), or on
    /// the conditions of [`element_bytes`](Self::element_bytes).
    pub fn at<T: Element>(&self, indices: &[i64]) -> T {
        assert_element_type::<T>(self.scalar_type);
        T::read_le(self.element_bytes(indices))
    }

    /// Copies the elements into a new planar [`Array`] with the same extents.
    pub fn to_owned(&self) -> Array {
        let mut array = Array::new(self.scalar_type, &self.shape.extents());
        let width = self.element_size_bytes();
        if width == 0 {
            return array;
        }
        if self.shape.is_planar() && self.origin == 0 {
            let len = array.data.len();
            array.data.copy_from_slice(&self.data[..len]);
            return array;
        }
        for (chunk, indices) in array.data.chunks_exact_mut(width).zip(self.shape.indices()) {
            chunk.copy_from_slice(self.element_bytes(&indices));
        }
        array
    }
}

impl<'a> ArrayViewMut<'a> {
    /// Creates a mutable view of `data`, with flat index 0 at byte 0.
    pub fn new(data: &'a mut [u8], scalar_type: ScalarType, shape: Shape) -> Self {
        Self::with_origin(data, 0, scalar_type, shape)
    }

    /// Creates a mutable view of `data` where flat index 0 is at byte
    /// `origin`.
    pub fn with_origin(
        data: &'a mut [u8],
        origin: usize,
        scalar_type: ScalarType,
        shape: Shape,
    ) -> Self {
        Self { data, origin, scalar_type, shape }
    }

    /// Reborrows as a read-only view.
    pub fn view(&self) -> ArrayView<'_> {
        ArrayView::with_origin(&*self.data, self.origin, self.scalar_type, self.shape.clone())
    }

    /// The element type.
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// The shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Number of elements.
    pub fn num_elements(&self) -> i64 {
        self.shape.num_elements()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Bytes per element.
    pub fn element_size_bytes(&self) -> usize {
        self.scalar_type.width_in_bytes()
    }

    /// `num_elements() * element_size_bytes()`.
    pub fn total_size_bytes(&self) -> i64 {
        self.num_elements() * self.element_size_bytes() as i64
    }

    /// The whole borrowed buffer.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// The bytes of the element at `indices`, mutably.
    pub fn element_bytes_mut(&mut self, indices: &[i64]) -> &mut [u8] {
        let range = element_range(
            self.data.len(),
            self.origin,
            self.scalar_type,
            &self.shape,
            indices,
        );
        &mut self.data[range]
    }

    /// Reads the element at `indices`. Panics as [`ArrayView::at`] does.
    pub fn at<T: Element>(&self, indices: &[i64]) -> T {
        self.view().at(indices)
    }

    /// Writes `value` at `indices`.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match [`scalar_type`](Self::scalar_type), if the
    /// index count is not the rank, or if the element lies outside the buffer.
    pub fn set<T: Element>(&mut self, indices: &[i64], value: T) {
        assert_element_type::<T>(self.scalar_type);
        value.write_le(self.element_bytes_mut(indices));
    }
}

impl Array {
    /// Allocates a zero-initialised array with a planar layout.
    ///
    /// # Panics
    ///
    /// Panics if an extent is negative or the size in bytes does not fit in
    /// `usize`.
    pub fn new(scalar_type: ScalarType, extents: &[i64]) -> Self {
        assert!(extents.iter().all(|&e| e >= 0), "negative extent in {extents:?}");
        let shape = Shape::new(extents);
        let len = shape
            .num_elements()
            .checked_mul(scalar_type.width_in_bytes() as i64)
            .and_then(|len| usize::try_from(len).ok())
            .expect("array size in bytes overflows usize");
        Self { scalar_type, shape, data: vec![0; len] }
    }

    /// Creates a planar array from its raw little-endian bytes.
    ///
    /// Returns `None` if `data` is not exactly the size the extents require.
    pub fn from_bytes(scalar_type: ScalarType, extents: &[i64], data: Vec<u8>) -> Option<Self> {
        let shape = Shape::new(extents);
        let expected = shape
            .num_elements()
            .checked_mul(scalar_type.width_in_bytes() as i64)?;
        (usize::try_from(expected).ok()? == data.len()).then_some(Self { scalar_type, shape, data })
    }

    /// Borrows the array as a view.
    pub fn view(&self) -> ArrayView<'_> {
        ArrayView::new(&self.data, self.scalar_type, self.shape.clone())
    }

    /// Borrows the array as a mutable view.
    pub fn view_mut(&mut self) -> ArrayViewMut<'_> {
        ArrayViewMut::new(&mut self.data, self.scalar_type, self.shape.clone())
    }

    /// The element type.
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// The shape. Always planar.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Number of elements.
    pub fn num_elements(&self) -> i64 {
        self.shape.num_elements()
    }

    /// Returns `true` if the array has no elements. A rank-0 array has one.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Bytes per element.
    pub fn element_size_bytes(&self) -> usize {
        self.scalar_type.width_in_bytes()
    }

    /// `num_elements() * element_size_bytes()`, equal to the buffer length.
    pub fn total_size_bytes(&self) -> i64 {
        self.num_elements() * self.element_size_bytes() as i64
    }

    /// The buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The buffer, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the array and returns its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Reads the element at `indices`. Panics as [`ArrayView::at`] does.
    pub fn at<T: Element>(&self, indices: &[i64]) -> T {
        self.view().at(indices)
    }

    /// Writes `value` at `indices`. Panics as [`ArrayViewMut::set`] does.
    pub fn set<T: Element>(&mut self, indices: &[i64], value: T) {
        assert_element_type::<T>(self.scalar_type);
        let range = element_range(
            self.data.len(),
            0,
            self.scalar_type,
            &self.shape,
            indices,
        );
        value.write_le(&mut self.data[range]);
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new(ScalarType::Undefined, &[0])
    }
}

impl fmt::Debug for ArrayView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArrayView")
            .field("scalar_type", &self.scalar_type)
            .field("dims", &self.shape.dims())
            .field("origin", &self.origin)
            .field("len", &self.data.len())
            .finish()
    }
}

impl fmt::Debug for ArrayViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArrayViewMut")
            .field("scalar_type", &self.scalar_type)
            .field("dims", &self.shape.dims())
            .field("origin", &self.origin)
            .field("len", &self.data.len())
            .finish()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Array")
            .field("scalar_type", &self.scalar_type)
            .field("extents", &self.shape.extents())
            .field("len", &self.data.len())
            .finish()
    }
}
