//! The index space of an N-dimensional array.
//!
//! A [`Shape`] is a list of per-axis [`Dim`]s. Every element offset in this
//! crate is computed by [`Shape::flat_index`]:
//!
//! ```text
//! flat_index(indices) = Σ (indices[d] - min[d]) * stride[d]
//! ```
//!
//! Strides are in units of elements and may be negative, zero or overlapping.

/// One axis of a [`Shape`]: the first valid index, the number of valid
/// indices and the distance in elements between neighbouring indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dim {
    min: i64,
    extent: i64,
    stride: i64,
}

impl Dim {
    /// Creates a new axis descriptor.
    pub const fn new(min: i64, extent: i64, stride: i64) -> Self {
        Self { min, extent, stride }
    }

    /// First valid index.
    pub const fn min(&self) -> i64 {
        self.min
    }

    /// Number of valid indices.
    pub const fn extent(&self) -> i64 {
        self.extent
    }

    /// Elements to advance in memory per index step.
    pub const fn stride(&self) -> i64 {
        self.stride
    }

    /// Last valid index. Less than `min()` when the extent is 0.
    pub const fn max(&self) -> i64 {
        self.min + self.extent - 1
    }

    /// Returns `true` if `index` lies in `min()..=max()`.
    pub const fn contains(&self, index: i64) -> bool {
        index >= self.min && index <= self.max()
    }

    /// Sets the first valid index.
    pub fn set_min(&mut self, min: i64) {
        self.min = min;
    }

    /// Sets the number of valid indices.
    pub fn set_extent(&mut self, extent: i64) {
        self.extent = extent;
    }

    /// Sets the stride.
    pub fn set_stride(&mut self, stride: i64) {
        self.stride = stride;
    }
}

/// The shape of an N-dimensional array.
///
/// The empty axis list is a scalar; see [`Shape::scalar`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<Dim>,
}

impl Shape {
    /// Creates a shape with a planar layout: every `min` is 0, axis 0 has
    /// stride 1 and each following stride is the product of all previous
    /// extents, saturating at `i64::MAX`. Strides of an empty shape never
    /// address an element.
    ///
    /// ```
    /// use npy_array::Shape;
    ///
    /// let shape = Shape::new(&[7, 5, 3]);
    /// assert_eq!(shape.strides(), vec![1, 7, 35]);
    /// assert_eq!(shape.num_elements(), 105);
    /// ```
    pub fn new(extents: &[i64]) -> Self {
        debug_assert!(
            extents.iter().all(|&e| e >= 0),
            "negative extent in {extents:?}"
        );
        let mut stride = 1;
        let dims = extents
            .iter()
            .map(|&extent| {
                let dim = Dim::new(0, extent, stride);
                stride = stride.saturating_mul(extent);
                dim
            })
            .collect();
        Self { dims }
    }

    /// A rank-0 shape. It has exactly one element.
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Creates a shape from explicit per-axis mins, extents and strides.
    ///
    /// The triples are taken as given: nothing checks that they describe
    /// disjoint or in-bounds memory.
    ///
    /// # Panics
    ///
    /// Panics if the three slices differ in length.
    pub fn from_parts(mins: &[i64], extents: &[i64], strides: &[i64]) -> Self {
        assert_eq!(mins.len(), extents.len(), "mins and extents differ in rank");
        assert_eq!(strides.len(), extents.len(), "strides and extents differ in rank");
        let dims = mins
            .iter()
            .zip(extents)
            .zip(strides)
            .map(|((&min, &extent), &stride)| Dim::new(min, extent, stride))
            .collect();
        Self { dims }
    }

    /// Creates a shape from a list of axis descriptors, taken as given.
    pub fn from_dims(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    /// All axes.
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// All axes, mutably.
    pub fn dims_mut(&mut self) -> &mut [Dim] {
        &mut self.dims
    }

    /// Axis `d`.
    pub fn dim(&self, d: usize) -> &Dim {
        &self.dims[d]
    }

    /// Axis `d`, mutably.
    pub fn dim_mut(&mut self, d: usize) -> &mut Dim {
        &mut self.dims[d]
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Product of all extents, saturating at `i64::MAX`. A rank-0 shape has
    /// 1 element and any zero extent gives 0.
    pub fn num_elements(&self) -> i64 {
        if self.dims.iter().any(|dim| dim.extent == 0) {
            return 0;
        }
        self.dims.iter().fold(1i64, |n, dim| n.saturating_mul(dim.extent))
    }

    /// Returns `true` if the shape has no elements. A rank-0 shape is never
    /// empty.
    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    /// First valid index of axis `d`.
    pub fn min(&self, d: usize) -> i64 {
        self.dims[d].min
    }

    /// Extent of axis `d`.
    pub fn extent(&self, d: usize) -> i64 {
        self.dims[d].extent
    }

    /// Stride of axis `d`.
    pub fn stride(&self, d: usize) -> i64 {
        self.dims[d].stride
    }

    /// Mins of all axes.
    pub fn mins(&self) -> Vec<i64> {
        self.dims.iter().map(Dim::min).collect()
    }

    /// Extents of all axes.
    pub fn extents(&self) -> Vec<i64> {
        self.dims.iter().map(Dim::extent).collect()
    }

    /// Strides of all axes.
    pub fn strides(&self) -> Vec<i64> {
        self.dims.iter().map(Dim::stride).collect()
    }

    /// Returns `true` if the shape is exactly what [`Shape::new`] would build
    /// from its extents.
    pub fn is_planar(&self) -> bool {
        let mut expected = 1;
        for dim in &self.dims {
            if dim.min != 0 || dim.stride != expected {
                return false;
            }
            expected = expected.saturating_mul(dim.extent);
        }
        true
    }

    /// Returns the offset in elements of `indices` in linear memory.
    ///
    /// For a scalar, `indices` is `[]` and the result is 0.
    ///
    /// # Panics
    ///
    /// Panics if `indices.len() != self.rank()`.
    pub fn flat_index(&self, indices: &[i64]) -> i64 {
        assert_eq!(
            indices.len(),
            self.rank(),
            "expected {} indices, got {}",
            self.rank(),
            indices.len()
        );
        self.dims
            .iter()
            .zip(indices)
            .map(|(dim, &i)| (i - dim.min) * dim.stride)
            .sum()
    }

    /// Iterates over every valid multi-index, axis 0 varying fastest.
    pub fn indices(&self) -> Indices {
        Indices::new(self)
    }

    // Named axes. Like `dim`, these panic if the axis does not exist.

    /// Extent of axis 0.
    pub fn width(&self) -> i64 {
        self.extent(0)
    }

    /// Extent of axis 1.
    pub fn height(&self) -> i64 {
        self.extent(1)
    }

    /// Extent of axis 2.
    pub fn channels(&self) -> i64 {
        self.extent(2)
    }

    /// Extent of axis 2.
    pub fn depth(&self) -> i64 {
        self.extent(2)
    }

    /// Extent of axis 0.
    pub fn rows(&self) -> i64 {
        self.extent(0)
    }

    /// Extent of axis 1.
    pub fn cols(&self) -> i64 {
        self.extent(1)
    }

    /// Extent of axis 2.
    pub fn slices(&self) -> i64 {
        self.extent(2)
    }

    /// Axis 0.
    pub fn x(&self) -> &Dim {
        &self.dims[0]
    }

    /// Axis 1.
    pub fn y(&self) -> &Dim {
        &self.dims[1]
    }

    /// Axis 2.
    pub fn z(&self) -> &Dim {
        &self.dims[2]
    }

    /// Axis 2, as a channel axis.
    pub fn c(&self) -> &Dim {
        &self.dims[2]
    }

    /// Axis 3.
    pub fn w(&self) -> &Dim {
        &self.dims[3]
    }

    /// Axis 0.
    pub fn i(&self) -> &Dim {
        &self.dims[0]
    }

    /// Axis 1.
    pub fn j(&self) -> &Dim {
        &self.dims[1]
    }

    /// Axis 2.
    pub fn k(&self) -> &Dim {
        &self.dims[2]
    }
}

impl From<Vec<Dim>> for Shape {
    fn from(dims: Vec<Dim>) -> Self {
        Self::from_dims(dims)
    }
}

/// Iterator over the multi-indices of a [`Shape`], created by
/// [`Shape::indices`].
#[derive(Clone, Debug)]
pub struct Indices {
    dims: Vec<Dim>,
    next: Option<Vec<i64>>,
}

impl Indices {
    fn new(shape: &Shape) -> Self {
        let next = if shape.dims.iter().any(|dim| dim.extent <= 0) {
            None
        } else {
            Some(shape.mins())
        };
        Self { dims: shape.dims.clone(), next }
    }
}

impl Iterator for Indices {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Vec<i64>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for (index, dim) in following.iter_mut().zip(&self.dims) {
            if *index < dim.max() {
                *index += 1;
                self.next = Some(following);
                return Some(current);
            }
            *index = dim.min;
        }
        // Every axis wrapped (or rank 0): that was the last index.
        Some(current)
    }
}
