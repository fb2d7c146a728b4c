//! Conversions between this crate's runtime-typed arrays and `ndarray`'s
//! statically-typed ones.
//!
//! Axes map one to one: index `[i, j]` of the `ndarray` value is index
//! `[min0 + i, min1 + j]` of the runtime-typed value. Per-axis extents and
//! strides are copied as they are, so no axis is reordered.

use crate::{scalar_type::Element, Array, ArrayView};
use ndarray::{ArrayBase, Data, Dimension, IntoDimension as _, IxDyn, ShapeBuilder as _};

impl<A, S, D> From<&ArrayBase<S, D>> for Array
where
    A: Element,
    S: Data<Elem = A>,
    D: Dimension,
{
    /// Copies an `ndarray` array into a new planar [`Array`].
    fn from(array: &ArrayBase<S, D>) -> Self {
        let extents: Vec<i64> = array.shape().iter().map(|&len| len as i64).collect();
        let mut out = Array::new(A::SCALAR_TYPE, &extents);
        let mut indices = vec![0; extents.len()];
        for (index, &value) in array.indexed_iter() {
            let index = index.into_dimension();
            for (dst, &src) in indices.iter_mut().zip(index.slice()) {
                *dst = src as i64;
            }
            out.set(&indices, value);
        }
        out
    }
}

impl<'a> ArrayView<'a> {
    /// Copies the elements into an owned `ndarray` array.
    ///
    /// Returns `None` if `A` does not match the scalar type or the rank does
    /// not fit `D`.
    pub fn to_ndarray<A, D>(&self) -> Option<ndarray::Array<A, D>>
    where
        A: Element,
        D: Dimension,
    {
        if A::SCALAR_TYPE != self.scalar_type() {
            return None;
        }
        let extents = self
            .shape()
            .extents()
            .into_iter()
            .map(|extent| usize::try_from(extent).ok())
            .collect::<Option<Vec<_>>>()?;
        // Planar order is column-major order.
        let data: Vec<A> = self.shape().indices().map(|index| self.at(&index)).collect();
        ndarray::Array::from_shape_vec(IxDyn(&extents).f(), data)
            .ok()?
            .into_dimensionality()
            .ok()
    }
}

impl Array {
    /// Copies the elements into an owned `ndarray` array. See
    /// [`ArrayView::to_ndarray`].
    pub fn to_ndarray<A, D>(&self) -> Option<ndarray::Array<A, D>>
    where
        A: Element,
        D: Dimension,
    {
        self.view().to_ndarray()
    }
}

#[cfg(target_endian = "little")]
mod zero_copy {
    use super::*;
    use crate::{Dim, Shape};
    use ndarray::ShapeBuilder as _;
    use std::{mem, slice};

    impl<'a, A, D> From<ndarray::ArrayView<'a, A, D>> for ArrayView<'a>
    where
        A: Element,
        D: Dimension,
    {
        /// Views the memory of an `ndarray` view without copying, keeping its
        /// strides (including negative ones).
        fn from(view: ndarray::ArrayView<'a, A, D>) -> Self {
            let width = mem::size_of::<A>();
            let dims: Vec<Dim> = view
                .shape()
                .iter()
                .zip(view.strides())
                .map(|(&len, &stride)| Dim::new(0, len as i64, stride as i64))
                .collect();
            if view.is_empty() {
                return ArrayView::new(&[], A::SCALAR_TYPE, Shape::from_dims(dims));
            }

            // Lowest and highest element offsets relative to `as_ptr()`.
            let (mut low, mut high) = (0isize, 0isize);
            for (&len, &stride) in view.shape().iter().zip(view.strides()) {
                let end = stride * (len as isize - 1);
                if end < 0 {
                    low += end;
                } else {
                    high += end;
                }
            }
            let len = (high - low + 1) as usize * width;
            // SAFETY: every element of `view` lies in `low..=high` elements
            // from `as_ptr()`, inside one allocation borrowed for `'a`, and the
            // element types have no padding or invalid bit patterns.
            let data = unsafe {
                slice::from_raw_parts(view.as_ptr().offset(low).cast::<u8>(), len)
            };
            ArrayView::with_origin(
                data,
                (-low) as usize * width,
                A::SCALAR_TYPE,
                Shape::from_dims(dims),
            )
        }
    }

    impl<'a> ArrayView<'a> {
        /// Views the same memory as an `ndarray` view without copying.
        ///
        /// Returns `None` if `A` does not match the scalar type, the rank
        /// does not fit `D`, any stride is negative, the first element is
        /// misaligned for `A`, or some element lies outside the buffer.
        pub fn as_ndarray<A, D>(&self) -> Option<ndarray::ArrayView<'a, A, D>>
        where
            A: Element,
            D: Dimension,
        {
            if A::SCALAR_TYPE != self.scalar_type() {
                return None;
            }
            if D::NDIM.is_some_and(|ndim| ndim != self.rank()) {
                return None;
            }
            let width = mem::size_of::<A>();
            let mut extents = Vec::with_capacity(self.rank());
            let mut strides = Vec::with_capacity(self.rank());
            let mut last = self.origin();
            for dim in self.shape().dims() {
                extents.push(usize::try_from(dim.extent()).ok()?);
                strides.push(usize::try_from(dim.stride()).ok()?);
                if dim.extent() > 0 {
                    let span = (dim.extent() as usize - 1).checked_mul(dim.stride() as usize)?;
                    last = last.checked_add(span.checked_mul(width)?)?;
                }
            }
            let data = self.as_bytes();
            let empty = extents.contains(&0);
            if !empty && last.checked_add(width)? > data.len() {
                return None;
            }
            let ptr = data.as_ptr().wrapping_add(self.origin()).cast::<A>();
            if ptr as usize % mem::align_of::<A>() != 0 {
                return None;
            }
            // SAFETY: type, alignment and bounds are checked above; strides
            // are non-negative and the bytes are borrowed for `'a`.
            let view = unsafe {
                ndarray::ArrayView::from_shape_ptr(IxDyn(&extents).strides(IxDyn(&strides)), ptr)
            };
            view.into_dimensionality().ok()
        }
    }
}
