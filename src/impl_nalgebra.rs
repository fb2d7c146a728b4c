//! Conversions between rank-2 runtime-typed arrays and `nalgebra` matrices.
//!
//! Axis 0 is the row axis and axis 1 the column axis. `nalgebra` stores
//! matrices column-major, which is exactly the planar layout of an [`Array`].

use crate::{scalar_type::Element, Array, ArrayView};
use nalgebra::{DMatrix, Dim, Matrix, RawStorage, SMatrix, Scalar};

impl<T, R, C, S> From<&Matrix<T, R, C, S>> for Array
where
    T: Element + Scalar,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    /// Copies a matrix into a new `[nrows, ncols]` [`Array`].
    fn from(matrix: &Matrix<T, R, C, S>) -> Self {
        let (nrows, ncols) = matrix.shape();
        let mut out = Array::new(T::SCALAR_TYPE, &[nrows as i64, ncols as i64]);
        for j in 0..ncols {
            for i in 0..nrows {
                out.set(&[i as i64, j as i64], matrix[(i, j)]);
            }
        }
        out
    }
}

impl ArrayView<'_> {
    fn matrix_element<T: Element>(&self, i: usize, j: usize) -> T {
        let shape = self.shape();
        self.at(&[shape.min(0) + i as i64, shape.min(1) + j as i64])
    }

    fn matrix_extents<T: Element>(&self) -> Option<(usize, usize)> {
        if T::SCALAR_TYPE != self.scalar_type() || self.rank() != 2 {
            return None;
        }
        let shape = self.shape();
        Some((usize::try_from(shape.rows()).ok()?, usize::try_from(shape.cols()).ok()?))
    }

    /// Copies a rank-2 view into a dynamically sized matrix.
    ///
    /// Returns `None` if `T` does not match the scalar type or the rank is not 2.
    pub fn to_dmatrix<T: Element + Scalar>(&self) -> Option<DMatrix<T>> {
        let (nrows, ncols) = self.matrix_extents::<T>()?;
        Some(DMatrix::from_fn(nrows, ncols, |i, j| self.matrix_element(i, j)))
    }

    /// Copies a rank-2 view into a statically sized `R`×`C` matrix.
    ///
    /// Returns `None` if `T` does not match the scalar type, the rank is not 2,
    /// or the extents are not `[R, C]`.
    pub fn to_smatrix<T: Element + Scalar, const R: usize, const C: usize>(
        &self,
    ) -> Option<SMatrix<T, R, C>> {
        let extents = self.matrix_extents::<T>()?;
        if extents != (R, C) {
            return None;
        }
        Some(SMatrix::from_fn(|i, j| self.matrix_element(i, j)))
    }
}

impl Array {
    /// See [`ArrayView::to_dmatrix`].
    pub fn to_dmatrix<T: Element + Scalar>(&self) -> Option<DMatrix<T>> {
        self.view().to_dmatrix()
    }

    /// See [`ArrayView::to_smatrix`].
    pub fn to_smatrix<T: Element + Scalar, const R: usize, const C: usize>(
        &self,
    ) -> Option<SMatrix<T, R, C>> {
        self.view().to_smatrix()
    }
}
