#![doc = include_str!("../README.md")]
//! ## Types
//!
//! - [`ScalarType`]: the runtime element tag, and [`Element`] for the native
//!   types it stands for
//! - [`Shape`]: per-axis min, extent and stride
//! - [`ArrayView`] / [`ArrayViewMut`]: borrowed, runtime-typed views
//! - [`Array`]: an owned, planar, runtime-typed array
//!
//! ## Operate .npy Files
//!
//! - Decoding: [`NpyDecoder`] (with an [`AxisOrderPolicy`]) and
//!   [`decode_npy`]
//! - Reading: [`ReadNpyExt`] extension trait and [`read_npy`]
//! - Viewing (primarily for use with memory-mapped files): [`ViewNpyExt`] and
//!   [`ViewMutNpyExt`]
//! - Writing: [`WriteNpyExt`] extension trait and [`write_npy`]
//!
//! ## Operate .npz Files
//!
//! - Reading: [`NpzReader`]
//!
//! ## Limitations
//!
//! - Only the twelve [`ScalarType`]s are supported. Structured, complex,
//!   boolean, string and object dtypes are rejected, as are big-endian
//!   payloads.
//! - Parsing of `.npy` files is limited to files where the `descr` field of
//!   the [header dictionary] is a Python string literal.
//!
//! [header dictionary]: https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html#format-version-1-0
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]

mod array;
mod npy;
mod npz;
mod scalar_type;
mod shape;

#[cfg(feature = "nalgebra")]
mod impl_nalgebra;
#[cfg(feature = "ndarray")]
mod impl_ndarray;

pub use crate::{
    array::{Array, ArrayView, ArrayViewMut},
    npy::{
        decode_npy, read_npy, write_npy, AxisOrderPolicy, DecodeNpyError, FormatHeaderError,
        NpyDecoder, ParseHeaderError, ReadNpyError, ReadNpyExt, ViewMutNpyExt, ViewNpyExt,
        WriteNpyError, WriteNpyExt,
    },
    npz::{NpzReader, ReadNpzError},
    scalar_type::{scalar_type_for, Element, ScalarType},
    shape::{Dim, Indices, Shape},
};
pub use half::f16;
