mod descr;
pub(crate) mod header;

pub use self::header::{FormatHeaderError, ParseHeaderError};
use self::{descr::TypeDescriptor, header::Header};
use crate::{Array, ArrayView, ArrayViewMut, ScalarType, Shape};
use std::{fs, io, path::Path};
use thiserror::Error;

/// How the `shape` tuple of a header maps to this crate's extents, where
/// axis 0 always varies fastest in memory.
///
/// A C-order (`fortran_order: False`) tuple lists the slowest axis first, so
/// [`ReverseUnlessFortran`](Self::ReverseUnlessFortran) gives extents that
/// describe the payload exactly. Data written by tools that already stored
/// extents in fastest-first order needs one of the other policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AxisOrderPolicy {
    /// Reverse the tuple when `fortran_order` is `False`.
    #[default]
    ReverseUnlessFortran,
    /// Reverse the tuple when `fortran_order` is `True`.
    ReverseIfFortran,
    /// Use the tuple as written.
    AsWritten,
}

impl AxisOrderPolicy {
    /// Turns the header's `shape` tuple into extents.
    pub fn extents(self, fortran_order: bool, mut shape: Vec<i64>) -> Vec<i64> {
        let reverse = match self {
            Self::ReverseUnlessFortran => !fortran_order,
            Self::ReverseIfFortran => fortran_order,
            Self::AsWritten => false,
        };
        if reverse {
            shape.reverse();
        }
        shape
    }
}

/// An error decoding `.npy` bytes. No array is produced when this is
/// returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeNpyError {
    /// The magic string, version or header dictionary is malformed.
    #[error("invalid npy header: {0}")]
    Header(#[from] ParseHeaderError),
    /// The `descr` is not one of the supported scalar types.
    #[error("unsupported dtype: {descr}")]
    UnsupportedDtype {
        /// The `descr` value as written.
        descr: String,
    },
    /// The payload is big-endian.
    #[error("big-endian dtype {descr} is not supported")]
    BigEndian {
        /// The `descr` value as written.
        descr: String,
    },
    /// The shape has a negative extent.
    #[error("invalid shape: extent {extent} of axis {axis} is negative")]
    NegativeExtent {
        /// Axis index, after applying the [`AxisOrderPolicy`].
        axis: usize,
        /// The offending extent.
        extent: i64,
    },
    /// Overflow while computing the length of the payload from the shape.
    #[error("overflow computing length from shape")]
    LengthOverflow,
    /// The buffer ends before the payload does.
    #[error("truncated npy data: expected at least {expected} bytes of data, got {available}")]
    Truncated {
        /// Payload size implied by the header.
        expected: usize,
        /// Bytes after the header.
        available: usize,
    },
}

/// An error reading a `.npy` file or stream.
#[derive(Debug, Error)]
pub enum ReadNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The bytes read are not a supported `.npy` file.
    #[error(transparent)]
    Decode(#[from] DecodeNpyError),
}

/// An error writing a `.npy` file.
#[derive(Debug, Error)]
pub enum WriteNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An error formatting the header.
    #[error("error formatting header: {0}")]
    FormatHeader(#[from] FormatHeaderError),
    /// [`ScalarType::Undefined`] has no `.npy` representation.
    #[error("cannot write an array of undefined scalar type")]
    UndefinedScalarType,
}

/// Where the payload of a validated `.npy` buffer lives and how to read it.
#[derive(Clone, Debug)]
struct Layout {
    scalar_type: ScalarType,
    extents: Vec<i64>,
    data_offset: usize,
    data_len: usize,
}

/// Decodes `.npy` bytes into arrays and views.
///
/// Decoding is a single pass over the buffer: magic and version, header
/// length, header dictionary, scalar type, extents, size validation. It either
/// produces a value or fails without side effects.
///
/// ```
/// use npy_array::{Array, NpyDecoder, ScalarType, WriteNpyExt};
///
/// let mut array = Array::new(ScalarType::Float32, &[3, 2]);
/// array.set(&[2, 1], 1.5f32);
/// let mut bytes = Vec::new();
/// array.write_npy(&mut bytes)?;
///
/// let decoded = NpyDecoder::new().decode(&bytes)?;
/// assert_eq!(decoded.shape().extents(), vec![3, 2]);
/// assert_eq!(decoded.at::<f32>(&[2, 1]), 1.5);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NpyDecoder {
    axis_order: AxisOrderPolicy,
}

impl NpyDecoder {
    /// A decoder using [`AxisOrderPolicy::ReverseUnlessFortran`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the axis-order policy.
    pub fn with_axis_order(mut self, axis_order: AxisOrderPolicy) -> Self {
        self.axis_order = axis_order;
        self
    }

    /// The axis-order policy in use.
    pub fn axis_order(&self) -> AxisOrderPolicy {
        self.axis_order
    }

    fn layout(&self, bytes: &[u8]) -> Result<Layout, DecodeNpyError> {
        let (header, data_offset) = Header::from_bytes(bytes)?;

        let descr = TypeDescriptor::parse(&header.descr);
        if descr.is_some_and(|descr| descr.is_big_endian()) {
            return Err(DecodeNpyError::BigEndian { descr: header.descr });
        }
        let scalar_type = descr.map_or(ScalarType::Undefined, |descr| descr.scalar_type());
        if !scalar_type.is_defined() {
            return Err(DecodeNpyError::UnsupportedDtype { descr: header.descr });
        }

        let extents = self.axis_order.extents(header.fortran_order, header.shape);
        if let Some((axis, &extent)) = extents.iter().enumerate().find(|(_, &e)| e < 0) {
            return Err(DecodeNpyError::NegativeExtent { axis, extent });
        }

        let data_len = if extents.contains(&0) {
            0
        } else {
            extents
                .iter()
                .try_fold(scalar_type.width_in_bytes(), |len, &extent| {
                    len.checked_mul(usize::try_from(extent).ok()?)
                })
                .filter(|&len| len <= isize::MAX as usize)
                .ok_or(DecodeNpyError::LengthOverflow)?
        };
        let available = bytes.len() - data_offset;
        if data_len > available {
            return Err(DecodeNpyError::Truncated { expected: data_len, available });
        }

        tracing::debug!(
            %scalar_type,
            ?extents,
            fortran_order = header.fortran_order,
            data_offset,
            "decoded npy header"
        );
        Ok(Layout { scalar_type, extents, data_offset, data_len })
    }

    /// Decodes `bytes` into an owned [`Array`], copying the payload.
    pub fn decode(&self, bytes: &[u8]) -> Result<Array, DecodeNpyError> {
        let layout = self.layout(bytes)?;
        let data = bytes[layout.data_offset..layout.data_offset + layout.data_len].to_vec();
        Array::from_bytes(layout.scalar_type, &layout.extents, data)
            .ok_or(DecodeNpyError::LengthOverflow)
    }

    /// Creates a view aliasing the payload inside `bytes`.
    pub fn view<'a>(&self, bytes: &'a [u8]) -> Result<ArrayView<'a>, DecodeNpyError> {
        let layout = self.layout(bytes)?;
        let data = &bytes[layout.data_offset..layout.data_offset + layout.data_len];
        Ok(ArrayView::new(data, layout.scalar_type, Shape::new(&layout.extents)))
    }

    /// Creates a mutable view aliasing the payload inside `bytes`. Writing
    /// through it modifies the `.npy` data in place.
    pub fn view_mut<'a>(&self, bytes: &'a mut [u8]) -> Result<ArrayViewMut<'a>, DecodeNpyError> {
        let layout = self.layout(bytes)?;
        let data = &mut bytes[layout.data_offset..layout.data_offset + layout.data_len];
        Ok(ArrayViewMut::new(data, layout.scalar_type, Shape::new(&layout.extents)))
    }
}

/// Decodes `.npy` bytes into an owned [`Array`] with the default
/// [`NpyDecoder`].
pub fn decode_npy(bytes: &[u8]) -> Result<Array, DecodeNpyError> {
    NpyDecoder::new().decode(bytes)
}

/// Read an `.npy` file located at the specified path.
///
/// # Example
///
/// ```no_run
/// use npy_array::read_npy;
/// # use npy_array::ReadNpyError;
///
/// let arr = read_npy("resources/array.npy")?;
/// println!("{:?} {:?}", arr.scalar_type(), arr.shape().extents());
/// # Ok::<_, ReadNpyError>(())
/// ```
pub fn read_npy<P: AsRef<Path>>(path: P) -> Result<Array, ReadNpyError> {
    Array::read_npy(fs::File::open(path)?)
}

/// Writes an array to an `.npy` file at the specified path.
///
/// This function will create the file if it does not exist, or overwrite it if
/// it does.
pub fn write_npy<P, T>(path: P, array: &T) -> Result<(), WriteNpyError>
where
    P: AsRef<Path>,
    T: WriteNpyExt + ?Sized,
{
    array.write_npy(io::BufWriter::new(fs::File::create(path)?))
}

/// Extension trait for reading an [`Array`] from a `.npy` stream.
pub trait ReadNpyExt: Sized {
    /// Reads `reader` to the end and decodes it.
    fn read_npy<R: io::Read>(reader: R) -> Result<Self, ReadNpyError>;
}

impl ReadNpyExt for Array {
    fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(decode_npy(&bytes)?)
    }
}

/// Extension trait for creating a view from a buffer containing an `.npy`
/// file.
///
/// The primary use-case for this is viewing a memory-mapped `.npy` file.
///
/// ```no_run
/// use memmap2::Mmap;
/// use npy_array::{ArrayView, ViewNpyExt};
/// use std::fs::File;
///
/// let file = File::open("resources/array.npy")?;
/// let mmap = unsafe { Mmap::map(&file)? };
/// let view = ArrayView::view_npy(&mmap)?;
/// println!("{view:?}");
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub trait ViewNpyExt<'a>: Sized {
    /// Creates a view from a buffer containing an `.npy` file.
    fn view_npy(buf: &'a [u8]) -> Result<Self, DecodeNpyError>;
}

impl<'a> ViewNpyExt<'a> for ArrayView<'a> {
    fn view_npy(buf: &'a [u8]) -> Result<Self, DecodeNpyError> {
        NpyDecoder::new().view(buf)
    }
}

/// Extension trait for creating a mutable view from a mutable buffer
/// containing an `.npy` file.
///
/// Modifying the elements in the view modifies the buffer. Modifying the
/// shape of the view does *not* modify the header.
pub trait ViewMutNpyExt<'a>: Sized {
    /// Creates a mutable view from a buffer containing an `.npy` file.
    fn view_mut_npy(buf: &'a mut [u8]) -> Result<Self, DecodeNpyError>;
}

impl<'a> ViewMutNpyExt<'a> for ArrayViewMut<'a> {
    fn view_mut_npy(buf: &'a mut [u8]) -> Result<Self, DecodeNpyError> {
        NpyDecoder::new().view_mut(buf)
    }
}

/// Extension trait for writing an array to `.npy` files.
///
/// Arrays are written in C order with the extents reversed, so the slowest
/// axis comes first in the header as numpy expects and the default
/// [`NpyDecoder`] reads back the same extents. The header is padded so the
/// payload starts at a multiple of 64 bytes.
pub trait WriteNpyExt {
    /// Writes the array to `writer` in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError>;
}

impl WriteNpyExt for ArrayView<'_> {
    fn write_npy<W: io::Write>(&self, mut writer: W) -> Result<(), WriteNpyError> {
        let descr = TypeDescriptor::for_scalar_type(self.scalar_type())
            .ok_or(WriteNpyError::UndefinedScalarType)?;
        let mut shape = self.shape().extents();
        shape.reverse();
        let header = Header { descr: descr.to_string(), fortran_order: false, shape };
        writer.write_all(&header.to_bytes()?)?;

        if self.shape().is_planar() && self.origin() == 0 {
            let len = self.total_size_bytes() as usize;
            writer.write_all(&self.as_bytes()[..len])?;
        } else {
            for indices in self.shape().indices() {
                writer.write_all(self.element_bytes(&indices))?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

impl WriteNpyExt for ArrayViewMut<'_> {
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError> {
        self.view().write_npy(writer)
    }
}

impl WriteNpyExt for Array {
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError> {
        self.view().write_npy(writer)
    }
}
