use byteorder::{ByteOrder, LittleEndian};
use half::f16;
use std::fmt;

/// The runtime tag identifying which fixed-width numeric representation the
/// elements of an array use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Unknown or unsupported. Has a width of zero.
    #[default]
    Undefined,

    /// `i8`
    Int8,
    /// `i16`
    Int16,
    /// `i32`
    Int32,
    /// `i64`
    Int64,

    /// `u8`
    UInt8,
    /// `u16`
    UInt16,
    /// `u32`
    UInt32,
    /// `u64`
    UInt64,

    /// [`half::f16`]
    Float16,
    /// `f32`
    Float32,
    /// `f64`
    Float64,
}

impl ScalarType {
    /// Size of one element in bytes. [`ScalarType::Undefined`] is 0.
    pub const fn width_in_bytes(self) -> usize {
        match self {
            Self::Undefined => 0,
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Maps a numpy kind character (`'i'`, `'u'` or `'f'`) and a word size in
    /// bytes to a scalar type.
    ///
    /// Any other combination is [`ScalarType::Undefined`].
    pub const fn from_kind(kind: char, word_size: usize) -> Self {
        match (kind, word_size) {
            ('i', 1) => Self::Int8,
            ('i', 2) => Self::Int16,
            ('i', 4) => Self::Int32,
            ('i', 8) => Self::Int64,
            ('u', 1) => Self::UInt8,
            ('u', 2) => Self::UInt16,
            ('u', 4) => Self::UInt32,
            ('u', 8) => Self::UInt64,
            ('f', 2) => Self::Float16,
            ('f', 4) => Self::Float32,
            ('f', 8) => Self::Float64,
            _ => Self::Undefined,
        }
    }

    /// The numpy kind character, or `None` for [`ScalarType::Undefined`].
    pub const fn kind(self) -> Option<char> {
        match self {
            Self::Undefined => None,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => Some('i'),
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => Some('u'),
            Self::Float16 | Self::Float32 | Self::Float64 => Some('f'),
        }
    }

    /// Returns `true` for every variant except [`ScalarType::Undefined`].
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        };
        f.write_str(name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A native numeric type that can be stored in an [`Array`](crate::Array).
///
/// Implemented for `i8`..`i64`, `u8`..`u64`, [`f16`], `f32` and `f64`; the
/// set is closed. Elements are stored little-endian regardless of the host.
pub trait Element: Copy + sealed::Sealed + 'static {
    /// The runtime tag matching `Self`.
    const SCALAR_TYPE: ScalarType;

    /// Reads one element from the first `size_of::<Self>()` bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Writes `self` into the first `size_of::<Self>()` bytes of `bytes`.
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! impl_element {
    ($ty:ty, $scalar:ident, $read:ident, $write:ident) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const SCALAR_TYPE: ScalarType = ScalarType::$scalar;

            fn read_le(bytes: &[u8]) -> Self {
                LittleEndian::$read(bytes)
            }

            fn write_le(self, bytes: &mut [u8]) {
                LittleEndian::$write(bytes, self);
            }
        }
    };
}

impl_element!(i16, Int16, read_i16, write_i16);
impl_element!(i32, Int32, read_i32, write_i32);
impl_element!(i64, Int64, read_i64, write_i64);
impl_element!(u16, UInt16, read_u16, write_u16);
impl_element!(u32, UInt32, read_u32, write_u32);
impl_element!(u64, UInt64, read_u64, write_u64);
impl_element!(f32, Float32, read_f32, write_f32);
impl_element!(f64, Float64, read_f64, write_f64);

impl sealed::Sealed for i8 {}

impl Element for i8 {
    const SCALAR_TYPE: ScalarType = ScalarType::Int8;

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

impl sealed::Sealed for u8 {}

impl Element for u8 {
    const SCALAR_TYPE: ScalarType = ScalarType::UInt8;

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }
}

impl sealed::Sealed for f16 {}

impl Element for f16 {
    const SCALAR_TYPE: ScalarType = ScalarType::Float16;

    fn read_le(bytes: &[u8]) -> Self {
        f16::from_bits(LittleEndian::read_u16(bytes))
    }

    fn write_le(self, bytes: &mut [u8]) {
        LittleEndian::write_u16(bytes, self.to_bits());
    }
}

/// Returns the [`ScalarType`] for the native type `T`.
pub const fn scalar_type_for<T: Element>() -> ScalarType {
    T::SCALAR_TYPE
}
