//! The `.npy` preamble: magic string, version, `HEADER_LEN` and the Python
//! dictionary literal describing the payload.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::ToPrimitive;
use py_literal::{
    FormatError as PyValueFormatError, ParseError as PyValueParseError, Value as PyValue,
};
use std::str;
use thiserror::Error;

pub(crate) const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// The payload starts at a multiple of this many bytes.
pub(crate) const HEADER_DIVISOR: usize = 64;

/// An error parsing the header of a `.npy` file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseHeaderError {
    /// The buffer does not start with `\x93NUMPY`.
    #[error("start does not match magic string")]
    MagicString,
    /// The version is not 1.0, 2.0 or 3.0.
    #[error("unknown version number: {major}.{minor}")]
    Version {
        /// Major version number.
        major: u8,
        /// Minor version number.
        minor: u8,
    },
    /// `HEADER_LEN` does not fit in `usize`.
    #[error("HEADER_LEN {0} does not fit in `usize`")]
    HeaderLengthOverflow(u32),
    /// The buffer ends inside the header.
    #[error("header needs {needed} bytes but only {available} are available")]
    UnexpectedEnd {
        /// Bytes from the start of the buffer to the end of the header part
        /// being read.
        needed: usize,
        /// Bytes in the buffer.
        available: usize,
    },
    /// Version 1.0 and 2.0 headers must be ASCII.
    #[error("non-ASCII header text in a version 1.0 or 2.0 file")]
    NonAscii,
    /// Version 3.0 header text is not UTF-8.
    #[error("header text is not UTF-8: {0}")]
    Utf8Parse(#[from] str::Utf8Error),
    /// The dictionary has a key other than `descr`, `fortran_order` and
    /// `shape`.
    #[error("unknown key: {0}")]
    UnknownKey(PyValue),
    /// The dictionary lacks one of the three keys.
    #[error("missing key: {0}")]
    MissingKey(&'static str),
    /// A key has a value of the wrong form.
    #[error("illegal value for key {key}: {value}")]
    IllegalValue {
        /// The key.
        key: &'static str,
        /// The value found.
        value: PyValue,
    },
    /// The header text is not a Python literal.
    #[error("error parsing metadata dict: {0}")]
    DictParse(#[from] PyValueParseError),
    /// The header text is a Python literal but not a dictionary.
    #[error("metadata is not a dict: {0}")]
    MetaNotDict(PyValue),
}

/// An error formatting the header of a `.npy` file.
#[derive(Debug, Error)]
pub enum FormatHeaderError {
    /// The dictionary could not be written as a Python literal.
    #[error("error formatting Python value: {0}")]
    PyValue(#[from] PyValueFormatError),
    /// `HEADER_LEN` does not fit even in a version 2.0 header.
    #[error("the header is too long")]
    HeaderTooLong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Version {
    V1,
    V2,
    V3,
}

impl Version {
    fn parse(major: u8, minor: u8) -> Result<Self, ParseHeaderError> {
        match (major, minor) {
            (1, 0) => Ok(Self::V1),
            (2, 0) => Ok(Self::V2),
            (3, 0) => Ok(Self::V3),
            _ => Err(ParseHeaderError::Version { major, minor }),
        }
    }

    fn major(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Width of the little-endian `HEADER_LEN` field.
    fn len_width(self) -> usize {
        match self {
            Self::V1 => 2,
            Self::V2 | Self::V3 => 4,
        }
    }

    /// Bytes before the dictionary text.
    fn prefix_len(self) -> usize {
        MAGIC_STRING.len() + 2 + self.len_width()
    }
}

/// The three entries of the header dictionary.
///
/// `shape` is kept exactly as written (slowest axis first unless
/// `fortran_order`), including negative entries, which are rejected later with
/// a more specific error than a parse failure. A `descr` that is not a string
/// (a structured dtype) is kept as its Python literal text and later fails as
/// an unsupported dtype.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub descr: String,
    pub fortran_order: bool,
    pub shape: Vec<i64>,
}

/// Position in a buffer being parsed.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Splits off the next `len` bytes.
    fn take(&mut self, len: usize) -> Result<&'a [u8], ParseHeaderError> {
        let end = self.pos.saturating_add(len);
        let field = self.bytes.get(self.pos..end).ok_or(ParseHeaderError::UnexpectedEnd {
            needed: end,
            available: self.bytes.len(),
        })?;
        self.pos = end;
        Ok(field)
    }
}

fn shape_of(value: &PyValue) -> Option<Vec<i64>> {
    value.as_tuple()?.iter().map(|extent| extent.as_integer()?.to_i64()).collect()
}

impl Header {
    /// Parses the header at the start of `bytes`.
    ///
    /// Returns the header and the offset of the first payload byte.
    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), ParseHeaderError> {
        let mut cursor = Cursor { bytes, pos: 0 };
        if cursor.take(MAGIC_STRING.len())? != MAGIC_STRING {
            return Err(ParseHeaderError::MagicString);
        }
        let version = cursor.take(2)?;
        let version = Version::parse(version[0], version[1])?;
        let len_field = cursor.take(version.len_width())?;
        let header_len = match version {
            Version::V1 => usize::from(LittleEndian::read_u16(len_field)),
            Version::V2 | Version::V3 => {
                let len = LittleEndian::read_u32(len_field);
                usize::try_from(len).map_err(|_| ParseHeaderError::HeaderLengthOverflow(len))?
            }
        };
        let text = cursor.take(header_len)?;
        if version != Version::V3 && !text.is_ascii() {
            return Err(ParseHeaderError::NonAscii);
        }
        // Padding is spaces and a final newline; accept any surrounding
        // whitespace.
        let value: PyValue = str::from_utf8(text)?.trim().parse()?;
        Ok((Self::from_py_value(value)?, cursor.pos))
    }

    fn from_py_value(value: PyValue) -> Result<Self, ParseHeaderError> {
        let PyValue::Dict(entries) = value else {
            return Err(ParseHeaderError::MetaNotDict(value));
        };
        let (mut descr, mut fortran_order, mut shape) = (None, None, None);
        for (key, value) in entries {
            let key = match &key {
                PyValue::String(key) => key.as_str(),
                _ => return Err(ParseHeaderError::UnknownKey(key)),
            };
            match (key, value) {
                ("descr", PyValue::String(s)) => descr = Some(s),
                ("descr", value) => descr = Some(value.to_string()),
                ("fortran_order", PyValue::Boolean(b)) => fortran_order = Some(b),
                ("shape", value) => match shape_of(&value) {
                    Some(s) => shape = Some(s),
                    None => return Err(ParseHeaderError::IllegalValue { key: "shape", value }),
                },
                ("fortran_order", value) => {
                    return Err(ParseHeaderError::IllegalValue { key: "fortran_order", value })
                }
                (other, _) => {
                    return Err(ParseHeaderError::UnknownKey(PyValue::String(other.to_owned())))
                }
            }
        }
        Ok(Self {
            descr: descr.ok_or(ParseHeaderError::MissingKey("descr"))?,
            fortran_order: fortran_order.ok_or(ParseHeaderError::MissingKey("fortran_order"))?,
            shape: shape.ok_or(ParseHeaderError::MissingKey("shape"))?,
        })
    }

    fn to_py_value(&self) -> PyValue {
        let entry = |key: &str, value| (PyValue::String(key.to_owned()), value);
        PyValue::Dict(vec![
            entry("descr", PyValue::String(self.descr.clone())),
            entry("fortran_order", PyValue::Boolean(self.fortran_order)),
            entry(
                "shape",
                PyValue::Tuple(self.shape.iter().map(|&n| PyValue::Integer(n.into())).collect()),
            ),
        ])
    }

    /// Formats the whole preamble, padded with spaces and a newline to a
    /// multiple of [`HEADER_DIVISOR`]. Version 1.0 is used unless `HEADER_LEN`
    /// needs more than 16 bits.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, FormatHeaderError> {
        let mut text = Vec::new();
        self.to_py_value().write_ascii(&mut text)?;

        for version in [Version::V1, Version::V2] {
            let prefix_len = version.prefix_len();
            // Dictionary plus the final newline, rounded up.
            let Some(unpadded) = (prefix_len + 1).checked_add(text.len()) else {
                break;
            };
            let Some(total) = unpadded.checked_next_multiple_of(HEADER_DIVISOR) else {
                break;
            };
            let header_len = total - prefix_len;
            let mut len_field = vec![0; version.len_width()];
            match version {
                Version::V1 => match u16::try_from(header_len) {
                    Ok(len) => LittleEndian::write_u16(&mut len_field, len),
                    Err(_) => continue,
                },
                Version::V2 | Version::V3 => match u32::try_from(header_len) {
                    Ok(len) => LittleEndian::write_u32(&mut len_field, len),
                    Err(_) => continue,
                },
            }

            let mut out = Vec::with_capacity(total);
            out.extend_from_slice(MAGIC_STRING);
            out.extend_from_slice(&[version.major(), 0]);
            out.extend_from_slice(&len_field);
            out.extend_from_slice(&text);
            out.resize(total - 1, b' ');
            out.push(b'\n');
            return Ok(out);
        }
        Err(FormatHeaderError::HeaderTooLong)
    }
}
