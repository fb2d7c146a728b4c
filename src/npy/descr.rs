//! The `descr` string of the header, e.g. `'<f4'` or `'|u1'`.

use crate::ScalarType;
use std::fmt;

/// The leading byte-order character of a type descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Endianness {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `=`, the writer's native order
    Native,
    /// `|`, byte order does not apply
    NotApplicable,
}

impl Endianness {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Little),
            '>' => Some(Self::Big),
            '=' => Some(Self::Native),
            '|' => Some(Self::NotApplicable),
            _ => None,
        }
    }

    const fn as_char(self) -> char {
        match self {
            Self::Little => '<',
            Self::Big => '>',
            Self::Native => '=',
            Self::NotApplicable => '|',
        }
    }
}

/// A simple (non-structured) numpy type descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TypeDescriptor {
    pub endianness: Endianness,
    pub kind: char,
    pub word_size: usize,
}

impl TypeDescriptor {
    /// Parses `[byte order] kind word_size`, e.g. `<f4`, `u2` or `|b1`.
    ///
    /// Returns `None` for anything that does not have that form (structured
    /// dtypes, unsized strings, datetimes with units, ...).
    pub fn parse(descr: &str) -> Option<Self> {
        let mut chars = descr.chars();
        let first = chars.next()?;
        let (endianness, kind) = match Endianness::from_char(first) {
            Some(endianness) => (endianness, chars.next()?),
            None => (Endianness::Native, first),
        };
        if !kind.is_ascii_alphabetic() {
            return None;
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let word_size = digits.parse().ok()?;
        Some(Self { endianness, kind, word_size })
    }

    /// The descriptor this crate writes for `scalar_type`: little-endian, or
    /// `|` for single-byte types. `None` for [`ScalarType::Undefined`].
    pub fn for_scalar_type(scalar_type: ScalarType) -> Option<Self> {
        let kind = scalar_type.kind()?;
        let word_size = scalar_type.width_in_bytes();
        let endianness = if word_size == 1 {
            Endianness::NotApplicable
        } else {
            Endianness::Little
        };
        Some(Self { endianness, kind, word_size })
    }

    pub fn scalar_type(&self) -> ScalarType {
        ScalarType::from_kind(self.kind, self.word_size)
    }

    /// Returns `true` if the payload bytes are big-endian. Single-byte types
    /// have no byte order.
    pub fn is_big_endian(&self) -> bool {
        let native_big = cfg!(target_endian = "big");
        self.word_size > 1
            && match self.endianness {
                Endianness::Big => true,
                Endianness::Native => native_big,
                Endianness::Little | Endianness::NotApplicable => false,
            }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.endianness.as_char(), self.kind, self.word_size)
    }
}
