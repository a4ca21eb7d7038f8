//! Strongly-typed metadata values for the PAX container format.
//!
//! A [`MetaValue`] is the in-memory form of one header metadata entry:
//! a comment, a string, a scalar number, or an N-dimensional numeric
//! array. The numeric payloads are tagged with their declared
//! [`MetaKind`] and accessed strictly; there is no implicit conversion
//! between kinds.

mod array;
mod mvalue;
mod text;

pub use array::*;
pub use mvalue::*;
use pax_dtype::{MetaKind, NativeMetaKind};
use pax_error::PaxResult;
pub use text::*;

/// One metadata payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// An unnamed `#` comment line.
    Comment(MetaText),
    /// A `## [string]` entry.
    String(MetaText),
    /// A single numeric value.
    Scalar(MValue),
    /// A dimensioned numeric array.
    Array(MetaArray),
}

impl MetaValue {
    pub fn comment(text: impl AsRef<[u8]>, stripped: bool) -> Self {
        Self::Comment(MetaText::new(text, stripped))
    }

    pub fn string(text: impl AsRef<[u8]>, stripped: bool) -> Self {
        Self::String(MetaText::new(text, stripped))
    }

    pub fn scalar(value: impl Into<MValue>) -> Self {
        Self::Scalar(value.into())
    }

    /// Build an array value. A declaration holding one element or fewer
    /// collapses to a scalar, which is also how such entries serialize.
    pub fn array<T: NativeMetaKind + Into<MValue>>(
        dims: Vec<u32>,
        values: &[T],
    ) -> PaxResult<Self> {
        let count: usize = dims.iter().map(|&d| d as usize).product();
        if count <= 1 && values.len() == 1 {
            return Ok(Self::Scalar(values[0].into()));
        }
        Ok(Self::Array(MetaArray::from_values(dims, values)?))
    }

    /// The declared kind of this entry.
    pub fn kind(&self) -> MetaKind {
        match self {
            Self::Comment(_) => MetaKind::Comment,
            Self::String(_) => MetaKind::String,
            Self::Scalar(v) => v.kind(),
            Self::Array(a) => a.kind(),
        }
    }

    /// Number of elements held: 1 for scalars and text.
    pub fn count(&self) -> usize {
        match self {
            Self::Array(a) => a.count(),
            _ => 1,
        }
    }

    /// Payload size in bytes.
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Comment(t) | Self::String(t) => t.len(),
            Self::Scalar(v) => v.kind().byte_size(),
            Self::Array(a) => a.byte_size(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn as_text(&self) -> Option<&MetaText> {
        match self {
            Self::Comment(t) | Self::String(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&MValue> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&MetaArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<MValue> for MetaValue {
    fn from(value: MValue) -> Self {
        Self::Scalar(value)
    }
}

macro_rules! meta_value_from {
    ($T:ty) => {
        impl From<$T> for MetaValue {
            fn from(value: $T) -> Self {
                Self::Scalar(MValue::from(value))
            }
        }
    };
}

meta_value_from!(f32);
meta_value_from!(f64);
meta_value_from!(i64);
meta_value_from!(u64);
meta_value_from!(i32);
meta_value_from!(u32);
meta_value_from!(i16);
meta_value_from!(u16);
meta_value_from!(i8);
meta_value_from!(u8);

impl From<&str> for MetaValue {
    fn from(text: &str) -> Self {
        // Programmatic strings always restore a space after the delimiter.
        Self::string(text, true)
    }
}

impl From<String> for MetaValue {
    fn from(text: String) -> Self {
        Self::string(text, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_counts() {
        assert_eq!(MetaValue::from(1.5f64).kind(), MetaKind::Double);
        assert_eq!(MetaValue::from("hi").kind(), MetaKind::String);
        assert_eq!(MetaValue::comment("note", true).kind(), MetaKind::Comment);

        let arr = MetaValue::array::<i16>(vec![2, 3], &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(arr.kind(), MetaKind::Int16);
        assert_eq!(arr.count(), 6);
        assert_eq!(arr.byte_size(), 12);
    }

    #[test]
    fn degenerate_array_collapses_to_scalar() {
        let v = MetaValue::array::<u32>(vec![1], &[9]).unwrap();
        assert!(!v.is_array());
        assert_eq!(v.as_scalar().unwrap().as_uint32().unwrap(), 9);

        let v = MetaValue::array::<u32>(vec![1, 1], &[9]).unwrap();
        assert!(!v.is_array());
    }

    #[test]
    fn scalar_byte_size_follows_kind() {
        assert_eq!(MetaValue::from(1u8).byte_size(), 1);
        assert_eq!(MetaValue::from(1.0f32).byte_size(), 4);
        assert_eq!(MetaValue::string("abcd", false).byte_size(), 4);
    }
}
