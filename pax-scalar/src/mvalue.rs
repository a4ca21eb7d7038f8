use std::fmt::{Display, Formatter};

use paste::paste;
use pax_dtype::MetaKind;
use pax_error::{pax_err, PaxResult};

/// A single numeric metadata value, tagged with its declared kind.
///
/// Accessors are strict: a value declared `double` on the wire can only
/// be read back as `f64`. There is no implicit widening and no bit
/// reinterpretation; anything else is a `TypeMismatch`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MValue {
    Float(f32),
    Double(f64),
    Int64(i64),
    Uint64(u64),
    Int32(i32),
    Uint32(u32),
    Int16(i16),
    Uint16(u16),
    Int8(i8),
    Uint8(u8),
}

macro_rules! strict_accessor {
    ($fn:ident, $T:ty, $variant:ident) => {
        paste! {
            #[doc = "Read this value as `" $T "`, failing unless it was declared `" $fn "`."]
            pub fn [<as_ $fn>](&self) -> PaxResult<$T> {
                match self {
                    Self::$variant(v) => Ok(*v),
                    other => Err(pax_err!(
                        TypeMismatch: "cannot read {} metadata as {}",
                        other.kind(),
                        MetaKind::$variant
                    )),
                }
            }
        }
    };
}

impl MValue {
    /// The kind this value was declared with.
    pub const fn kind(&self) -> MetaKind {
        match self {
            Self::Float(_) => MetaKind::Float,
            Self::Double(_) => MetaKind::Double,
            Self::Int64(_) => MetaKind::Int64,
            Self::Uint64(_) => MetaKind::Uint64,
            Self::Int32(_) => MetaKind::Int32,
            Self::Uint32(_) => MetaKind::Uint32,
            Self::Int16(_) => MetaKind::Int16,
            Self::Uint16(_) => MetaKind::Uint16,
            Self::Int8(_) => MetaKind::Int8,
            Self::Uint8(_) => MetaKind::Uint8,
        }
    }

    /// Append this value's little-endian encoding to a byte buffer.
    pub fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        match self {
            Self::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Uint64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Uint32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Uint16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Uint8(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    strict_accessor!(float, f32, Float);
    strict_accessor!(double, f64, Double);
    strict_accessor!(int64, i64, Int64);
    strict_accessor!(uint64, u64, Uint64);
    strict_accessor!(int32, i32, Int32);
    strict_accessor!(uint32, u32, Uint32);
    strict_accessor!(int16, i16, Int16);
    strict_accessor!(uint16, u16, Uint16);
    strict_accessor!(int8, i8, Int8);
    strict_accessor!(uint8, u8, Uint8);
}

macro_rules! impl_mvalue {
    ($T:ty, $variant:ident) => {
        impl From<$T> for MValue {
            fn from(value: $T) -> Self {
                MValue::$variant(value)
            }
        }
    };
}

impl_mvalue!(f32, Float);
impl_mvalue!(f64, Double);
impl_mvalue!(i64, Int64);
impl_mvalue!(u64, Uint64);
impl_mvalue!(i32, Int32);
impl_mvalue!(u32, Uint32);
impl_mvalue!(i16, Int16);
impl_mvalue!(u16, Uint16);
impl_mvalue!(i8, Int8);
impl_mvalue!(u8, Uint8);

impl Display for MValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Uint64(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Uint32(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::Uint16(v) => write!(f, "{}", v),
            Self::Int8(v) => write!(f, "{}", v),
            Self::Uint8(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use pax_error::PaxError;

    use super::*;

    #[test]
    fn strict_access() {
        let v = MValue::from(3.25f32);
        assert_eq!(v.kind(), MetaKind::Float);
        assert_eq!(v.as_float().unwrap(), 3.25);
        assert!(matches!(v.as_double(), Err(PaxError::TypeMismatch(_))));
        assert!(matches!(v.as_int32(), Err(PaxError::TypeMismatch(_))));
    }

    #[test]
    fn no_widening_between_integers() {
        let v = MValue::from(7u8);
        assert_eq!(v.as_uint8().unwrap(), 7);
        assert!(matches!(v.as_uint16(), Err(PaxError::TypeMismatch(_))));
        assert!(matches!(v.as_int8(), Err(PaxError::TypeMismatch(_))));
    }
}
