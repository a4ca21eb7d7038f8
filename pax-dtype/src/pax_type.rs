//! The raster element type registry.

use std::fmt::{Debug, Display, Formatter};

use half::f16;
use num_traits::NumCast;
use pax_error::{pax_err, PaxResult};

/// How the scalar values inside one raster element are to be interpreted.
///
/// The value space determines the number of values per element: a complex
/// element carries two scalars, an RGB element three, and so on. `Bits`
/// is not directly unpacked but supports packed binary rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueSpace {
    Real,
    Imaginary,
    Complex,
    Polar,
    Real2,
    Imaginary2,
    Complex2,
    Polar2,
    Real3,
    Imaginary3,
    Complex3,
    Polar3,
    Real4,
    Imaginary4,
    Complex4,
    Polar4,
    Bits,
    Mag,
    Phase,
    MagPhase,
    Iq,
    Rgb,
    Hsv,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Undefined,
}

impl ValueSpace {
    /// The number of scalar values that make up one element.
    pub const fn values_per_element(self) -> usize {
        match self {
            Self::Real | Self::Imaginary | Self::Bits | Self::Mag | Self::Phase | Self::One => 1,
            Self::Complex
            | Self::Polar
            | Self::Real2
            | Self::Imaginary2
            | Self::MagPhase
            | Self::Iq
            | Self::Two => 2,
            Self::Real3 | Self::Imaginary3 | Self::Rgb | Self::Hsv | Self::Three => 3,
            Self::Complex2 | Self::Polar2 | Self::Real4 | Self::Imaginary4 | Self::Four => 4,
            Self::Five => 5,
            Self::Complex3 | Self::Polar3 | Self::Six => 6,
            Self::Complex4 | Self::Polar4 => 8,
            Self::Undefined => 0,
        }
    }
}

macro_rules! pax_types {
    ($( { $variant:ident, $name:literal, $code:literal, $bpv:literal, $vs:ident } ),* $(,)?) => {
        /// The closed registry of PAX raster element types.
        ///
        /// Each entry pins a stable wire code, a printable name, the
        /// number of bytes per scalar value, and a [`ValueSpace`] from
        /// which the values-per-element count derives. The code/name
        /// mapping is bijective.
        #[repr(i32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum PaxType {
            $($variant = $code,)*
        }

        impl PaxType {
            /// Every registered type, in wire-code order.
            pub const ALL: &'static [PaxType] = &[$(PaxType::$variant,)*];

            /// Look up a type by its wire code.
            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// The stable integer code written after the `PAX` tag.
            pub const fn code(self) -> i32 {
                self as i32
            }

            /// The printable name written on the type line.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Bytes per scalar value.
            pub const fn bpv(self) -> usize {
                match self {
                    $(Self::$variant => $bpv,)*
                }
            }

            /// The value space of one element.
            pub const fn value_space(self) -> ValueSpace {
                match self {
                    $(Self::$variant => ValueSpace::$vs,)*
                }
            }
        }
    };
}

// PAX type table: variant, printable name, wire code, bytes per value,
// value space. Codes 0-16 are the legacy SF composite types, 100-111 the
// primitive scalars, 199/200 the meta-only sentinel and float triple, and
// 1001-1006 the netpbm family.
pax_types! {
    { Invalid,              "PAX_INVALID",                 -1,  0, Undefined },
    { SfMagUchar,           "PAX_SF_MAG_UCHAR",             0,  1, Mag },
    { SfMagPhaseUshort,     "PAX_SF_MAG_PHASE_USHORT",      1,  2, MagPhase },
    { SfComplexUshort,      "PAX_SF_COMPLEX_USHORT",        2,  2, Complex },
    { SfComplexUint,        "PAX_SF_COMPLEX_UINT",          3,  4, Complex },
    { SfComplexUlong,       "PAX_SF_COMPLEX_ULONG",         4,  8, Complex },
    { SfMagChar,            "PAX_SF_MAG_CHAR",              5,  1, Mag },
    { SfMagPhaseShort,      "PAX_SF_MAG_PHASE_SHORT",       6,  2, MagPhase },
    { SfComplexShort,       "PAX_SF_COMPLEX_SHORT",         7,  2, Complex },
    { SfComplexInt,         "PAX_SF_COMPLEX_INT",           8,  4, Complex },
    { SfComplexLong,        "PAX_SF_COMPLEX_LONG",          9,  8, Complex },
    { SfComplexSingle,      "PAX_SF_COMPLEX_SINGLE",       10,  4, Complex },
    { SfComplexDouble,      "PAX_SF_COMPLEX_DOUBLE",       11,  8, Complex },
    { SfMagPhaseUchar,      "PAX_SF_MAG_PHASE_UCHAR",      12,  1, MagPhase },
    { SfMagPhaseChar,       "PAX_SF_MAG_PHASE_CHAR",       13,  1, MagPhase },
    { SfRgbUchar,           "PAX_SF_RGB_UCHAR",            14,  1, Rgb },
    { SfHsvUchar,           "PAX_SF_HSV_UCHAR",            15,  1, Hsv },
    { SfUndefinedPixelType, "PAX_SF_UNDEFINED_PIXEL_TYPE", 16,  0, Undefined },
    { Char,                 "PAX_CHAR",                   100,  1, One },
    { Uchar,                "PAX_UCHAR",                  101,  1, One },
    { Short,                "PAX_SHORT",                  102,  2, One },
    { Ushort,               "PAX_USHORT",                 103,  2, One },
    { Int,                  "PAX_INT",                    104,  4, One },
    { Uint,                 "PAX_UINT",                   105,  4, One },
    { Long,                 "PAX_LONG",                   106,  8, One },
    { Ulong,                "PAX_ULONG",                  107,  8, One },
    { Half,                 "PAX_HALF",                   108,  2, One },
    { Float,                "PAX_FLOAT",                  109,  4, One },
    { Double,               "PAX_DOUBLE",                 110,  8, One },
    { Quadruple,            "PAX_QUADRUPLE",              111, 16, One },
    { MetaOnly,             "PAX_META_ONLY",              199,  0, Undefined },
    { Float3,               "PAX_FLOAT3",                 200,  4, Real3 },
    { PbmAscii,             "PAX_PBM_ASCII",             1001,  1, Bits },
    { PgmAscii,             "PAX_PGM_ASCII",             1002,  1, Real },
    { PpmAscii,             "PAX_PPM_ASCII",             1003,  1, Rgb },
    { PbmBinary,            "PAX_PBM_BINARY",            1004,  1, Bits },
    { PgmBinary,            "PAX_PGM_BINARY",            1005,  1, Real },
    { PpmBinary,            "PAX_PPM_BINARY",            1006,  1, Rgb },
}

impl PaxType {
    /// Values per element, derived from the value space.
    pub const fn vpe(self) -> usize {
        self.value_space().values_per_element()
    }

    /// Bytes in one whole element.
    pub const fn element_size(self) -> usize {
        self.bpv() * self.vpe()
    }

    /// Whether this type carries raster data at all.
    pub const fn has_raster(self) -> bool {
        self.element_size() != 0
    }
}

impl Display for PaxType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A trait for native Rust scalar types that can be read out of a PAX
/// raster element.
///
/// The wire carries raster bytes verbatim; element values are interpreted
/// little-endian through this trait.
pub trait NativePaxType:
    Send + Sync + Copy + Debug + Display + PartialEq + Default + NumCast
{
    /// The little-endian encoding of `Self`, always `[u8; size_of::<Self>()]`.
    type Bytes: AsRef<[u8]>;

    /// This type's bytes in little-endian order.
    fn to_le_bytes(self) -> Self::Bytes;

    /// Decode a value from a little-endian byte slice.
    fn try_from_le_bytes(bytes: &[u8]) -> PaxResult<Self>;
}

macro_rules! native_pax_type {
    ($T:ty) => {
        impl NativePaxType for $T {
            type Bytes = [u8; std::mem::size_of::<$T>()];

            #[inline]
            fn to_le_bytes(self) -> Self::Bytes {
                <$T>::to_le_bytes(self)
            }

            fn try_from_le_bytes(bytes: &[u8]) -> PaxResult<Self> {
                let bytes: Self::Bytes = bytes.try_into().map_err(|_| {
                    pax_err!(
                        IndexOutOfRange: "expected {} bytes for {}, found {}",
                        std::mem::size_of::<$T>(),
                        std::any::type_name::<$T>(),
                        bytes.len()
                    )
                })?;
                Ok(<$T>::from_le_bytes(bytes))
            }
        }
    };
}

native_pax_type!(u8);
native_pax_type!(u16);
native_pax_type!(u32);
native_pax_type!(u64);
native_pax_type!(i8);
native_pax_type!(i16);
native_pax_type!(i32);
native_pax_type!(i64);
native_pax_type!(f16);
native_pax_type!(f32);
native_pax_type!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_name_bijective() {
        for &ptype in PaxType::ALL {
            assert_eq!(PaxType::from_code(ptype.code()), Some(ptype));
            let same_name = PaxType::ALL
                .iter()
                .filter(|t| t.name() == ptype.name())
                .count();
            assert_eq!(same_name, 1, "duplicate name {}", ptype.name());
        }
        assert_eq!(PaxType::from_code(42), None);
        assert_eq!(PaxType::from_code(112), None);
    }

    #[test]
    fn vpe_zero_only_for_rasterless_types() {
        for &ptype in PaxType::ALL {
            let rasterless = matches!(
                ptype,
                PaxType::Invalid | PaxType::MetaOnly | PaxType::SfUndefinedPixelType
            );
            assert_eq!(ptype.vpe() == 0, rasterless, "{}", ptype);
        }
    }

    #[test]
    fn bpv_values_are_legal() {
        for &ptype in PaxType::ALL {
            assert!(matches!(ptype.bpv(), 0 | 1 | 2 | 4 | 8 | 16), "{}", ptype);
        }
    }

    #[test]
    fn element_sizes() {
        assert_eq!(PaxType::Float.element_size(), 4);
        assert_eq!(PaxType::SfComplexSingle.element_size(), 8);
        assert_eq!(PaxType::Float3.element_size(), 12);
        assert_eq!(PaxType::SfRgbUchar.element_size(), 3);
        assert_eq!(PaxType::MetaOnly.element_size(), 0);
        assert!(!PaxType::MetaOnly.has_raster());
    }

    #[test]
    fn le_bytes_round_trip() {
        assert_eq!(u32::try_from_le_bytes(&42u32.to_le_bytes()).unwrap(), 42);
        assert_eq!(
            f32::try_from_le_bytes(&1.5f32.to_le_bytes()).unwrap(),
            1.5f32
        );
        assert_eq!(
            f16::try_from_le_bytes(&f16::from_f32(2.0).to_le_bytes()).unwrap(),
            f16::from_f32(2.0)
        );
        assert!(u32::try_from_le_bytes(&[1, 2]).is_err());
    }
}
