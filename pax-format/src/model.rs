//! The in-memory PAX model.

use bytes::Bytes;
use paste::paste;
use pax_dtype::{MetaKind, NativePaxType, PaxType};
use pax_error::{pax_bail, pax_err, PaxResult};
use pax_scalar::{MetaArray, MetaValue};

use crate::header::Header;
use crate::raster::Raster;
use crate::store::{MetaEntry, MetadataStore};
use crate::{MetaLocation, DEFAULT_VERSION};

/// One decoded (or to-be-encoded) PAX stream: its type, version, raster,
/// and metadata.
///
/// A model uniquely owns everything inside it; dropping the model
/// releases the raster payload, every metadata payload, and the name
/// strings. Nothing in here is lazily populated, so sharing an immutable
/// model between threads is sound.
#[derive(Debug, Clone)]
pub struct PaxModel {
    version: f32,
    raster: Raster,
    meta: MetadataStore,
    consumed: usize,
}

impl PaxModel {
    /// Build a model from scratch. A missing source buffer allocates a
    /// zeroed raster of the right length; a supplied one must match the
    /// shape exactly.
    pub fn new(ptype: PaxType, dims: &[u32], source: Option<&[u8]>) -> PaxResult<Self> {
        if ptype == PaxType::Invalid {
            pax_bail!(UnknownType: "cannot build a model of {}", ptype);
        }
        if dims.len() > MetaArray::MAX_DIMS {
            pax_bail!(
                InvalidShape: "the header carries at most {} dimensions, {} given",
                MetaArray::MAX_DIMS,
                dims.len()
            );
        }
        Ok(Self {
            version: DEFAULT_VERSION,
            raster: Raster::new(ptype, dims, source)?,
            meta: MetadataStore::new(),
            consumed: 0,
        })
    }

    pub(crate) fn from_decode(header: Header, data: Bytes, consumed: usize) -> Self {
        Self {
            version: header.version,
            raster: Raster::from_parts(header.ptype, header.dims, data),
            meta: header.meta,
            consumed,
        }
    }

    pub(crate) fn from_preview(header: Header, consumed: usize) -> Self {
        Self {
            version: header.version,
            raster: Raster::headerless(header.ptype, header.dims),
            meta: header.meta,
            consumed,
        }
    }

    #[inline]
    pub fn ptype(&self) -> PaxType {
        self.raster.ptype()
    }

    #[inline]
    pub fn version(&self) -> f32 {
        self.version
    }

    pub fn set_version(&mut self, version: f32) {
        self.version = version;
    }

    #[inline]
    pub fn dims(&self) -> &[u32] {
        self.raster.dims()
    }

    /// The payload length the header declares.
    pub fn datalen(&self) -> usize {
        self.raster.datalen()
    }

    #[inline]
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    #[inline]
    pub fn meta(&self) -> &MetadataStore {
        &self.meta
    }

    #[inline]
    pub fn meta_mut(&mut self) -> &mut MetadataStore {
        &mut self.meta
    }

    /// How many input bytes the decode of this model consumed. Zero for
    /// models built in memory.
    pub fn consumed_len(&self) -> usize {
        self.consumed
    }

    /// Switch the region subsequent metadata additions land in.
    pub fn set_meta_location(&mut self, location: MetaLocation) {
        self.meta.set_location(location);
    }

    /// Add or overwrite named metadata at the current location.
    pub fn add_meta(&mut self, name: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.add(name, value.into());
    }

    /// Add or overwrite named metadata at an explicit location.
    pub fn add_meta_at(
        &mut self,
        location: MetaLocation,
        name: impl Into<String>,
        value: impl Into<MetaValue>,
    ) {
        self.meta.add_at(location, name, value.into());
    }

    /// Add a comment at the current location.
    pub fn add_comment(&mut self, text: impl AsRef<[u8]>) {
        self.meta.add_comment(text);
    }

    /// Add a comment at an explicit location.
    pub fn add_comment_at(&mut self, location: MetaLocation, text: impl AsRef<[u8]>) {
        self.meta.add_comment_at(location, text);
    }

    fn entry(&self, name: &str) -> PaxResult<&MetaEntry> {
        self.meta
            .get(name)
            .ok_or_else(|| pax_err!(UnknownMetadata: "no metadata named '{}'", name))
    }

    /// The declared kind of a metadata entry.
    pub fn get_meta_kind(&self, name: &str) -> PaxResult<MetaKind> {
        Ok(self.entry(name)?.value().kind())
    }

    /// A string or comment entry's text, lossily converted to UTF-8.
    pub fn get_meta_string(&self, name: &str) -> PaxResult<String> {
        match self.entry(name)?.value() {
            MetaValue::String(text) | MetaValue::Comment(text) => {
                Ok(text.to_string_lossy().into_owned())
            }
            other => Err(pax_err!(
                TypeMismatch: "cannot read {} metadata '{}' as a string",
                other.kind(),
                name
            )),
        }
    }

    /// Read the raster element at `(x, y)`; see [`Raster::value_xy`].
    pub fn raster_value_xy<T: NativePaxType>(&self, x: u32, y: u32) -> Option<T> {
        self.raster.value_xy(x, y)
    }

    /// Read the raster element at `(row, column)`.
    pub fn raster_value_rc<T: NativePaxType>(&self, row: u32, column: u32) -> Option<T> {
        self.raster.value_rc(row, column)
    }
}

macro_rules! typed_meta_getters {
    ($(($fn:ident, $T:ty)),* $(,)?) => {
        impl PaxModel {
            paste! { $(
                #[doc = "Read scalar `" $fn "` metadata by name."]
                pub fn [<get_meta_ $fn>](&self, name: &str) -> PaxResult<$T> {
                    match self.entry(name)?.value() {
                        MetaValue::Scalar(value) => value.[<as_ $fn>](),
                        MetaValue::Array(_) => Err(pax_err!(
                            IndexOutOfRange: "metadata '{}' is an array; indices are required",
                            name
                        )),
                        other => Err(pax_err!(
                            TypeMismatch: "cannot read {} metadata '{}' as {}",
                            other.kind(),
                            name,
                            stringify!($fn)
                        )),
                    }
                }

                #[doc = "Read one element of `" $fn "` array metadata by name and indices."]
                pub fn [<get_meta_ $fn _at>](&self, name: &str, indices: &[u32]) -> PaxResult<$T> {
                    match self.entry(name)?.value() {
                        MetaValue::Array(array) => {
                            if indices.len() != array.dims().len() {
                                pax_bail!(
                                    IndexOutOfRange: "metadata '{}' has {} dimensions, {} indices given",
                                    name,
                                    array.dims().len(),
                                    indices.len()
                                );
                            }
                            array.value::<$T>(indices)
                        }
                        MetaValue::Scalar(_) => Err(pax_err!(
                            IndexOutOfRange: "metadata '{}' is scalar; no indices apply",
                            name
                        )),
                        other => Err(pax_err!(
                            TypeMismatch: "cannot read {} metadata '{}' as {}",
                            other.kind(),
                            name,
                            stringify!($fn)
                        )),
                    }
                }
            )* }
        }
    };
}

typed_meta_getters!(
    (float, f32),
    (double, f64),
    (int64, i64),
    (uint64, u64),
    (int32, i32),
    (uint32, u32),
    (int16, i16),
    (uint16, u16),
    (int8, i8),
    (uint8, u8),
);

#[cfg(test)]
mod tests {
    use pax_error::PaxError;

    use super::*;

    #[test]
    fn typed_getters_are_strict() {
        let mut model = PaxModel::new(PaxType::MetaOnly, &[], None).unwrap();
        model.add_meta("pi", 3.1416f32);
        assert!((model.get_meta_float("pi").unwrap() - 3.1416).abs() < 1e-6);
        assert!(matches!(
            model.get_meta_double("pi"),
            Err(PaxError::TypeMismatch(_))
        ));

        model.add_meta("pi", 3.141592653589793f64);
        assert_eq!(model.get_meta_double("pi").unwrap(), 3.141592653589793);
        assert!(matches!(
            model.get_meta_float("pi"),
            Err(PaxError::TypeMismatch(_))
        ));
    }

    #[test]
    fn missing_names_are_reported() {
        let model = PaxModel::new(PaxType::MetaOnly, &[], None).unwrap();
        assert!(matches!(
            model.get_meta_int32("absent"),
            Err(PaxError::UnknownMetadata(_))
        ));
        assert!(matches!(
            model.get_meta_kind("absent"),
            Err(PaxError::UnknownMetadata(_))
        ));
    }

    #[test]
    fn array_access_requires_full_arity() {
        let mut model = PaxModel::new(PaxType::MetaOnly, &[], None).unwrap();
        model.add_meta(
            "grid",
            MetaValue::array::<i32>(vec![2, 3], &[1, 2, 3, 4, 5, 6]).unwrap(),
        );
        assert_eq!(model.get_meta_int32_at("grid", &[1, 2]).unwrap(), 6);
        assert!(matches!(
            model.get_meta_int32_at("grid", &[1]),
            Err(PaxError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            model.get_meta_int32("grid"),
            Err(PaxError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            model.get_meta_float_at("grid", &[0, 0]),
            Err(PaxError::TypeMismatch(_))
        ));
    }

    #[test]
    fn strings_and_comments_read_back() {
        let mut model = PaxModel::new(PaxType::MetaOnly, &[], None).unwrap();
        model.add_meta("motto", "Four score and seven years ago...");
        model.add_comment("a remark");
        assert_eq!(
            model.get_meta_string("motto").unwrap(),
            "Four score and seven years ago..."
        );
        assert_eq!(model.get_meta_string(";4;1").unwrap(), "a remark");
        assert!(matches!(
            model.get_meta_string("absent"),
            Err(PaxError::UnknownMetadata(_))
        ));
    }

    #[test]
    fn invalid_type_is_rejected() {
        assert!(matches!(
            PaxModel::new(PaxType::Invalid, &[2], None),
            Err(PaxError::UnknownType(_))
        ));
    }
}
