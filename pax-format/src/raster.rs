//! The binary raster payload.

use bytes::Bytes;
use pax_dtype::{NativePaxType, PaxType};
use pax_error::{pax_bail, PaxResult};

/// The raster of one PAX stream: its element type, dimensions, and the
/// payload bytes.
///
/// The payload is carried verbatim; no byte swapping happens on encode or
/// decode. Element accessors interpret values as little-endian, the byte
/// order every known producer writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    ptype: PaxType,
    dims: Vec<u32>,
    data: Bytes,
}

impl Raster {
    /// Build a raster, allocating a zeroed payload or copying the given
    /// source bytes. One-dimensional shapes gain a trivial second
    /// dimension, matching the wire layout's two dimension tags.
    pub fn new(ptype: PaxType, dims: &[u32], source: Option<&[u8]>) -> PaxResult<Self> {
        let dims = Self::normalize_dims(dims);
        let datalen = Self::length_of(ptype, &dims);
        let data = match source {
            Some(bytes) => {
                if bytes.len() != datalen {
                    pax_bail!(
                        InvalidShape: "raster of {} needs {} bytes, {} supplied",
                        ptype,
                        datalen,
                        bytes.len()
                    );
                }
                Bytes::copy_from_slice(bytes)
            }
            None => Bytes::from(vec![0u8; datalen]),
        };
        Ok(Self { ptype, dims, data })
    }

    /// A raster whose shape is known but whose payload was not read,
    /// as produced by a header-only preview.
    pub(crate) fn headerless(ptype: PaxType, dims: Vec<u32>) -> Self {
        Self {
            ptype,
            dims,
            data: Bytes::new(),
        }
    }

    pub(crate) fn from_parts(ptype: PaxType, dims: Vec<u32>, data: Bytes) -> Self {
        Self { ptype, dims, data }
    }

    fn normalize_dims(dims: &[u32]) -> Vec<u32> {
        match dims.len() {
            0 => vec![0, 0],
            1 => vec![dims[0], 1],
            _ => dims.to_vec(),
        }
    }

    fn length_of(ptype: PaxType, dims: &[u32]) -> usize {
        let elements: usize = dims.iter().map(|&d| d as usize).product();
        elements * ptype.element_size()
    }

    #[inline]
    pub fn ptype(&self) -> PaxType {
        self.ptype
    }

    #[inline]
    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// The payload length the header declares for this shape.
    pub fn datalen(&self) -> usize {
        Self::length_of(self.ptype, &self.dims)
    }

    /// The payload bytes. Empty for previewed rasters.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Read the element at `(x, y)`, x being the fastest-moving
    /// (sequential) dimension. Returns `None` when the coordinates are
    /// out of range or `T` does not have this raster's element size.
    pub fn value_xy<T: NativePaxType>(&self, x: u32, y: u32) -> Option<T> {
        if std::mem::size_of::<T>() != self.ptype.element_size() {
            return None;
        }
        let (d0, d1) = (self.dims[0], self.dims.get(1).copied().unwrap_or(1));
        if x >= d0 || y >= d1 {
            return None;
        }
        let size = self.ptype.element_size();
        let offset = (x as usize + y as usize * d0 as usize) * size;
        let bytes = self.data.get(offset..offset + size)?;
        T::try_from_le_bytes(bytes).ok()
    }

    /// Read the element at `(row, column)`; axes swapped from
    /// [`Self::value_xy`].
    pub fn value_rc<T: NativePaxType>(&self, row: u32, column: u32) -> Option<T> {
        self.value_xy(column, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_raster() -> Raster {
        let values: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        Raster::new(PaxType::Float, &[2, 2], Some(&values)).unwrap()
    }

    #[test]
    fn typed_access() {
        let raster = float_raster();
        assert_eq!(raster.datalen(), 16);
        assert_eq!(raster.value_xy::<f32>(0, 0), Some(1.0));
        assert_eq!(raster.value_xy::<f32>(1, 0), Some(2.0));
        assert_eq!(raster.value_xy::<f32>(0, 1), Some(3.0));
        assert_eq!(raster.value_rc::<f32>(1, 1), Some(4.0));
    }

    #[test]
    fn wrong_size_type_reads_nothing() {
        let raster = float_raster();
        assert_eq!(raster.value_xy::<f64>(0, 0), None);
        assert_eq!(raster.value_xy::<u8>(0, 0), None);
        // Same width as the element is allowed, whatever the type.
        assert_eq!(raster.value_xy::<u32>(0, 0), Some(1.0f32.to_bits()));
    }

    #[test]
    fn out_of_range_reads_nothing() {
        let raster = float_raster();
        assert_eq!(raster.value_xy::<f32>(2, 0), None);
        assert_eq!(raster.value_xy::<f32>(0, 2), None);
    }

    #[test]
    fn one_dimensional_shapes_are_padded() {
        let raster = Raster::new(PaxType::Uchar, &[3], None).unwrap();
        assert_eq!(raster.dims(), &[3, 1]);
        assert_eq!(raster.datalen(), 3);
    }

    #[test]
    fn source_length_is_checked() {
        assert!(Raster::new(PaxType::Float, &[2, 2], Some(&[0u8; 15])).is_err());
    }

    #[test]
    fn meta_only_has_no_payload() {
        let raster = Raster::new(PaxType::MetaOnly, &[], None).unwrap();
        assert_eq!(raster.datalen(), 0);
        assert_eq!(raster.value_xy::<u8>(0, 0), None);
    }
}
