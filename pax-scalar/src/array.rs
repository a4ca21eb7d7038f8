use pax_dtype::{MetaKind, NativeMetaKind, NativePaxType};
use pax_error::{pax_bail, pax_err, PaxResult};

/// An N-dimensional numeric metadata array.
///
/// Elements are stored flat in little-endian bytes, column-major: the
/// first named dimension is the fastest-moving one. The dimension list is
/// never empty; degenerate declarations collapse to scalars before an
/// array is built (see [`crate::MetaValue::array`]).
#[derive(Debug, Clone, PartialEq)]
pub struct MetaArray {
    kind: MetaKind,
    dims: Vec<u32>,
    bytes: Vec<u8>,
}

impl MetaArray {
    /// Dimension labels stop at "fourth"; deeper arrays are reserved.
    pub const MAX_DIMS: usize = 4;

    /// Build an array from raw little-endian element bytes.
    pub fn from_le_bytes(kind: MetaKind, dims: Vec<u32>, bytes: Vec<u8>) -> PaxResult<Self> {
        if !kind.is_numeric() {
            pax_bail!(TypeMismatch: "{} metadata cannot be dimensioned", kind);
        }
        if dims.len() > Self::MAX_DIMS {
            pax_bail!(
                IndexOutOfRange: "metadata arrays carry at most {} dimensions, {} declared",
                Self::MAX_DIMS,
                dims.len()
            );
        }
        let count: usize = dims.iter().map(|&d| d as usize).product();
        if bytes.len() != count * kind.byte_size() {
            pax_bail!(
                InvalidShape: "{} array of {} elements needs {} bytes, found {}",
                kind,
                count,
                count * kind.byte_size(),
                bytes.len()
            );
        }
        Ok(Self { kind, dims, bytes })
    }

    /// Build an array by encoding a slice of native values.
    pub fn from_values<T: NativeMetaKind>(dims: Vec<u32>, values: &[T]) -> PaxResult<Self> {
        if dims.len() > Self::MAX_DIMS {
            pax_bail!(
                IndexOutOfRange: "metadata arrays carry at most {} dimensions, {} declared",
                Self::MAX_DIMS,
                dims.len()
            );
        }
        let count: usize = dims.iter().map(|&d| d as usize).product();
        if values.len() != count {
            pax_bail!(
                InvalidShape: "dimensions {:?} hold {} elements, {} values supplied",
                dims,
                count,
                values.len()
            );
        }
        let mut bytes = Vec::with_capacity(count * T::KIND.byte_size());
        for value in values {
            bytes.extend_from_slice(value.to_le_bytes().as_ref());
        }
        Ok(Self {
            kind: T::KIND,
            dims,
            bytes,
        })
    }

    #[inline]
    pub fn kind(&self) -> MetaKind {
        self.kind
    }

    #[inline]
    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// Total number of elements.
    pub fn count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// Number of elements along one dimension.
    pub fn count_in(&self, dim: usize) -> PaxResult<usize> {
        self.dims
            .get(dim)
            .map(|&d| d as usize)
            .ok_or_else(|| pax_err!(IndexOutOfRange: "array has {} dimensions, not {}", self.dims.len(), dim + 1))
    }

    /// Total payload size in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_le_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Flatten multi-dimensional indices, first dimension fastest:
    /// `idx[0] + idx[1]*dims[0] + idx[2]*dims[0]*dims[1] + ...`
    pub fn flat_index(&self, indices: &[u32]) -> PaxResult<usize> {
        if indices.len() > self.dims.len() {
            pax_bail!(
                IndexOutOfRange: "{} indices into a {}-dimensional array",
                indices.len(),
                self.dims.len()
            );
        }
        let mut flat = 0usize;
        let mut stride = 1usize;
        for (i, (&index, &dim)) in indices.iter().zip(self.dims.iter()).enumerate() {
            if index >= dim {
                pax_bail!(
                    IndexOutOfRange: "index {} is {} but dimension holds {}",
                    i,
                    index,
                    dim
                );
            }
            flat += index as usize * stride;
            stride *= dim as usize;
        }
        Ok(flat)
    }

    /// Read the element at a flat position.
    pub fn value_at<T: NativeMetaKind>(&self, flat: usize) -> PaxResult<T> {
        if T::KIND != self.kind {
            pax_bail!(
                TypeMismatch: "cannot read {} array metadata as {}",
                self.kind,
                T::KIND
            );
        }
        let size = self.kind.byte_size();
        let bytes = self
            .bytes
            .get(flat * size..(flat + 1) * size)
            .ok_or_else(|| {
                pax_err!(IndexOutOfRange: "element {} of a {}-element array", flat, self.count())
            })?;
        T::try_from_le_bytes(bytes)
    }

    /// Read the element at multi-dimensional indices.
    pub fn value<T: NativeMetaKind>(&self, indices: &[u32]) -> PaxResult<T> {
        self.value_at(self.flat_index(indices)?)
    }
}

#[cfg(test)]
mod tests {
    use pax_error::PaxError;

    use super::*;

    #[test]
    fn flat_index_formula() {
        let a = MetaArray::from_values::<i32>(vec![3, 4, 5], &[0; 60]).unwrap();
        assert_eq!(a.flat_index(&[0, 0, 0]).unwrap(), 0);
        assert_eq!(a.flat_index(&[1, 0, 0]).unwrap(), 1);
        assert_eq!(a.flat_index(&[0, 1, 0]).unwrap(), 3);
        assert_eq!(a.flat_index(&[0, 0, 1]).unwrap(), 12);
        assert_eq!(a.flat_index(&[2, 3, 4]).unwrap(), 2 + 3 * 3 + 4 * 12);
        // Fewer indices than dimensions address the leading slice.
        assert_eq!(a.flat_index(&[2, 1]).unwrap(), 5);
    }

    #[test]
    fn flat_index_bounds() {
        let a = MetaArray::from_values::<i32>(vec![3, 4], &[0; 12]).unwrap();
        assert!(matches!(
            a.flat_index(&[3, 0]),
            Err(PaxError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            a.flat_index(&[0, 0, 0]),
            Err(PaxError::IndexOutOfRange(_))
        ));
    }

    #[test]
    fn values_round_trip() {
        let a = MetaArray::from_values::<f64>(vec![2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(a.count(), 4);
        assert_eq!(a.byte_size(), 32);
        assert_eq!(a.value::<f64>(&[1, 1]).unwrap(), 4.0);
        assert_eq!(a.value_at::<f64>(2).unwrap(), 3.0);
        assert!(matches!(
            a.value_at::<f32>(0),
            Err(PaxError::TypeMismatch(_))
        ));
        assert!(matches!(
            a.value_at::<f64>(4),
            Err(PaxError::IndexOutOfRange(_))
        ));
    }

    #[test]
    fn shape_is_validated() {
        assert!(matches!(
            MetaArray::from_values::<u8>(vec![2, 2], &[1, 2, 3]),
            Err(PaxError::InvalidShape(_))
        ));
        assert!(matches!(
            MetaArray::from_le_bytes(MetaKind::Int16, vec![4], vec![0; 7]),
            Err(PaxError::InvalidShape(_))
        ));
    }
}
