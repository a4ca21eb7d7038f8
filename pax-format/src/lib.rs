//! The PAX wire codec.
//!
//! A PAX stream is a human-readable ASCII header followed by a binary
//! raster payload. This crate owns everything wire-facing: the header
//! scanner and parser, the round-trip-stable writer, the metadata store
//! with its per-location ordering, the raster container, and the codec
//! facade ([`decode`], [`encode`], [`preview`], [`decode_many`]).
//!
//! ```
//! use pax_format::{decode, encode, PaxModel};
//! use pax_dtype::PaxType;
//!
//! let values: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
//!     .iter()
//!     .flat_map(|v| v.to_le_bytes())
//!     .collect();
//! let mut model = PaxModel::new(PaxType::Float, &[2, 2], Some(&values)).unwrap();
//! model.add_meta("pi", 3.1416f32);
//!
//! let stream = encode(&model);
//! let back = decode(&stream).unwrap();
//! assert_eq!(back.raster_value_rc::<f32>(1, 1), Some(4.0));
//! ```

mod codec;
mod header;
mod location;
mod model;
mod raster;
mod scanner;
mod store;
mod writer;

pub use codec::*;
pub use location::*;
pub use model::*;
pub use raster::*;
pub use store::*;

/// Byte cap on one comment or string metadata payload.
pub use pax_scalar::MAX_META_TEXT;

/// Block size used by chunked header preview.
pub const CHUNK_LEN: usize = 16384;

/// Shortest byte stream that can possibly be a valid PAX file.
pub const MIN_PAX_LEN: usize = 128;

/// The format version this library writes.
pub const PAX_VERSION: f32 = 1.00;

/// The version assumed for headers that predate the version clause.
pub(crate) const DEFAULT_VERSION: f32 = 1.00;
