//! PAX (Portable Arbitrary map eXtended) is a self-describing container
//! for multi-dimensional numeric raster data and arbitrarily-typed
//! metadata: a human-readable ASCII header followed by a binary payload,
//! in the spirit of the netpbm `pam` format.
//!
//! This crate re-exports the workspace members. Most users only need
//! [`PaxModel`] together with [`decode`] and [`encode`]:
//!
//! ```
//! use pax::dtype::PaxType;
//! use pax::{decode, encode, PaxModel};
//!
//! let data: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
//!     .iter()
//!     .flat_map(|v| v.to_le_bytes())
//!     .collect();
//! let mut model = PaxModel::new(PaxType::Float, &[2, 2], Some(&data)).unwrap();
//! model.add_meta("pi", 3.1416f32);
//! model.add_comment("sample raster");
//!
//! let stream = encode(&model);
//! let back = decode(&stream).unwrap();
//! assert_eq!(back.raster_value_xy::<f32>(1, 1), Some(4.0));
//! assert!((back.get_meta_float("pi").unwrap() - 3.1416).abs() < 1e-6);
//! ```

pub use pax_format::*;
pub use {
    pax_dtype as dtype, pax_error as error, pax_format as format, pax_scalar as scalar,
};
