//! Type definitions for the PAX container format.
//!
//! Two closed registries live here: the raster element registry
//! ([`PaxType`], carried on the wire as an integer code) and the metadata
//! kind registry ([`MetaKind`], carried as a lowercase tag inside `##`
//! header lines). Both are compile-time constant tables; all lookups
//! outside the registries fail with `UnknownType`.

mod meta_kind;
mod pax_type;

pub use meta_kind::*;
pub use pax_type::*;

/// Re-exported so downstream crates don't need their own `half` pin.
pub use half;
