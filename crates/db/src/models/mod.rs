//! Row structs and DTOs.
//!
//! Each submodule contains `FromRow` row structs matching the database and
//! conversions into the domain types of `hostwatch-core`.

pub mod alert;
pub mod host;
pub mod sample;
pub mod threshold;
