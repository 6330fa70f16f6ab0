//! Row structs and their conversions into domain types.
//!
//! Each submodule contains a `FromRow` struct matching the database row and
//! a checked conversion into the corresponding `sentinel-core` type.

pub mod hardware;
