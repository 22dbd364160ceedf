//! # `xmp_harvest_types`
//!
//! The "data" side of `xmp_harvest`.
//!
//! Callers own a [`MetadataRecord`] for as long as they like, feeding it from
//! as many metadata sources as they have. This crate also holds the table
//! that says which XMP properties feed which record field, so other parsers
//! can agree on it.

#![forbid(unsafe_code)]

pub mod record;
pub mod xmp_fields;

pub use record::MetadataRecord;
