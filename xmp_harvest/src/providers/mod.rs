//! # Providers
//!
//! Providers represent a source of metadata, such as a media file format.
//! Each one knows how to find the metadata blocks inside its container.
//!
//! Only JPEG is supported for now.

pub mod jpeg;
