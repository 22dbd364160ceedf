//! # `xmp_harvest`
//!
//! A library to pull XMP metadata out of JPEG files and into a normalized
//! [`MetadataRecord`].
//!
//! ## Usage
//!
//! ```no_run
//! use xmp_harvest::{MetadataRecord, parse_file};
//!
//! let mut record = MetadataRecord::new();
//! match parse_file("photo.jpg", &mut record) {
//!     Ok(()) => println!("title: {}", record.title),
//!     Err(e) if e.is_not_found() => println!("no xmp here"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! The record is yours, and it can be shared with other metadata sources.
//! Fields the XMP doesn't have are left alone, so nothing another source
//! found is ever erased.
//!
//! ## Robustness
//!
//! Files are treated as hostile. A truncated or mangled JPEG still yields
//! whatever came before the damage, and any panic inside the library comes
//! back as [`ErrorKind::InternalFault`] instead of unwinding into your code.
//!
//! ## License
//!
//! This project is dual-licensed under either the Apache License 2.0 or the MIT License at your option.

#![forbid(unsafe_code)]

use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use crate::{providers::jpeg::SegmentList, xmp::error::XmpError};

pub mod error;
pub mod guard;
pub mod mapper;
pub mod providers;
pub mod xmp;

pub use error::{ErrorKind, HarvestError};
pub use xmp::XmpDocument;
pub use xmp_harvest_types::MetadataRecord;

/// Reads the XMP in a JPEG file into `record`.
///
/// # Errors
///
/// - [`ErrorKind::NotFound`] if the file has no XMP. `record` is unchanged.
/// - [`ErrorKind::InvalidDocument`] if the XMP can't be read. `record` is
///   unchanged.
/// - [`ErrorKind::MalformedContainer`] if the JPEG broke before any XMP.
/// - [`ErrorKind::Io`] if the file couldn't be opened.
/// - [`ErrorKind::InternalFault`] if something panicked.
pub fn parse_file(
    path: impl AsRef<Path>,
    record: &mut MetadataRecord,
) -> Result<(), HarvestError> {
    let path: &Path = path.as_ref();
    let name: String = path.to_string_lossy().into_owned();

    guard::contain(&name, || {
        let mut file: File = File::open(path).map_err(|e| io_error(&name, e))?;
        let len: u64 = file.metadata().map_err(|e| io_error(&name, e))?.len();

        extract(&name, &mut file, len, record)
    })
}

/// Like [`parse_file`], but for a stream you've already opened.
///
/// `name` is only used in errors and logs. `len` should be the number of
/// bytes from the stream's current position to the end of the JPEG.
pub fn parse_stream<R: Read + Seek>(
    name: &str,
    stream: &mut R,
    len: u64,
    record: &mut MetadataRecord,
) -> Result<(), HarvestError> {
    guard::contain(name, || extract(name, stream, len, record))
}

/// Reads an XMP sidecar file (usually `*.xmp`) into `record`.
///
/// The whole file is the XMP packet.
pub fn parse_sidecar(
    path: impl AsRef<Path>,
    record: &mut MetadataRecord,
) -> Result<(), HarvestError> {
    let path: &Path = path.as_ref();
    let name: String = path.to_string_lossy().into_owned();

    guard::contain(&name, || {
        let packet: Vec<u8> = std::fs::read(path).map_err(|e| io_error(&name, e))?;
        let doc: XmpDocument = decode(&name, &packet)?;
        map_document(&name, &doc, record)
    })
}

/// Reads an XMP sidecar file into a fresh record.
///
/// For JPEGs, use [`parse_file`].
pub fn xmp_from_file(path: impl AsRef<Path>) -> Result<MetadataRecord, HarvestError> {
    let mut record = MetadataRecord::new();
    parse_sidecar(path, &mut record)?;
    Ok(record)
}

/// Scans, locates, decodes, and maps.
fn extract<R: Read + Seek>(
    name: &str,
    stream: &mut R,
    len: u64,
    record: &mut MetadataRecord,
) -> Result<(), HarvestError> {
    let segments: SegmentList = providers::jpeg::scan(stream, len);

    let Some(packet) = segments.find_xmp().and_then(|s| s.xmp_packet()) else {
        return Err(match segments.error() {
            Some(e) => {
                log::error!("`{name}` is malformed, and no XMP came before the damage. err: {e}");
                HarvestError::new(name, ErrorKind::MalformedContainer(e.clone()))
            }
            None => {
                log::debug!("`{name}` has no XMP.");
                HarvestError::new(name, ErrorKind::NotFound)
            }
        });
    };

    // we've got what we came for, so later damage doesn't matter
    if let Some(e) = segments.error() {
        log::warn!("Scan of `{name}` stopped early, but XMP was already found. err: {e}");
    }

    let doc: XmpDocument = decode(name, packet)?;
    map_document(name, &doc, record)
}

fn decode(name: &str, packet: &[u8]) -> Result<XmpDocument, HarvestError> {
    XmpDocument::decode(packet).map_err(|e: XmpError| {
        log::error!("Failed to decode XMP in `{name}`. err: {e}");
        HarvestError::new(name, ErrorKind::InvalidDocument(e))
    })
}

/// Applies the document under its own guard, so a fault while mapping is
/// reported apart from one while parsing.
fn map_document(
    name: &str,
    doc: &XmpDocument,
    record: &mut MetadataRecord,
) -> Result<(), HarvestError> {
    guard::contain(name, || {
        mapper::apply(doc, record);
        Ok(())
    })
}

fn io_error(name: &str, e: std::io::Error) -> HarvestError {
    log::error!("Couldn't read `{name}`. err: {e}");
    HarvestError::new(name, ErrorKind::from(e))
}

/// Internal utility methods.
pub(crate) mod util {
    /// Helper function to initialize the logger for testing.
    #[cfg(test)]
    pub fn logger() {
        _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::max())
            .format_file(true)
            .format_line_number(true)
            .try_init();
    }

}
