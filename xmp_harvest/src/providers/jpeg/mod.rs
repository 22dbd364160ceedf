//! JPEG is an older image format designed with old-school compression in mind.
//!
//! It uses an unfortunate internal structure that's difficult to parse, so
//! this module treads lightly: it splits the file into marker segments and
//! leaves the contents alone, except for finding the one that carries XMP.

mod error;
mod scan;

pub use error::JpegError;
pub use scan::{ScanConfig, scan, scan_with};

/// The signature at the start of an APP1 payload holding StandardXMP.
pub const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// What kind of marker a [`Segment`] begins with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `SOI`, the start of the image. (`0xD8`)
    Soi,

    /// `EOI`, the end of the image. (`0xD9`)
    Eoi,

    /// `SOS`, the start of a scan. Its payload is the scan header. (`0xDA`)
    Sos,

    /// `RSTn`, a restart marker. (`0xD0..=0xD7`)
    Restart(u8),

    /// `APPn`, an application segment. (`0xE0..=0xEF`)
    App(u8),

    /// Any other marker, by its code.
    Other(u8),

    /// Entropy-coded image data following an `SOS` header.
    ///
    /// This isn't a real marker, but it does take up space in the file.
    ScanData,
}

impl Marker {
    /// Classifies a marker code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0xD8 => Marker::Soi,
            0xD9 => Marker::Eoi,
            0xDA => Marker::Sos,
            0xD0..=0xD7 => Marker::Restart(code - 0xD0),
            0xE0..=0xEF => Marker::App(code - 0xE0),
            other => Marker::Other(other),
        }
    }

    /// Grabs the marker code, if this is a real marker.
    pub fn code(&self) -> Option<u8> {
        Some(match *self {
            Marker::Soi => 0xD8,
            Marker::Eoi => 0xD9,
            Marker::Sos => 0xDA,
            Marker::Restart(n) => 0xD0 + n,
            Marker::App(n) => 0xE0 + n,
            Marker::Other(code) => code,
            Marker::ScanData => return None,
        })
    }
}

/// One part of a JPEG file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    marker: Marker,
    offset: u64,
    payload: Vec<u8>,
}

impl Segment {
    pub(crate) fn new(marker: Marker, offset: u64, payload: Vec<u8>) -> Self {
        Self {
            marker,
            offset,
            payload,
        }
    }

    /// The marker this segment starts with.
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Where this segment starts, counted from the stream position the scan
    /// began at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The segment's payload.
    ///
    /// This does NOT include the marker or its two length bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether this is an APP1 segment carrying StandardXMP.
    pub fn is_xmp(&self) -> bool {
        self.marker == Marker::App(1) && self.payload.starts_with(XMP_SIGNATURE)
    }

    /// The XMP packet inside this segment, without its signature.
    pub fn xmp_packet(&self) -> Option<&[u8]> {
        if !self.is_xmp() {
            return None;
        }

        self.payload.get(XMP_SIGNATURE.len()..)
    }
}

/// The segments found in a JPEG stream, in stream order.
///
/// If the scan stopped early, [`SegmentList::error`] says why. Everything
/// found before that point is still here.
#[derive(Clone, Debug, Default)]
pub struct SegmentList {
    segments: Vec<Segment>,
    error: Option<JpegError>,
}

impl SegmentList {
    pub(crate) fn new(segments: Vec<Segment>, error: Option<JpegError>) -> Self {
        Self { segments, error }
    }

    /// The segments, in stream order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The problem that stopped the scan, if any.
    pub fn error(&self) -> Option<&JpegError> {
        self.error.as_ref()
    }

    /// Whether the scan reached `EOI` without trouble.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Finds the first segment carrying XMP.
    ///
    /// Later XMP segments are ignored, even if this one turns out to be
    /// unreadable. Not finding one is normal - most JPEGs don't have XMP.
    pub fn find_xmp(&self) -> Option<&Segment> {
        let found = self.segments.iter().find(|s| s.is_xmp());

        match found {
            Some(s) => log::debug!("Found XMP segment at offset `{}`.", s.offset),
            None => log::debug!("No XMP segment among `{}` segments.", self.segments.len()),
        }

        found
    }

    /// Splits the list into its segments and error.
    pub fn into_parts(self) -> (Vec<Segment>, Option<JpegError>) {
        (self.segments, self.error)
    }
}
