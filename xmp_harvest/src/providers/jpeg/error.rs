use std::sync::Arc;

/// Why a JPEG scan stopped before reaching `EOI`.
///
/// These never throw away the segments found before the problem. See
/// [`super::SegmentList::error`].
#[derive(Clone, Debug)]
pub enum JpegError {
    /// The stream had no bytes at all.
    Empty,

    /// The first marker in a JPEG file should be a `SOI`.
    ///
    /// However, this file had another marker first.
    FirstMarkerWasNotSoi {
        /// The first marker's marker code.
        marker_code: u8,
    },

    /// The first byte of a marker should be `0xFF`.
    ///
    /// It wasn't!
    FirstMarkerByteWasWrong {
        /// The byte we got instead.
        byte: u8,

        /// Where the marker should've started.
        offset: u64,
    },

    /// A marker code was `0`, but that value is disallowed.
    MarkerCodeDisallowed {
        /// Where the marker started.
        offset: u64,
    },

    /// A marker had a negative length (after removing 2 len bytes).
    NegativeLength {
        /// The afflicted marker's marker code.
        marker_code: u8,

        /// Its original length, including the marker length bytes.
        original_len: u16,

        /// Where the marker started.
        offset: u64,
    },

    /// The input ended partway through a segment.
    ///
    /// This happens with cut-off files, and when the length we were given is
    /// shorter than the real file.
    Truncated {
        /// Where the unfinished segment started.
        offset: u64,

        /// How many bytes of it we had.
        available: usize,
    },

    /// The input ended cleanly between two segments, but there was never an
    /// `EOI` marker.
    MissingEoi,

    /// Reading from the stream failed.
    Io(
        // note: `Arc` allows us to impl `Clone`
        Arc<std::io::Error>,
    ),
}

impl core::fmt::Display for JpegError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("The JPEG stream was empty."),

            Self::FirstMarkerWasNotSoi { marker_code } => write!(
                f,
                "A JPEG file's first marker should be SOI (`0xD8`), \
                but it was: `{marker_code:x?}`"
            ),

            Self::FirstMarkerByteWasWrong { byte, offset } => write!(
                f,
                "JPEG marker's first byte was wrong. \
                    expected: `255`; \
                    got: `{byte}`; \
                    at offset: `{offset}`",
            ),

            Self::MarkerCodeDisallowed { offset } => write!(
                f,
                "A JPEG marker code had the disallowed value `0`. \
                    at offset: `{offset}`",
            ),

            Self::NegativeLength {
                marker_code,
                original_len,
                offset,
            } => write!(
                f,
                "JPEG marker segment with code `{marker_code:x?}` had \
                    a length that becomes negative after removing 2: \
                    `{original_len}` bytes. at offset: `{offset}`"
            ),

            Self::Truncated { offset, available } => write!(
                f,
                "Ran out of data partway through a JPEG segment. \
                    segment offset: `{offset}`, \
                    bytes available: `{available}`"
            ),

            Self::MissingEoi => f.write_str("The JPEG stream ended without an EOI marker."),

            Self::Io(e) => write!(f, "Failed to read the JPEG stream. err: {e}"),
        }
    }
}

impl core::error::Error for JpegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for JpegError {
    fn from(value: std::io::Error) -> Self {
        JpegError::Io(value.into())
    }
}
