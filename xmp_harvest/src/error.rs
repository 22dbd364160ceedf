//! Errors returned from the public entry points.

use std::{path::Path, sync::Arc};

use crate::{providers::jpeg::JpegError, xmp::error::XmpError};

/// An error from harvesting one file's XMP.
///
/// It always names the file it came from, by base name only.
#[derive(Clone, Debug)]
pub struct HarvestError {
    file: String,
    kind: ErrorKind,
}

impl HarvestError {
    /// Creates an error for `file`, which may be a full path.
    pub fn new(file: impl AsRef<str>, kind: ErrorKind) -> Self {
        Self {
            file: base_name(file.as_ref()),
            kind,
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The base name of the file we were reading.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Whether the file simply had no XMP.
    ///
    /// Most callers treat this as "nothing to do" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }
}

/// The kinds of [`HarvestError`].
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// We couldn't open or measure the file.
    Io(Arc<std::io::Error>),

    /// The JPEG framing was broken before any XMP segment turned up.
    MalformedContainer(JpegError),

    /// The file has no XMP segment.
    NotFound,

    /// An XMP segment was found, but it isn't a readable XMP document.
    InvalidDocument(XmpError),

    /// Something panicked while reading the file.
    ///
    /// This is always a bug in this library.
    InternalFault {
        /// The panic's message.
        message: String,

        /// A backtrace from where the panic happened.
        trace: String,
    },
}

impl core::fmt::Display for HarvestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "metadata: {} in `{}` (xmp)", self.kind, self.file)
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ErrorKind::Io(e) => write!(f, "couldn't read the file. err: {e}"),
            ErrorKind::MalformedContainer(e) => write!(f, "malformed JPEG. err: {e}"),
            ErrorKind::NotFound => f.write_str("no XMP segment found"),
            ErrorKind::InvalidDocument(e) => write!(f, "unreadable XMP document. err: {e}"),
            ErrorKind::InternalFault { message, trace } => {
                write!(f, "internal fault: {message}\n{trace}")
            }
        }
    }
}

impl core::error::Error for HarvestError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self.kind {
            ErrorKind::Io(ref e) => Some(e.as_ref()),
            ErrorKind::MalformedContainer(ref e) => Some(e),
            ErrorKind::InvalidDocument(ref e) => Some(e),
            ErrorKind::NotFound | ErrorKind::InternalFault { .. } => None,
        }
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(value: std::io::Error) -> Self {
        ErrorKind::Io(Arc::new(value))
    }
}

/// Strips any directories from a file name.
fn base_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_owned())
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, HarvestError};

    #[test]
    fn only_the_base_name_is_kept() {
        let e = HarvestError::new("/photos/2021/sunset.jpg", ErrorKind::NotFound);

        assert_eq!(e.file(), "sunset.jpg");
        assert!(e.is_not_found());
        assert_eq!(
            e.to_string(),
            "metadata: no XMP segment found in `sunset.jpg` (xmp)"
        );
    }

    #[test]
    fn stream_names_pass_through() {
        let e = HarvestError::new("upload #4", ErrorKind::NotFound);
        assert_eq!(e.file(), "upload #4");
    }
}
