use std::sync::Arc;

/// This is an error that happened while we were decoding XMP.
///
/// Any of these means the document can't be trusted for any field.
#[derive(Clone, Debug)]
pub enum XmpError {
    /// The XMP packet wasn't valid UTF-8.
    NotUtf8,

    /// The XML nests deeper than we're willing to follow.
    TooDeep {
        /// The deepest nesting we allow.
        limit: usize,
    },

    /// `xmltree` failed to parse the XML.
    XmlParseError(
        // note: `Arc` allows us to impl `Clone`
        Arc<xmltree::ParseError>,
    ),

    /// Initial XML scanning failed - no `rdf:RDF` element was found.
    NoRdfElement,

    /// We couldn't find any `rdf:Description` elements in the `rdf:RDF`
    /// element.
    NoDescriptionElements,
}

impl core::fmt::Display for XmpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            XmpError::NotUtf8 => f.write_str("The XMP packet was not valid UTF-8."),

            XmpError::TooDeep { limit } => write!(
                f,
                "The XML nests more than `{limit}` elements deep. \
                    Refusing to parse it."
            ),

            XmpError::XmlParseError(e) => {
                write!(f, "Encountered error while parsing XML. err: {}", e)
            }

            XmpError::NoRdfElement => {
                f.write_str("The XML is missing the `rdf:RDF` element, which is required.")
            }

            XmpError::NoDescriptionElements => f.write_str(
                "The `rdf:RDF` element has no `rdf:Description` elements. \
                    One or more are required.",
            ),
        }
    }
}

impl core::error::Error for XmpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmpError::XmlParseError(e) => Some(e.as_ref()),
            XmpError::NotUtf8
            | XmpError::TooDeep { .. }
            | XmpError::NoRdfElement
            | XmpError::NoDescriptionElements => None,
        }
    }
}

impl From<xmltree::ParseError> for XmpError {
    fn from(value: xmltree::ParseError) -> Self {
        XmpError::XmlParseError(value.into())
    }
}
