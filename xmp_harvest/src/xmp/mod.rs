//! Implements an XMP decoder.
//!
//! XMP (Extensible Metadata Platform) is RDF/XML with a few conventions on
//! top. We don't model the whole thing: decoding walks each `rdf:Description`
//! and keeps only the properties listed in
//! [`xmp_harvest_types::xmp_fields`], by namespace and name.
//!
//! If you're looking to read another property into the record, please visit
//! that table before touching anything here.

use chrono::{DateTime, Utc};
use xmltree::Element;
use xmp_harvest_types::xmp_fields::{self, XmpField, XmpFieldSource};

use crate::xmp::{error::XmpError, heuristics::XmpElementHeuristicsExt as _};

pub mod error;
mod heuristics;
mod nesting;
mod sanitize;

pub use sanitize::parse_timestamp;

/// This represents the `rdf:` prefix in various collection/container types in
/// XMP through the "RDF/XML" specification.
///
/// We use it to compare namespaces and check which elements we've got.
const RDF_NAMESPACE: &str = r"http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Like the above, this is a namespace sometimes used in a few XMP elements.
///
/// We'll check for it in places like `x:xmpmeta`.
const X_NAMESPACE: &str = r"adobe:ns:meta/";

/// A decoded XMP document.
///
/// Each accessor returns an empty value when the document doesn't have it:
/// `""` for text, `None` for the timestamp, and an empty slice for keywords.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmpDocument {
    title: String,
    artist: String,
    description: String,
    copyright: String,
    camera_make: String,
    camera_model: String,
    lens_model: String,
    taken_at: Option<DateTime<Utc>>,
    keywords: Vec<String>,
}

impl XmpDocument {
    /// Decodes a raw XMP packet.
    ///
    /// The packet may be padded with whitespace or NUL bytes, as it often is
    /// inside JPEG files.
    pub fn decode(packet: &[u8]) -> Result<Self, XmpError> {
        let trimmed: &[u8] = trim_padding(packet);

        let raw_xml: &str = core::str::from_utf8(trimmed)
            .map_err(|e| {
                log::error!("XMP was not in UTF-8 format! err: {e}");
                XmpError::NotUtf8
            })?
            .trim_start_matches('\u{feff}');

        if nesting::max_depth(raw_xml, nesting::MAX_DEPTH) > nesting::MAX_DEPTH {
            log::error!("XMP nests too deeply to parse safely.");
            return Err(XmpError::TooDeep {
                limit: nesting::MAX_DEPTH,
            });
        }

        // grab the document from XML
        let document: Element = Element::parse(raw_xml.as_bytes()).map_err(|e| {
            log::error!("Failed to parse XMP as XML! err: {e}");
            XmpError::from(e)
        })?;

        let mut collector = Collector::default();
        for description in rdf_descriptions(&document)? {
            collector.description(description);
        }

        Ok(collector.finish())
    }

    /// The title, from `dc:title` or `photoshop:Headline`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The first creator, from `dc:creator` or `tiff:Artist`.
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// The caption, from `dc:description` or `exif:UserComment`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The rights statement, from `dc:rights` or `xmpRights:Owner`.
    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    /// The camera maker, from `tiff:Make`.
    pub fn camera_make(&self) -> &str {
        &self.camera_make
    }

    /// The camera model, from `tiff:Model`.
    pub fn camera_model(&self) -> &str {
        &self.camera_model
    }

    /// The lens, from `exifEX:LensModel` or `aux:Lens`.
    pub fn lens_model(&self) -> &str {
        &self.lens_model
    }

    /// When the photo was taken, in UTC.
    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    /// Keywords, in document order.
    ///
    /// These may contain duplicates.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Strips trailing NULs and whitespace, which JPEG writers like to pad with.
fn trim_padding(packet: &[u8]) -> &[u8] {
    let end: usize = packet
        .iter()
        .rposition(|b| *b != 0 && !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(0);

    &packet[..end]
}

/// Finds the `rdf:Description` elements in a document.
fn rdf_descriptions(document: &Element) -> Result<Vec<&Element>, XmpError> {
    // let's start by trying to grab the elements before the descriptions.
    //
    // the first one is optional: `x:xmpmeta`
    let parent: &Element = document
        .get_child("xmpmeta")
        .and_then(|c| {
            // ensure that only `x:xmpmeta` makes it
            match c.namespace.as_deref()? {
                X_NAMESPACE => Some(c),
                other => {
                    log::warn!(
                        "Found `xmpmeta` element, but with wrong namespace!
                            - expected: `{X_NAMESPACE}`
                            - got: `{other}`"
                    );
                    None
                }
            }
        })
        .inspect(|_| log::debug!("Found an `x:xmpmeta` element."))
        .unwrap_or(document);

    // now, we need to get the required `rdf:RDF` element.
    //
    // note: sometimes, the document's "root" is the `rdf:RDF` element, and
    // some writers bury it a few wrappers deep, so we search for it
    let rdf: &Element = find_rdf(parent).ok_or_else(|| {
        log::error!("Couldn't find an `rdf:RDF` element in the document.");
        XmpError::NoRdfElement
    })?;

    // the `rdf:RDF` element should contain "one or more" `rdf:Description`
    // elements.
    //
    // let's grab those
    let descriptions: Vec<&Element> = rdf
        .children
        .iter()
        .flat_map(|child| child.as_element())
        .filter(|child| {
            if child.name != "Description" {
                return false;
            }

            if !child.is_rdf_description() {
                log::error!(
                    "Cannot parse `Description` due to incorrect namespace!
                        - expected: {RDF_NAMESPACE}
                        - got: {:?}",
                    child.namespace
                );
                return false;
            }

            true
        })
        .collect();

    // if we've got no descriptions, we can't continue
    if descriptions.is_empty() {
        log::warn!("No `rdf:Description` elements found in the `rdf:RDF` element.");
        return Err(XmpError::NoDescriptionElements);
    }

    Ok(descriptions)
}

/// Searches `root` and its descendants, breadth-first, for `rdf:RDF`.
fn find_rdf(root: &Element) -> Option<&Element> {
    let mut queue: std::collections::VecDeque<&Element> = [root].into();

    while let Some(e) = queue.pop_front() {
        if e.is_rdf("RDF") {
            return Some(e);
        }

        if e.name == "RDF" {
            log::warn!(
                "Found `RDF` element, but with wrong namespace!
                    - expected: `{RDF_NAMESPACE}`
                    - got: `{:?}`",
                e.namespace
            );
        }

        queue.extend(e.children.iter().flat_map(|c| c.as_element()));
    }

    None
}

/// Gathers candidate values for each field, then picks the winners.
#[derive(Default)]
struct Collector {
    /// `(field, rank, value)`, in document order.
    candidates: Vec<(XmpField, u8, String)>,
}

impl Collector {
    /// Reads the properties on one `rdf:Description`.
    fn description(&mut self, description: &Element) {
        // simple properties can be written as attributes
        for (key, value) in description.attributes.iter() {
            let Some(source) = attribute_source(key.namespace_ref(), &key.local_name) else {
                continue;
            };

            log::debug!(
                "Reading attribute `{}` with value `{value}`.",
                key.local_name
            );
            self.push(source, std::iter::once(value.clone()));
        }

        // ...and everything can be written as child elements
        for element in description.children.iter().flat_map(|c| c.as_element()) {
            let Some(ns) = element.namespace.as_deref() else {
                log::warn!(
                    "Element `{name}` has no namespace. Skipping it.",
                    name = element.name
                );
                continue;
            };

            let Some(source) = xmp_fields::lookup(ns, &element.name) else {
                log::trace!("Skipping unused element `{}`.", element.name);
                continue;
            };

            log::debug!("Reading element `{}` for {:?}.", element.name, source.field);
            self.push(source, element.property_values());
        }
    }

    fn push(&mut self, source: XmpFieldSource, values: impl IntoIterator<Item = String>) {
        self.candidates.extend(
            values
                .into_iter()
                .map(|v| (source.field, source.rank, v)),
        );
    }

    /// Picks a winning value for each field.
    ///
    /// Scalar fields take the first usable value from the best-ranked
    /// property that has one. Keywords take every usable value.
    fn finish(mut self) -> XmpDocument {
        // stable, so document order survives within a rank
        self.candidates.sort_by_key(|(field, rank, _)| (*field, *rank));

        let mut doc = XmpDocument::default();
        for (field, _, raw) in self.candidates {
            if field == XmpField::TakenAt {
                if doc.taken_at.is_none() {
                    doc.taken_at = parse_timestamp(&raw);
                }
                continue;
            }

            let value: String = sanitize::sanitize_text(&raw);
            if value.is_empty() {
                continue;
            }

            if field.is_list() {
                doc.keywords.push(value);
                continue;
            }

            let slot: &mut String = match field {
                XmpField::Title => &mut doc.title,
                XmpField::Artist => &mut doc.artist,
                XmpField::Description => &mut doc.description,
                XmpField::Copyright => &mut doc.copyright,
                XmpField::CameraMake => &mut doc.camera_make,
                XmpField::CameraModel => &mut doc.camera_model,
                XmpField::LensModel => &mut doc.lens_model,
                XmpField::TakenAt | XmpField::Keywords => continue,
            };

            if slot.is_empty() {
                *slot = value;
            }
        }

        doc
    }
}

/// Finds the field fed by an attribute on `rdf:Description`.
fn attribute_source(namespace: Option<&str>, name: &str) -> Option<XmpFieldSource> {
    // `rdf:about` and friends are informational markers w/o data
    let ns: &str = namespace?;
    if ns == RDF_NAMESPACE {
        return None;
    }

    xmp_fields::lookup(ns, name)
}
