//! This module assists in reading the value of an XMP property element.
//!
//! We don't keep a schema for each property, so we guess its shape from the
//! RDF it's written with: plain text, a collection (`rdf:Alt`, `rdf:Bag`,
//! `rdf:Seq`), or a struct.

use xmltree::Element;

use super::RDF_NAMESPACE;

/// The namespace of the predefined `xml:` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub trait XmpElementHeuristicsExt {
    fn is_rdf(&self, name: &str) -> bool;
    fn is_rdf_description(&self) -> bool;
    fn is_struct(&self) -> bool;
    fn has_collection(&self) -> Option<(CollectionKind, &Element)>;
    fn property_values(&self) -> Vec<String>;
}

impl XmpElementHeuristicsExt for Element {
    /// Checks for an `rdf:` element with the given name.
    fn is_rdf(&self, name: &str) -> bool {
        // all of em have namespaces
        let Some(ref ns) = self.namespace else {
            return false;
        };

        ns == RDF_NAMESPACE && self.name == name
    }

    fn is_rdf_description(&self) -> bool {
        self.is_rdf("Description")
    }

    /// Determines whether or not `self` is a struct.
    fn is_struct(&self) -> bool {
        // if we have the `rdf:parseType="Resource"`, we must be a struct.
        if self.attributes.iter().any(|(attr_keys, attr_value)| {
            attr_keys.local_name == "parseType"
                && attr_keys
                    .namespace_ref()
                    .is_some_and(|inner_ns| inner_ns == RDF_NAMESPACE)
                && attr_value == "Resource"
        }) {
            return true;
        }

        // if any of our children are `rdf:Description`, we carry fields and
        // must be a struct
        self.children
            .iter()
            .flat_map(|c| c.as_element())
            .any(|c| c.is_rdf_description())
    }

    fn has_collection(&self) -> Option<(CollectionKind, &Element)> {
        self.children
            .iter()
            .flat_map(|c| c.as_element())
            .find_map(|c| {
                let kind = match c.name.as_str() {
                    "Alt" => CollectionKind::Alternatives,
                    "Bag" => CollectionKind::Unordered,
                    "Seq" => CollectionKind::Ordered,
                    _ => return None,
                };

                // the namespace should be `rdf`
                c.is_rdf(&c.name).then_some((kind, c))
            })
    }

    /// Grabs the text values of a property element.
    ///
    /// - Plain text becomes one value.
    /// - Collections become one value per `rdf:li`. For `rdf:Alt`, the
    ///   `x-default` entry comes first.
    /// - Structs have no values we can use.
    fn property_values(&self) -> Vec<String> {
        if let Some((kind, collection)) = self.has_collection() {
            let mut items: Vec<(bool, String)> = collection
                .children
                .iter()
                .flat_map(|c| c.as_element())
                .filter(|li| {
                    if li.is_rdf("li") {
                        return true;
                    }

                    log::warn!(
                        "Sub-element of `{}` was expected to be `rdf:li`, but was `{}`.",
                        self.name,
                        li.name
                    );
                    false
                })
                .filter_map(|li| {
                    // nested structs in a list don't have text we can use
                    if li.is_struct() {
                        return None;
                    }

                    let text = li.get_text()?.to_string();
                    Some((is_default_language(li), text))
                })
                .collect();

            if matches!(kind, CollectionKind::Alternatives) {
                // stable, so the rest keep their order
                items.sort_by_key(|(is_default, _)| !*is_default);
            }

            return items.into_iter().map(|(_, text)| text).collect();
        }

        if self.is_struct() {
            log::trace!("Property `{}` is a struct. Skipping its value.", self.name);
            return Vec::new();
        }

        self.get_text()
            .map(|t| vec![t.to_string()])
            .unwrap_or_default()
    }
}

/// Whether an `rdf:li` is tagged `xml:lang="x-default"`.
fn is_default_language(li: &Element) -> bool {
    li.attributes.iter().any(|(key, value)| {
        key.local_name == "lang"
            && (key.namespace_ref() == Some(XML_NAMESPACE) || key.prefix_ref() == Some("xml"))
            && value == "x-default"
    })
}

/// The kind of collection we've detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Alternatives,
    Unordered,
    Ordered,
}
