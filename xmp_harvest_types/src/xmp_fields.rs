//! Which XMP properties feed which [`crate::MetadataRecord`] field.
//!
//! Some fields can come from more than one property. For example, a title
//! lives in `dc:title`, but some tools only write `photoshop:Headline`. Each
//! property gets a rank within its field; when a document has several, the
//! lowest rank wins.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// Namespace URLs for the schemas we read from.
pub mod ns {
    /// Dublin Core.
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";

    /// Adobe Photoshop.
    pub const PHOTOSHOP: &str = "http://ns.adobe.com/photoshop/1.0/";

    /// Exif's TIFF properties.
    pub const TIFF: &str = "http://ns.adobe.com/tiff/1.0/";

    /// Exif-specific properties.
    pub const EXIF: &str = "http://ns.adobe.com/exif/1.0/";

    /// Exif 2.3+ properties, as defined by CIPA.
    pub const EXIF_EX: &str = "http://cipa.jp/exif/1.0/";

    /// Adobe's "auxiliary" Exif properties.
    pub const AUX: &str = "http://ns.adobe.com/exif/1.0/aux/";

    /// XMP Basic.
    pub const XMP_BASIC: &str = "http://ns.adobe.com/xap/1.0/";

    /// XMP Rights Management.
    pub const XMP_RIGHTS: &str = "http://ns.adobe.com/xap/1.0/rights/";
}

/// A field of the metadata record that XMP can provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XmpField {
    Title,
    Artist,
    Description,
    Copyright,
    CameraMake,
    CameraModel,
    LensModel,
    TakenAt,
    Keywords,
}

impl XmpField {
    /// Whether this field holds a list, rather than one value.
    pub fn is_list(&self) -> bool {
        matches!(self, XmpField::Keywords)
    }
}

/// Where a property's value goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct XmpFieldSource {
    /// The record field it feeds.
    pub field: XmpField,

    /// Its rank among properties feeding the same field. Lower wins.
    pub rank: u8,
}

/// A pair of a property's namespace URL and its element name.
///
/// Ex: ("http://purl.org/dc/elements/1.1/", "title") for `dc:title`
#[derive(Hash, PartialEq, Eq)]
pub struct XmpNamespaceNamePair(pub (&'static str, &'static str));

// this impl allows us to search the hashmap with borrowed expressions for any
// lifetime 'a.
//
// `HashMap<K, V, _>::get` takes `&Q` where `K: Borrow<Q>`, so handing out
// the inner tuple lets a `(&'a str, &'a str)` built from parsed XML act as a
// key.
impl<'a> core::borrow::Borrow<(&'a str, &'a str)> for XmpNamespaceNamePair {
    fn borrow(&self) -> &(&'a str, &'a str) {
        &self.0
    }
}

/// A map, (key, value), where:
///
/// - `key` is the namespace URL + name pair
/// - `value` says which record field it feeds, and with which rank.
pub static XMP_FIELD_TABLE: LazyLock<FxHashMap<XmpNamespaceNamePair, XmpFieldSource>> =
    LazyLock::new(|| {
        let mut m: FxHashMap<XmpNamespaceNamePair, XmpFieldSource> = FxHashMap::default();
        map(&mut m);
        m
    });

/// Finds the record field fed by a property, if any.
pub fn lookup(namespace: &str, name: &str) -> Option<XmpFieldSource> {
    XMP_FIELD_TABLE.get(&(namespace, name)).copied()
}

/// Adds all (key, value) pairs to the currently empty map.
fn map(m: &mut FxHashMap<XmpNamespaceNamePair, XmpFieldSource>) {
    use XmpField as F;
    use XmpNamespaceNamePair as P;

    // each field lists its properties in rank order
    let table: &[(XmpField, &[(&'static str, &'static str)])] = &[
        (F::Title, &[(ns::DC, "title"), (ns::PHOTOSHOP, "Headline")]),
        (F::Artist, &[(ns::DC, "creator"), (ns::TIFF, "Artist")]),
        (
            F::Description,
            &[(ns::DC, "description"), (ns::EXIF, "UserComment")],
        ),
        (
            F::Copyright,
            &[(ns::DC, "rights"), (ns::XMP_RIGHTS, "Owner")],
        ),
        (F::CameraMake, &[(ns::TIFF, "Make")]),
        (F::CameraModel, &[(ns::TIFF, "Model")]),
        (F::LensModel, &[(ns::EXIF_EX, "LensModel"), (ns::AUX, "Lens")]),
        (
            F::TakenAt,
            &[
                (ns::PHOTOSHOP, "DateCreated"),
                (ns::EXIF, "DateTimeOriginal"),
                (ns::XMP_BASIC, "CreateDate"),
            ],
        ),
        (F::Keywords, &[(ns::DC, "subject")]),
    ];

    for (field, properties) in table {
        for (rank, pair) in properties.iter().enumerate() {
            let rank = u8::try_from(rank).unwrap_or(u8::MAX);
            m.insert(
                P(*pair),
                XmpFieldSource {
                    field: *field,
                    rank,
                },
            );
        }
    }
}
