//! Copies a decoded XMP document into a [`MetadataRecord`].
//!
//! Values the document doesn't have never erase what the record already
//! holds, so XMP can be applied before or after other sources.

use xmp_harvest_types::MetadataRecord;

use crate::xmp::XmpDocument;

/// Writes the document's fields into `record`.
pub fn apply(doc: &XmpDocument, record: &mut MetadataRecord) {
    record.merge_title(doc.title());
    record.merge_artist(doc.artist());
    record.merge_description(doc.description());
    record.merge_copyright(doc.copyright());
    record.merge_camera_make(doc.camera_make());
    record.merge_camera_model(doc.camera_model());
    record.merge_lens_model(doc.lens_model());
    record.merge_taken_at(doc.taken_at());

    if !doc.keywords().is_empty() {
        let added = record.add_keywords(doc.keywords());
        log::trace!("Added `{added}` new keywords.");
    }
}
