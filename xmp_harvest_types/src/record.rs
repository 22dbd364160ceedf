//! A normalized metadata record.
//!
//! Many sources (XMP, Exif, IPTC...) write into the same record over its
//! lifetime. Each write goes through a merge function, so a source that
//! doesn't know a value never erases one that another source found.

use chrono::{DateTime, Utc};

/// The normalized metadata for one media file.
///
/// Text fields use the empty string for "unknown", and `taken_at` uses
/// `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MetadataRecord {
    pub title: String,
    pub artist: String,
    pub description: String,
    pub copyright: String,
    pub camera_make: String,
    pub camera_model: String,
    pub lens_model: String,

    /// When the photo was taken.
    pub taken_at: Option<DateTime<Utc>>,

    /// Keywords, in the order they were first seen.
    ///
    /// These never contain duplicates when added through
    /// [`MetadataRecord::add_keywords`].
    pub keywords: Vec<String>,
}

/// Overwrites `slot` with `incoming`, but only if `incoming` has content.
///
/// Returns whether `slot` now holds `incoming`.
pub fn merge_text(slot: &mut String, incoming: &str) -> bool {
    if incoming.is_empty() {
        return false;
    }

    if slot != incoming {
        slot.clear();
        slot.push_str(incoming);
    }

    true
}

/// Overwrites `slot` with `incoming`, but only if `incoming` is `Some`.
///
/// Returns whether `slot` was written.
pub fn merge_time(slot: &mut Option<DateTime<Utc>>, incoming: Option<DateTime<Utc>>) -> bool {
    match incoming {
        Some(t) => {
            *slot = Some(t);
            true
        }
        None => false,
    }
}

/// Generates a `merge_*` method for each text field.
macro_rules! text_fields {
    ( $( $field:ident => $merge:ident ),+ $(,)? ) => {
        impl MetadataRecord {
            $(
                #[doc = concat!(
                    "Sets `", stringify!($field), "` to `value`, unless `value` is empty."
                )]
                pub fn $merge(&mut self, value: &str) -> bool {
                    merge_text(&mut self.$field, value)
                }
            )+
        }
    };
}

text_fields! {
    title => merge_title,
    artist => merge_artist,
    description => merge_description,
    copyright => merge_copyright,
    camera_make => merge_camera_make,
    camera_model => merge_camera_model,
    lens_model => merge_lens_model,
}

impl MetadataRecord {
    /// Creates a blank record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `taken_at`, unless `value` is `None`.
    pub fn merge_taken_at(&mut self, value: Option<DateTime<Utc>>) -> bool {
        merge_time(&mut self.taken_at, value)
    }

    /// Appends keywords to the record.
    ///
    /// Each keyword is trimmed. Blank keywords, and keywords the record
    /// already has (ignoring case), are skipped.
    ///
    /// Returns how many keywords were added.
    pub fn add_keywords<I, S>(&mut self, keywords: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0_usize;

        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if keyword.is_empty() || self.has_keyword(keyword) {
                continue;
            }

            self.keywords.push(keyword.to_owned());
            added += 1;
        }

        added
    }

    /// Checks whether the record has a keyword, ignoring case.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        self.keywords.iter().any(|k| k.to_lowercase() == keyword)
    }
}
