//! Runs the whole pipeline over in-memory JPEGs.

use std::io::{Cursor, Read, Seek, SeekFrom};

use chrono::{TimeZone as _, Utc};
use xmp_harvest::{ErrorKind, MetadataRecord, parse_stream};

mod common;
use common::{jpeg_sized, jpeg_with, logger, segment, xmp_app1, xmp_packet};

fn harvest(file: &[u8], record: &mut MetadataRecord) -> Result<(), xmp_harvest::HarvestError> {
    parse_stream("test.jpg", &mut Cursor::new(file), file.len() as u64, record)
}

/// A 2 KiB JPEG sets the title, and leaves the artist alone.
#[test]
fn sunset_title_keeps_artist() {
    logger();

    let file = jpeg_sized(&[xmp_app1(&xmp_packet(r#"dc:title="Sunset""#, ""))], 2048);
    let mut record = MetadataRecord {
        artist: "Jane Doe".into(),
        ..Default::default()
    };

    harvest(&file, &mut record).expect("file has valid xmp");

    assert_eq!(record.title, "Sunset");
    assert_eq!(record.artist, "Jane Doe");
}

/// Present fields are written; absent ones keep their old values.
#[test]
fn present_fields_overwrite_absent_fields_stay() {
    logger();

    let xmp = xmp_packet(
        r#"tiff:Make="Canon" tiff:Model="EOS R5" exif:DateTimeOriginal="2022:08:14 06:30:00""#,
        r#"<dc:creator><rdf:Seq><rdf:li>Jane Doe</rdf:li></rdf:Seq></dc:creator>
           <dc:subject><rdf:Bag><rdf:li>dawn</rdf:li><rdf:li>lake</rdf:li></rdf:Bag></dc:subject>"#,
    );
    let file = jpeg_with(&[xmp_app1(&xmp)]);

    let before = MetadataRecord {
        title: "Untitled".into(),
        copyright: "All rights reserved".into(),
        camera_make: "Nikon".into(),
        keywords: vec!["Lake".into()],
        ..Default::default()
    };
    let mut record = before.clone();

    harvest(&file, &mut record).unwrap();

    assert_eq!(
        record,
        MetadataRecord {
            artist: "Jane Doe".into(),
            camera_make: "Canon".into(),
            camera_model: "EOS R5".into(),
            taken_at: Some(Utc.with_ymd_and_hms(2022, 8, 14, 6, 30, 0).unwrap()),
            keywords: vec!["Lake".into(), "dawn".into()],
            ..before
        }
    );
}

/// Damage after the XMP segment doesn't matter.
#[test]
fn truncated_stream_still_harvests() {
    logger();

    let file = jpeg_with(&[xmp_app1(&xmp_packet(r#"dc:title="Sunset""#, ""))]);
    let cut = &file[..file.len() - 40];

    let mut record = MetadataRecord::new();
    harvest(cut, &mut record).expect("xmp came before the cut");

    assert_eq!(record.title, "Sunset");
}

/// A length hint shorter than the file only hides the tail.
#[test]
fn short_length_hint_is_respected() {
    logger();

    let file = jpeg_with(&[xmp_app1(&xmp_packet(r#"dc:title="Sunset""#, ""))]);
    let hint = file.len() as u64 - 40;
    let mut cursor = Cursor::new(&file);

    let mut record = MetadataRecord::new();
    parse_stream("short.jpg", &mut cursor, hint, &mut record).unwrap();

    assert!(cursor.position() <= hint, "read past the length hint");
    assert_eq!(record.title, "Sunset");
}

/// A hint that cuts into the XMP segment itself leaves nothing to find.
#[test]
fn length_hint_inside_xmp_is_malformed() {
    logger();

    let file = jpeg_with(&[xmp_app1(&xmp_packet(r#"dc:title="Sunset""#, ""))]);
    let mut record = MetadataRecord::new();

    let err = parse_stream("short.jpg", &mut Cursor::new(&file), 40, &mut record).unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::MalformedContainer(_)));
    assert_eq!(record, MetadataRecord::new());
}

/// No XMP means `NotFound`, and no changes.
#[test]
fn no_xmp_is_not_found() {
    logger();

    let exif_only = segment(0xE1, b"Exif\0\0MM\0*\0\0\0\x08");
    let file = jpeg_with(&[exif_only]);

    let before = MetadataRecord {
        title: "Kept".into(),
        ..Default::default()
    };
    let mut record = before.clone();

    let err = harvest(&file, &mut record).unwrap_err();

    assert!(err.is_not_found(), "got: {err}");
    assert_eq!(err.file(), "test.jpg");
    assert_eq!(record, before);
}

/// XMP that isn't XML is rejected before anything is written.
#[test]
fn invalid_xml_never_reaches_the_record() {
    logger();

    let file = jpeg_with(&[xmp_app1(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF><dc:title>Sunset"#,
    )]);

    let mut record = MetadataRecord::new();
    let err = harvest(&file, &mut record).unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::InvalidDocument(_)), "got: {err}");
    assert_eq!(record, MetadataRecord::new());
}

/// Well-formed XML without RDF is just as unreadable.
#[test]
fn xml_without_rdf_is_invalid() {
    logger();

    let file = jpeg_with(&[xmp_app1("<note><to>nobody</to></note>")]);
    let err = harvest(&file, &mut MetadataRecord::new()).unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::InvalidDocument(_)));
}

/// Only the first XMP segment counts.
#[test]
fn first_of_two_xmp_segments_wins() {
    logger();

    let file = jpeg_with(&[
        xmp_app1(&xmp_packet(r#"dc:title="First""#, "")),
        xmp_app1(&xmp_packet(r#"dc:title="Second" tiff:Make="Leica""#, "")),
    ]);

    let mut record = MetadataRecord::new();
    harvest(&file, &mut record).unwrap();

    assert_eq!(record.title, "First");
    assert_eq!(record.camera_make, "", "the second segment is never read");
}

/// Unreadable first XMP isn't rescued by a later one.
#[test]
fn broken_first_xmp_is_not_skipped() {
    logger();

    let file = jpeg_with(&[
        xmp_app1("<not xml"),
        xmp_app1(&xmp_packet(r#"dc:title="Second""#, "")),
    ]);

    let mut record = MetadataRecord::new();
    let err = harvest(&file, &mut record).unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::InvalidDocument(_)));
    assert_eq!(record.title, "");
}

/// Two runs over the same bytes give the same record.
#[test]
fn harvesting_is_deterministic() {
    logger();

    let xmp = xmp_packet(
        r#"photoshop:DateCreated="2021-06-21T19:45:00+02:00""#,
        r#"<dc:title><rdf:Alt><rdf:li xml:lang="x-default">Sunset</rdf:li></rdf:Alt></dc:title>
           <dc:subject><rdf:Bag><rdf:li>sun</rdf:li><rdf:li>sea</rdf:li></rdf:Bag></dc:subject>"#,
    );
    let file = jpeg_with(&[xmp_app1(&xmp)]);

    let mut first = MetadataRecord::new();
    let mut second = MetadataRecord::new();
    harvest(&file, &mut first).unwrap();
    harvest(&file, &mut second).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.keywords, vec!["sun", "sea"]);
}

/// Broken framing before any XMP is reported as such.
#[test]
fn bad_framing_without_xmp_is_malformed() {
    logger();

    let file: [u8; 8] = [0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x01, 0xFF, 0xD9];
    let err = harvest(&file, &mut MetadataRecord::new()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedContainer(_)));

    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    let err = harvest(png, &mut MetadataRecord::new()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedContainer(_)));
}

/// Broken framing after the XMP is ignored.
#[test]
fn bad_framing_after_xmp_is_ignored() {
    logger();

    let mut file = vec![0xFF, 0xD8];
    file.extend(xmp_app1(&xmp_packet(r#"dc:title="Sunset""#, "")));
    file.extend([0x00, 0x01, 0x02]);

    let mut record = MetadataRecord::new();
    harvest(&file, &mut record).unwrap();

    assert_eq!(record.title, "Sunset");
}

/// A stream that hands out `SOI`, then panics on its next read.
struct PanicsMidRead {
    reads: usize,
}

impl Read for PanicsMidRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reads += 1;
        if self.reads > 1 {
            panic!("stream blew up on read {}", self.reads);
        }

        buf[..2].copy_from_slice(&[0xFF, 0xD8]);
        Ok(2)
    }
}

impl Seek for PanicsMidRead {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        Ok(match pos {
            SeekFrom::End(_) => 14,
            SeekFrom::Start(_) | SeekFrom::Current(_) => 0,
        })
    }
}

/// A panic from inside the pipeline comes back as an error.
#[test]
fn panicking_stream_is_an_internal_fault() {
    logger();

    let before = MetadataRecord {
        title: "Kept".into(),
        ..Default::default()
    };
    let mut record = before.clone();

    let err = parse_stream(
        "/a/b/evil.jpg",
        &mut PanicsMidRead { reads: 0 },
        14,
        &mut record,
    )
    .unwrap_err();

    match err.kind() {
        ErrorKind::InternalFault { message, .. } => {
            assert!(message.contains("stream blew up on read 2"), "got: {message}");
        }
        other => panic!("expected an internal fault, got {other:?}"),
    }
    assert_eq!(err.file(), "evil.jpg");
    assert_eq!(record, before);

    // the guard keeps working afterwards
    let file = jpeg_with(&[xmp_app1(&xmp_packet(r#"dc:title="Sunset""#, ""))]);
    harvest(&file, &mut record).unwrap();
    assert_eq!(record.title, "Sunset");
}
