//! Shared helpers for the integration tests.

#![allow(dead_code)]

/// Initializes the logger for testing.
pub fn logger() {
    _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

/// The signature that starts an XMP APP1 payload.
pub const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// A marker segment with a length field.
pub fn segment(code: u8, payload: &[u8]) -> Vec<u8> {
    let len = u16::try_from(payload.len() + 2).expect("test segment fits");

    let mut out = vec![0xFF, code];
    out.extend(len.to_be_bytes());
    out.extend(payload);
    out
}

/// An APP1 segment carrying `xml` as XMP.
pub fn xmp_app1(xml: &str) -> Vec<u8> {
    segment(0xE1, &[XMP_SIGNATURE, xml.as_bytes()].concat())
}

/// Wraps RDF properties in a full XMP packet.
///
/// `attributes` go on the `rdf:Description`, `elements` inside it.
pub fn xmp_packet(attributes: &str, elements: &str) -> String {
    format!(
        r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:tiff="http://ns.adobe.com/tiff/1.0/"
    xmlns:exif="http://ns.adobe.com/exif/1.0/"
    xmlns:photoshop="http://ns.adobe.com/photoshop/1.0/"
    {attributes}>
   {elements}
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#
    )
}

/// A JPEG with `extra` segments after its JFIF header.
///
/// The image data is 48 bytes of entropy-coded junk, so cutting up to 40
/// bytes from the end only ever lands inside it.
pub fn jpeg_with(extra: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend(segment(0xE0, b"JFIF\0\x01\x02\0\0\x01\0\x01\0\0"));
    for s in extra {
        out.extend(s);
    }
    out.extend(segment(0xDB, &[0x00; 65]));
    out.extend(segment(0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]));

    let mut data: Vec<u8> = (0x10..0x20).collect();
    data.extend([0xFF, 0x00]);
    data.extend(0x20..0x2E);
    data.extend([0xFF, 0xD0]);
    data.extend(0x30..0x3E);
    out.extend(data);

    out.extend([0xFF, 0xD9]);
    out
}

/// Like [`jpeg_with`], but padded with a comment segment to exactly `size`
/// bytes.
pub fn jpeg_sized(extra: &[Vec<u8>], size: usize) -> Vec<u8> {
    let unpadded: usize = jpeg_with(extra).len();
    let filler: usize = size
        .checked_sub(unpadded + 4)
        .expect("requested size fits the segments");

    let mut with_comment: Vec<Vec<u8>> = extra.to_vec();
    with_comment.push(segment(0xFE, &vec![b'.'; filler]));

    let out = jpeg_with(&with_comment);
    assert_eq!(out.len(), size);
    out
}
