/// Locators for the metadata block embedded in image containers
///
/// Each locator scans its container's framing and returns the absolute range
/// of the TIFF-style metadata block, or `None` when the container has none.
/// The located block is then handed unchanged to the IFD decoder.
use tracing::debug;

use super::ifd::{self, TagEntry};
use super::reader::{ByteRange, ByteView, Endian};
use crate::error::Result;

const JPEG_SOI: u16 = 0xFFD8;
const JPEG_APP1: u16 = 0xFFE1;
const JPEG_EXIF_SIGNATURE: &[u8; 6] = b"Exif\0\0";

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const PNG_EXIF_CHUNK: &[u8; 4] = b"eXIf";

const WEBP_EXIF_CHUNK: &[u8; 4] = b"EXIF";

/// Container framing around a metadata block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl ContainerKind {
    /// Container kind for a sniffed MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(ContainerKind::Jpeg),
            "image/png" => Some(ContainerKind::Png),
            "image/webp" => Some(ContainerKind::WebP),
            "image/tiff" => Some(ContainerKind::Tiff),
            _ => None,
        }
    }
}

/// Find the metadata block of a container starting at `offset` within `view`
pub fn locate(kind: ContainerKind, view: &ByteView, offset: usize) -> Option<ByteRange> {
    let found = match kind {
        ContainerKind::Jpeg => locate_jpeg(view, offset),
        ContainerKind::Png => locate_png(view, offset),
        ContainerKind::WebP => locate_webp(view, offset),
        ContainerKind::Tiff => Some(ByteRange::new(view.offset(), view.len())),
    };
    match found {
        Some(range) => debug!("{:?} metadata block at {}+{}", kind, range.offset, range.length),
        None => debug!("{:?} container has no metadata block", kind),
    }
    found
}

/// Locate and decode a container's metadata in one step
pub fn decode_metadata(kind: ContainerKind, view: &ByteView) -> Result<Vec<TagEntry>> {
    match locate(kind, view, 0) {
        Some(range) => ifd::decode(&view.slice(range)),
        None => Ok(Vec::new()),
    }
}

fn locate_jpeg(view: &ByteView, offset: usize) -> Option<ByteRange> {
    let mut pos = offset;
    if view.u16(pos, Endian::Big).ok()? == JPEG_SOI {
        pos += 2;
    }

    loop {
        let marker = view.u16(pos, Endian::Big).ok()?;
        if marker & 0xFF00 != 0xFF00 {
            return None;
        }

        let segment_len = view.u16(pos + 2, Endian::Big).ok()? as usize;
        if marker == JPEG_APP1 && view.matches(pos + 4, JPEG_EXIF_SIGNATURE) {
            let start = view.offset() + pos + 2 + 8;
            return Some(ByteRange::new(start, segment_len.checked_sub(8)?));
        }

        pos += 2 + segment_len;
    }
}

fn locate_png(view: &ByteView, offset: usize) -> Option<ByteRange> {
    let mut pos = offset;
    if view.matches(pos, PNG_SIGNATURE) {
        pos += PNG_SIGNATURE.len();
    }

    while view.has(pos, 8) {
        let chunk_len = view.u32(pos, Endian::Big).ok()? as usize;
        if view.matches(pos + 4, PNG_EXIF_CHUNK) {
            return Some(ByteRange::new(view.offset() + pos + 8, chunk_len));
        }
        pos += 12 + chunk_len;
    }
    None
}

fn locate_webp(view: &ByteView, offset: usize) -> Option<ByteRange> {
    let mut pos = offset;
    if view.matches(pos, b"RIFF") && view.matches(pos + 8, b"WEBP") {
        pos += 12;
    }

    while view.has(pos, 8) {
        let chunk_len = view.u32(pos + 4, Endian::Little).ok()? as usize;
        if view.matches(pos, WEBP_EXIF_CHUNK) {
            return Some(ByteRange::new(view.offset() + pos + 8, chunk_len));
        }
        pos += 8 + chunk_len + (chunk_len & 1);
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::meta::ifd::find_text;
    use crate::meta::ifd::tests::make_block;

    pub(crate) fn jpeg_with_exif(block: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        // An unrelated APP0 segment first
        out.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, b'J', b'F', b'I', b'F']);
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((block.len() + 8) as u16).to_be_bytes());
        out.extend_from_slice(JPEG_EXIF_SIGNATURE);
        out.extend_from_slice(block);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    fn png_with_exif(block: &[u8]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        out.extend_from_slice(&13u32.to_be_bytes());
        out.extend_from_slice(b"IHDR");
        out.extend_from_slice(&[0; 13]);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(block.len() as u32).to_be_bytes());
        out.extend_from_slice(PNG_EXIF_CHUNK);
        out.extend_from_slice(block);
        out.extend_from_slice(&[0; 4]);
        out
    }

    fn webp_with_exif(block: &[u8]) -> Vec<u8> {
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(b"WEBP");
        // Odd-length chunk forces a pad byte
        out.extend_from_slice(b"VP8X");
        out.extend_from_slice(&3u32.to_le_bytes());
        out.extend_from_slice(&[0, 0, 0, 0]);
        out.extend_from_slice(WEBP_EXIF_CHUNK);
        out.extend_from_slice(&(block.len() as u32).to_le_bytes());
        out.extend_from_slice(block);
        out
    }

    fn decoded_make(kind: ContainerKind, bytes: Vec<u8>) -> Option<String> {
        let entries = decode_metadata(kind, &ByteView::new(bytes)).unwrap();
        find_text(&entries, 0x010F).map(str::to_string)
    }

    #[test]
    fn test_jpeg_make_round_trip() {
        let bytes = jpeg_with_exif(&make_block("JPEG"));
        assert_eq!(decoded_make(ContainerKind::Jpeg, bytes).as_deref(), Some("JPEG"));
    }

    #[test]
    fn test_png_make_round_trip() {
        let bytes = png_with_exif(&make_block("PNG "));
        assert_eq!(decoded_make(ContainerKind::Png, bytes).as_deref(), Some("PNG"));
    }

    #[test]
    fn test_webp_make_round_trip() {
        let bytes = webp_with_exif(&make_block("WebP"));
        assert_eq!(decoded_make(ContainerKind::WebP, bytes).as_deref(), Some("WebP"));
    }

    #[test]
    fn test_tiff_make_round_trip() {
        let bytes = make_block("TIFF");
        assert_eq!(decoded_make(ContainerKind::Tiff, bytes).as_deref(), Some("TIFF"));
    }

    #[test]
    fn test_jpeg_without_app1_is_absent() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0x12, 0x34];
        assert_eq!(locate(ContainerKind::Jpeg, &ByteView::new(bytes), 0), None);
    }

    #[test]
    fn test_jpeg_app1_without_signature_is_skipped() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x0A];
        bytes.extend_from_slice(b"http:/\0\0");
        assert_eq!(locate(ContainerKind::Jpeg, &ByteView::new(bytes), 0), None);
    }

    #[test]
    fn test_webp_and_png_chunk_lengths_differ_in_endianness() {
        let block = make_block("SAME");
        let png = png_with_exif(&block);
        let webp = webp_with_exif(&block);

        let png_range = locate(ContainerKind::Png, &ByteView::new(png.clone()), 0).unwrap();
        let webp_range = locate(ContainerKind::WebP, &ByteView::new(webp.clone()), 0).unwrap();
        assert_eq!(png_range.length, block.len());
        assert_eq!(webp_range.length, block.len());

        // The same bytes parsed with the other container's framing do not
        // yield the metadata block
        let png_as_webp = locate(ContainerKind::WebP, &ByteView::new(png), 0);
        assert_ne!(png_as_webp.map(|r| r.length), Some(block.len()));
        let webp_as_png = locate(ContainerKind::Png, &ByteView::new(webp), 0);
        assert_ne!(webp_as_png.map(|r| r.length), Some(block.len()));
    }

    #[test]
    fn test_single_chunk_length_read_differs_by_endianness() {
        // Identical header bytes: length field 00 00 01 00
        let mut png = vec![0x00, 0x00, 0x01, 0x00];
        png.extend_from_slice(b"eXIf");
        png.extend(std::iter::repeat(0).take(0x100));
        let mut webp = b"EXIF".to_vec();
        webp.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);
        webp.extend(std::iter::repeat(0).take(0x100));

        let png_range = locate(ContainerKind::Png, &ByteView::new(png), 0).unwrap();
        let webp_range = locate(ContainerKind::WebP, &ByteView::new(webp), 0).unwrap();
        assert_eq!(png_range.length, 0x100);
        assert_eq!(webp_range.length, 0x0001_0000);
    }

    #[test]
    fn test_from_mime() {
        assert_eq!(ContainerKind::from_mime("image/webp"), Some(ContainerKind::WebP));
        assert_eq!(ContainerKind::from_mime("video/mp4"), None);
    }
}
