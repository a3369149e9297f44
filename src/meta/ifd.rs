/// Tag/IFD decoder for TIFF-family metadata blocks
///
/// A metadata block starts with an 8-byte header (byte order magic, two
/// unused bytes, first-directory pointer). All pointers inside the block are
/// relative to the block start, not to the file.
use std::collections::HashSet;
use tracing::debug;

use super::reader::{ByteRange, ByteView, Endian};
use crate::error::Result;

/// Tag whose value points at a secondary directory (EXIF sub-IFD)
pub const SUB_IFD_POINTER: u16 = 0x8769;

const ENTRY_STRIDE: usize = 12;
const HEADER_LEN: u32 = 8;

/// On-disk value type of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    Undefined,
    SShort,
    SLong,
    SRational,
    Unknown(u16),
}

impl TagType {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => TagType::Byte,
            2 => TagType::Ascii,
            3 => TagType::Short,
            4 => TagType::Long,
            5 => TagType::Rational,
            7 => TagType::Undefined,
            8 => TagType::SShort,
            9 => TagType::SLong,
            10 => TagType::SRational,
            other => TagType::Unknown(other),
        }
    }

    /// Size in bytes of one element
    pub fn size(&self) -> usize {
        match self {
            TagType::Byte | TagType::Ascii | TagType::Undefined => 1,
            TagType::Short | TagType::SShort => 2,
            TagType::Long | TagType::SLong => 4,
            TagType::Rational | TagType::SRational => 8,
            TagType::Unknown(_) => 0,
        }
    }
}

/// Decoded entry value. The variant is fixed by the entry's `TagType`.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Bytes(ByteRange),
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub tag: u16,
    pub kind: TagType,
    /// `None` when the type is not one we decode
    pub value: Option<TagValue>,
}

impl TagEntry {
    /// Human-readable name of the tag, or its hex id
    pub fn name(&self) -> String {
        tag_name(self.tag)
            .map(str::to_string)
            .unwrap_or_else(|| format!("0x{:04X}", self.tag))
    }

    /// Value formatted for the metadata panel
    pub fn display(&self) -> String {
        match &self.value {
            Some(TagValue::Text(s)) => s.clone(),
            Some(TagValue::Bytes(r)) => format!("{} bytes", r.length),
            Some(TagValue::Integer(v)) => v.to_string(),
            Some(TagValue::Float(v)) if self.tag == TAG_EXPOSURE_TIME && *v > 0.0 && *v < 1.0 => {
                format!("1/{:.0}", 1.0 / v)
            }
            Some(TagValue::Float(v)) => format!("{:.2}", v),
            None => String::from("-"),
        }
    }
}

const TAG_EXPOSURE_TIME: u16 = 0x829A;

/// Display names of the tags the metadata panel shows
pub fn tag_name(tag: u16) -> Option<&'static str> {
    Some(match tag {
        0x010E => "ImageDescription",
        0x010F => "Make",
        0x0110 => "Model",
        0x0112 => "Orientation",
        0x011A => "XResolution",
        0x011B => "YResolution",
        0x0128 => "ResolutionUnit",
        0x0131 => "Software",
        0x0132 => "DateTime",
        0x013B => "Artist",
        0x8298 => "Copyright",
        TAG_EXPOSURE_TIME => "ExposureTime",
        0x829D => "FNumber",
        0x8822 => "ExposureProgram",
        0x8827 => "ISO",
        SUB_IFD_POINTER => "ExifOffset",
        0x9000 => "ExifVersion",
        0x9003 => "DateTimeOriginal",
        0x9004 => "CreateDate",
        0x9201 => "ShutterSpeedValue",
        0x9202 => "ApertureValue",
        0x9204 => "ExposureCompensation",
        0x9207 => "MeteringMode",
        0x9209 => "Flash",
        0x920A => "FocalLength",
        0x927C => "MakerNote",
        0xA002 => "ExifImageWidth",
        0xA003 => "ExifImageHeight",
        0xA405 => "FocalLengthIn35mmFormat",
        0xA433 => "LensMake",
        0xA434 => "LensModel",
        _ => return None,
    })
}

/// Decode every entry reachable from the block's first directory.
///
/// Structural problems (bad pointer, empty directory) give an empty or short
/// list. Reads past the end of the file are errors.
pub fn decode(block: &ByteView) -> Result<Vec<TagEntry>> {
    let endian = if block.u16(0, Endian::Big)? == 0x4949 {
        Endian::Little
    } else {
        Endian::Big
    };

    let first = block.u32(4, endian)?;
    if first < HEADER_LEN {
        debug!("IFD pointer {} inside header, no entries", first);
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    read_directory(block, endian, first as usize, &mut entries, &mut visited)?;
    debug!("Decoded {} metadata entries", entries.len());
    Ok(entries)
}

fn read_directory(
    block: &ByteView,
    endian: Endian,
    at: usize,
    entries: &mut Vec<TagEntry>,
    visited: &mut HashSet<usize>,
) -> Result<()> {
    if !visited.insert(at) {
        return Ok(());
    }

    let count = block.u16(at, endian)? as usize;
    for i in 0..count {
        let entry_at = at + 2 + i * ENTRY_STRIDE;
        let entry = read_entry(block, endian, entry_at)?;

        let sub_ifd = match (&entry.tag, &entry.value) {
            (&SUB_IFD_POINTER, Some(TagValue::Integer(ptr))) => Some(*ptr as usize),
            _ => None,
        };
        entries.push(entry);

        if let Some(ptr) = sub_ifd {
            read_directory(block, endian, ptr, entries, visited)?;
        }
    }
    Ok(())
}

fn read_entry(block: &ByteView, endian: Endian, at: usize) -> Result<TagEntry> {
    let tag = block.u16(at, endian)?;
    let kind = TagType::from_code(block.u16(at + 2, endian)?);
    let count = block.u32(at + 4, endian)? as usize;

    let size = kind.size() * count;
    let value_at = if size > 4 {
        block.u32(at + 8, endian)? as usize
    } else {
        at + 8
    };

    let value = match kind {
        TagType::Ascii => Some(TagValue::Text(block.ascii(value_at, count)?)),
        TagType::Byte | TagType::Undefined => Some(TagValue::Bytes(block.bytes(value_at, count)?)),
        TagType::Short => Some(TagValue::Integer(block.u16(value_at, endian)? as i64)),
        TagType::SShort => Some(TagValue::Integer(block.i16(value_at, endian)? as i64)),
        TagType::Long => Some(TagValue::Integer(block.u32(value_at, endian)? as i64)),
        TagType::SLong => Some(TagValue::Integer(block.i32(value_at, endian)? as i64)),
        TagType::Rational => Some(TagValue::Float(block.rational(value_at, endian)?)),
        TagType::SRational => Some(TagValue::Float(block.srational(value_at, endian)?)),
        TagType::Unknown(_) => None,
    };

    Ok(TagEntry { tag, kind, value })
}

/// First text value for `tag`
#[cfg(test)]
pub fn find_text(entries: &[TagEntry], tag: u16) -> Option<&str> {
    entries.iter().find_map(|e| match (&e.value, e.tag == tag) {
        (Some(TagValue::Text(s)), true) => Some(s.as_str()),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a metadata block for tests: header plus one IFD at offset 8.
    /// Each entry is (tag, type, count, 4-byte value field); `tail` is
    /// appended after the directory and may hold out-of-line values.
    pub(crate) fn build_block(little: bool, entries: &[(u16, u16, u32, [u8; 4])], tail: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let w16 = |out: &mut Vec<u8>, v: u16| {
            if little {
                out.extend_from_slice(&v.to_le_bytes())
            } else {
                out.extend_from_slice(&v.to_be_bytes())
            }
        };
        let w32 = |out: &mut Vec<u8>, v: u32| {
            if little {
                out.extend_from_slice(&v.to_le_bytes())
            } else {
                out.extend_from_slice(&v.to_be_bytes())
            }
        };
        out.extend_from_slice(if little { b"II" } else { b"MM" });
        w16(&mut out, 42);
        w32(&mut out, 8);
        w16(&mut out, entries.len() as u16);
        for (tag, kind, count, value) in entries {
            w16(&mut out, *tag);
            w16(&mut out, *kind);
            w32(&mut out, *count);
            out.extend_from_slice(value);
        }
        w32(&mut out, 0);
        out.extend_from_slice(tail);
        out
    }

    /// Block holding a single inline-or-pointed ASCII "Make" tag
    pub(crate) fn make_block(make: &str) -> Vec<u8> {
        let mut text = make.as_bytes().to_vec();
        text.push(0);
        let count = text.len() as u32;
        if text.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..text.len()].copy_from_slice(&text);
            build_block(false, &[(0x010F, 2, count, inline)], &[])
        } else {
            // header 8 + count 2 + one entry 12 + next pointer 4
            let ptr: u32 = 8 + 2 + 12 + 4;
            build_block(false, &[(0x010F, 2, count, ptr.to_be_bytes())], &text)
        }
    }

    #[test]
    fn test_decode_out_of_line_ascii() {
        let block = make_block("FUJIFILM");
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TagType::Ascii);
        assert_eq!(find_text(&entries, 0x010F), Some("FUJIFILM"));
        assert_eq!(entries[0].name(), "Make");
    }

    #[test]
    fn test_decode_little_endian_short() {
        let block = build_block(true, &[(0x0112, 3, 1, [6, 0, 0, 0])], &[]);
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries[0].value, Some(TagValue::Integer(6)));
    }

    #[test]
    fn test_any_other_magic_is_big_endian() {
        let mut block = build_block(false, &[(0x0112, 3, 1, [0, 6, 0, 0])], &[]);
        block[0] = b'X';
        block[1] = b'Y';
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries[0].value, Some(TagValue::Integer(6)));
    }

    #[test]
    fn test_pointer_inside_header_is_empty() {
        let mut block = build_block(false, &[(0x0112, 3, 1, [0, 6, 0, 0])], &[]);
        block[4..8].copy_from_slice(&4u32.to_be_bytes());
        assert!(decode(&ByteView::new(block)).unwrap().is_empty());
    }

    #[test]
    fn test_follows_sub_ifd_pointer() {
        // IFD0 at 8 (1 entry, 18 bytes), sub-IFD right after at 26
        let sub_at: u32 = 8 + 2 + 12 + 4;
        let mut tail = Vec::new();
        tail.extend_from_slice(&1u16.to_be_bytes());
        tail.extend_from_slice(&0x8827u16.to_be_bytes());
        tail.extend_from_slice(&3u16.to_be_bytes());
        tail.extend_from_slice(&1u32.to_be_bytes());
        tail.extend_from_slice(&[0x01, 0x90, 0, 0]);
        tail.extend_from_slice(&0u32.to_be_bytes());

        let block = build_block(false, &[(SUB_IFD_POINTER, 4, 1, sub_at.to_be_bytes())], &tail);
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, SUB_IFD_POINTER);
        assert_eq!(entries[1].tag, 0x8827);
        assert_eq!(entries[1].value, Some(TagValue::Integer(400)));
    }

    #[test]
    fn test_self_referencing_sub_ifd_terminates() {
        let block = build_block(false, &[(SUB_IFD_POINTER, 4, 1, 8u32.to_be_bytes())], &[]);
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_unknown_type_yields_none() {
        let block = build_block(false, &[(0x1234, 12, 1, [0; 4])], &[]);
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries[0].kind, TagType::Unknown(12));
        assert_eq!(entries[0].value, None);
    }

    #[test]
    fn test_rational_zero_denominator_is_not_fixed_up() {
        let ptr: u32 = 8 + 2 + 12 + 4;
        let mut tail = Vec::new();
        tail.extend_from_slice(&1u32.to_be_bytes());
        tail.extend_from_slice(&0u32.to_be_bytes());
        let block = build_block(false, &[(TAG_EXPOSURE_TIME, 5, 1, ptr.to_be_bytes())], &tail);
        let entries = decode(&ByteView::new(block)).unwrap();
        assert_eq!(entries[0].value, Some(TagValue::Float(f64::INFINITY)));
        assert_eq!(entries[0].display(), "inf");
    }

    #[test]
    fn test_exposure_time_display() {
        let entry = TagEntry {
            tag: TAG_EXPOSURE_TIME,
            kind: TagType::Rational,
            value: Some(TagValue::Float(1.0 / 250.0)),
        };
        assert_eq!(entry.display(), "1/250");
    }

    #[test]
    fn test_out_of_file_value_pointer_is_an_error() {
        let block = build_block(false, &[(0x010F, 2, 64, 9000u32.to_be_bytes())], &[]);
        assert!(decode(&ByteView::new(block)).is_err());
    }
}
