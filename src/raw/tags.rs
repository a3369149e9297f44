/// Vendor tag block decoder
///
/// Layout: big-endian u32 record count, then records of
/// `id: u16, len: u16, value: [u8; len]` with no padding. Every record is
/// decoded through a table keyed by tag id; ids without an entry are
/// skipped. The declared count is not trusted as a total length, records are
/// walked by `4 + len` until the count is exhausted.
use tracing::debug;

use crate::error::Result;
use crate::meta::{ByteRange, ByteView, Endian};

/// Decoded vendor tag value
#[derive(Debug, Clone, PartialEq)]
pub enum VendorTagValue {
    Text(String),
    /// Known enumeration constant
    Named(&'static str),
    Integer(i64),
    Float(f64),
    Pair(u32, u32),
}

impl std::fmt::Display for VendorTagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VendorTagValue::Text(s) => write!(f, "{}", s),
            VendorTagValue::Named(s) => write!(f, "{}", s),
            VendorTagValue::Integer(v) => write!(f, "{}", v),
            VendorTagValue::Float(v) => write!(f, "{:.2}", v),
            VendorTagValue::Pair(a, b) => write!(f, "{} x {}", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorTagEntry {
    pub tag: u16,
    pub value: VendorTagValue,
}

impl VendorTagEntry {
    pub fn name(&self) -> &'static str {
        lookup(self.tag).map(|t| t.name).unwrap_or("Unknown")
    }
}

pub const RAW_IMAGE_FULL_SIZE: u16 = 0x0100;
pub const RAW_IMAGE_CROP_TOP_LEFT: u16 = 0x0110;
pub const RAW_IMAGE_CROPPED_SIZE: u16 = 0x0111;
pub const RAW_IMAGE_ASPECT_RATIO: u16 = 0x0115;
pub const RAW_IMAGE_SIZE: u16 = 0x0121;
pub const FUJI_LAYOUT: u16 = 0x0130;
pub const QUALITY: u16 = 0x1000;
pub const SHARPNESS: u16 = 0x1001;
pub const WHITE_BALANCE: u16 = 0x1002;
pub const SATURATION: u16 = 0x1003;
pub const FLASH_MODE: u16 = 0x1010;
pub const PICTURE_MODE: u16 = 0x1031;
pub const WB_GRB_LEVELS: u16 = 0x2FF0;
pub const RAW_EXPOSURE_BIAS: u16 = 0x9650;

/// Decoders receive a view over exactly the record's value bytes
type Decoder = fn(&ByteView) -> Result<Option<VendorTagValue>>;

/// One row of the dispatch table
struct VendorTag {
    id: u16,
    name: &'static str,
    decode: Decoder,
}

const SHARPNESS_NAMES: &[(u32, &str)] = &[
    (0x00, "Softest"),
    (0x01, "Very Soft"),
    (0x02, "Soft"),
    (0x03, "Normal"),
    (0x04, "Hard"),
    (0x05, "Very Hard"),
    (0x06, "Hardest"),
    (0x82, "Medium Soft"),
    (0x84, "Medium Hard"),
];

const WHITE_BALANCE_NAMES: &[(u32, &str)] = &[
    (0x000, "Auto"),
    (0x100, "Daylight"),
    (0x200, "Cloudy"),
    (0x300, "Daylight Fluorescent"),
    (0x301, "Day White Fluorescent"),
    (0x302, "White Fluorescent"),
    (0x400, "Incandescent"),
    (0x500, "Flash"),
    (0x600, "Underwater"),
    (0xF00, "Custom"),
    (0xFF0, "Kelvin"),
];

const SATURATION_NAMES: &[(u32, &str)] = &[
    (0x000, "Normal"),
    (0x080, "Medium High"),
    (0x100, "High"),
    (0x180, "Medium Low"),
    (0x200, "Low"),
    (0x300, "None (B&W)"),
];

const FLASH_MODE_NAMES: &[(u32, &str)] = &[
    (0x0, "Auto"),
    (0x1, "On"),
    (0x2, "Off"),
    (0x3, "Red-eye reduction"),
    (0x4, "External"),
];

const PICTURE_MODE_NAMES: &[(u32, &str)] = &[
    (0x000, "Auto"),
    (0x001, "Portrait"),
    (0x002, "Landscape"),
    (0x003, "Macro"),
    (0x004, "Sports"),
    (0x005, "Night Scene"),
    (0x006, "Program AE"),
    (0x100, "Aperture-priority AE"),
    (0x200, "Shutter speed priority AE"),
    (0x300, "Manual"),
];

static TABLE: &[VendorTag] = &[
    VendorTag { id: RAW_IMAGE_FULL_SIZE, name: "RawImageFullSize", decode: pair_u16 },
    VendorTag { id: RAW_IMAGE_CROP_TOP_LEFT, name: "RawImageCropTopLeft", decode: pair_u16 },
    VendorTag { id: RAW_IMAGE_CROPPED_SIZE, name: "RawImageCroppedSize", decode: pair_u16 },
    VendorTag { id: RAW_IMAGE_ASPECT_RATIO, name: "RawImageAspectRatio", decode: pair_u16 },
    VendorTag { id: RAW_IMAGE_SIZE, name: "RawImageSize", decode: pair_u16 },
    VendorTag { id: FUJI_LAYOUT, name: "FujiLayout", decode: layout },
    VendorTag { id: QUALITY, name: "Quality", decode: text },
    VendorTag { id: SHARPNESS, name: "Sharpness", decode: sharpness },
    VendorTag { id: WHITE_BALANCE, name: "WhiteBalance", decode: white_balance },
    VendorTag { id: SATURATION, name: "Saturation", decode: saturation },
    VendorTag { id: FLASH_MODE, name: "FlashMode", decode: flash_mode },
    VendorTag { id: PICTURE_MODE, name: "PictureMode", decode: picture_mode },
    VendorTag { id: WB_GRB_LEVELS, name: "WB_GRBLevels", decode: wb_levels },
    VendorTag { id: RAW_EXPOSURE_BIAS, name: "RawExposureBias", decode: exposure_bias },
];

fn lookup(id: u16) -> Option<&'static VendorTag> {
    TABLE.iter().find(|t| t.id == id)
}

fn pair_u16(v: &ByteView) -> Result<Option<VendorTagValue>> {
    let a = v.u16(0, Endian::Big)? as u32;
    let b = v.u16(2, Endian::Big)? as u32;
    Ok(Some(VendorTagValue::Pair(a, b)))
}

fn layout(v: &ByteView) -> Result<Option<VendorTagValue>> {
    Ok(Some(VendorTagValue::Integer(v.u8(0)? as i64)))
}

fn text(v: &ByteView) -> Result<Option<VendorTagValue>> {
    Ok(Some(VendorTagValue::Text(v.ascii(0, v.len())?)))
}

fn wb_levels(v: &ByteView) -> Result<Option<VendorTagValue>> {
    // G at +0 is the reference; expose R and B
    let r = v.u16(2, Endian::Big)? as u32;
    let b = v.u16(4, Endian::Big)? as u32;
    Ok(Some(VendorTagValue::Pair(r, b)))
}

fn exposure_bias(v: &ByteView) -> Result<Option<VendorTagValue>> {
    let num = v.i16(0, Endian::Big)?;
    let den = v.u16(2, Endian::Big)?;
    Ok(Some(VendorTagValue::Float(num as f64 / den as f64)))
}

fn sharpness(v: &ByteView) -> Result<Option<VendorTagValue>> {
    enum_u16(v, SHARPNESS_NAMES)
}

fn white_balance(v: &ByteView) -> Result<Option<VendorTagValue>> {
    enum_u16(v, WHITE_BALANCE_NAMES)
}

fn saturation(v: &ByteView) -> Result<Option<VendorTagValue>> {
    enum_u16(v, SATURATION_NAMES)
}

fn flash_mode(v: &ByteView) -> Result<Option<VendorTagValue>> {
    enum_u16(v, FLASH_MODE_NAMES)
}

fn picture_mode(v: &ByteView) -> Result<Option<VendorTagValue>> {
    enum_u16(v, PICTURE_MODE_NAMES)
}

fn enum_u16(v: &ByteView, names: &[(u32, &'static str)]) -> Result<Option<VendorTagValue>> {
    Ok(Some(named(v.u16(0, Endian::Big)? as u32, names)))
}

/// Name of a raw enum value when it is a known constant, the raw value otherwise
pub fn named(raw: u32, names: &[(u32, &'static str)]) -> VendorTagValue {
    names
        .iter()
        .find(|(value, _)| *value == raw)
        .map(|(_, name)| VendorTagValue::Named(*name))
        .unwrap_or(VendorTagValue::Integer(raw as i64))
}

/// Decode every recognised record of a vendor tag block
pub fn decode(block: &ByteView) -> Result<Vec<VendorTagEntry>> {
    let count = block.u32(0, Endian::Big)?;
    let mut entries = Vec::new();
    let mut pos = 4;

    for _ in 0..count {
        let tag = block.u16(pos, Endian::Big)?;
        let len = block.u16(pos + 2, Endian::Big)? as usize;
        let value_at = pos + 4;

        if let Some(desc) = lookup(tag) {
            let value_view = block.slice(ByteRange::new(block.offset() + value_at, len));
            if let Some(value) = (desc.decode)(&value_view)? {
                entries.push(VendorTagEntry { tag, value });
            }
        }

        pos = value_at + len;
    }

    debug!("Decoded {} of {} vendor tags", entries.len(), count);
    Ok(entries)
}

/// First value recorded for `tag`
pub fn find(entries: &[VendorTagEntry], tag: u16) -> Option<&VendorTagValue> {
    entries.iter().find(|e| e.tag == tag).map(|e| &e.value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn block(records: &[(u16, Vec<u8>)]) -> Vec<u8> {
        let mut out = (records.len() as u32).to_be_bytes().to_vec();
        for (tag, value) in records {
            out.extend_from_slice(&tag.to_be_bytes());
            out.extend_from_slice(&(value.len() as u16).to_be_bytes());
            out.extend_from_slice(value);
        }
        out
    }

    fn be16(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_three_entry_block() {
        let bytes = block(&[
            (QUALITY, b"FINE".to_vec()),
            (SHARPNESS, be16(&[3])),
            (RAW_IMAGE_FULL_SIZE, be16(&[100, 200])),
        ]);
        let entries = decode(&ByteView::new(bytes)).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(find(&entries, QUALITY), Some(&VendorTagValue::Text("FINE".into())));
        assert_eq!(find(&entries, SHARPNESS), Some(&VendorTagValue::Named("Normal")));
        assert_eq!(find(&entries, RAW_IMAGE_FULL_SIZE), Some(&VendorTagValue::Pair(100, 200)));
    }

    #[test]
    fn test_unknown_enum_value_falls_back_to_integer() {
        let bytes = block(&[(WHITE_BALANCE, be16(&[0x1234]))]);
        let entries = decode(&ByteView::new(bytes)).unwrap();
        assert_eq!(entries[0].value, VendorTagValue::Integer(0x1234));
    }

    #[test]
    fn test_unknown_tags_are_dropped_and_skipped_by_length() {
        let bytes = block(&[
            (0xBEEF, vec![1, 2, 3, 4, 5, 6, 7]),
            (FLASH_MODE, be16(&[2])),
        ]);
        let entries = decode(&ByteView::new(bytes)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, VendorTagValue::Named("Off"));
        assert_eq!(entries[0].name(), "FlashMode");
    }

    #[test]
    fn test_record_advance_ignores_consumed_length() {
        // Sharpness consumes 2 bytes but declares 6
        let bytes = block(&[
            (SHARPNESS, be16(&[0x82, 0xAAAA, 0xBBBB])),
            (RAW_IMAGE_SIZE, be16(&[4000, 6000])),
        ]);
        let entries = decode(&ByteView::new(bytes)).unwrap();
        assert_eq!(entries[0].value, VendorTagValue::Named("Medium Soft"));
        assert_eq!(entries[1].value, VendorTagValue::Pair(4000, 6000));
    }

    #[test]
    fn test_exposure_bias_and_wb_levels() {
        let mut bias = (-2i16).to_be_bytes().to_vec();
        bias.extend_from_slice(&3u16.to_be_bytes());
        let bytes = block(&[
            (RAW_EXPOSURE_BIAS, bias),
            (WB_GRB_LEVELS, be16(&[302, 520, 710])),
        ]);
        let entries = decode(&ByteView::new(bytes)).unwrap();
        match &entries[0].value {
            VendorTagValue::Float(v) => assert!((v + 2.0 / 3.0).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(entries[1].value, VendorTagValue::Pair(520, 710));
    }

    #[test]
    fn test_truncated_block_is_an_error() {
        let mut bytes = block(&[(RAW_IMAGE_SIZE, be16(&[1, 2]))]);
        bytes.truncate(7);
        assert!(decode(&ByteView::new(bytes)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(VendorTagValue::Pair(4000, 6000).to_string(), "4000 x 6000");
        assert_eq!(VendorTagValue::Named("Auto").to_string(), "Auto");
    }
}
