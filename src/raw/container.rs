/// Fixed-offset header of the vendor RAW container
///
/// The header stores three (offset, length) pairs as big-endian u32 values
/// pointing at the embedded preview JPEG, the vendor tag block and the sensor
/// data. Nothing else about the file is validated: plausible but wrong
/// offsets decode to wrong in-bounds slices.
use tracing::debug;

use crate::error::Result;
use crate::meta::{self, ByteRange, ByteView, ContainerKind, Endian, TagEntry};

/// Leading magic of files written by the camera
pub const RAW_MAGIC: &[u8; 16] = b"FUJIFILMCCD-RAW ";

const PREVIEW_FIELD: usize = 84;
const VENDOR_TAGS_FIELD: usize = 92;
const SENSOR_DATA_FIELD: usize = 100;

/// Sub-regions of a RAW container. A range is either fully inside the file
/// or absent, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawContainerLayout {
    pub preview: Option<ByteRange>,
    pub vendor_tags: Option<ByteRange>,
    pub sensor_data: Option<ByteRange>,
}

/// True when the bytes start with the vendor RAW magic
pub fn is_raw_container(bytes: &[u8]) -> bool {
    bytes.starts_with(RAW_MAGIC)
}

/// Read the header's region table
pub fn decode_layout(file: &ByteView) -> RawContainerLayout {
    let total = file.len();
    let layout = RawContainerLayout {
        preview: region(file, PREVIEW_FIELD, total),
        vendor_tags: region(file, VENDOR_TAGS_FIELD, total),
        sensor_data: region(file, SENSOR_DATA_FIELD, total),
    };
    debug!(
        "RAW layout: preview={:?} vendor_tags={:?} sensor_data={:?}",
        layout.preview, layout.vendor_tags, layout.sensor_data
    );
    layout
}

fn region(file: &ByteView, field: usize, total: usize) -> Option<ByteRange> {
    let offset = file.u32(field, Endian::Big).ok()? as usize;
    let length = file.u32(field + 4, Endian::Big).ok()? as usize;
    if offset > 0 && length > 0 && offset + length <= total {
        Some(ByteRange::new(file.offset() + offset, length))
    } else {
        None
    }
}

/// Metadata of the embedded preview JPEG, empty when there is none
pub fn preview_metadata(file: &ByteView, layout: &RawContainerLayout) -> Result<Vec<TagEntry>> {
    match layout.preview {
        Some(range) => meta::decode_metadata(ContainerKind::Jpeg, &file.slice(range)),
        None => Ok(Vec::new()),
    }
}
