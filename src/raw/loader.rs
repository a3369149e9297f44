/// RAW sensor data loader
///
/// Splits a vendor RAW container into its parts: preview metadata, vendor
/// tags and the 16-bit sensor mosaic that the GPU pipeline demosaics.
use tracing::{debug, warn};

use super::container::{self, RawContainerLayout};
use super::tags::{self, VendorTagEntry, VendorTagValue};
use crate::error::Result;
use crate::meta::{ByteView, TagEntry};

/// Single-channel sensor readout
#[derive(Debug, Clone, PartialEq)]
pub struct Mosaic {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
}

impl Mosaic {
    /// Half-resolution copy with the same CFA layout
    ///
    /// Each output photosite averages the four photosites of its color in
    /// the matching 4x4 block, so output (x, y) keeps the color of input
    /// (x, y) and the CFA phase carries over. Odd trailing rows and columns
    /// are dropped. `None` when the mosaic is smaller than one 4x4 block.
    pub fn binned(&self) -> Option<Mosaic> {
        let width = self.width / 4 * 2;
        let height = self.height / 4 * 2;
        if width == 0 || height == 0 {
            return None;
        }

        let stride = self.width as usize;
        let sample = |x: usize, y: usize| self.data.get(y * stride + x).copied().unwrap_or(0) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as usize {
            let top = y / 2 * 4 + y % 2;
            for x in 0..width as usize {
                let left = x / 2 * 4 + x % 2;
                let sum = sample(left, top)
                    + sample(left + 2, top)
                    + sample(left, top + 2)
                    + sample(left + 2, top + 2);
                data.push(((sum + 2) / 4) as u16);
            }
        }

        Some(Mosaic { width, height, data })
    }
}

/// Mosaic dimensions recorded in the vendor tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSensorInfo {
    pub width: u32,
    pub height: u32,
}

impl RawSensorInfo {
    /// Prefer the stored raw size, fall back to the full sensor size.
    /// Both tags store (height, width).
    pub fn from_tags(entries: &[VendorTagEntry]) -> Option<Self> {
        let pair = tags::find(entries, tags::RAW_IMAGE_SIZE)
            .or_else(|| tags::find(entries, tags::RAW_IMAGE_FULL_SIZE))?;
        match *pair {
            VendorTagValue::Pair(height, width) if width > 0 && height > 0 => {
                Some(Self { width, height })
            }
            _ => None,
        }
    }
}

/// Everything decoded from a RAW container
#[derive(Debug, Clone, Default)]
pub struct RawImage {
    pub layout: RawContainerLayout,
    /// Metadata of the embedded preview JPEG
    pub preview_tags: Vec<TagEntry>,
    pub vendor_tags: Vec<VendorTagEntry>,
    /// `None` when the container has no sensor region, no dimensions, or too
    /// few bytes for the declared dimensions
    pub mosaic: Option<Mosaic>,
}

/// Decode a RAW container held in `file`
pub fn decode_raw(file: &ByteView, sensor_little_endian: bool) -> Result<RawImage> {
    let layout = container::decode_layout(file);
    let preview_tags = container::preview_metadata(file, &layout)?;

    let vendor_tags = match layout.vendor_tags {
        Some(range) => tags::decode(&file.slice(range))?,
        None => Vec::new(),
    };

    let mosaic = match (layout.sensor_data, RawSensorInfo::from_tags(&vendor_tags)) {
        (Some(range), Some(info)) => {
            let sensor = file.absolute(range)?;
            unpack_mosaic(sensor, info, sensor_little_endian)
        }
        _ => None,
    };

    debug!(
        "RAW decode: {} preview tags, {} vendor tags, mosaic={:?}",
        preview_tags.len(),
        vendor_tags.len(),
        mosaic.as_ref().map(|m| (m.width, m.height))
    );

    Ok(RawImage {
        layout,
        preview_tags,
        vendor_tags,
        mosaic,
    })
}

fn unpack_mosaic(sensor: &[u8], info: RawSensorInfo, little_endian: bool) -> Option<Mosaic> {
    let pixels = info.width as usize * info.height as usize;
    if sensor.len() < pixels * 2 {
        warn!(
            "Sensor region holds {} bytes, {}x{} needs {}",
            sensor.len(),
            info.width,
            info.height,
            pixels * 2
        );
        return None;
    }

    let data = sensor[..pixels * 2]
        .chunks_exact(2)
        .map(|b| {
            if little_endian {
                u16::from_le_bytes([b[0], b[1]])
            } else {
                u16::from_be_bytes([b[0], b[1]])
            }
        })
        .collect();

    Some(Mosaic {
        width: info.width,
        height: info.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::container::tests::header;
    use crate::raw::tags::tests::block;

    fn raw_file(width: u16, height: u16, samples: &[u16]) -> Vec<u8> {
        let mut size = height.to_be_bytes().to_vec();
        size.extend_from_slice(&width.to_be_bytes());
        let tag_block = block(&[(tags::RAW_IMAGE_SIZE, size)]);
        let sensor: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();

        let tags_at = 108u32;
        let sensor_at = tags_at + tag_block.len() as u32;
        let mut out = header(
            [(0, 0), (tags_at, tag_block.len() as u32), (sensor_at, sensor.len() as u32)],
            108,
        );
        out.extend_from_slice(&tag_block);
        out.extend_from_slice(&sensor);
        out
    }

    #[test]
    fn test_decode_mosaic() {
        let bytes = raw_file(2, 2, &[10, 20, 30, 4095]);
        let raw = decode_raw(&ByteView::new(bytes), false).unwrap();
        let mosaic = raw.mosaic.unwrap();
        assert_eq!((mosaic.width, mosaic.height), (2, 2));
        assert_eq!(mosaic.data, vec![10, 20, 30, 4095]);
        assert!(raw.preview_tags.is_empty());
    }

    #[test]
    fn test_short_sensor_region_has_no_mosaic() {
        let bytes = raw_file(4, 4, &[1, 2, 3]);
        let raw = decode_raw(&ByteView::new(bytes), false).unwrap();
        assert!(raw.mosaic.is_none());
        assert_eq!(raw.vendor_tags.len(), 1);
    }

    #[test]
    fn test_sensor_info_falls_back_to_full_size() {
        let entries = vec![VendorTagEntry {
            tag: tags::RAW_IMAGE_FULL_SIZE,
            value: VendorTagValue::Pair(3000, 4000),
        }];
        assert_eq!(
            RawSensorInfo::from_tags(&entries),
            Some(RawSensorInfo { width: 4000, height: 3000 })
        );
    }

    #[test]
    fn test_binning_keeps_cfa_layout() {
        // Value encodes the 2x2 site, plus a per-block offset on red sites
        let data = (0..8u16)
            .flat_map(|y| {
                (0..8u16).map(move |x| match (x % 2, y % 2) {
                    (0, 0) => 1000 + x * 10,
                    (1, 0) => 2000,
                    (0, 1) => 3000,
                    _ => 4000,
                })
            })
            .collect();
        let mosaic = Mosaic { width: 8, height: 8, data };

        let binned = mosaic.binned().unwrap();
        assert_eq!((binned.width, binned.height), (4, 4));
        assert_eq!(binned.data.len(), 16);
        // Red at (0, 0) averages x = 0 and x = 2; red at (2, 0) averages x = 4 and x = 6
        assert_eq!(binned.data[0], 1010);
        assert_eq!(binned.data[2], 1050);
        assert_eq!(binned.data[1], 2000);
        assert_eq!(binned.data[4], 3000);
        assert_eq!(binned.data[5], 4000);
        assert_eq!(binned.data[15], 4000);
    }

    #[test]
    fn test_binning_drops_partial_blocks() {
        let mosaic = Mosaic {
            width: 10,
            height: 5,
            data: vec![7; 50],
        };
        let binned = mosaic.binned().unwrap();
        assert_eq!((binned.width, binned.height), (4, 2));
        assert!(binned.data.iter().all(|&v| v == 7));

        let tiny = Mosaic {
            width: 3,
            height: 8,
            data: vec![0; 24],
        };
        assert!(tiny.binned().is_none());
    }

    #[test]
    fn test_little_endian_samples() {
        let sensor = [0x01, 0x02];
        let mosaic = unpack_mosaic(&sensor, RawSensorInfo { width: 1, height: 1 }, true).unwrap();
        assert_eq!(mosaic.data, vec![0x0201]);
    }
}
