/// Load a selected file for display
///
/// Reads the bytes asynchronously, then decodes on a blocking thread:
/// - RAW containers give a sensor mosaic, vendor tags and preview metadata
/// - Everything else is decoded as a bitmap, with its EXIF block if any
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SensorConfig;
use crate::error::LoadError;
use crate::gpu::SourcePixels;
use crate::meta::{self, ByteView, ContainerKind};
use crate::raw::{self, decode_raw};
use crate::state::library::RAW_MIME;
use crate::state::{FileItem, ResultKey};

/// Longest side of the reduced copy used for histograms
pub const THUMBNAIL_EDGE: u32 = 1024;

/// One row of the metadata panel
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub name: String,
    pub value: String,
}

/// A decoded file ready for the viewer
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub name: String,
    pub source: SourcePixels,
    /// `source` reduced to `THUMBNAIL_EDGE`, rendered for the histogram
    pub thumbnail: SourcePixels,
    /// Identity of `source`, stable across lighting changes
    pub key: ResultKey,
    pub metadata: Vec<MetadataRow>,
}

/// Read and decode `item`
pub async fn load(item: FileItem, sensor: SensorConfig) -> Result<LoadedImage, LoadError> {
    let bytes = item.handle.read().await?;
    let path = item.handle.path.clone();
    let name = item.handle.name.clone();
    let mime = item.mime_type.clone();
    info!("📂 Loading {} ({} bytes)", name, bytes.len());

    tokio::task::spawn_blocking(move || -> Result<LoadedImage, LoadError> {
        let view = ByteView::new(bytes);
        let (source, metadata) = decode_bytes(&view, mime.as_deref(), &sensor)?;
        let (width, height) = source.dimensions();
        Ok(LoadedImage {
            key: ResultKey::source(&path, view.as_slice(), width, height),
            thumbnail: source.fit_within(THUMBNAIL_EDGE),
            path,
            name,
            source,
            metadata,
        })
    })
    .await?
}

/// Decode file bytes according to their sniffed MIME type
pub fn decode_bytes(
    view: &ByteView,
    mime: Option<&str>,
    sensor: &SensorConfig,
) -> Result<(SourcePixels, Vec<MetadataRow>), LoadError> {
    let is_raw = mime == Some(RAW_MIME) || raw::is_raw_container(view.as_slice());
    if is_raw {
        decode_raw_file(view, sensor)
    } else {
        decode_bitmap_file(view, mime)
    }
}

fn decode_raw_file(view: &ByteView, sensor: &SensorConfig) -> Result<(SourcePixels, Vec<MetadataRow>), LoadError> {
    let raw = decode_raw(view, sensor.little_endian)?;

    let preview = match raw.layout.preview {
        Some(range) => {
            match image::load_from_memory_with_format(view.absolute(range)?, image::ImageFormat::Jpeg) {
                Ok(decoded) => Some(decoded.to_rgba8()),
                Err(e) => {
                    warn!("Embedded preview could not be decoded: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let mut metadata: Vec<MetadataRow> = raw
        .preview_tags
        .iter()
        .map(|entry| MetadataRow {
            name: entry.name(),
            value: entry.display(),
        })
        .collect();
    metadata.extend(raw.vendor_tags.iter().map(|entry| MetadataRow {
        name: entry.name().to_string(),
        value: entry.value.to_string(),
    }));

    let source = match (raw.mosaic, preview) {
        (Some(mosaic), _) => SourcePixels::Mosaic(Arc::new(mosaic)),
        (None, Some(preview)) => {
            warn!("No usable sensor data, showing the embedded preview");
            SourcePixels::rgba(preview)
        }
        (None, None) => return Err(LoadError::NoSensorData),
    };

    Ok((source, metadata))
}

fn decode_bitmap_file(view: &ByteView, mime: Option<&str>) -> Result<(SourcePixels, Vec<MetadataRow>), LoadError> {
    let image = image::load_from_memory(view.as_slice())?.to_rgba8();

    let tags = match mime.and_then(ContainerKind::from_mime) {
        Some(kind) => meta::decode_metadata(kind, view)?,
        None => Vec::new(),
    };
    let metadata = tags
        .iter()
        .map(|entry| MetadataRow {
            name: entry.name(),
            value: entry.display(),
        })
        .collect();

    Ok((SourcePixels::rgba(image), metadata))
}
