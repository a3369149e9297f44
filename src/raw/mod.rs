/// Vendor RAW container decoding
///
/// This module handles:
/// - Locating the preview, vendor tag and sensor regions (container.rs)
/// - Decoding the vendor tag block (tags.rs)
/// - Unpacking the sensor mosaic for GPU upload (loader.rs)

pub mod container;
pub mod loader;
pub mod tags;

pub use container::{is_raw_container, RawContainerLayout};
pub use loader::{decode_raw, Mosaic, RawImage};
pub use tags::{VendorTagEntry, VendorTagValue};
