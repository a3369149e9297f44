/// Metadata decoding shared by every image container
///
/// - `reader.rs` - typed reads over shared file bytes
/// - `ifd.rs` - TIFF-style tag directory walker
/// - `container.rs` - JPEG/PNG/WebP/TIFF metadata block locators

pub mod container;
pub mod ifd;
pub mod reader;

pub use container::{decode_metadata, locate, ContainerKind};
pub use ifd::{TagEntry, TagType, TagValue};
pub use reader::{ByteRange, ByteView, Endian};
