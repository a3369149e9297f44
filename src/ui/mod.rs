/// Widgets backed by the GPU pipeline
///
/// - `canvas.rs` - shader widget that renders the selected image
/// - `histogram.rs` - canvas that draws the RGB histogram

pub mod canvas;
pub mod histogram;

pub use canvas::ImageView;
pub use histogram::Histogram;
