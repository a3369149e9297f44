use thiserror::Error;

/// Failures raised while decoding file bytes.
///
/// Malformed-but-readable structures never produce these; they decode to
/// empty lists or absent ranges instead. `OutOfBounds` means a header
/// pointed past the end of the loaded buffer and is not recoverable.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("read of {len} bytes at {at} is past the end of a {buffer_len}-byte buffer")]
    OutOfBounds { at: usize, len: usize, buffer_len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// GPU failures surfaced to the caller exactly once per operation.
#[derive(Error, Debug, Clone)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to request GPU device: {0}")]
    DeviceRequest(String),

    #[error("GPU device lost: {0}")]
    DeviceLost(String),

    #[error("Failed to map readback buffer: {0}")]
    Map(String),
}

/// Errors from loading a file for display.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("RAW file has no usable sensor data")]
    NoSensorData,

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
