use crate::components::{GridBounds, PixelFormat};

pub type Result<T> = std::result::Result<T, WarpioError>;

#[derive(thiserror::Error, Debug)]
pub enum WarpioError {
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NulError(#[from] std::ffi::NulError),
    #[error("Could not open {locator} (error {code}): {msg}")]
    Open {
        locator: String,
        code: i32,
        msg: String,
    },
    #[error("Could not build warped view (error {code}): {msg}")]
    Warp { code: i32, msg: String },
    #[error("Could not read {bounds:?} (error {code}): {msg}")]
    Read {
        bounds: GridBounds,
        code: i32,
        msg: String,
    },
    #[error("Pixel format {0:?} has no cell type")]
    UnsupportedFormat(PixelFormat),
    #[error("Raster of {cols}x{rows} pixels does not fit in a single tile")]
    OversizedRaster { cols: usize, rows: usize },
    #[error("Geo transform yields a degenerate extent")]
    DegenerateExtent,
    #[error("Geo transform is not invertible")]
    NonInvertibleTransform,
    #[error("Band index {index} out of range for {count} bands")]
    BandIndexOutOfRange { index: usize, count: usize },
    #[error("Buffer of {len} values does not fit shape {shape:?}")]
    ShapeMismatch { len: usize, shape: Vec<usize> },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Warped view lock was poisoned")]
    LockPoisoned,
}

impl<T> From<std::sync::PoisonError<T>> for WarpioError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        WarpioError::LockPoisoned
    }
}
