use std::fmt::Debug;

use crate::{
    buffer::Buffer,
    components::{
        bounds::GridBounds, cell_type::PixelFormat, options::WarpOptions,
        transforms::GeoTransform, DataType,
    },
    errors::Result,
};

/// Decoding and warping engine a [`crate::WarpedRasterSource`] reads through.
pub trait RasterEngine: Debug + Send + Sync {
    /// Opened source dataset, released on drop.
    type Dataset;
    type View: WarpedView;

    /// Fails with [`crate::WarpioError::Open`] when `locator` can not be opened.
    fn open(&self, locator: &str) -> Result<Self::Dataset>;

    /// Virtual view of `dataset` as seen in `options.crs`.
    ///
    /// The view must stay valid after `dataset` is dropped.
    fn warp(&self, dataset: &Self::Dataset, options: &WarpOptions) -> Result<Self::View>;
}

/// Warped raster exposing its geometry and windowed reads.
pub trait WarpedView: Send {
    /// (cols, rows)
    fn size(&self) -> (usize, usize);
    fn geo_transform(&self) -> Result<GeoTransform>;
    fn num_bands(&self) -> usize;
    /// Native format of band `index` (0 based).
    fn band_format(&self, index: usize) -> Result<PixelFormat>;
    /// Reads `bands` within `bounds` into a (C, H, W) buffer.
    ///
    /// The result may be smaller than `bounds` where they reach past the raster.
    fn read_window<T: DataType>(&self, bounds: &GridBounds, bands: &[usize]) -> Result<Buffer<T, 3>>;
}
