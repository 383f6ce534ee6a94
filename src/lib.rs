//! Read windows of a raster as if it had been warped into another crs.
//!
//! A [`WarpedRasterSource`] builds a virtual warped view of its dataset on
//! first use and answers [`RasterWindow`] requests with [`Tile`]s of exactly
//! the requested shape, padding with no-data where windows reach past the
//! raster.
//!
//! ```no_run
//! use std::sync::Arc;
//! use warpio::{backends::gdal_backend::GdalEngine, WarpOptions, WarpedRasterSource};
//!
//! # fn main() -> warpio::Result<()> {
//! let source = WarpedRasterSource::new(
//!     Arc::new(GdalEngine::new()),
//!     "data/scene.tif",
//!     WarpOptions::new("EPSG:3857"),
//! );
//! let window = source.window()?;
//! for tile in source.read::<f32>([window])? {
//!     let tile = tile?;
//!     println!("{:?} {:?}", tile.extent(), tile.shape());
//! }
//! # Ok(())
//! # }
//! ```

mod buffer;
mod components;
mod errors;
mod indexes;

pub use buffer::Buffer;
pub use components::backends;
pub use components::tile::reconcile;
pub use components::{
    CellType, Crs, DataType, GeoExtent, GeoTransform, Geometry, GridBounds, PixelFormat,
    RasterEngine, RasterWindow, ResampleMethod, Tile, WarpOptions, WarpedRasterSource,
    WarpedView, DEFAULT_ERROR_THRESHOLD, MAX_TILE_CELLS,
};
pub use errors::{Result, WarpioError};
pub use indexes::Indexes;
