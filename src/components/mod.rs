pub mod backends;
pub mod bounds;
pub mod cell_type;
pub mod engines;
pub mod options;
pub mod source;
pub mod tile;
pub mod transforms;

pub use bounds::{GeoExtent, GridBounds, RasterWindow};
pub use cell_type::{CellType, DataType, PixelFormat};
pub use engines::{RasterEngine, WarpedView};
pub use options::{Crs, ResampleMethod, WarpOptions, DEFAULT_ERROR_THRESHOLD};
pub use source::{Geometry, WarpedRasterSource, MAX_TILE_CELLS};
pub use tile::Tile;
pub use transforms::GeoTransform;
