use log::{debug, info};
use rayon::prelude::*;
use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
};

use crate::{
    buffer::Buffer,
    components::{
        bounds::{GeoExtent, GridBounds, RasterWindow},
        cell_type::CellType,
        engines::{RasterEngine, WarpedView},
        options::{Crs, ResampleMethod, WarpOptions},
        tile::{reconcile, Tile},
        transforms::GeoTransform,
        DataType,
    },
    errors::{Result, WarpioError},
    Indexes,
};

/// Largest pixel count a single tile buffer may address.
pub const MAX_TILE_CELLS: usize = i32::MAX as usize;

/// Geometry of the warped view, fixed once derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub cols: usize,
    pub rows: usize,
    pub transform: GeoTransform,
    pub extent: GeoExtent,
    pub band_count: usize,
    pub cell_type: CellType,
}

struct Warped<V> {
    geometry: Geometry,
    view: Mutex<V>,
}

/// A dataset read as if it was warped into another crs.
///
/// Nothing is opened until the geometry is first needed.
pub struct WarpedRasterSource<E: RasterEngine> {
    engine: Arc<E>,
    locator: String,
    options: WarpOptions,
    warped: Mutex<Option<Arc<Warped<E::View>>>>,
}

impl<E: RasterEngine> Debug for WarpedRasterSource<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let geometry = self
            .warped
            .lock()
            .ok()
            .and_then(|warped| warped.as_ref().map(|warped| warped.geometry));
        f.debug_struct("WarpedRasterSource")
            .field("locator", &self.locator)
            .field("options", &self.options)
            .field("geometry", &geometry)
            .finish()
    }
}

impl<E: RasterEngine> WarpedRasterSource<E> {
    pub fn new(engine: Arc<E>, locator: impl Into<String>, options: WarpOptions) -> Self {
        Self {
            engine,
            locator: locator.into(),
            options,
            warped: Mutex::new(None),
        }
    }

    /// Same dataset under a new crs and resample method, keeping the error threshold.
    pub fn with_crs(&self, crs: impl Into<Crs>, resample: ResampleMethod) -> Self {
        let options = WarpOptions::new(crs)
            .with_resample(resample)
            .with_error_threshold(self.options.error_threshold);
        self.with_options(options)
    }

    pub fn with_options(&self, options: WarpOptions) -> Self {
        Self::new(Arc::clone(&self.engine), self.locator.clone(), options)
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn crs(&self) -> &Crs {
        &self.options.crs
    }

    pub fn resample_method(&self) -> ResampleMethod {
        self.options.resample
    }

    pub fn error_threshold(&self) -> f64 {
        self.options.error_threshold
    }

    fn warped(&self) -> Result<Arc<Warped<E::View>>> {
        let mut slot = self.warped.lock()?;
        if let Some(warped) = slot.as_ref() {
            return Ok(Arc::clone(warped));
        }
        let warped = Arc::new(self.materialize()?);
        *slot = Some(Arc::clone(&warped));
        Ok(warped)
    }

    fn materialize(&self) -> Result<Warped<E::View>> {
        let threshold = self.options.error_threshold;
        if !(threshold.is_finite() && threshold >= 0.) {
            return Err(WarpioError::InvalidArgument(format!(
                "error threshold must be a non negative number, got {threshold}"
            )));
        }

        let view = {
            let dataset = self.engine.open(&self.locator)?;
            self.engine.warp(&dataset, &self.options)?
        };

        let (cols, rows) = view.size();
        if !matches!(cols.checked_mul(rows), Some(cells) if cells <= MAX_TILE_CELLS) {
            return Err(WarpioError::OversizedRaster { cols, rows });
        }
        let transform = view.geo_transform()?;
        let extent = transform.extent(cols, rows)?;
        let band_count = view.num_bands();
        // Band 1 decides for every band.
        let cell_type = CellType::try_from(view.band_format(0)?)?;

        let geometry = Geometry {
            cols,
            rows,
            transform,
            extent,
            band_count,
            cell_type,
        };
        info!("warped {} to {}: {geometry:?}", self.locator, self.options.crs);
        Ok(Warped {
            geometry,
            view: Mutex::new(view),
        })
    }

    pub fn geometry(&self) -> Result<Geometry> {
        Ok(self.warped()?.geometry)
    }

    pub fn extent(&self) -> Result<GeoExtent> {
        Ok(self.geometry()?.extent)
    }

    pub fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.geometry()?.transform)
    }

    pub fn cols(&self) -> Result<usize> {
        Ok(self.geometry()?.cols)
    }

    pub fn rows(&self) -> Result<usize> {
        Ok(self.geometry()?.rows)
    }

    /// (cols, rows)
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        let geometry = self.geometry()?;
        Ok((geometry.cols, geometry.rows))
    }

    /// (width, height) of a pixel, both positive.
    pub fn cell_size(&self) -> Result<(f64, f64)> {
        let (width, height) = self.geo_transform()?.pixel_size();
        Ok((width.abs(), height.abs()))
    }

    pub fn band_count(&self) -> Result<usize> {
        Ok(self.geometry()?.band_count)
    }

    pub fn cell_type(&self) -> Result<CellType> {
        Ok(self.geometry()?.cell_type)
    }

    /// Window over the whole warped grid.
    pub fn window(&self) -> Result<RasterWindow> {
        let geometry = self.geometry()?;
        RasterWindow::new(geometry.extent, geometry.cols, geometry.rows)
    }

    /// Window over `extent` at the warped resolution.
    pub fn window_for(&self, extent: GeoExtent) -> Result<RasterWindow> {
        RasterWindow::with_cell_size(extent, self.cell_size()?)
    }

    /// Reads every band of each window, in input order.
    ///
    /// Fails upfront if the warped view can not be built,
    /// read failures are reported per window.
    pub fn read<'a, T: DataType>(
        &'a self,
        windows: impl IntoIterator<Item = RasterWindow> + 'a,
    ) -> Result<impl Iterator<Item = Result<Tile<T>>> + 'a> {
        self.read_bands(windows, Indexes::all())
    }

    pub fn read_bands<'a, T: DataType>(
        &'a self,
        windows: impl IntoIterator<Item = RasterWindow> + 'a,
        bands: Indexes,
    ) -> Result<impl Iterator<Item = Result<Tile<T>>> + 'a> {
        let warped = self.warped()?;
        let bands = bands.indexes_from(warped.geometry.band_count)?;
        Ok(windows
            .into_iter()
            .map(move |window| Self::read_window(&warped, &window, &bands)))
    }

    /// Reads every band of each window in parallel.
    ///
    /// Tiles come in no particular order, match them by [`Tile::extent`].
    pub fn par_read<T: DataType>(
        &self,
        windows: Vec<RasterWindow>,
    ) -> Result<impl ParallelIterator<Item = Result<Tile<T>>>> {
        let warped = self.warped()?;
        let bands = Indexes::all().indexes_from(warped.geometry.band_count)?;
        Ok(windows
            .into_par_iter()
            .map(move |window| Self::read_window(&warped, &window, &bands)))
    }

    fn read_window<T: DataType>(
        warped: &Warped<E::View>,
        window: &RasterWindow,
        bands: &[usize],
    ) -> Result<Tile<T>> {
        let geometry = &warped.geometry;
        let fill = geometry.cell_type.fill_value::<T>();
        let shape = window.shape();

        let window_extent = window.grid_extent();
        let grid_bounds = GridBounds::covering(
            &window_extent,
            &geometry.transform,
            (geometry.cols, geometry.rows),
        )?;
        debug!("reading {window_extent:?} as {grid_bounds:?}");

        let data = match grid_bounds {
            Some(grid_bounds) => {
                let decoded = warped.view.lock()?.read_window::<T>(&grid_bounds, bands)?;
                reconcile(decoded, shape, fill)
            }
            None => Buffer::new_filled([bands.len(), shape.1, shape.0], fill),
        };
        Ok(Tile::new(data, *window.extent()))
    }
}
