//! Engine serving rasters held in memory.
//!
//! Rasters are registered already warped, keyed by locator and target crs,
//! so warping only looks up the matching entry.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use log::debug;
use num::NumCast;

use crate::{
    buffer::Buffer,
    components::{
        bounds::GridBounds,
        cell_type::PixelFormat,
        engines::{RasterEngine, WarpedView},
        options::{Crs, WarpOptions},
        transforms::GeoTransform,
        DataType,
    },
    errors::{Result, WarpioError},
};

/// Error code reported for unknown locators, gdal's `CPLE_OpenFailed`.
pub const OPEN_FAILED: i32 = 4;
/// Error code reported for missing crs entries, gdal's `CPLE_AppDefined`.
pub const APP_DEFINED: i32 = 1;
/// Error code reported for unreadable pixels, gdal's `CPLE_FileIO`.
pub const FILE_IO: i32 = 3;

#[derive(Debug, Clone)]
pub enum MemBand {
    Constant(f64),
    /// Row-major pixels.
    Data(Arc<[f64]>),
}

impl MemBand {
    fn value(&self, index: usize) -> f64 {
        match self {
            MemBand::Constant(value) => *value,
            MemBand::Data(data) => data[index],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemRaster {
    size: (usize, usize),
    transform: GeoTransform,
    format: PixelFormat,
    bands: Vec<MemBand>,
    unreadable: Option<GridBounds>,
}

impl MemRaster {
    pub fn new(size: (usize, usize), transform: GeoTransform, format: PixelFormat) -> Self {
        Self {
            size,
            transform,
            format,
            bands: Vec::new(),
            unreadable: None,
        }
    }

    /// Makes reads touching `bounds` fail.
    pub fn with_unreadable(mut self, bounds: GridBounds) -> Self {
        self.unreadable = Some(bounds);
        self
    }

    pub fn with_band(mut self, band: MemBand) -> Result<Self> {
        if let MemBand::Data(data) = &band {
            let (cols, rows) = self.size;
            if data.len() != cols * rows {
                return Err(WarpioError::ShapeMismatch {
                    len: data.len(),
                    shape: vec![rows, cols],
                });
            }
        }
        self.bands.push(band);
        Ok(self)
    }
}

/// Handle to a registered locator.
#[derive(Debug)]
pub struct MemDataset {
    locator: String,
    live: Arc<AtomicUsize>,
}

impl Drop for MemDataset {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct MemEngine {
    rasters: HashMap<(String, Crs), Arc<MemRaster>>,
    opened: AtomicUsize,
    warped: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl MemEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `raster` as the view of `locator` in `crs`.
    pub fn insert(&mut self, locator: impl Into<String>, crs: impl Into<Crs>, raster: MemRaster) {
        self.rasters
            .insert((locator.into(), crs.into()), Arc::new(raster));
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of opened datasets not dropped yet.
    pub fn live_datasets(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of successful warps.
    pub fn warp_count(&self) -> usize {
        self.warped.load(Ordering::SeqCst)
    }
}

impl RasterEngine for MemEngine {
    type Dataset = MemDataset;
    type View = MemView;

    fn open(&self, locator: &str) -> Result<MemDataset> {
        if !self.rasters.keys().any(|(known, _)| known == locator) {
            return Err(WarpioError::Open {
                locator: locator.to_string(),
                code: OPEN_FAILED,
                msg: format!("{locator}: No such file or directory"),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MemDataset {
            locator: locator.to_string(),
            live: Arc::clone(&self.live),
        })
    }

    fn warp(&self, dataset: &MemDataset, options: &WarpOptions) -> Result<MemView> {
        let key = (dataset.locator.clone(), options.crs.clone());
        let raster = self.rasters.get(&key).ok_or_else(|| WarpioError::Warp {
            code: APP_DEFINED,
            msg: format!("no view of {} in {}", dataset.locator, options.crs),
        })?;
        self.warped.fetch_add(1, Ordering::SeqCst);
        debug!("warped {} to {}", dataset.locator, options.crs);
        Ok(MemView(Arc::clone(raster)))
    }
}

#[derive(Debug)]
pub struct MemView(Arc<MemRaster>);

impl WarpedView for MemView {
    fn size(&self) -> (usize, usize) {
        self.0.size
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.0.transform)
    }

    fn num_bands(&self) -> usize {
        self.0.bands.len()
    }

    fn band_format(&self, index: usize) -> Result<PixelFormat> {
        if index >= self.0.bands.len() {
            return Err(WarpioError::BandIndexOutOfRange {
                index,
                count: self.0.bands.len(),
            });
        }
        Ok(self.0.format)
    }

    fn read_window<T: DataType>(&self, bounds: &GridBounds, bands: &[usize]) -> Result<Buffer<T, 3>> {
        if let Some(unreadable) = self.0.unreadable {
            if overlaps(bounds, &unreadable) {
                return Err(WarpioError::Read {
                    bounds: *bounds,
                    code: FILE_IO,
                    msg: format!("pixels {unreadable:?} are unreadable"),
                });
            }
        }

        let (raster_cols, raster_rows) = self.0.size;
        let (col, row) = bounds.offset();
        let (cols, rows) = bounds.shape();
        let cols = cols.min(raster_cols.saturating_sub(col));
        let rows = rows.min(raster_rows.saturating_sub(row));

        let mut data = Vec::with_capacity(bands.len() * cols * rows);
        for &band_index in bands {
            let band = self.0.bands.get(band_index).ok_or(WarpioError::BandIndexOutOfRange {
                index: band_index,
                count: self.0.bands.len(),
            })?;
            for r in row..row + rows {
                data.extend((col..col + cols).map(|c| {
                    <T as NumCast>::from(band.value(r * raster_cols + c)).unwrap_or_else(T::zero)
                }));
            }
        }
        Buffer::from_parts(data, [bands.len(), rows, cols])
    }
}

fn overlaps(a: &GridBounds, b: &GridBounds) -> bool {
    a.min().x < b.max().x && b.min().x < a.max().x && a.min().y < b.max().y && b.min().y < a.max().y
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn engine() -> MemEngine {
        let raster = MemRaster::new(
            (3, 2),
            GeoTransform::from_gdal([0., 1., 0., 2., 0., -1.]),
            PixelFormat::UInt8,
        )
        .with_band(MemBand::Data(Arc::from([1., 2., 3., 4., 5., 6.])))
        .unwrap()
        .with_band(MemBand::Constant(9.))
        .unwrap();
        let mut engine = MemEngine::new();
        engine.insert("mem://raster", "EPSG:3857", raster);
        engine
    }

    #[rstest]
    fn open_unknown_locator(engine: MemEngine) {
        assert!(matches!(
            engine.open("mem://other"),
            Err(WarpioError::Open { code: OPEN_FAILED, .. })
        ));
        assert_eq!(engine.open_count(), 0);
    }

    #[rstest]
    fn warp_unknown_crs(engine: MemEngine) {
        let dataset = engine.open("mem://raster").unwrap();
        assert!(matches!(
            engine.warp(&dataset, &WarpOptions::new("EPSG:4326")),
            Err(WarpioError::Warp { .. })
        ));
        assert_eq!(engine.warp_count(), 0);
    }

    #[rstest]
    fn reads_clipped_window(engine: MemEngine) {
        let dataset = engine.open("mem://raster").unwrap();
        let view = engine.warp(&dataset, &WarpOptions::new("EPSG:3857")).unwrap();
        let buff = view
            .read_window::<u8>(&GridBounds::new((1, 1), (4, 4)), &[0, 1])
            .unwrap();
        assert_eq!(buff.shape(), [2, 1, 2]);
        assert_eq!(buff.as_ref(), &[5, 6, 9, 9]);
    }

    #[rstest]
    fn counts_live_datasets(engine: MemEngine) {
        let dataset = engine.open("mem://raster").unwrap();
        assert_eq!(engine.live_datasets(), 1);
        drop(dataset);
        assert_eq!(engine.live_datasets(), 0);
        assert_eq!(engine.open_count(), 1);
    }

    #[rstest]
    fn unreadable_region() {
        let raster = MemRaster::new(
            (4, 4),
            GeoTransform::from_gdal([0., 1., 0., 4., 0., -1.]),
            PixelFormat::UInt8,
        )
        .with_band(MemBand::Constant(1.))
        .unwrap()
        .with_unreadable(GridBounds::new((2, 2), (1, 1)));
        let mut engine = MemEngine::new();
        engine.insert("mem://raster", "EPSG:3857", raster);
        let dataset = engine.open("mem://raster").unwrap();
        let view = engine.warp(&dataset, &WarpOptions::new("EPSG:3857")).unwrap();

        assert!(view
            .read_window::<u8>(&GridBounds::new((0, 0), (2, 4)), &[0])
            .is_ok());
        assert!(matches!(
            view.read_window::<u8>(&GridBounds::new((1, 1), (2, 2)), &[0]),
            Err(WarpioError::Read { code: FILE_IO, .. })
        ));
    }

    #[rstest]
    fn rejects_mismatched_band() {
        let raster = MemRaster::new(
            (2, 2),
            GeoTransform::from_gdal([0., 1., 0., 2., 0., -1.]),
            PixelFormat::Int16,
        );
        assert!(raster
            .with_band(MemBand::Data(Arc::from([1., 2., 3.])))
            .is_err());
    }
}
