//! Engine backed by gdal, warping through `GDALAutoCreateWarpedVRT`.
use std::ffi::{c_char, CStr, CString};

use gdal::{spatial_ref::SpatialRef, Dataset as GdalDataset, DriverManager, GdalOpenFlags};
use log::debug;

use crate::{
    buffer::Buffer,
    components::{
        bounds::GridBounds,
        cell_type::PixelFormat,
        engines::{RasterEngine, WarpedView},
        options::{ResampleMethod, WarpOptions},
        transforms::GeoTransform,
        DataType,
    },
    errors::{Result, WarpioError},
};

/// Gdal settings applied once per process.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct GdalConfig {
    #[serde(default)]
    pub debug_logging: bool,
    /// Extra `KEY=VALUE` config options, e.g. `GDAL_CACHEMAX`.
    #[serde(default)]
    pub config_options: Vec<(String, String)>,
}

impl GdalConfig {
    pub fn apply(&self) -> Result<()> {
        setup_logging(self.debug_logging);
        for (key, value) in &self.config_options {
            gdal::config::set_config_option(key, value)?;
        }
        Ok(())
    }
}

/// Routes gdal error messages to `log`.
pub fn setup_logging(debug: bool) {
    if debug && gdal::config::set_config_option("CPL_DEBUG", "ON").is_err() {
        log::debug!("Failed to set GDAL debug level")
    }

    gdal::config::set_error_handler(|severity, _code, msg| {
        use gdal::errors::CplErrType;
        match severity {
            CplErrType::Debug => log::debug!("GDAL: {msg}"),
            CplErrType::Warning => log::warn!("GDAL: {msg}"),
            CplErrType::Failure | CplErrType::Fatal => log::error!("GDAL: {msg}"),
            CplErrType::None => {}
        }
    });
}

/// Takes and clears gdal's last error.
fn take_last_error() -> (i32, String) {
    unsafe {
        let code = gdal_sys::CPLGetLastErrorNo();
        let msg_ptr: *const c_char = gdal_sys::CPLGetLastErrorMsg();
        let msg = if msg_ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(msg_ptr).to_string_lossy().into_owned()
        };
        gdal_sys::CPLErrorReset();
        (code, msg)
    }
}

fn resample_to_gdal(resample: ResampleMethod) -> gdal_sys::GDALResampleAlg::Type {
    use gdal_sys::GDALResampleAlg::*;
    match resample {
        ResampleMethod::NearestNeighbour => GRA_NearestNeighbour,
        ResampleMethod::Bilinear => GRA_Bilinear,
        ResampleMethod::Cubic => GRA_Cubic,
        ResampleMethod::CubicSpline => GRA_CubicSpline,
        ResampleMethod::Lanczos => GRA_Lanczos,
        ResampleMethod::Average => GRA_Average,
        ResampleMethod::Mode => GRA_Mode,
        ResampleMethod::Max => GRA_Max,
        ResampleMethod::Min => GRA_Min,
        ResampleMethod::Median => GRA_Med,
        ResampleMethod::Q1 => GRA_Q1,
        ResampleMethod::Q3 => GRA_Q3,
    }
}

fn pixel_format_from_gdal(data_type: gdal_sys::GDALDataType::Type) -> PixelFormat {
    use gdal_sys::GDALDataType::*;
    match data_type {
        GDT_Byte => PixelFormat::UInt8,
        GDT_UInt16 => PixelFormat::UInt16,
        GDT_Int16 => PixelFormat::Int16,
        GDT_UInt32 => PixelFormat::UInt32,
        GDT_Int32 => PixelFormat::Int32,
        GDT_Float32 => PixelFormat::Float32,
        GDT_Float64 => PixelFormat::Float64,
        GDT_CInt16 => PixelFormat::CInt16,
        GDT_CInt32 => PixelFormat::CInt32,
        GDT_CFloat32 => PixelFormat::CFloat32,
        GDT_CFloat64 => PixelFormat::CFloat64,
        GDT_Unknown => PixelFormat::Unknown,
        other => {
            log::warn!("gdal data type {other} read as unknown");
            PixelFormat::Unknown
        }
    }
}

/// Source dataset opened by [`GdalEngine`].
///
/// Dropping releases this handle's reference only; the dataset is closed
/// once no warped vrt refers to it any more.
#[derive(Debug)]
pub struct GdalSource(gdal_sys::GDALDatasetH);

impl GdalSource {
    pub fn c_dataset(&self) -> gdal_sys::GDALDatasetH {
        self.0
    }
}

impl Drop for GdalSource {
    fn drop(&mut self) {
        unsafe {
            if gdal_sys::GDALDereferenceDataset(self.0) < 1 {
                gdal_sys::GDALClose(self.0);
            }
        }
    }
}

#[derive(Debug)]
pub struct GdalEngine;

impl GdalEngine {
    pub fn new() -> Self {
        DriverManager::register_all();
        Self
    }
}

impl Default for GdalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterEngine for GdalEngine {
    type Dataset = GdalSource;
    type View = GdalWarpedView;

    fn open(&self, locator: &str) -> Result<GdalSource> {
        let c_locator = CString::new(locator)?;
        let flags = (GdalOpenFlags::GDAL_OF_RASTER
            | GdalOpenFlags::GDAL_OF_READONLY
            | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR)
            .bits();
        let handle = unsafe {
            gdal_sys::GDALOpenEx(
                c_locator.as_ptr(),
                flags,
                std::ptr::null(),
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        if handle.is_null() {
            let (code, msg) = take_last_error();
            return Err(WarpioError::Open {
                locator: locator.to_string(),
                code,
                msg,
            });
        }
        debug!("opened {locator}");
        Ok(GdalSource(handle))
    }

    fn warp(&self, dataset: &GdalSource, options: &WarpOptions) -> Result<GdalWarpedView> {
        let target_wkt = CString::new(SpatialRef::from_definition(options.crs.as_str())?.to_wkt()?)?;
        let handle = unsafe {
            gdal_sys::GDALAutoCreateWarpedVRT(
                dataset.c_dataset(),
                std::ptr::null(),
                target_wkt.as_ptr(),
                resample_to_gdal(options.resample),
                options.error_threshold,
                std::ptr::null(),
            )
        };
        if handle.is_null() {
            let (code, msg) = take_last_error();
            return Err(WarpioError::Warp { code, msg });
        }
        // The vrt references the source; dropping the GdalSource only
        // dereferences it and the vrt's own close releases the last reference.
        Ok(GdalWarpedView(unsafe { GdalDataset::from_c_dataset(handle) }))
    }
}

#[derive(Debug)]
pub struct GdalWarpedView(GdalDataset);

impl WarpedView for GdalWarpedView {
    fn size(&self) -> (usize, usize) {
        self.0.raster_size()
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(GeoTransform::from_gdal(self.0.geo_transform()?))
    }

    fn num_bands(&self) -> usize {
        self.0.raster_count()
    }

    fn band_format(&self, index: usize) -> Result<PixelFormat> {
        let band = self.0.rasterband(index + 1)?;
        let data_type = unsafe { gdal_sys::GDALGetRasterDataType(band.c_rasterband()) };
        Ok(pixel_format_from_gdal(data_type))
    }

    fn read_window<T: DataType>(&self, bounds: &GridBounds, bands: &[usize]) -> Result<Buffer<T, 3>> {
        let (raster_cols, raster_rows) = self.0.raster_size();
        let (col, row) = bounds.offset();
        let (cols, rows) = bounds.shape();
        let shape = (
            cols.min(raster_cols.saturating_sub(col)),
            rows.min(raster_rows.saturating_sub(row)),
        );

        let mut data = Vec::with_capacity(bands.len() * shape.0 * shape.1);
        for band_index in bands {
            let buffer = self.0.rasterband(band_index + 1)?.read_as::<T>(
                (col as isize, row as isize),
                shape,
                shape,
                None,
            )?;
            data.extend_from_slice(buffer.data());
        }
        Buffer::from_parts(data, [bands.len(), shape.1, shape.0])
    }
}
