use std::fmt::Debug;

use gdal::raster::GdalType;
use num::{NumCast, Zero};

use crate::errors::{Result, WarpioError};

/// Element types tiles can be read as.
pub trait DataType: NumCast + Zero + Copy + Send + Sync + Debug + GdalType + 'static {}

impl<T> DataType for T where T: NumCast + Zero + Copy + Send + Sync + Debug + GdalType + 'static {}

/// Pixel format as reported by the decoding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum PixelFormat {
    Unknown,
    UInt8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    CInt16,
    CInt32,
    CFloat32,
    CFloat64,
}

impl PixelFormat {
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            PixelFormat::CInt16 | PixelFormat::CInt32 | PixelFormat::CFloat32 | PixelFormat::CFloat64
        )
    }
}

/// Canonical per pixel storage.
///
/// `ConstantNoData` variants reserve a sentinel value for missing pixels,
/// `Raw` variants have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum CellType {
    Int16ConstantNoData,
    Int32Raw,
    Int32ConstantNoData,
    Float32Raw,
    Float32ConstantNoData,
    Float64ConstantNoData,
}

impl TryFrom<PixelFormat> for CellType {
    type Error = WarpioError;

    /// Narrow and unsigned formats are widened so a no-data sentinel fits
    /// next to their full value range.
    fn try_from(format: PixelFormat) -> Result<Self> {
        Ok(match format {
            PixelFormat::Unknown => CellType::Float64ConstantNoData,
            PixelFormat::UInt8 => CellType::Int16ConstantNoData,
            PixelFormat::UInt16 => CellType::Int32Raw,
            PixelFormat::Int16 => CellType::Int16ConstantNoData,
            PixelFormat::UInt32 => CellType::Float32Raw,
            PixelFormat::Int32 => CellType::Int32ConstantNoData,
            PixelFormat::Float32 => CellType::Float32ConstantNoData,
            PixelFormat::Float64 => CellType::Float64ConstantNoData,
            PixelFormat::CInt16
            | PixelFormat::CInt32
            | PixelFormat::CFloat32
            | PixelFormat::CFloat64 => return Err(WarpioError::UnsupportedFormat(format)),
        })
    }
}

impl CellType {
    pub fn bits(&self) -> usize {
        match self {
            CellType::Int16ConstantNoData => 16,
            CellType::Int32Raw
            | CellType::Int32ConstantNoData
            | CellType::Float32Raw
            | CellType::Float32ConstantNoData => 32,
            CellType::Float64ConstantNoData => 64,
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(
            self,
            CellType::Float32Raw | CellType::Float32ConstantNoData | CellType::Float64ConstantNoData
        )
    }

    /// Sentinel marking missing pixels, if any.
    pub fn no_data(&self) -> Option<f64> {
        match self {
            CellType::Int16ConstantNoData => Some(i16::MIN as f64),
            CellType::Int32ConstantNoData => Some(i32::MIN as f64),
            CellType::Float32ConstantNoData | CellType::Float64ConstantNoData => Some(f64::NAN),
            CellType::Int32Raw | CellType::Float32Raw => None,
        }
    }

    /// Value padded cells get when read as `T`.
    ///
    /// Falls back to zero when the sentinel can not be represented in `T`.
    pub fn fill_value<T: DataType>(&self) -> T {
        self.no_data()
            .and_then(<T as NumCast>::from)
            .unwrap_or_else(T::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PixelFormat::Unknown, CellType::Float64ConstantNoData)]
    #[case(PixelFormat::UInt8, CellType::Int16ConstantNoData)]
    #[case(PixelFormat::UInt16, CellType::Int32Raw)]
    #[case(PixelFormat::Int16, CellType::Int16ConstantNoData)]
    #[case(PixelFormat::UInt32, CellType::Float32Raw)]
    #[case(PixelFormat::Int32, CellType::Int32ConstantNoData)]
    #[case(PixelFormat::Float32, CellType::Float32ConstantNoData)]
    #[case(PixelFormat::Float64, CellType::Float64ConstantNoData)]
    fn maps_native_formats(#[case] format: PixelFormat, #[case] expected: CellType) {
        assert_eq!(CellType::try_from(format).unwrap(), expected);
        assert_eq!(CellType::try_from(format).unwrap(), expected);
    }

    #[rstest]
    fn rejects_complex_formats(
        #[values(
            PixelFormat::CInt16,
            PixelFormat::CInt32,
            PixelFormat::CFloat32,
            PixelFormat::CFloat64
        )]
        format: PixelFormat,
    ) {
        assert!(format.is_complex());
        assert!(matches!(
            CellType::try_from(format),
            Err(WarpioError::UnsupportedFormat(f)) if f == format
        ));
    }

    #[rstest]
    fn sentinels() {
        assert_eq!(CellType::Int16ConstantNoData.fill_value::<i16>(), i16::MIN);
        assert_eq!(CellType::Int32ConstantNoData.fill_value::<i32>(), i32::MIN);
        assert!(CellType::Float32ConstantNoData.fill_value::<f32>().is_nan());
        assert_eq!(CellType::Int32Raw.fill_value::<i32>(), 0);
        // NaN has no u8 representation.
        assert_eq!(CellType::Float64ConstantNoData.fill_value::<u8>(), 0);
        assert_eq!(CellType::Int16ConstantNoData.bits(), 16);
        assert!(!CellType::Int32Raw.is_floating_point());
    }
}
