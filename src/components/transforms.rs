use geo::{AffineTransform, Coord, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::{
    components::bounds::GeoExtent,
    errors::{Result, WarpioError},
};

/// Affine transform from pixel grid to crs coordinates.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff))
    }

    /// From gdal ordering `[xoff, a, b, yoff, d, e]`.
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.0.xoff(),
            self.0.a(),
            self.0.b(),
            self.0.yoff(),
            self.0.d(),
            self.0.e(),
        ]
    }

    pub fn origin(&self) -> Coord {
        Coord {
            x: self.0.xoff(),
            y: self.0.yoff(),
        }
    }

    /// (pixel width, pixel height), height is usually negative.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0.a(), self.0.e())
    }

    /// Crs coordinate of the pixel corner `(col, row)`.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> Coord {
        self.0.apply(Coord { x: col, y: row })
    }

    pub fn inverse(&self) -> Result<GeoPixelTransform> {
        self.0
            .inverse()
            .map(GeoPixelTransform)
            .ok_or(WarpioError::NonInvertibleTransform)
    }

    /// Extent covered by a `cols` x `rows` grid.
    ///
    /// Rotation terms are ignored.
    pub fn extent(&self, cols: usize, rows: usize) -> Result<GeoExtent> {
        let xmin = self.0.xoff();
        let xmax = xmin + self.0.a() * cols as f64;
        let ymax = self.0.yoff();
        let ymin = ymax + self.0.e() * rows as f64;
        if !(xmin < xmax && ymin < ymax) {
            return Err(WarpioError::DegenerateExtent);
        }
        Ok(GeoExtent::from(Rect::new(
            Coord { x: xmin, y: ymin },
            Coord { x: xmax, y: ymax },
        )))
    }
}

/// Affine transform from crs coordinates to fractional pixel indexes.
#[derive(Shrinkwrap, Debug, Clone, Copy)]
pub struct GeoPixelTransform(AffineTransform);

impl GeoPixelTransform {
    /// Fractional (col, row) of a crs coordinate.
    pub fn geo_to_pixel(&self, coord: Coord) -> Coord {
        self.0.apply(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn gdal_ordering_round_trips() {
        let gdal_transform = [100000., 10., 0., 50000., 0., -10.];
        let transform = GeoTransform::from_gdal(gdal_transform);
        assert_eq!(transform.pixel_size(), (10., -10.));
        assert_eq!(transform.to_gdal(), gdal_transform);
    }

    #[rstest]
    fn extent_from_transform_and_size() {
        let transform = GeoTransform::from_gdal([100000., 10., 0., 50000., 0., -10.]);
        let extent = transform.extent(4000, 3000).unwrap();
        assert_eq!(extent.min(), Coord { x: 100000., y: 20000. });
        assert_eq!(extent.max(), Coord { x: 140000., y: 50000. });
    }

    #[rstest]
    fn degenerate_extent() {
        let transform = GeoTransform::from_gdal([0., 10., 0., 0., 0., 10.]);
        assert!(matches!(
            transform.extent(10, 10),
            Err(WarpioError::DegenerateExtent)
        ));
    }

    #[rstest]
    fn inverse_maps_back_to_pixels() {
        let transform = GeoTransform::from_gdal([500., 2., 0., 1000., 0., -4.]);
        let geo = transform.pixel_to_geo(3., 7.);
        assert_eq!(geo, Coord { x: 506., y: 972. });
        let pixel = transform.inverse().unwrap().geo_to_pixel(geo);
        assert_relative_eq!(pixel.x, 3.);
        assert_relative_eq!(pixel.y, 7.);
    }

    #[rstest]
    fn singular_transform_is_not_invertible() {
        let transform = GeoTransform::from_gdal([0., 0., 0., 0., 0., 0.]);
        assert!(matches!(
            transform.inverse(),
            Err(WarpioError::NonInvertibleTransform)
        ));
    }
}
