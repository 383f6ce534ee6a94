use geo::{Coord, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::{
    components::transforms::GeoTransform,
    errors::{Result, WarpioError},
};

/// Tolerance (in pixels) under which a fractional index snaps to the grid line.
const GRID_EPSILON: f64 = 1e-6;

/// Axis aligned bounds in crs coordinates.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoExtent(Rect);

impl From<Rect> for GeoExtent {
    fn from(value: Rect) -> Self {
        Self(value)
    }
}

impl GeoExtent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self(Rect::new(
            Coord { x: xmin, y: ymin },
            Coord { x: xmax, y: ymax },
        ))
    }

    pub fn top_left(&self) -> Coord {
        Coord {
            x: self.0.min().x,
            y: self.0.max().y,
        }
    }

    pub fn intersects(&self, other: &GeoExtent) -> bool {
        self.0.min().x < other.0.max().x
            && other.0.min().x < self.0.max().x
            && self.0.min().y < other.0.max().y
            && other.0.min().y < self.0.max().y
    }
}

/// Pixel bounds within a raster grid.
///
/// `min` is the offset of the top left pixel, `max` is exclusive.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds(Rect<usize>);

impl GridBounds {
    pub fn new(offset: (usize, usize), shape: (usize, usize)) -> Self {
        let offset = Coord::from(offset);
        let max = offset + Coord::from(shape);
        Self(Rect::new(offset, max))
    }

    /// Pixels of a `cols` x `rows` grid under `transform` covered by `extent`.
    ///
    /// Clipped to the grid, `None` when nothing is left.
    pub fn covering(
        extent: &GeoExtent,
        transform: &GeoTransform,
        (cols, rows): (usize, usize),
    ) -> Result<Option<Self>> {
        let to_pixel = transform.inverse()?;
        let top_left = to_pixel.geo_to_pixel(extent.top_left());
        let bottom_right = to_pixel.geo_to_pixel(Coord {
            x: extent.max().x,
            y: extent.min().y,
        });

        let col_range = grid_range(top_left.x, bottom_right.x, cols);
        let row_range = grid_range(top_left.y, bottom_right.y, rows);
        Ok(col_range.zip(row_range).map(|((col_min, col_max), (row_min, row_max))| {
            Self(Rect::new((col_min, row_min), (col_max, row_max)))
        }))
    }

    /// Coords of the top left pixel.
    pub fn offset(&self) -> (usize, usize) {
        self.0.min().x_y()
    }

    /// (cols, rows)
    pub fn shape(&self) -> (usize, usize) {
        (self.0.width(), self.0.height())
    }

    pub fn size(&self) -> usize {
        self.0.width() * self.0.height()
    }
}

fn snap(index: f64) -> f64 {
    let rounded = index.round();
    if (index - rounded).abs() < GRID_EPSILON {
        rounded
    } else {
        index
    }
}

/// Half open range of whole pixels touched by `[a, b]`, clamped to `[0, len)`.
fn grid_range(a: f64, b: f64, len: usize) -> Option<(usize, usize)> {
    let min = snap(a.min(b)).floor().max(0.);
    let max = snap(a.max(b)).ceil().min(len as f64);
    (min < max).then(|| (min as usize, max as usize))
}

/// Caller requested window: crs extent plus the grid it is sampled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterWindow {
    extent: GeoExtent,
    cell_size: (f64, f64),
    cols: usize,
    rows: usize,
}

impl RasterWindow {
    pub fn new(extent: GeoExtent, cols: usize, rows: usize) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(WarpioError::InvalidArgument(format!(
                "window must have pixels, got {cols}x{rows}"
            )));
        }
        let cell_size = (extent.width() / cols as f64, extent.height() / rows as f64);
        Ok(Self {
            extent,
            cell_size,
            cols,
            rows,
        })
    }

    /// Window over `extent` sampled at `cell_size`, rounding to whole pixels.
    pub fn with_cell_size(extent: GeoExtent, cell_size: (f64, f64)) -> Result<Self> {
        let (width, height) = cell_size;
        if !(width > 0. && height > 0.) {
            return Err(WarpioError::InvalidArgument(format!(
                "cell size must be positive, got {cell_size:?}"
            )));
        }
        let cols = (extent.width() / width).round().max(1.) as usize;
        let rows = (extent.height() / height).round().max(1.) as usize;
        Ok(Self {
            extent,
            cell_size,
            cols,
            rows,
        })
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    /// (width, height) of a cell, both positive.
    pub fn cell_size(&self) -> (f64, f64) {
        self.cell_size
    }

    /// (cols, rows)
    pub fn shape(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// North up transform of the window's own grid.
    pub fn transform(&self) -> GeoTransform {
        let origin = self.extent.top_left();
        GeoTransform::new(
            self.cell_size.0,
            0.,
            origin.x,
            0.,
            -self.cell_size.1,
            origin.y,
        )
    }

    /// Extent spanned by the window's grid, from its origin to the far pixel corner.
    pub fn grid_extent(&self) -> GeoExtent {
        let origin = self.extent.top_left();
        let far_corner = self
            .transform()
            .pixel_to_geo(self.cols as f64, self.rows as f64);
        GeoExtent(Rect::new(origin, far_corner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn transform() -> GeoTransform {
        GeoTransform::from_gdal([0., 10., 0., 100., 0., -10.])
    }

    #[rstest]
    fn covering_aligned_extent(transform: GeoTransform) {
        let extent = GeoExtent::new(20., 40., 50., 80.);
        let bounds = GridBounds::covering(&extent, &transform, (10, 10))
            .unwrap()
            .unwrap();
        assert_eq!(bounds.offset(), (2, 2));
        assert_eq!(bounds.shape(), (3, 4));
        assert_eq!(bounds.size(), 12);
    }

    #[rstest]
    fn covering_partial_pixels(transform: GeoTransform) {
        let extent = GeoExtent::new(25., 41., 51., 75.);
        let bounds = GridBounds::covering(&extent, &transform, (10, 10))
            .unwrap()
            .unwrap();
        assert_eq!(bounds, GridBounds::new((2, 2), (4, 4)));
    }

    #[rstest]
    fn covering_clips_to_grid(transform: GeoTransform) {
        let extent = GeoExtent::new(80., -20., 120., 20.);
        let bounds = GridBounds::covering(&extent, &transform, (10, 10))
            .unwrap()
            .unwrap();
        assert_eq!(bounds, GridBounds::new((8, 8), (2, 2)));
    }

    #[rstest]
    #[case(GeoExtent::new(200., 0., 300., 100.))]
    #[case(GeoExtent::new(0., 100., 100., 200.))]
    #[case(GeoExtent::new(-50., -50., 0., 0.))]
    fn covering_outside_grid(transform: GeoTransform, #[case] extent: GeoExtent) {
        assert_eq!(
            GridBounds::covering(&extent, &transform, (10, 10)).unwrap(),
            None
        );
    }

    #[rstest]
    fn window_grid_matches_extent() {
        let extent = GeoExtent::new(100., 200., 164., 232.);
        let window = RasterWindow::new(extent, 16, 8).unwrap();
        assert_eq!(window.cell_size(), (4., 4.));
        assert_eq!(window.grid_extent(), extent);
        assert_eq!(window.transform().pixel_size(), (4., -4.));
    }

    #[rstest]
    fn window_from_cell_size() {
        let extent = GeoExtent::new(0., 0., 95., 40.);
        let window = RasterWindow::with_cell_size(extent, (10., 10.)).unwrap();
        assert_eq!(window.shape(), (10, 4));
        assert!(RasterWindow::with_cell_size(extent, (0., 10.)).is_err());
        assert!(RasterWindow::new(extent, 0, 4).is_err());
    }

    #[rstest]
    fn extents_intersect() {
        let extent = GeoExtent::new(0., 0., 10., 10.);
        assert!(extent.intersects(&GeoExtent::new(5., 5., 15., 15.)));
        assert!(!extent.intersects(&GeoExtent::new(10., 0., 20., 10.)));
    }
}
