use crate::{buffer::Buffer, components::bounds::GeoExtent};

/// Multiband pixels read for a window, paired with the window's extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<T> {
    data: Buffer<T, 3>,
    extent: GeoExtent,
}

impl<T> Tile<T> {
    pub fn new(data: Buffer<T, 3>, extent: GeoExtent) -> Self {
        Self { data, extent }
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    pub fn data(&self) -> &Buffer<T, 3> {
        &self.data
    }

    /// (cols, rows)
    pub fn shape(&self) -> (usize, usize) {
        self.data.band_shape()
    }

    pub fn num_bands(&self) -> usize {
        self.data.num_bands()
    }

    pub fn into_parts(self) -> (Buffer<T, 3>, GeoExtent) {
        (self.data, self.extent)
    }
}

/// Fits `decoded` into a `cols` x `rows` buffer.
///
/// Pixels stay anchored to the bottom right corner, the uncovered region
/// is set to `fill` and anything past the top or left edge is dropped.
pub fn reconcile<T: Copy>(decoded: Buffer<T, 3>, (cols, rows): (usize, usize), fill: T) -> Buffer<T, 3> {
    let (decoded_cols, decoded_rows) = decoded.band_shape();
    if (decoded_cols, decoded_rows) == (cols, rows) {
        return decoded;
    }

    let col_offset = cols.saturating_sub(decoded_cols);
    let row_offset = rows.saturating_sub(decoded_rows);
    let skip_cols = decoded_cols.saturating_sub(cols);
    let skip_rows = decoded_rows.saturating_sub(rows);
    let copy_cols = decoded_cols.min(cols);
    let copy_rows = decoded_rows.min(rows);

    let mut tile = Buffer::new_filled([decoded.num_bands(), rows, cols], fill);
    for (decoded_band, tile_band) in decoded.bands().zip(tile.bands_mut()) {
        for row in 0..copy_rows {
            let src_start = (row + skip_rows) * decoded_cols + skip_cols;
            let dst_start = (row + row_offset) * cols + col_offset;
            tile_band[dst_start..dst_start + copy_cols]
                .copy_from_slice(&decoded_band[src_start..src_start + copy_cols]);
        }
    }
    tile
}
