use crate::errors::{Result, WarpioError};

/// Owned pixel buffer.
///
/// Data is row-major, 3D buffers are laid out as (C, H, W).
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T, const ND: usize> {
    data: Box<[T]>,
    shape: [usize; ND],
}

impl<T: Copy, const ND: usize> Buffer<T, ND> {
    pub fn new_filled(shape: [usize; ND], value: T) -> Self {
        Self {
            data: vec![value; shape.iter().product()].into_boxed_slice(),
            shape,
        }
    }
}

impl<T, const ND: usize> Buffer<T, ND> {
    pub fn from_parts(data: impl Into<Box<[T]>>, shape: [usize; ND]) -> Result<Self> {
        let data = data.into();
        if data.len() != shape.iter().product::<usize>() {
            return Err(WarpioError::ShapeMismatch {
                len: data.len(),
                shape: shape.to_vec(),
            });
        }
        Ok(Self { data, shape })
    }

    pub fn into_parts(self) -> (Box<[T]>, [usize; ND]) {
        (self.data, self.shape)
    }

    pub fn as_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> [usize; ND] {
        self.shape
    }
}

impl<T, const ND: usize> AsRef<[T]> for Buffer<T, ND> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T> Buffer<T, 3> {
    pub fn num_bands(&self) -> usize {
        self.shape[0]
    }

    /// (cols, rows) of each band.
    pub fn band_shape(&self) -> (usize, usize) {
        (self.shape[2], self.shape[1])
    }

    /// Row-major pixels of band `index`.
    pub fn band(&self, index: usize) -> &[T] {
        let band_len = self.shape[1] * self.shape[2];
        &self.data[index * band_len..(index + 1) * band_len]
    }

    pub fn bands(&self) -> impl Iterator<Item = &[T]> {
        let band_len = (self.shape[1] * self.shape[2]).max(1);
        self.data.chunks(band_len).take(self.shape[0])
    }

    pub fn bands_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        let band_len = (self.shape[1] * self.shape[2]).max(1);
        let num_bands = self.shape[0];
        self.data.chunks_mut(band_len).take(num_bands)
    }
}
