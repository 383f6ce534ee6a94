use std::collections::HashSet;

use itertools::Itertools;

use crate::errors::{Result, WarpioError};

/// Selection of band indexes (0 based).
///
/// With `drop` set the selection lists the bands to leave out.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Indexes {
    selection: Box<[usize]>,
    drop: bool,
}

impl<const N: usize> From<([usize; N], bool)> for Indexes {
    fn from(value: ([usize; N], bool)) -> Self {
        let selection = Box::from(value.0);
        let drop = value.1;
        Indexes { selection, drop }
    }
}

impl From<(std::ops::Range<usize>, bool)> for Indexes {
    fn from(value: (std::ops::Range<usize>, bool)) -> Self {
        let selection = value.0.collect();
        let drop = value.1;
        Indexes { selection, drop }
    }
}

impl<const N: usize> From<[usize; N]> for Indexes {
    fn from(value: [usize; N]) -> Self {
        Indexes {
            selection: Box::from(value),
            drop: false,
        }
    }
}

impl From<std::ops::Range<usize>> for Indexes {
    fn from(value: std::ops::Range<usize>) -> Self {
        Indexes {
            selection: value.collect(),
            drop: false,
        }
    }
}

impl Default for Indexes {
    fn default() -> Self {
        Self::all()
    }
}

impl Indexes {
    /// Resolves the selection against a raster with `count` bands.
    pub fn indexes_from(&self, count: usize) -> Result<Box<[usize]>> {
        if let Some(&index) = self.selection.iter().find(|&&index| index >= count) {
            return Err(WarpioError::BandIndexOutOfRange { index, count });
        }
        if self.drop {
            let drop_idxs: HashSet<usize> = self.selection.iter().copied().collect();
            Ok((0..count)
                .filter(|idx| !drop_idxs.contains(idx))
                .sorted()
                .collect())
        } else {
            Ok(self.selection.clone())
        }
    }

    pub fn all() -> Self {
        Self {
            selection: Box::from([]),
            drop: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Indexes::all(), &[0, 1, 2, 3])]
    #[case(Indexes::from([2, 0]), &[2, 0])]
    #[case(Indexes::from(1..3), &[1, 2])]
    #[case(Indexes::from(([1, 3], true)), &[0, 2])]
    #[case(Indexes::from((0..2, true)), &[2, 3])]
    fn resolves_selection(#[case] indexes: Indexes, #[case] expected: &[usize]) {
        assert_eq!(indexes.indexes_from(4).unwrap().as_ref(), expected);
    }

    #[rstest]
    fn rejects_out_of_range() {
        assert!(matches!(
            Indexes::from([0, 5]).indexes_from(3),
            Err(WarpioError::BandIndexOutOfRange { index: 5, count: 3 })
        ));
    }
}
