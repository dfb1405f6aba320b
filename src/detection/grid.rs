//! 5x5 grid sampling.
//!
//! Reads the center pixel of each cell and classifies it against the grid's
//! target color. Drawing the detection boxes lives in
//! `calibration::preview` so sampling stays free of side effects.

use image::RgbaImage;

use super::DetectionError;
use super::color::{color_match, rgb};
use crate::calibration::coords::{PixelPoint, Resolution};

/// Cells per grid side.
pub const GRID_SIZE: usize = 5;

/// Which of the two on-screen grids a sample belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridId {
    Top,
    Bottom,
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridId::Top => write!(f, "top"),
            GridId::Bottom => write!(f, "bottom"),
        }
    }
}

/// Which cells of a grid matched their target color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OccupancyMatrix([[bool; GRID_SIZE]; GRID_SIZE]);

impl OccupancyMatrix {
    /// A matrix with every cell set.
    #[cfg(test)]
    pub fn full() -> Self {
        Self([[true; GRID_SIZE]; GRID_SIZE])
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.0[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize) {
        self.0[row][col] = true;
    }

    /// Number of set cells, 0..=25.
    pub fn count(&self) -> u8 {
        self.0.iter().flatten().filter(|&&c| c).count() as u8
    }

    /// Element-wise logical OR.
    pub fn union(&self, other: &OccupancyMatrix) -> OccupancyMatrix {
        let mut out = *self;
        for (row, other_row) in out.0.iter_mut().zip(other.0.iter()) {
            for (cell, &other_cell) in row.iter_mut().zip(other_row.iter()) {
                *cell |= other_cell;
            }
        }
        out
    }

    /// `(row, col)` of every set cell, row-major.
    pub fn active_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..GRID_SIZE)
            .flat_map(|row| (0..GRID_SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.0[row][col])
    }
}

/// Position, cell size and target color of one grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    pub id: GridId,
    /// Top-left pixel of cell (0, 0)
    pub origin: PixelPoint,
    pub cell_size: u32,
    /// RGB order
    pub target: [u8; 3],
    pub tolerance: u8,
}

impl GridSpec {
    /// Top-left pixel of a cell, or `None` if it does not fit in `u32`.
    pub fn checked_cell_origin(&self, row: usize, col: usize) -> Option<PixelPoint> {
        let offset = |cells: usize, start: u32| {
            u32::try_from(cells)
                .ok()?
                .checked_mul(self.cell_size)?
                .checked_add(start)
        };
        Some(PixelPoint::new(
            offset(col, self.origin.x)?,
            offset(row, self.origin.y)?,
        ))
    }

    /// Top-left pixel of a cell. Saturates at `u32::MAX`; only meaningful
    /// once `check_bounds` has passed.
    pub fn cell_origin(&self, row: usize, col: usize) -> PixelPoint {
        let step = |cells: usize, start: u32| {
            (cells as u32)
                .saturating_mul(self.cell_size)
                .saturating_add(start)
        };
        PixelPoint::new(step(col, self.origin.x), step(row, self.origin.y))
    }

    /// The single pixel sampled for a cell.
    pub fn cell_center(&self, row: usize, col: usize) -> PixelPoint {
        let corner = self.cell_origin(row, col);
        let half = self.cell_size / 2;
        PixelPoint::new(corner.x.saturating_add(half), corner.y.saturating_add(half))
    }

    /// Exclusive bottom-right corner of the whole grid, `None` on overflow.
    pub fn extent(&self) -> Option<PixelPoint> {
        self.checked_cell_origin(GRID_SIZE, GRID_SIZE)
    }

    /// Fails with `OutOfBounds` unless every cell fits inside the frame.
    pub fn check_bounds(&self, frame: Resolution) -> Result<(), DetectionError> {
        let out_of_bounds = |extent| DetectionError::OutOfBounds {
            grid: self.id,
            extent,
            frame,
        };
        let Some(extent) = self.extent() else {
            return Err(out_of_bounds(self.cell_origin(GRID_SIZE, GRID_SIZE)));
        };
        let last = self.cell_center(GRID_SIZE - 1, GRID_SIZE - 1);
        if extent.x > frame.width
            || extent.y > frame.height
            || last.x >= frame.width
            || last.y >= frame.height
        {
            return Err(out_of_bounds(extent));
        }
        Ok(())
    }
}

/// Samples the center pixel of all 25 cells.
///
/// The frame is only read. Returns `OutOfBounds` before reading anything if
/// the grid does not fit.
pub fn sample_grid(frame: &RgbaImage, spec: &GridSpec) -> Result<OccupancyMatrix, DetectionError> {
    let (width, height) = frame.dimensions();
    spec.check_bounds(Resolution::new(width, height))?;

    let mut matrix = OccupancyMatrix::default();
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let center = spec.cell_center(row, col);
            let pixel = frame.get_pixel(center.x, center.y);
            if color_match(rgb(pixel), spec.target, spec.tolerance) {
                matrix.set(row, col);
            }
        }
    }
    Ok(matrix)
}
