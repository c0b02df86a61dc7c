use crate::interpolation::steps::{Band, GridSteps};
use serde::{Deserialize, Serialize};

/// A point value in grid space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatSample {
    pub x: i32,
    pub y: i32,
    pub value: f64,
}

impl HeatSample {
    pub fn new(x: i32, y: i32, value: f64) -> Self {
        Self { x, y, value }
    }
}

/// Output size and interpolation radius, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    /// Samples further than this from a cell do not contribute to it. A
    /// non-positive radius renders nothing.
    pub radius: i32,
}

impl GridConfig {
    pub fn new(width: usize, height: usize, radius: i32) -> Self {
        Self {
            width,
            height,
            radius,
        }
    }
}

/// A dense `width × height` classified grid, row-major with row 0 at the top.
/// `None` cells are transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<Band>>,
}

impl HeatGrid {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<Option<Band>>) -> Self {
        debug_assert_eq!(cells.len(), width * height);
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Option<Band>] {
        &self.cells
    }

    /// Band of cell (x, y), `None` when empty or outside the grid.
    pub fn band_at(&self, x: usize, y: usize) -> Option<Band> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y * self.width + x]
    }

    /// Number of classified (non-empty) cells.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_blank(&self) -> bool {
        self.filled() == 0
    }

    /// Renders the grid to a premultiplied RGBA8 buffer, 4 bytes per cell in
    /// row-major order. Empty cells are fully transparent.
    pub fn to_rgba(&self, steps: &GridSteps) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.cells.len() * 4);
        for cell in &self.cells {
            match cell {
                Some(band) => {
                    let [r, g, b, a] = steps.step(*band).color;
                    let premultiply = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
                    buffer.extend_from_slice(&[premultiply(r), premultiply(g), premultiply(b), a]);
                }
                None => buffer.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
        buffer
    }
}
