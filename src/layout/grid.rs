//! Grid geometry
//!
//! All positions here are relative to the canvas top-left corner. Every cell
//! has the same size: the widest and tallest asset of the whole batch.

use crate::api::types::{Point, Size};
use crate::assets::Dimensions;
use crate::config::{Spacing, VerticalAlignment};

/// Columns and rows of a near-square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
}

/// Zero-based cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
}

impl GridLayout {
    /// rows = floor(sqrt(n)), columns = ceil(n / rows); `None` for an empty batch
    pub fn for_count(count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let rows = integer_sqrt(count);
        let columns = count.div_ceil(rows);
        Some(Self {
            columns: u32::try_from(columns).ok()?,
            rows: u32::try_from(rows).ok()?,
        })
    }

    /// Row-major cell of the `index`-th asset
    pub fn cell_at(&self, index: usize) -> Cell {
        let columns = self.columns as usize;
        Cell {
            row: (index / columns) as u32,
            column: (index % columns) as u32,
        }
    }

    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Canvas size fitting the grid, spacing included on every side
    pub fn canvas_size(&self, max: Dimensions, spacing: Spacing) -> Size {
        Size {
            width: (spacing.horizontal + i64::from(max.width)) * i64::from(self.columns)
                + spacing.horizontal,
            height: (spacing.vertical + i64::from(max.height)) * i64::from(self.rows)
                + spacing.vertical,
        }
    }
}

fn integer_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Position of an asset inside its cell, horizontally centered
pub fn place_in_cell(
    asset: Dimensions,
    cell: Cell,
    cell_size: Dimensions,
    alignment: VerticalAlignment,
    spacing: Spacing,
) -> Point {
    let column_width = i64::from(cell_size.width);
    let row_height = i64::from(cell_size.height);
    let width = i64::from(asset.width);
    let height = i64::from(asset.height);

    let offset_x = (column_width - width).div_euclid(2);
    let offset_y = match alignment {
        VerticalAlignment::Top => 0,
        VerticalAlignment::Bottom => row_height - height,
        VerticalAlignment::Center => (row_height - height).div_euclid(2),
    };

    Point::new(
        offset_x + i64::from(cell.column) * column_width + spacing.horizontal,
        offset_y + i64::from(cell.row) * row_height + spacing.vertical,
    )
}

/// Left-to-right placement into an existing canvas, wrapping into new rows
///
/// The canvas keeps its width; its height grows when a row overflows the bottom.
#[derive(Debug, Clone)]
pub struct FlowCursor {
    canvas_width: i64,
    canvas_height: i64,
    spacing: Spacing,
    next: Point,
    row_height: i64,
}

impl FlowCursor {
    pub fn new(canvas: Size, spacing: Spacing) -> Self {
        Self {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            spacing,
            next: Point::new(spacing.horizontal, spacing.vertical),
            row_height: 0,
        }
    }

    /// Width an asset may take without overflowing the canvas sides
    pub fn inner_width(&self) -> u32 {
        (self.canvas_width - 2 * self.spacing.horizontal).clamp(1, i64::from(u32::MAX)) as u32
    }

    /// Current canvas height, grown by every placement so far
    pub fn canvas_height(&self) -> i64 {
        self.canvas_height
    }

    /// Reserve room for `asset` and return its position
    pub fn place(&mut self, asset: Dimensions) -> Point {
        let width = i64::from(asset.width);
        let height = i64::from(asset.height);
        let mut x = self.next.x;
        let mut y = self.next.y;

        if x + width > self.canvas_width {
            y += self.spacing.vertical + self.row_height;
            x = self.spacing.horizontal;
            self.row_height = height;
        }
        self.next.x = x + self.spacing.horizontal + width;
        self.row_height = self.row_height.max(height);

        if y + height > self.canvas_height {
            self.canvas_height = y + height + self.spacing.vertical;
        }
        self.next.y = y;

        Point::new(x, y)
    }
}
