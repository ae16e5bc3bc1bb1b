//! Pixel-space geometry shared by the annotation overlay and the transcript.
//!
//! Everything here works in `f32` pixel units. The terminal layer converts
//! cell coordinates into this space through [`CellMetrics`].

use ratatui::layout::Rect;

/// A sampled pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle described by its four edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Zero-area box located at `point`.
    pub const fn at(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Grow the box so it covers `point`.
    pub fn include(&mut self, point: Point) {
        self.left = self.left.min(point.x);
        self.top = self.top.min(point.y);
        self.right = self.right.max(point.x);
        self.bottom = self.bottom.max(point.y);
    }

    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }

    /// Plain rectangle intersection. Shared edges and corners count.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }

    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        if !self.intersects(other) {
            return None;
        }
        Some(Bounds::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        ))
    }
}

/// Pixel size of a single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f32,
    pub height: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 16.0,
        }
    }
}

impl CellMetrics {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Viewport position of the centre of the given cell.
    pub fn cell_center(&self, column: u16, row: u16) -> Point {
        Point::new(
            column as f32 * self.width + self.width / 2.0,
            row as f32 * self.height + self.height / 2.0,
        )
    }

    /// Viewport position of the top-left corner of the given cell.
    pub fn cell_origin(&self, column: u16, row: u16) -> Point {
        Point::new(column as f32 * self.width, row as f32 * self.height)
    }

    /// Viewport bounds covering every cell of `rect`.
    pub fn rect_bounds(&self, rect: Rect) -> Bounds {
        let origin = self.cell_origin(rect.x, rect.y);
        Bounds::new(
            origin.x,
            origin.y,
            origin.x + rect.width as f32 * self.width,
            origin.y + rect.height as f32 * self.height,
        )
    }

    /// Map a viewport point back to the cell that contains it.
    pub fn cell_at(&self, point: Point) -> Option<(u16, u16)> {
        if point.x < 0.0 || point.y < 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let column = (point.x / self.width).floor();
        let row = (point.y / self.height).floor();
        if column > u16::MAX as f32 || row > u16::MAX as f32 {
            return None;
        }
        Some((column as u16, row as u16))
    }
}

/// Cells on the straight line from `from` to `to`, both ends included.
pub fn cell_line(from: (u16, u16), to: (u16, u16)) -> Vec<(u16, u16)> {
    let (mut x, mut y) = (from.0 as i32, from.1 as i32);
    let (x1, y1) = (to.0 as i32, to.1 as i32);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut cells = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        cells.push((x as u16, y as u16));
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}
