//! FrameBuffer - a 2D grid of cells painted from a host subtree.
//!
//! Flat storage with row-major indexing: `index = y * width + x`.

use crate::types::Rgba;

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    /// `None` keeps the terminal's default.
    pub fg: Option<Rgba>,
    pub bg: Option<Rgba>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            bold: false,
        }
    }
}

impl Cell {
    /// Same colors and weight, ignoring the character.
    pub fn same_style(&self, other: &Cell) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.bold == other.bold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Cells of row `y`, empty when out of bounds.
    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = self.index(0, y);
        &self.cells[start..start + self.width as usize]
    }

    /// Fill a rectangle's background, clipped to the buffer.
    pub fn fill_bg(&mut self, x: u16, y: u16, width: u16, height: u16, bg: Rgba) {
        for row in y..y.saturating_add(height).min(self.height) {
            for col in x..x.saturating_add(width).min(self.width) {
                if let Some(cell) = self.get_mut(col, row) {
                    cell.bg = Some(bg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let buffer = FrameBuffer::new(3, 2);
        assert!(buffer.get(2, 1).is_some());
        assert!(buffer.get(3, 0).is_none());
        assert!(buffer.row(2).is_empty());
        assert_eq!(buffer.row(1).len(), 3);
    }

    #[test]
    fn test_fill_bg_clips() {
        let mut buffer = FrameBuffer::new(3, 2);
        buffer.fill_bg(1, 1, 10, 10, Rgba::RED);
        assert_eq!(buffer.get(0, 1).unwrap().bg, None);
        assert_eq!(buffer.get(2, 1).unwrap().bg, Some(Rgba::RED));
        assert_eq!(buffer.get(2, 0).unwrap().bg, None);
    }
}
