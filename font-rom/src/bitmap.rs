//! Monochrome glyph canvases and their packed byte rows.

use std::fmt::Write;

/// A fixed-size grid of "ink" pixels.
///
/// The dimensions are the declared canvas size of a section; glyph content is
/// centered or padded into it and anything outside is cropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    ink: Vec<bool>,
}

/// The bytes of one packed pixel row.
///
/// Bit 7 of byte `i` is pixel column `i * 8`, bit 0 is column `i * 8 + 7`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedRow(Vec<u8>);

impl PixelGrid {
    /// Create a grid with no ink.
    pub fn new(width: u32, height: u32) -> Self {
        PixelGrid {
            width,
            height,
            ink: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if the pixel at (x, y) is inked.
    ///
    /// Coordinates outside the grid are never inked.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.index(x, y).map(|ix| self.ink[ix]).unwrap_or(false)
    }

    /// Set the pixel at (x, y); writes outside the grid are dropped.
    pub fn set(&mut self, x: u32, y: u32, ink: bool) {
        if let Some(ix) = self.index(x, y) {
            self.ink[ix] = ink;
        }
    }

    /// Returns `true` if no pixel is inked.
    pub fn is_blank(&self) -> bool {
        !self.ink.iter().any(|ink| *ink)
    }

    /// Iterate over the rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        // chunks panics on zero, and a zero-width grid has no pixels anyway
        self.ink
            .chunks(self.width.max(1) as usize)
            .take(self.height as usize)
    }

    /// Pack each row into bytes, eight pixels per byte, most significant
    /// bit first.
    ///
    /// Section canvases always have a width that is a multiple of eight; for
    /// any other width the trailing byte of each row is zero-filled on the
    /// right.
    pub fn pack(&self) -> Vec<PackedRow> {
        let bytes_per_row = self.width.div_ceil(8) as usize;
        (0..self.height)
            .map(|y| {
                let mut bytes = vec![0u8; bytes_per_row];
                for x in (0..self.width).filter(|x| self.get(*x, y)) {
                    bytes[x as usize / 8] |= 0x80 >> (x % 8);
                }
                PackedRow(bytes)
            })
            .collect()
    }

    /// Rebuild a grid of the given width from packed rows.
    ///
    /// This is the inverse of [`PixelGrid::pack`]; bits past `width` are
    /// ignored.
    pub fn unpack(rows: &[PackedRow], width: u32) -> Self {
        let mut grid = PixelGrid::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for x in 0..width {
                let bit = row
                    .0
                    .get(x as usize / 8)
                    .map(|byte| byte & (0x80 >> (x % 8)) != 0)
                    .unwrap_or(false);
                grid.set(x, y as u32, bit);
            }
        }
        grid
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

impl PackedRow {
    pub fn new(bytes: Vec<u8>) -> Self {
        PackedRow(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// The row as uppercase hexadecimal, two digits per byte.
    pub fn to_hex(&self) -> String {
        self.0
            .iter()
            .fold(String::with_capacity(self.0.len() * 2), |mut out, byte| {
                let _ = write!(out, "{byte:02X}");
                out
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> PixelGrid {
        let mut grid = PixelGrid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.set(x, y, (x + y) % 2 == 0 || x % 7 == 3);
            }
        }
        grid
    }

    #[test]
    fn msb_is_leftmost() {
        let mut grid = PixelGrid::new(16, 1);
        grid.set(0, 0, true);
        grid.set(15, 0, true);
        let rows = grid.pack();
        assert_eq!(rows, vec![PackedRow::new(vec![0x80, 0x01])]);
        assert_eq!(rows[0].to_hex(), "8001");
    }

    #[test]
    fn one_row_per_pixel_row() {
        let rows = PixelGrid::new(32, 64).pack();
        assert_eq!(rows.len(), 64);
        assert!(rows.iter().all(|row| row.bytes() == [0, 0, 0, 0]));
        assert_eq!(rows[0].to_hex(), "00000000");
    }

    #[test]
    fn unpack_reverses_pack() {
        for (width, height) in [(8, 3), (16, 32), (32, 64)] {
            let grid = checkerboard(width, height);
            assert_eq!(PixelGrid::unpack(&grid.pack(), width), grid);
        }
    }

    #[test]
    fn partial_byte_is_zero_filled() {
        let mut grid = PixelGrid::new(10, 1);
        (0..10).for_each(|x| grid.set(x, 0, true));
        assert_eq!(grid.pack()[0].bytes(), [0xFF, 0xC0]);
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut grid = PixelGrid::new(8, 2);
        grid.set(8, 0, true);
        grid.set(0, 2, true);
        assert!(grid.is_blank());
        assert!(!grid.get(100, 100));
    }
}
