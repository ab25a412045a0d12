//! X bitmap dumps of a section's glyphs.
//!
//! One block per character, each holding the packed rows of its canvas:
//!
//! ```text
//! # XBM File
//!
//! /* Character: 'A' */
//! #define A_width 16
//! #define A_height 32
//! static char A_bits[] = {
//!   0x00, 0x00,
//!   ...
//! };
//! ```

use std::fmt::{self, Display};

use crate::bitmap::PackedRow;

/// The packed rows of one character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XbmGlyph {
    pub ch: char,
    pub rows: Vec<PackedRow>,
}

/// Every glyph of a section, in address order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XbmFile {
    width: u32,
    height: u32,
    glyphs: Vec<XbmGlyph>,
}

impl XbmFile {
    pub fn new(width: u32, height: u32) -> Self {
        XbmFile {
            width,
            height,
            glyphs: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn glyphs(&self) -> &[XbmGlyph] {
        &self.glyphs
    }

    pub fn push_glyph(&mut self, ch: char, rows: Vec<PackedRow>) {
        self.glyphs.push(XbmGlyph { ch, rows });
    }
}

impl Display for XbmFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# XBM File")?;
        writeln!(f)?;
        for XbmGlyph { ch, rows } in &self.glyphs {
            writeln!(f, "/* Character: '{ch}' */")?;
            writeln!(f, "#define {ch}_width {}", self.width)?;
            writeln!(f, "#define {ch}_height {}", self.height)?;
            writeln!(f, "static char {ch}_bits[] = {{")?;
            for row in rows {
                write!(f, " ")?;
                for byte in row.bytes() {
                    write!(f, " 0x{byte:02X},")?;
                }
                writeln!(f)?;
            }
            writeln!(f, "}};")?;
            writeln!(f)?;
        }
        Ok(())
    }
}
