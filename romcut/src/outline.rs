//! Rendering characters of a font file into greyscale coverage.

use font_rom::{Coverage, RasterError, Rasterizer};
use fontdue::FontSettings;
use miette::miette;
use skrifa::{charmap::Charmap, FontRef, MetadataProvider};

/// A [`Rasterizer`] over the raw bytes of a font file.
///
/// Characters are mapped through the font's cmap with skrifa, and the
/// mapped glyph is scan converted by fontdue.
pub struct FontRasterizer<'a> {
    charmap: Charmap<'a>,
    font: fontdue::Font,
}

impl<'a> FontRasterizer<'a> {
    pub fn new(data: &'a [u8]) -> miette::Result<Self> {
        let font_ref = FontRef::new(data).map_err(|e| miette!("failed to parse font: {e}"))?;
        let font = fontdue::Font::from_bytes(data, FontSettings::default())
            .map_err(|e| miette!("failed to load font outlines: {e}"))?;
        Ok(FontRasterizer {
            charmap: font_ref.charmap(),
            font,
        })
    }
}

impl Rasterizer for FontRasterizer<'_> {
    fn rasterize(&mut self, ch: char, pixel_size: f32) -> Result<Coverage, RasterError> {
        let gid = self.charmap.map(ch).ok_or(RasterError::MissingGlyph(ch))?;
        let index = u16::try_from(gid.to_u32())
            .map_err(|_| RasterError::Failed(format!("glyph id {} is out of range", gid)))?;
        let (metrics, bitmap) = self.font.rasterize_indexed(index, pixel_size);
        coverage(metrics.width, metrics.height, bitmap)
    }
}

/// Wrap a top-down row-major bitmap, checking its size.
fn coverage(width: usize, height: usize, data: Vec<u8>) -> Result<Coverage, RasterError> {
    if data.len() != width * height {
        return Err(RasterError::Failed(format!(
            "{width}x{height} bitmap has {} bytes",
            data.len()
        )));
    }
    let dimension = |value: usize| {
        u32::try_from(value)
            .map_err(|_| RasterError::Failed(format!("{value} pixels is too large")))
    };
    Ok(Coverage {
        width: dimension(width)?,
        height: dimension(height)?,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_bitmaps() {
        let coverage = coverage(3, 2, vec![0, 128, 255, 255, 128, 0]).unwrap();
        assert_eq!((coverage.width, coverage.height), (3, 2));
        assert_eq!(coverage.data[2], 255);
    }

    #[test]
    fn empty_glyphs_have_no_size() {
        let coverage = coverage(0, 0, Vec::new()).unwrap();
        assert_eq!((coverage.width, coverage.height), (0, 0));
    }

    #[test]
    fn short_bitmaps_are_rejected() {
        assert!(matches!(
            coverage(4, 4, vec![0; 15]),
            Err(RasterError::Failed(_))
        ));
    }

    #[test]
    fn rejects_non_fonts() {
        assert!(FontRasterizer::new(b"definitely not a font file").is_err());
        assert!(FontRasterizer::new(&[]).is_err());
    }
}
