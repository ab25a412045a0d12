//! Building fixed-size glyph bitmaps from rendered coverage.
//!
//! A character is rendered by a [`Rasterizer`] at twice the forced glyph
//! height, resampled to its target size, thresholded, and then placed on
//! the section canvas. Placement either centers the glyph inside an inner
//! grid that is itself centered on the canvas, or (when no inner grid is
//! configured) centers it horizontally below a fixed top padding.

use image::{imageops::FilterType, GrayImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bitmap::PixelGrid;

const DEFAULT_PUNCTUATION_SCALE: f32 = 0.25;
const DEFAULT_NARROW_SCALE: f32 = 0.5;
const DEFAULT_THRESHOLD: u8 = 128;

/// Word depth of a 16×32 section.
pub const SMALL_SECTION_DEPTH: u32 = 8192;
/// Word depth of every other section.
pub const LARGE_SECTION_DEPTH: u32 = 16384;

/// How the glyphs of one ROM section are rendered and placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlyphSpec {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// The height every normal glyph is scaled to.
    pub forced_height: u32,
    /// The widest a scaled glyph may become.
    pub max_width: u32,
    #[serde(default)]
    pub padding_top: u32,
    #[serde(default)]
    pub padding_bottom: u32,
    /// An inner grid the glyph is centered in.
    ///
    /// When this is `None` the glyph is placed using the paddings instead.
    #[serde(default)]
    pub inner_grid: Option<GridSize>,
    /// Characters scaled down by `punctuation_scale` and sat on the bottom
    /// edge of the inner grid.
    #[serde(default = "default_punctuation")]
    pub punctuation: String,
    #[serde(default = "default_punctuation_scale")]
    pub punctuation_scale: f32,
    /// Characters whose width is scaled by `narrow_scale`.
    #[serde(default = "default_narrow")]
    pub narrow: String,
    #[serde(default = "default_narrow_scale")]
    pub narrow_scale: f32,
    /// Resampled coverage above this value is ink.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
}

/// The size of the inner grid glyphs are centered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

/// How a character is scaled relative to the forced height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleClass {
    Punctuation,
    Narrow,
    Normal,
}

/// Greyscale coverage of one rendered character, cropped to its ink.
///
/// `data` holds `width * height` bytes in row-major order, 0 meaning no
/// coverage and 255 full coverage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Renders characters of some font into greyscale coverage.
pub trait Rasterizer {
    /// Render `ch` at `pixel_size` pixels per em.
    fn rasterize(&mut self, ch: char, pixel_size: f32) -> Result<Coverage, RasterError>;
}

impl<F> Rasterizer for F
where
    F: FnMut(char, f32) -> Result<Coverage, RasterError>,
{
    fn rasterize(&mut self, ch: char, pixel_size: f32) -> Result<Coverage, RasterError> {
        self(ch, pixel_size)
    }
}

/// A failure reported by a [`Rasterizer`].
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("no glyph is mapped to {0:?}")]
    MissingGlyph(char),
    #[error("{0}")]
    Failed(String),
}

/// A character that could not be turned into a bitmap.
///
/// These are recoverable: the character is left out of the section.
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("failed to rasterize {ch:?}")]
    Raster {
        ch: char,
        #[source]
        source: RasterError,
    },
    #[error("{ch:?} scales to an empty {width}x{height} bitmap")]
    EmptyTarget { ch: char, width: u32, height: u32 },
    #[error("coverage for {ch:?} has {len} bytes, expected {width}x{height}")]
    InvalidCoverage {
        ch: char,
        len: usize,
        width: u32,
        height: u32,
    },
}

impl GlyphSpec {
    /// The 16×32 section: glyphs 28 pixels tall below a 2 pixel padding.
    pub fn rom_16x32() -> Self {
        GlyphSpec {
            canvas_width: 16,
            canvas_height: 32,
            forced_height: 28,
            max_width: 13,
            padding_top: 2,
            padding_bottom: 2,
            inner_grid: None,
            punctuation: default_punctuation(),
            punctuation_scale: DEFAULT_PUNCTUATION_SCALE,
            narrow: default_narrow(),
            narrow_scale: DEFAULT_NARROW_SCALE,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// The standard 32×64 section, drawn into a 17×39 inner grid.
    pub fn rom_32x64() -> Self {
        GlyphSpec {
            canvas_width: 32,
            canvas_height: 64,
            forced_height: 39,
            max_width: 17,
            padding_top: 0,
            padding_bottom: 2,
            inner_grid: Some(GridSize {
                width: 17,
                height: 39,
            }),
            ..Self::rom_16x32()
        }
    }

    /// The alternate 32×64 section, drawn into a 26×58 inner grid.
    pub fn rom_32x64_custom() -> Self {
        GlyphSpec {
            forced_height: 58,
            max_width: 26,
            inner_grid: Some(GridSize {
                width: 26,
                height: 58,
            }),
            ..Self::rom_32x64()
        }
    }

    /// The number of words reserved for this section.
    pub fn depth(&self) -> u32 {
        if (self.canvas_width, self.canvas_height) == (16, 32) {
            SMALL_SECTION_DEPTH
        } else {
            LARGE_SECTION_DEPTH
        }
    }

    /// The size characters are rendered at before being scaled down.
    pub fn render_size(&self) -> f32 {
        self.forced_height as f32 * 2.0
    }

    pub fn scale_class(&self, ch: char) -> ScaleClass {
        if self.punctuation.contains(ch) {
            ScaleClass::Punctuation
        } else if self.narrow.contains(ch) {
            ScaleClass::Narrow
        } else {
            ScaleClass::Normal
        }
    }

    /// The (width, height) a glyph with the given raw size is scaled to.
    pub fn target_size(&self, class: ScaleClass, raw_width: u32, raw_height: u32) -> (u32, u32) {
        let aspect = raw_width as f64 / raw_height as f64;
        let forced = self.forced_height as f64;
        let (width, height) = match class {
            ScaleClass::Punctuation => {
                let height = (forced * self.punctuation_scale as f64) as u32;
                ((height as f64 * aspect) as u32, height)
            }
            ScaleClass::Narrow => (
                (forced * aspect * self.narrow_scale as f64) as u32,
                self.forced_height,
            ),
            ScaleClass::Normal => ((forced * aspect) as u32, self.forced_height),
        };
        (width.min(self.max_width), height)
    }

    /// The canvas position of the top-left pixel of a scaled glyph.
    fn origin(&self, class: ScaleClass, width: u32, height: u32) -> (u32, u32) {
        match self.inner_grid {
            Some(grid) => {
                let grid_x = self.canvas_width.saturating_sub(grid.width) / 2;
                let grid_y = self.canvas_height.saturating_sub(grid.height) / 2;
                let dx = grid.width.saturating_sub(width) / 2;
                let dy = match class {
                    ScaleClass::Punctuation => grid.height.saturating_sub(height),
                    _ => grid.height.saturating_sub(height) / 2,
                };
                (grid_x + dx, grid_y + dy)
            }
            None => (
                self.canvas_width.saturating_sub(width) / 2,
                self.padding_top,
            ),
        }
    }

    /// The first canvas row glyph content may not reach.
    fn bottom_limit(&self) -> u32 {
        match self.inner_grid {
            Some(_) => self.canvas_height,
            None => self.canvas_height.saturating_sub(self.padding_bottom),
        }
    }
}

impl Default for GlyphSpec {
    fn default() -> Self {
        Self::rom_16x32()
    }
}

/// Turn one character into a canvas-sized bitmap.
///
/// A space, or a character that renders with no ink at all, produces a blank
/// canvas so that it still occupies its slot in the section.
pub fn build_glyph(
    spec: &GlyphSpec,
    ch: char,
    rasterizer: &mut impl Rasterizer,
) -> Result<PixelGrid, GlyphError> {
    let mut grid = PixelGrid::new(spec.canvas_width, spec.canvas_height);
    if ch == ' ' {
        return Ok(grid);
    }
    let coverage = rasterizer
        .rasterize(ch, spec.render_size())
        .map_err(|source| GlyphError::Raster { ch, source })?;
    if coverage.width == 0 || coverage.height == 0 {
        return Ok(grid);
    }
    let (raw_width, raw_height) = (coverage.width, coverage.height);
    let len = coverage.data.len();
    let source = GrayImage::from_raw(raw_width, raw_height, coverage.data).ok_or(
        GlyphError::InvalidCoverage {
            ch,
            len,
            width: raw_width,
            height: raw_height,
        },
    )?;

    let class = spec.scale_class(ch);
    let (width, height) = spec.target_size(class, raw_width, raw_height);
    if width == 0 || height == 0 {
        return Err(GlyphError::EmptyTarget { ch, width, height });
    }
    let scaled = image::imageops::resize(&source, width, height, FilterType::Lanczos3);

    let (x0, y0) = spec.origin(class, width, height);
    let limit = spec.bottom_limit();
    for (x, y, pixel) in scaled.enumerate_pixels() {
        if pixel.0[0] > spec.threshold && y0 + y < limit {
            grid.set(x0 + x, y0 + y, true);
        }
    }
    log::debug!("{ch:?}: {raw_width}x{raw_height} -> {width}x{height} at ({x0}, {y0})");
    Ok(grid)
}

fn default_punctuation() -> String {
    ",.".into()
}

fn default_narrow() -> String {
    "I".into()
}

fn default_punctuation_scale() -> f32 {
    DEFAULT_PUNCTUATION_SCALE
}

fn default_narrow_scale() -> f32 {
    DEFAULT_NARROW_SCALE
}

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}
