//! Running the whole pipeline.

use std::ops::Range;

use crate::{
    config::{RomConfig, SectionConfig, SectionPlacement},
    consolidate::{consolidate, Consolidated, OutputMode},
    error::Error,
    glyph::{build_glyph, GlyphSpec, Rasterizer},
    mif::{MifFile, MifHeader, RecordEncoder},
    rom::{RomBuilder, RomImage},
    split::split_file,
    xbm::XbmFile,
};

/// The state of one section's run through the pipeline.
///
/// The address cursor lives here and nowhere else, so separate runs never
/// share addresses.
#[derive(Debug)]
pub struct CompilationContext<'a> {
    spec: &'a GlyphSpec,
    encoder: RecordEncoder,
    xbm: XbmFile,
    skipped: Vec<char>,
}

/// Everything produced for one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionOutput {
    pub name: String,
    pub file_stem: String,
    /// One record per pixel row of every glyph.
    pub mif: MifFile,
    /// The packed bitmaps of every rendered character.
    pub xbm: XbmFile,
    /// The high and low halves, for sections stored split.
    pub split: Option<(MifFile, MifFile)>,
    pub consolidated: Option<Consolidated>,
    /// Characters that failed to render and have no addresses.
    pub skipped: Vec<char>,
}

/// The result of [`compile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compilation {
    pub sections: Vec<SectionOutput>,
    pub image: RomImage,
}

impl<'a> CompilationContext<'a> {
    pub fn new(spec: &'a GlyphSpec) -> Self {
        let header = MifHeader::new(spec.canvas_width, spec.depth());
        CompilationContext {
            spec,
            encoder: RecordEncoder::new(header),
            xbm: XbmFile::new(spec.canvas_width, spec.canvas_height),
            skipped: Vec::new(),
        }
    }

    /// The address the next glyph starts at.
    pub fn cursor(&self) -> u32 {
        self.encoder.cursor()
    }

    /// Render, pack and encode one character.
    ///
    /// Returns the addresses assigned to it, or `None` if it could not be
    /// rendered, in which case it takes no addresses at all.
    pub fn add_char(&mut self, ch: char, rasterizer: &mut impl Rasterizer) -> Option<Range<u32>> {
        match build_glyph(self.spec, ch, rasterizer) {
            Ok(grid) => {
                let rows = grid.pack();
                let addresses = self.encoder.encode_glyph(ch, &rows);
                self.xbm.push_glyph(ch, rows);
                Some(addresses)
            }
            Err(e) => {
                log::warn!("skipping {ch:?} (U+{:04X}): {e}", ch as u32);
                self.skipped.push(ch);
                None
            }
        }
    }

    /// Finish the section, writing its words into the image and producing
    /// its derived files.
    pub fn finish(
        self,
        section: &SectionConfig,
        mode: Option<OutputMode>,
        builder: &mut RomBuilder,
    ) -> Result<SectionOutput, Error> {
        let mif = self.encoder.finish();
        let split = match &section.placement {
            SectionPlacement::Direct { region } => {
                builder.write_region(region, mif.records())?;
                None
            }
            SectionPlacement::Split { high, low } => {
                let (high_mif, low_mif) = split_file(&mif);
                builder.write_region(high, high_mif.records())?;
                builder.write_region(low, low_mif.records())?;
                Some((high_mif, low_mif))
            }
        };
        let consolidated = mode.map(|mode| consolidate(&mif, mode)).transpose()?;
        Ok(SectionOutput {
            name: section.name.clone(),
            file_stem: section.file_stem.clone(),
            mif,
            xbm: self.xbm,
            split,
            consolidated,
            skipped: self.skipped,
        })
    }
}

/// Compile every section of `config` and assemble the ROM image.
pub fn compile(config: &RomConfig, rasterizer: &mut impl Rasterizer) -> Result<Compilation, Error> {
    config.validate()?;
    let chars = config.characters();
    let mut builder = RomBuilder::new(config.layout.clone())?;
    let mut sections = Vec::with_capacity(config.sections.len());

    for section in &config.sections {
        let mut context = CompilationContext::new(&section.glyph);
        for ch in &chars {
            context.add_char(*ch, rasterizer);
        }
        log::info!(
            "section '{}': {} words for {} characters",
            section.name,
            context.cursor(),
            chars.len() - context.skipped.len()
        );
        sections.push(context.finish(section, config.consolidate, &mut builder)?);
    }

    Ok(Compilation {
        sections,
        image: builder.build(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Coverage, RasterError};

    /// Draws a solid block for every character except 'x', which is missing.
    fn blocks_without_x(ch: char, _: f32) -> Result<Coverage, RasterError> {
        match ch {
            'x' => Err(RasterError::MissingGlyph(ch)),
            _ => Ok(Coverage {
                width: 8,
                height: 16,
                data: vec![255; 128],
            }),
        }
    }

    #[test]
    fn failed_characters_take_no_addresses() {
        let spec = GlyphSpec::rom_16x32();
        let mut rasterizer = blocks_without_x;
        let mut context = CompilationContext::new(&spec);
        assert_eq!(context.add_char('a', &mut rasterizer), Some(0..32));
        assert_eq!(context.add_char('x', &mut rasterizer), None);
        assert_eq!(context.add_char(' ', &mut rasterizer), Some(32..64));
        assert_eq!(context.add_char('b', &mut rasterizer), Some(64..96));
        assert_eq!(context.skipped, ['x']);
        let drawn: Vec<_> = context.xbm.glyphs().iter().map(|g| g.ch).collect();
        assert_eq!(drawn, ['a', ' ', 'b']);
        assert!(context.xbm.glyphs().iter().all(|g| g.rows.len() == 32));
    }

    #[test]
    fn contexts_start_at_zero() {
        let spec = GlyphSpec::rom_32x64();
        let mut rasterizer = blocks_without_x;
        let mut first = CompilationContext::new(&spec);
        first.add_char('a', &mut rasterizer);
        assert_eq!(first.cursor(), 64);
        let second = CompilationContext::new(&spec);
        assert_eq!(second.cursor(), 0);
    }

    #[test]
    fn split_sections_write_both_halves() {
        let config = RomConfig {
            chars: "a".into(),
            ..RomConfig::default()
        };
        let mut rasterizer = blocks_without_x;
        let compilation = compile(&config, &mut rasterizer).unwrap();
        let section = &compilation.sections[1];
        let (high, low) = section.split.as_ref().unwrap();
        assert_eq!(high.records().count(), 64);
        assert_eq!(low.records().count(), 64);
        assert_eq!(high.header.width, 16);
        assert!(section.consolidated.is_none());
        assert!(compilation.image.verify());
    }
}
