//! Configuration for a compilation run.
//!
//! Everything has a default matching the legacy three-section ROM, so an
//! empty TOML file is a complete configuration:
//!
//! ```toml
//! chars = "0123456789"
//! consolidate = "hex_and_binary"
//!
//! [[sections]]
//! name = "16x32"
//! file_stem = "FontRom32"
//! placement = { direct = { region = "16x32" } }
//! glyph = { canvas_width = 16, canvas_height = 32, forced_height = 28, max_width = 13 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{consolidate::OutputMode, error::Error, glyph::GlyphSpec, rom::RomLayout};

/// The complete input of [`compile`](crate::compile).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomConfig {
    /// The characters of every section, in address order.
    pub chars: String,
    pub sections: Vec<SectionConfig>,
    pub layout: RomLayout,
    /// Also produce consolidated text files in this mode.
    pub consolidate: Option<OutputMode>,
}

/// One glyph canvas configuration and where its words go.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    /// The base of the file names of this section's text artifacts.
    pub file_stem: String,
    pub glyph: GlyphSpec,
    pub placement: SectionPlacement,
}

/// Where a section is stored in the image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPlacement {
    /// 16-bit words written to one region.
    Direct { region: String },
    /// 32-bit words split into high and low halves in two regions.
    Split { high: String, low: String },
}

impl RomConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    /// The characters to compile, with repeats removed.
    ///
    /// A character keeps the position of its first occurrence.
    pub fn characters(&self) -> Vec<char> {
        let mut seen = std::collections::HashSet::new();
        self.chars.chars().filter(|ch| seen.insert(*ch)).collect()
    }

    /// Check that every section can be compiled into the layout.
    pub fn validate(&self) -> Result<(), Error> {
        self.layout.validate()?;
        for section in &self.sections {
            let width = section.glyph.canvas_width;
            if width == 0 || width % 8 != 0 {
                return Err(Error::CanvasWidth(width));
            }
            let (regions, word_width) = match &section.placement {
                SectionPlacement::Direct { region } => (vec![region], 16),
                SectionPlacement::Split { high, low } => (vec![high, low], 32),
            };
            if width != word_width {
                return Err(Error::Placement {
                    section: section.name.clone(),
                    width,
                });
            }
            if let Some(missing) = regions
                .into_iter()
                .find(|name| self.layout.region(name).is_none())
            {
                return Err(Error::UnknownRegion(missing.clone()));
            }
        }
        Ok(())
    }
}

impl Default for RomConfig {
    fn default() -> Self {
        RomConfig {
            chars: default_chars(),
            sections: vec![
                SectionConfig {
                    name: "16x32".into(),
                    file_stem: "FontRom32".into(),
                    glyph: GlyphSpec::rom_16x32(),
                    placement: SectionPlacement::Direct {
                        region: "16x32".into(),
                    },
                },
                SectionConfig {
                    name: "32x64".into(),
                    file_stem: "FontRom64".into(),
                    glyph: GlyphSpec::rom_32x64(),
                    placement: SectionPlacement::Split {
                        high: "32x64_high".into(),
                        low: "32x64_low".into(),
                    },
                },
                SectionConfig {
                    name: "32x64_custom".into(),
                    file_stem: "FontRomCustom".into(),
                    glyph: GlyphSpec::rom_32x64_custom(),
                    placement: SectionPlacement::Split {
                        high: "32x64_custom_high".into(),
                        low: "32x64_custom_low".into(),
                    },
                },
            ],
            layout: RomLayout::legacy(),
            consolidate: None,
        }
    }
}

/// Printable ASCII up to the backtick, then the symbols the display needs.
fn default_chars() -> String {
    (' '..='`')
        .chain(['{', '|', '}', '~', '°', '±', '…', '←', '↑', '→', '↓', '⇌', '▼', '✓', ' '])
        .collect()
}
