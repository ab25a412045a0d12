//! Compiling font glyphs into character ROM images.
//!
//! Glyphs move through three representations on their way into a ROM:
//!
//! 1. a monochrome [`PixelGrid`] per character, built by [`build_glyph`] from
//!    the greyscale coverage produced by a [`Rasterizer`];
//! 2. a memory-initialization text file ([`MifFile`]) with one
//!    `ADDRESS : DATA;` record per packed pixel row;
//! 3. a flat binary [`RomImage`] where every section occupies a fixed region
//!    and the final two bytes hold a checksum.
//!
//! Each section's bitmaps are also kept as an [`XbmFile`] for inspection.
//!
//! The memory-initialization files can additionally be [consolidated] into
//! eight-record runs or [split] into 16-bit high and low banks.
//!
//! The entry point for a full run is [`compile`].
//!
//! [consolidated]: consolidate::consolidate
//! [split]: split::split_file

pub mod bitmap;
pub mod compile;
pub mod config;
pub mod consolidate;
mod error;
pub mod glyph;
pub mod mif;
pub mod rom;
pub mod split;
pub mod xbm;

pub use bitmap::{PackedRow, PixelGrid};
pub use compile::{compile, Compilation, CompilationContext, SectionOutput};
pub use config::{RomConfig, SectionConfig, SectionPlacement};
pub use consolidate::{consolidate, Consolidated, ConsolidatedRecord, Consolidator, OutputMode};
pub use error::{Error, FieldError, FieldProblem};
pub use glyph::{build_glyph, Coverage, GlyphError, GlyphSpec, RasterError, Rasterizer};
pub use mif::{MemoryRecord, MifFile, MifHeader, MifLine, Radix, RecordEncoder};
pub use rom::{checksum, RegionLayout, RomBuilder, RomImage, RomLayout};
pub use split::{split_file, split_record, SplitRecordPair};
pub use xbm::{XbmFile, XbmGlyph};
