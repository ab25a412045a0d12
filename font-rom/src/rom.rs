//! Assembling sections into a flat ROM image.
//!
//! The image is a fixed-size buffer divided into named regions. Each record
//! of a section is a 16-bit word stored most significant byte first at
//! `region.offset + address * 2`. The last two bytes of the image hold the
//! sum of every preceding byte, modulo 65536, most significant byte first.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, FieldError, FieldProblem},
    mif::MemoryRecord,
};

/// Bytes per word.
pub const WORD_SIZE: usize = 2;
/// Bytes in the checksum trailer.
pub const CHECKSUM_LEN: usize = 2;

/// A named, fixed region of the image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLayout {
    pub name: String,
    /// The byte offset of the start of the region.
    pub offset: usize,
    /// The size of the region in bytes.
    pub size: usize,
}

/// The regions of an image and its total size, trailer included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomLayout {
    pub total_size: usize,
    pub regions: Vec<RegionLayout>,
}

/// Writes sections into their regions.
///
/// Created once per run; [`RomBuilder::build`] computes the checksum and
/// hands out the finished [`RomImage`].
#[derive(Clone, Debug)]
pub struct RomBuilder {
    layout: RomLayout,
    data: Vec<u8>,
}

/// A finished image with its checksum trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RomImage {
    data: Vec<u8>,
}

/// The sum of all bytes, modulo 65536.
pub fn checksum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |sum, byte| sum.wrapping_add(*byte as u16))
}

impl RegionLayout {
    pub fn new(name: impl Into<String>, offset: usize, size: usize) -> Self {
        RegionLayout {
            name: name.into(),
            offset,
            size,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    fn overlaps(&self, other: &RegionLayout) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

impl RomLayout {
    /// The 72 KiB layout of the three legacy sections.
    pub fn legacy() -> Self {
        RomLayout {
            total_size: 73728,
            regions: vec![
                RegionLayout::new("16x32", 0x0000, 0x2000),
                RegionLayout::new("32x64_high", 0x2000, 0x4000),
                RegionLayout::new("32x64_low", 0x6000, 0x4000),
                RegionLayout::new("32x64_custom_high", 0xA000, 0x3000),
                RegionLayout::new("32x64_custom_low", 0xD000, 0x3000),
            ],
        }
    }

    pub fn region(&self, name: &str) -> Option<&RegionLayout> {
        self.regions.iter().find(|region| region.name == name)
    }

    /// The offset of the checksum trailer.
    pub fn data_len(&self) -> usize {
        self.total_size.saturating_sub(CHECKSUM_LEN)
    }

    /// Check that regions are disjoint and clear of the checksum trailer.
    pub fn validate(&self) -> Result<(), Error> {
        if self.total_size < CHECKSUM_LEN {
            return Err(Error::ImageTooSmall(self.total_size));
        }
        let limit = self.data_len();
        for (i, region) in self.regions.iter().enumerate() {
            if region.end() > limit {
                return Err(Error::RegionOutOfBounds {
                    name: region.name.clone(),
                    end: region.end(),
                    limit,
                });
            }
            if let Some(other) = self.regions[i + 1..]
                .iter()
                .find(|other| region.overlaps(other) || region.name == other.name)
            {
                return Err(Error::OverlappingRegions {
                    first: region.name.clone(),
                    second: other.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for RomLayout {
    fn default() -> Self {
        Self::legacy()
    }
}

impl RomBuilder {
    /// Allocate a zero-filled image for a layout.
    pub fn new(layout: RomLayout) -> Result<Self, Error> {
        layout.validate()?;
        let data = vec![0; layout.total_size];
        Ok(RomBuilder { layout, data })
    }

    pub fn layout(&self) -> &RomLayout {
        &self.layout
    }

    /// Write records into the named region, returning how many were written.
    ///
    /// Words that would land outside the image are dropped. Words past the
    /// end of their region but inside the image are still written.
    pub fn write_region<'a>(
        &mut self,
        name: &str,
        records: impl IntoIterator<Item = &'a MemoryRecord>,
    ) -> Result<usize, Error> {
        let region = self
            .layout
            .region(name)
            .ok_or_else(|| Error::UnknownRegion(name.to_owned()))?;
        let (base, region_end) = (region.offset, region.end());
        let mut written = 0;
        let mut spilled = 0;
        let mut dropped = 0;
        for record in records {
            let word = decode_word(record)?;
            let offset = base + record.address as usize * WORD_SIZE;
            let Some(target) = self.data.get_mut(offset..offset + WORD_SIZE) else {
                dropped += 1;
                continue;
            };
            target.copy_from_slice(&word);
            written += 1;
            if offset + WORD_SIZE > region_end {
                spilled += 1;
            }
        }
        if spilled > 0 {
            log::warn!("{spilled} words of '{name}' extend past the end of the region");
        }
        if dropped > 0 {
            log::debug!("dropped {dropped} words of '{name}' outside the image");
        }
        Ok(written)
    }

    /// Compute the checksum and finish the image.
    pub fn build(mut self) -> RomImage {
        let split = self.layout.data_len();
        let sum = checksum(&self.data[..split]);
        self.data[split..].copy_from_slice(&sum.to_be_bytes());
        log::info!(
            "built {} byte image, checksum {sum:#06X}",
            self.data.len()
        );
        RomImage { data: self.data }
    }
}

impl RomImage {
    /// Wrap an existing image, e.g. one read back from disk.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        if data.len() < CHECKSUM_LEN {
            return Err(Error::ImageTooSmall(data.len()));
        }
        Ok(RomImage { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The checksum stored in the trailer.
    pub fn stored_checksum(&self) -> u16 {
        let split = self.data.len() - CHECKSUM_LEN;
        u16::from_be_bytes([self.data[split], self.data[split + 1]])
    }

    /// The checksum of everything before the trailer.
    pub fn computed_checksum(&self) -> u16 {
        checksum(&self.data[..self.data.len() - CHECKSUM_LEN])
    }

    /// Returns `true` if the trailer matches the contents.
    pub fn verify(&self) -> bool {
        self.stored_checksum() == self.computed_checksum()
    }

    /// The 16-bit word at the given byte offset, if it is in the image.
    pub fn word_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.data.get(offset..offset + WORD_SIZE)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

/// Interpret the data of a record as one big-endian word.
fn decode_word(record: &MemoryRecord) -> Result<[u8; WORD_SIZE], FieldError> {
    let error = |problem| FieldError {
        address: record.address,
        data: record.data.clone(),
        problem,
    };
    let digits = record.data.as_bytes();
    if digits.len() != WORD_SIZE * 2 {
        return Err(error(FieldProblem::Width {
            expected: WORD_SIZE * 2,
        }));
    }
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(error(FieldProblem::NotHex));
    }
    let mut word = [0u8; WORD_SIZE];
    for (byte, pair) in word.iter_mut().zip(digits.chunks(2)) {
        let pair = std::str::from_utf8(pair).map_err(|_| error(FieldProblem::NotHex))?;
        *byte = u8::from_str_radix(pair, 16).map_err(|_| error(FieldProblem::NotHex))?;
    }
    Ok(word)
}
