//! Splitting 32-bit words into 16-bit high and low banks.

use crate::mif::{MemoryRecord, MifFile, MifLine};

/// The number of hex digits in a splittable word.
const WORD_DIGITS: usize = 8;

/// The two halves of one record, both at the source address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitRecordPair {
    pub high: MemoryRecord,
    pub low: MemoryRecord,
}

/// Split a record into its most and least significant halves.
///
/// Data that is not exactly eight digits long is copied unchanged into both
/// halves.
pub fn split_record(record: &MemoryRecord) -> SplitRecordPair {
    let data = record.data.as_str();
    let (high, low) = if data.len() == WORD_DIGITS && data.is_ascii() {
        data.split_at(WORD_DIGITS / 2)
    } else {
        (data, data)
    };
    SplitRecordPair {
        high: MemoryRecord::new(record.address, high),
        low: MemoryRecord::new(record.address, low),
    }
}

/// Split every record of a file, returning the `(high, low)` files.
///
/// Comments are copied into both. A 32-bit header is narrowed to 16 bits.
pub fn split_file(file: &MifFile) -> (MifFile, MifFile) {
    let mut header = file.header.clone();
    if header.width == 32 {
        header.width = 16;
    }
    let mut high = MifFile::new(header.clone());
    let mut low = MifFile::new(header);
    for line in &file.lines {
        match line {
            MifLine::Comment(text) => {
                high.push_comment(text.clone());
                low.push_comment(text.clone());
            }
            MifLine::Record(record) => {
                let pair = split_record(record);
                high.push_record(pair.high);
                low.push_record(pair.low);
            }
        }
    }
    (high, low)
}
