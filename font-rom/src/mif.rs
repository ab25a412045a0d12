//! The memory-initialization text format.
//!
//! A file is a short header of `KEY = VALUE;` lines, a `CONTENT BEGIN`
//! marker, one `ADDRESS : DATA;` record per word, and a closing `END;`.
//! Lines starting with `--` are comments.
//!
//! ```text
//! DEPTH = 8192;
//! WIDTH = 16;
//! ADDRESS_RADIX = HEX;
//! DATA_RADIX = HEX;
//! CONTENT BEGIN
//! -- Character: 'A'
//! 0000 : 0000;
//! 0001 : 0180;
//! END;
//! ```

use std::{
    fmt::{self, Display},
    ops::Range,
    path::Path,
    str::FromStr,
};

use crate::{bitmap::PackedRow, error::Error};

/// The number base of addresses or data in a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Radix {
    Bin,
    Oct,
    Dec,
    #[default]
    Hex,
    Uns,
}

/// The fixed header of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MifHeader {
    /// Bits per word
    pub width: u32,
    /// Capacity in words
    pub depth: u32,
    pub address_radix: Radix,
    pub data_radix: Radix,
}

/// One `ADDRESS : DATA;` line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryRecord {
    pub address: u32,
    pub data: String,
}

/// A line in the body of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MifLine {
    /// The text of a `--` comment, without the marker.
    Comment(String),
    Record(MemoryRecord),
}

/// A parsed or generated memory-initialization file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MifFile {
    pub header: MifHeader,
    pub lines: Vec<MifLine>,
}

/// Assigns consecutive addresses to packed glyph rows.
///
/// One encoder covers one section: the cursor starts at zero and every row
/// of every glyph takes the next address, so glyphs occupy contiguous,
/// non-overlapping ranges.
#[derive(Clone, Debug)]
pub struct RecordEncoder {
    cursor: u32,
    file: MifFile,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Bin => 2,
            Radix::Oct => 8,
            Radix::Dec | Radix::Uns => 10,
            Radix::Hex => 16,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Radix::Bin => "BIN",
            Radix::Oct => "OCT",
            Radix::Dec => "DEC",
            Radix::Hex => "HEX",
            Radix::Uns => "UNS",
        }
    }

    fn format_address(self, address: u32) -> String {
        match self {
            Radix::Hex => format!("{address:04X}"),
            Radix::Bin => format!("{address:b}"),
            Radix::Oct => format!("{address:o}"),
            Radix::Dec | Radix::Uns => address.to_string(),
        }
    }
}

impl FromStr for Radix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BIN" => Ok(Radix::Bin),
            "OCT" => Ok(Radix::Oct),
            "DEC" => Ok(Radix::Dec),
            "HEX" => Ok(Radix::Hex),
            "UNS" => Ok(Radix::Uns),
            _ => Err(format!("unknown radix '{s}'")),
        }
    }
}

impl Display for Radix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl MifHeader {
    /// A header with hexadecimal addresses and data.
    pub fn new(width: u32, depth: u32) -> Self {
        MifHeader {
            width,
            depth,
            address_radix: Radix::Hex,
            data_radix: Radix::Hex,
        }
    }
}

impl MemoryRecord {
    pub fn new(address: u32, data: impl Into<String>) -> Self {
        MemoryRecord {
            address,
            data: data.into(),
        }
    }
}

impl MifFile {
    pub fn new(header: MifHeader) -> Self {
        MifFile {
            header,
            lines: Vec::new(),
        }
    }

    /// Parse the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        text.parse()
    }

    pub fn push_record(&mut self, record: MemoryRecord) {
        self.lines.push(MifLine::Record(record));
    }

    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.lines.push(MifLine::Comment(text.into()));
    }

    /// Iterate over the records of the file, skipping comments.
    pub fn records(&self) -> impl Iterator<Item = &MemoryRecord> + '_ {
        self.lines.iter().filter_map(|line| match line {
            MifLine::Record(record) => Some(record),
            MifLine::Comment(_) => None,
        })
    }
}

impl Display for MemoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} : {};", self.address, self.data)
    }
}

impl Display for MifFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = &self.header;
        writeln!(f, "DEPTH = {};", header.depth)?;
        writeln!(f, "WIDTH = {};", header.width)?;
        writeln!(f, "ADDRESS_RADIX = {};", header.address_radix)?;
        writeln!(f, "DATA_RADIX = {};", header.data_radix)?;
        writeln!(f, "CONTENT BEGIN")?;
        for line in &self.lines {
            match line {
                MifLine::Comment(text) => writeln!(f, "-- {text}")?,
                MifLine::Record(record) => writeln!(
                    f,
                    "{} : {};",
                    header.address_radix.format_address(record.address),
                    record.data
                )?,
            }
        }
        writeln!(f, "END;")
    }
}

impl FromStr for MifFile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut width = None;
        let mut depth = None;
        let mut address_radix = Radix::Hex;
        let mut data_radix = Radix::Hex;
        let mut lines = Vec::new();
        let mut ended = false;

        for (ix, line) in s.lines().enumerate() {
            let line_no = ix + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix("--") {
                lines.push(MifLine::Comment(comment.trim().to_owned()));
                continue;
            }
            let upper = line.to_ascii_uppercase();
            if upper.starts_with("END") {
                ended = true;
                break;
            }
            if matches!(upper.as_str(), "CONTENT" | "BEGIN" | "CONTENT BEGIN") {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_end_matches(';').trim();
                match key.trim().to_ascii_uppercase().as_str() {
                    "WIDTH" => width = Some(parse_number(value, line_no)?),
                    "DEPTH" => depth = Some(parse_number(value, line_no)?),
                    "ADDRESS_RADIX" => {
                        address_radix = value.parse().map_err(|e| Error::parse(line_no, e))?
                    }
                    "DATA_RADIX" => {
                        data_radix = value.parse().map_err(|e| Error::parse(line_no, e))?
                    }
                    other => {
                        return Err(Error::parse(line_no, format!("unknown header '{other}'")))
                    }
                }
                continue;
            }
            if let Some((address, data)) = line.split_once(':') {
                let address = address.trim();
                let invalid = || Error::parse(line_no, format!("invalid address '{address}'"));
                if !address.chars().all(|c| c.is_digit(address_radix.base())) {
                    return Err(invalid());
                }
                let address =
                    u32::from_str_radix(address, address_radix.base()).map_err(|_| invalid())?;
                let data = data.trim().trim_end_matches(';').trim();
                if data.is_empty() {
                    return Err(Error::parse(line_no, "record has no data"));
                }
                lines.push(MifLine::Record(MemoryRecord::new(address, data)));
                continue;
            }
            return Err(Error::parse(line_no, format!("unexpected line '{line}'")));
        }

        if !ended {
            return Err(Error::parse(s.lines().count(), "missing 'END;'"));
        }
        let width = width.ok_or_else(|| Error::parse(1, "missing WIDTH"))?;
        let depth = depth.ok_or_else(|| Error::parse(1, "missing DEPTH"))?;
        Ok(MifFile {
            header: MifHeader {
                width,
                depth,
                address_radix,
                data_radix,
            },
            lines,
        })
    }
}

fn parse_number(value: &str, line: usize) -> Result<u32, Error> {
    value
        .parse()
        .map_err(|_| Error::parse(line, format!("expected a number, found '{value}'")))
}

impl RecordEncoder {
    pub fn new(header: MifHeader) -> Self {
        RecordEncoder {
            cursor: 0,
            file: MifFile::new(header),
        }
    }

    /// The address the next row will be assigned.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Emit one record per row of a glyph, returning the addresses used.
    pub fn encode_glyph(&mut self, ch: char, rows: &[PackedRow]) -> Range<u32> {
        let start = self.cursor;
        self.file.push_comment(format!("Character: '{ch}'"));
        for row in rows {
            self.file
                .push_record(MemoryRecord::new(self.cursor, row.to_hex()));
            self.cursor += 1;
        }
        start..self.cursor
    }

    /// Finish the section, returning the encoded file.
    pub fn finish(self) -> MifFile {
        self.file
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rows(hex: &[u16]) -> Vec<PackedRow> {
        hex.iter()
            .map(|word| PackedRow::new(word.to_be_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn encoder_addresses_are_contiguous() {
        let mut encoder = RecordEncoder::new(MifHeader::new(16, 8192));
        assert_eq!(encoder.encode_glyph('A', &rows(&[0x0180, 0x03C0])), 0..2);
        assert_eq!(encoder.encode_glyph('B', &rows(&[0xFF00])), 2..3);
        assert_eq!(encoder.cursor(), 3);
        let file = encoder.finish();
        let addresses: Vec<_> = file.records().map(|r| r.address).collect();
        assert_eq!(addresses, [0, 1, 2]);
    }

    #[test]
    fn writes_header_records_and_end() {
        let mut encoder = RecordEncoder::new(MifHeader::new(16, 8192));
        encoder.encode_glyph('A', &rows(&[0x0180, 0x00FF]));
        let expected = "\
DEPTH = 8192;
WIDTH = 16;
ADDRESS_RADIX = HEX;
DATA_RADIX = HEX;
CONTENT BEGIN
-- Character: 'A'
0000 : 0180;
0001 : 00FF;
END;
";
        assert_eq!(encoder.finish().to_string(), expected);
    }

    #[test]
    fn parses_what_it_writes() {
        let mut encoder = RecordEncoder::new(MifHeader::new(32, 16384));
        encoder.encode_glyph('x', &[PackedRow::new(vec![0xDE, 0xAD, 0xBE, 0xEF])]);
        let file = encoder.finish();
        assert_eq!(file.to_string().parse::<MifFile>().unwrap(), file);
    }

    #[test]
    fn parse_is_lenient_about_spacing() {
        let text = "WIDTH=16;\nDEPTH = 4 ;\nDATA_RADIX = BIN;\nCONTENT\nBEGIN\n\n  0008 :   00FF ;\nEND;\ntrailing junk";
        let file: MifFile = text.parse().unwrap();
        assert_eq!(file.header.width, 16);
        assert_eq!(file.header.depth, 4);
        assert_eq!(file.header.data_radix, Radix::Bin);
        assert_eq!(file.lines, [MifLine::Record(MemoryRecord::new(8, "00FF"))]);
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let bad_address = "WIDTH = 16;\nDEPTH = 4;\nCONTENT BEGIN\nZZ : 0000;\nEND;";
        assert!(matches!(
            bad_address.parse::<MifFile>(),
            Err(Error::Parse { line: 4, .. })
        ));
        let signed_address = "WIDTH = 16;\nDEPTH = 4;\nCONTENT BEGIN\n+0A : 0000;\nEND;";
        assert!(matches!(
            signed_address.parse::<MifFile>(),
            Err(Error::Parse { line: 4, .. })
        ));
        let unknown = "WIDTH = 16;\nDEPTH = 4;\nCONTENT BEGIN\nwhat is this\nEND;";
        assert!(matches!(
            unknown.parse::<MifFile>(),
            Err(Error::Parse { line: 4, .. })
        ));
        let unterminated = "WIDTH = 16;\nDEPTH = 4;\nCONTENT BEGIN\n0000 : 0000;";
        assert!(matches!(
            unterminated.parse::<MifFile>(),
            Err(Error::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn decimal_addresses() {
        let text = "WIDTH = 8;\nDEPTH = 16;\nADDRESS_RADIX = DEC;\nCONTENT BEGIN\n10 : 7F;\nEND;";
        let file: MifFile = text.parse().unwrap();
        assert_eq!(file.records().next(), Some(&MemoryRecord::new(10, "7F")));
        assert!(file.to_string().contains("\n10 : 7F;\n"));
    }
}
