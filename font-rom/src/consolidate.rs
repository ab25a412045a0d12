//! Merging runs of eight memory records into one wide record.
//!
//! Records are buffered until eight have arrived; the run is then emitted as
//! a single record at the address of its first member, its data being the
//! eight data fields concatenated in arrival order and re-encoded according
//! to the [`OutputMode`]. A short run left at the end of the input is still
//! emitted, at its own base address.

use serde::{Deserialize, Serialize};

use crate::{
    error::{FieldError, FieldProblem},
    mif::{MemoryRecord, MifFile, MifLine, Radix},
};

/// The number of records merged into one.
pub const RUN_LENGTH: usize = 8;

/// How the data of a consolidated run is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Concatenated hex digits; the data radix is declared as hex.
    #[default]
    Hex,
    /// Every field as a zero-padded string of `0`s and `1`s; the data radix
    /// is declared as binary.
    Binary,
    /// Concatenated data with the header forwarded untouched.
    Raw,
    /// Both [`OutputMode::Hex`] and [`OutputMode::Binary`] at once.
    HexAndBinary,
}

/// The re-encoded data of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunData {
    Hex(String),
    Binary(String),
    Raw(String),
    HexAndBinary { hex: String, binary: String },
}

/// A run of up to eight records merged into one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsolidatedRecord {
    /// The address of the first record in the run.
    pub base_address: u32,
    /// The number of records merged.
    pub len: usize,
    pub data: RunData,
}

/// The result of consolidating a whole file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consolidated {
    Single(MifFile),
    Dual { hex: MifFile, binary: MifFile },
}

/// Accumulates records and emits a [`ConsolidatedRecord`] per run.
#[derive(Clone, Debug)]
pub struct Consolidator {
    mode: OutputMode,
    field_digits: Option<usize>,
    base_address: u32,
    pending: Vec<String>,
}

impl Consolidator {
    pub fn new(mode: OutputMode) -> Self {
        Consolidator {
            mode,
            field_digits: None,
            base_address: 0,
            pending: Vec::with_capacity(RUN_LENGTH),
        }
    }

    /// Require every data field to have exactly `digits` digits.
    ///
    /// Without this, the first field of each run sets the width for the
    /// rest of the run.
    pub fn with_field_digits(mut self, digits: usize) -> Self {
        self.field_digits = Some(digits);
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// The number of records waiting for their run to fill.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Add a record, returning the run it completes, if any.
    pub fn push(
        &mut self,
        record: &MemoryRecord,
    ) -> Result<Option<ConsolidatedRecord>, FieldError> {
        self.check_field(record)?;
        if self.pending.is_empty() {
            self.base_address = record.address;
        }
        self.pending.push(record.data.clone());
        if self.pending.len() == RUN_LENGTH {
            self.flush().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Emit whatever is left of the last run.
    pub fn finish(&mut self) -> Result<Option<ConsolidatedRecord>, FieldError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    fn flush(&mut self) -> Result<ConsolidatedRecord, FieldError> {
        let fields = std::mem::take(&mut self.pending);
        let base_address = self.base_address;
        let hex = || fields.concat();
        let data = match self.mode {
            OutputMode::Hex => RunData::Hex(hex()),
            OutputMode::Raw => RunData::Raw(hex()),
            OutputMode::Binary => RunData::Binary(to_binary(base_address, &fields)?),
            OutputMode::HexAndBinary => RunData::HexAndBinary {
                hex: hex(),
                binary: to_binary(base_address, &fields)?,
            },
        };
        log::debug!("run of {} at {base_address:04X}", fields.len());
        Ok(ConsolidatedRecord {
            base_address,
            len: fields.len(),
            data,
        })
    }

    fn check_field(&self, record: &MemoryRecord) -> Result<(), FieldError> {
        let expected = self
            .field_digits
            .or_else(|| self.pending.first().map(String::len));
        let error = |problem| FieldError {
            address: record.address,
            data: record.data.clone(),
            problem,
        };
        if record.data.is_empty() {
            return Err(error(FieldProblem::Width {
                expected: expected.unwrap_or(1),
            }));
        }
        if let Some(expected) = expected.filter(|digits| *digits != record.data.len()) {
            return Err(error(FieldProblem::Width { expected }));
        }
        if !record.data.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(error(FieldProblem::NotHex));
        }
        Ok(())
    }
}

impl RunData {
    /// The hex encoding of the run, if it has one.
    pub fn hex(&self) -> Option<&str> {
        match self {
            RunData::Hex(hex) | RunData::Raw(hex) | RunData::HexAndBinary { hex, .. } => Some(hex),
            RunData::Binary(_) => None,
        }
    }

    /// The binary encoding of the run, if it has one.
    pub fn binary(&self) -> Option<&str> {
        match self {
            RunData::Binary(binary) | RunData::HexAndBinary { binary, .. } => Some(binary),
            RunData::Hex(_) | RunData::Raw(_) => None,
        }
    }
}

/// Render each hex field as a binary string four times as long.
fn to_binary(address: u32, fields: &[String]) -> Result<String, FieldError> {
    let mut out = String::with_capacity(fields.iter().map(|f| f.len() * 4).sum());
    for field in fields {
        let error = |problem| FieldError {
            address,
            data: field.clone(),
            problem,
        };
        if field.len() > 16 {
            return Err(error(FieldProblem::TooWide));
        }
        let value = u64::from_str_radix(field, 16).map_err(|_| error(FieldProblem::NotHex))?;
        out.push_str(&format!("{value:0width$b}", width = field.len() * 4));
    }
    Ok(out)
}

fn emit(run: ConsolidatedRecord, hex_out: &mut MifFile, bin_out: &mut MifFile) {
    let address = run.base_address;
    match run.data {
        RunData::Hex(data) | RunData::Binary(data) | RunData::Raw(data) => {
            hex_out.push_record(MemoryRecord::new(address, data))
        }
        RunData::HexAndBinary { hex, binary } => {
            hex_out.push_record(MemoryRecord::new(address, hex));
            bin_out.push_record(MemoryRecord::new(address, binary));
        }
    }
}

/// Consolidate every record of a file.
///
/// Comments are forwarded in the order they arrive. The data radix of the
/// output is rewritten to match the mode, except in [`OutputMode::Raw`],
/// which forwards the header as it was.
pub fn consolidate(file: &MifFile, mode: OutputMode) -> Result<Consolidated, FieldError> {
    let header = &file.header;
    let mut consolidator = Consolidator::new(mode);
    if header.data_radix == Radix::Hex && header.width % 4 == 0 && header.width > 0 {
        consolidator = consolidator.with_field_digits(header.width as usize / 4);
    }

    let mut hex_out = MifFile::new(header.clone());
    let mut bin_out = MifFile::new(header.clone());
    match mode {
        OutputMode::Hex | OutputMode::HexAndBinary => hex_out.header.data_radix = Radix::Hex,
        OutputMode::Binary => hex_out.header.data_radix = Radix::Bin,
        OutputMode::Raw => (),
    }
    bin_out.header.data_radix = Radix::Bin;

    for line in &file.lines {
        match line {
            MifLine::Comment(text) => {
                hex_out.push_comment(text.clone());
                bin_out.push_comment(text.clone());
            }
            MifLine::Record(record) => {
                if let Some(run) = consolidator.push(record)? {
                    emit(run, &mut hex_out, &mut bin_out);
                }
            }
        }
    }
    if let Some(run) = consolidator.finish()? {
        emit(run, &mut hex_out, &mut bin_out);
    }

    Ok(match mode {
        OutputMode::HexAndBinary => Consolidated::Dual {
            hex: hex_out,
            binary: bin_out,
        },
        _ => Consolidated::Single(hex_out),
    })
}
