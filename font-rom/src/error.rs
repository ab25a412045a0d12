//! Errors that abort a compilation run

use std::path::PathBuf;

use thiserror::Error;

/// A memory record whose data field could not be interpreted.
///
/// This indicates corrupted intermediate state, not expected variance in the
/// input, so the whole run that contained the record fails.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("malformed data '{data}' at address {address:04X}: {problem}")]
pub struct FieldError {
    /// The address of the offending record
    pub address: u32,
    /// The data field as it was found
    pub data: String,
    /// What was wrong with it
    pub problem: FieldProblem,
}

/// The ways a data field can be malformed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FieldProblem {
    #[error("not a hexadecimal number")]
    NotHex,
    #[error("expected {expected} digits")]
    Width { expected: usize },
    #[error("wider than 64 bits")]
    TooWide,
}

/// An error that aborts a compilation run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    MalformedField(#[from] FieldError),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("canvas width {0} is not a multiple of 8")]
    CanvasWidth(u32),

    #[error("section '{section}' has {width}-bit words, which its placement cannot store")]
    Placement { section: String, width: u32 },

    #[error("unknown ROM region '{0}'")]
    UnknownRegion(String),

    #[error("ROM regions '{first}' and '{second}' overlap")]
    OverlappingRegions { first: String, second: String },

    #[error("ROM region '{name}' ends at {end:#X}, past the checksum trailer at {limit:#X}")]
    RegionOutOfBounds {
        name: String,
        end: usize,
        limit: usize,
    },

    #[error("an image of {0} bytes has no room for a checksum")]
    ImageTooSmall(usize),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
