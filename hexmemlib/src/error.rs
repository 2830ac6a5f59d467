//! The `error` module defines the [`HexMemoryError`] enum that describes the errors that
//! can occur when decoding an Intel HEX file into a [`HexMemory`](crate::HexMemory).
//! It contains the three pieces of information:
//! 1. When the error occurs, e.g., while opening the file, decoding a record or loading it.
//! 2. What kind of error was encountered (via [`HexMemoryErrorKind`]).
//! 3. What is the line number (if applicable), e.g., at which line in a hex file the parsing failed.
//!
//! [`HexReaderStatus`] collapses any outcome into the four terminal states of a read.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HexMemoryError {
    #[error("Failed to open hex file '{}': {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read line #{line} of the hex file: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("Error encountered during record parsing at line #{1} of the hex file:\n{0}")]
    ParseRecordError(HexMemoryErrorKind, usize),
    #[error("Error encountered while loading record at line #{1} of the hex file:\n{0}")]
    LoadDataError(HexMemoryErrorKind, usize),
    #[error("Memory buffer overflow at line #{line}: all {capacity} bytes of the buffer are used")]
    MemoryBufferOverflow { line: usize, capacity: usize },
    #[error("Invalid reader configuration:\n{0}")]
    ConfigError(HexMemoryErrorKind),
}

impl HexMemoryError {
    /// Terminal status this error corresponds to.
    #[must_use]
    pub const fn status(&self) -> HexReaderStatus {
        match self {
            Self::OpenFile { .. } => HexReaderStatus::FailedToOpenFile,
            Self::MemoryBufferOverflow { .. } => HexReaderStatus::MemoryBufferOverflow,
            Self::ReadLine { .. }
            | Self::ParseRecordError(..)
            | Self::LoadDataError(..)
            | Self::ConfigError(_) => HexReaderStatus::FailedToLoadData,
        }
    }

    /// Line number of the hex file the error was raised at, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::ReadLine { line, .. } | Self::MemoryBufferOverflow { line, .. } => Some(*line),
            Self::ParseRecordError(_, line) | Self::LoadDataError(_, line) => Some(*line),
            Self::OpenFile { .. } | Self::ConfigError(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HexMemoryErrorKind {
    /// Record does not begin with a ':'
    #[error("Missing start code ':'")]
    MissingStartCode,
    /// Record contains non-hexadecimal characters
    #[error("Record contains invalid character(s)")]
    ContainsInvalidCharacters,
    /// Record is shorter than its own fixed fields
    #[error("Record too short")]
    RecordTooShort,
    /// Record carries more data bytes than a record may hold
    #[error("Record too long - at most {max} data bytes allowed, found {found}")]
    RecordTooLong { max: usize, found: usize },
    /// Record type code is not one of 0..=5
    #[error("Invalid record type: 0x{0:02X}")]
    InvalidRecordType(u8),
    /// Extended linear address record arrived with every chunk slot taken
    #[error("Chunk table is full - at most {0} memory chunks allowed")]
    ChunkTableFull(usize),
    /// Data byte arrived with the memory buffer already full
    #[error("Memory buffer is full - at most {0} bytes allowed")]
    ArenaFull(usize),
    /// Capacity setting of zero
    #[error("Capacity must be greater than zero")]
    InvalidCapacity,
}

/// Terminal status of a read, mirroring the four outcomes a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HexReaderStatus {
    FailedToOpenFile,
    FailedToLoadData,
    MemoryBufferOverflow,
    FinishedReadingFile,
}

impl HexReaderStatus {
    /// Status of a finished read.
    ///
    /// # Example
    /// ```
    /// use hexmemlib::{HexReader, HexReaderStatus};
    ///
    /// let res = HexReader::new().read_hex("tests/fixtures/does_not_exist.hex");
    /// assert_eq!(HexReaderStatus::of(&res), HexReaderStatus::FailedToOpenFile);
    /// ```
    #[must_use]
    pub const fn of<T>(result: &Result<T, HexMemoryError>) -> Self {
        match result {
            Ok(_) => Self::FinishedReadingFile,
            Err(err) => err.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = HexMemoryError::OpenFile {
            path: PathBuf::from("missing.hex"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.status(), HexReaderStatus::FailedToOpenFile);
        assert_eq!(err.line(), None);

        let err = HexMemoryError::LoadDataError(HexMemoryErrorKind::ChunkTableFull(10), 11);
        assert_eq!(err.status(), HexReaderStatus::FailedToLoadData);
        assert_eq!(err.line(), Some(11));

        let err = HexMemoryError::ParseRecordError(HexMemoryErrorKind::RecordTooShort, 3);
        assert_eq!(err.status(), HexReaderStatus::FailedToLoadData);

        let err = HexMemoryError::MemoryBufferOverflow {
            line: 7,
            capacity: 8192,
        };
        assert_eq!(err.status(), HexReaderStatus::MemoryBufferOverflow);
    }

    #[test]
    fn test_display_contains_line_and_kind() {
        let err = HexMemoryError::ParseRecordError(HexMemoryErrorKind::MissingStartCode, 4);
        let msg = err.to_string();

        assert!(msg.contains("line #4"));
        assert!(msg.contains("Missing start code"));
    }
}
