//! The `reader` module provides [`HexReader`], the entry point for decoding Intel HEX text
//! into a [`HexMemory`].
//!
//! A `HexReader` only holds limits. Every read builds its own buffer and chunk table,
//! so one reader can be shared and reused for any number of independent reads.

use crate::assembler::{
    ChunkAssembler, ChunkSizing, DEFAULT_ARENA_CAPACITY, DEFAULT_MAX_CHUNKS,
};
use crate::error::{HexMemoryError, HexMemoryErrorKind};
use crate::memory::HexMemory;
use crate::record::{DEFAULT_MAX_RECORD_BYTES, Record};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexReader {
    /// Maximum number of memory chunks (extended linear address records)
    max_chunks: usize,
    /// Size of the buffer holding every decoded data byte
    arena_capacity: usize,
    /// Maximum number of data bytes per record
    max_record_bytes: usize,
    /// Size rule applied when a chunk is closed
    chunk_sizing: ChunkSizing,
}

impl Default for HexReader {
    fn default() -> Self {
        Self::new()
    }
}

impl HexReader {
    /// Creates a `HexReader` with the default limits:
    /// 10 chunks, 8192 buffer bytes, 32 bytes per record and legacy chunk sizing.
    ///
    /// # Examples
    /// ```
    /// use hexmemlib::{ChunkSizing, HexReader};
    ///
    /// let reader = HexReader::new();
    /// assert_eq!(reader.max_chunks(), 10);
    /// assert_eq!(reader.arena_capacity(), 8192);
    /// assert_eq!(reader.chunk_sizing(), ChunkSizing::Legacy);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_chunks: DEFAULT_MAX_CHUNKS,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            chunk_sizing: ChunkSizing::Legacy,
        }
    }

    #[must_use]
    pub const fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    #[must_use]
    pub const fn arena_capacity(&self) -> usize {
        self.arena_capacity
    }

    #[must_use]
    pub const fn max_record_bytes(&self) -> usize {
        self.max_record_bytes
    }

    #[must_use]
    pub const fn chunk_sizing(&self) -> ChunkSizing {
        self.chunk_sizing
    }

    /// Update the maximum number of memory chunks. Default = 10.
    ///
    /// # Errors
    /// Returns an error if the provided value is 0.
    pub fn set_max_chunks(&mut self, max_chunks: usize) -> Result<(), HexMemoryError> {
        self.max_chunks = non_zero(max_chunks)?;
        Ok(())
    }

    /// Update the size of the data buffer in bytes. Default = 8192.
    ///
    /// # Errors
    /// Returns an error if the provided value is 0.
    ///
    /// # Example
    /// ```
    /// use hexmemlib::HexReader;
    ///
    /// let mut reader = HexReader::new();
    /// assert!(reader.set_arena_capacity(0).is_err());
    /// assert!(reader.set_arena_capacity(64 * 1024).is_ok());
    /// assert_eq!(reader.arena_capacity(), 65536);
    /// ```
    pub fn set_arena_capacity(&mut self, capacity: usize) -> Result<(), HexMemoryError> {
        self.arena_capacity = non_zero(capacity)?;
        Ok(())
    }

    /// Update the maximum number of data bytes a record may carry. Default = 32.
    ///
    /// # Errors
    /// Returns an error if the provided value is 0.
    pub fn set_max_record_bytes(&mut self, max_bytes: usize) -> Result<(), HexMemoryError> {
        self.max_record_bytes = non_zero(max_bytes)?;
        Ok(())
    }

    pub const fn set_chunk_sizing(&mut self, sizing: ChunkSizing) {
        self.chunk_sizing = sizing;
    }

    /// Decodes the provided hex file.
    ///
    /// # Errors
    /// - [`HexMemoryError::OpenFile`] if the file cannot be opened
    /// - any error of [`HexReader::read_from`]
    ///
    /// # Example
    /// ```
    /// use hexmemlib::HexReader;
    ///
    /// let mem = HexReader::new().read_hex("tests/fixtures/two_regions.hex").unwrap();
    /// assert_eq!(mem.chunk_count(), 2);
    /// ```
    pub fn read_hex<P: AsRef<Path>>(&self, filepath: P) -> Result<HexMemory, HexMemoryError> {
        let path = filepath.as_ref();
        let file = File::open(path).map_err(|source| {
            warn!(path = %path.display(), error = %source, "failed to open hex file");
            HexMemoryError::OpenFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(path = %path.display(), "hex file opened");

        self.read_from(BufReader::new(file))
    }

    /// Decodes Intel HEX text provided line by line by `reader`.
    ///
    /// # Errors
    /// - [`HexMemoryError::ReadLine`] if a line cannot be read
    /// - [`HexMemoryError::ParseRecordError`] if a line cannot be decoded
    /// - [`HexMemoryError::LoadDataError`] if the chunk table is full
    /// - [`HexMemoryError::MemoryBufferOverflow`] once the data buffer is full
    pub fn read_from<R: BufRead>(&self, reader: R) -> Result<HexMemory, HexMemoryError> {
        debug!(
            max_chunks = self.max_chunks,
            arena_capacity = self.arena_capacity,
            sizing = ?self.chunk_sizing,
            "hex parse started"
        );

        let result = self.assemble(reader);
        match &result {
            Ok(memory) => debug!(
                chunks = memory.chunk_count(),
                bytes = memory.buffer().len(),
                "hex parse finished"
            ),
            Err(err) => warn!(error = %err, status = ?err.status(), "hex parse failed"),
        }
        result
    }

    /// Decodes Intel HEX text held in memory.
    ///
    /// # Errors
    /// Same as [`HexReader::read_from`], except for read errors.
    ///
    /// # Example
    /// ```
    /// use hexmemlib::HexReader;
    ///
    /// let text = ":0400000408000000F0\n:0400000001020304F2\n:00000001FF\n";
    /// let mem = HexReader::new().parse_str(text).unwrap();
    ///
    /// assert_eq!(mem.chunks()[0].address, 0x0800_0000);
    /// assert_eq!(mem.chunks()[0].size, 4);
    /// ```
    pub fn parse_str(&self, contents: &str) -> Result<HexMemory, HexMemoryError> {
        self.read_from(contents.as_bytes())
    }

    /// Iterator over the decoded records of `reader`, tagged with their line number.
    /// Blank lines are skipped; the iterator ends after the first error.
    pub fn records<R: BufRead>(&self, reader: R) -> Records<R> {
        Records {
            lines: reader.lines(),
            line_no: 0,
            max_record_bytes: self.max_record_bytes,
            done: false,
        }
    }

    fn assemble<R: BufRead>(&self, reader: R) -> Result<HexMemory, HexMemoryError> {
        let mut assembler =
            ChunkAssembler::new(self.max_chunks, self.arena_capacity, self.chunk_sizing);

        for item in self.records(reader) {
            let (line, record) = item?;
            trace!(
                line,
                rtype = record.rtype.as_str(),
                address = record.address,
                data_len = record.data_len(),
                "record decoded"
            );

            assembler.load(&record).map_err(|kind| match kind {
                HexMemoryErrorKind::ArenaFull(capacity) => {
                    HexMemoryError::MemoryBufferOverflow { line, capacity }
                }
                kind => HexMemoryError::LoadDataError(kind, line),
            })?;

            if assembler.is_full() {
                return Err(HexMemoryError::MemoryBufferOverflow {
                    line,
                    capacity: self.arena_capacity,
                });
            }
        }

        trace!(bytes = assembler.bytes_written(), "end of input");
        Ok(assembler.finish())
    }

    #[cfg(feature = "benchmarking")]
    pub fn bench_priv_assemble(&self, records: &[Record]) -> Result<HexMemory, HexMemoryErrorKind> {
        let mut assembler =
            ChunkAssembler::new(self.max_chunks, self.arena_capacity, self.chunk_sizing);
        for record in records {
            assembler.load(record)?;
        }
        Ok(assembler.finish())
    }
}

fn non_zero(value: usize) -> Result<usize, HexMemoryError> {
    if value == 0 {
        return Err(HexMemoryError::ConfigError(
            HexMemoryErrorKind::InvalidCapacity,
        ));
    }
    Ok(value)
}

/// Decodes the provided hex file with the default limits.
///
/// # Errors
/// See [`HexReader::read_hex`].
///
/// # Example
/// ```
/// use hexmemlib::{HexReaderStatus, get_hex_memory};
///
/// let res = get_hex_memory("tests/fixtures/single_block.hex");
/// assert_eq!(HexReaderStatus::of(&res), HexReaderStatus::FinishedReadingFile);
/// ```
pub fn get_hex_memory<P: AsRef<Path>>(filepath: P) -> Result<HexMemory, HexMemoryError> {
    HexReader::new().read_hex(filepath)
}

/// Iterator over the records of a line source. Created by [`HexReader::records`].
pub struct Records<R> {
    lines: Lines<R>,
    line_no: usize,
    max_record_bytes: usize,
    done: bool,
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<(usize, Record), HexMemoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let item = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => Record::parse(&line, self.max_record_bytes)
                    .map(|record| (self.line_no, record))
                    .map_err(|kind| HexMemoryError::ParseRecordError(kind, self.line_no)),
                Err(source) => Err(HexMemoryError::ReadLine {
                    line: self.line_no,
                    source,
                }),
            };

            self.done = item.is_err();
            return Some(item);
        }
    }
}
