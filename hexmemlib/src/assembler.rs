//! The `assembler` module turns a stream of decoded [`Record`]s into memory chunks.
//!
//! Data bytes are appended to a bounded buffer. Every extended linear address record
//! closes the chunk that is currently open and opens a new one at the buffer position
//! the next data byte will land on. All other record types leave the state untouched.

use crate::error::HexMemoryErrorKind;
use crate::memory::{HexMemory, MemoryChunk};
use crate::record::{Record, RecordType};
use tracing::{debug, warn};

/// Default number of memory chunks a single hex file may produce.
pub const DEFAULT_MAX_CHUNKS: usize = 10;
/// Default size of the buffer holding all decoded data bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 8192;

/// How the size of a chunk is computed once it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChunkSizing {
    /// A chunk closed by a later address record holds one byte less than was written
    /// into it. A chunk closed by the end of input holds every byte written into it.
    #[default]
    Legacy,
    /// A chunk always holds every byte written into it.
    Exact,
}

impl ChunkSizing {
    const fn closed_by_address(self, bytes: usize) -> usize {
        match self {
            Self::Legacy => bytes.saturating_sub(1),
            Self::Exact => bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ChunkAssembler {
    /// Decoded data bytes; its length is the write cursor
    arena: Vec<u8>,
    arena_capacity: usize,
    /// Bytes written since the open chunk began
    chunk_bytes: usize,
    chunks: Vec<MemoryChunk>,
    max_chunks: usize,
    sizing: ChunkSizing,
    orphan_bytes: usize,
}

impl ChunkAssembler {
    pub(crate) fn new(max_chunks: usize, arena_capacity: usize, sizing: ChunkSizing) -> Self {
        Self {
            arena: Vec::with_capacity(arena_capacity.min(DEFAULT_ARENA_CAPACITY)),
            arena_capacity,
            chunk_bytes: 0,
            chunks: Vec::with_capacity(max_chunks.min(DEFAULT_MAX_CHUNKS)),
            max_chunks,
            sizing,
            orphan_bytes: 0,
        }
    }

    /// Total number of bytes written into the buffer so far.
    pub(crate) fn bytes_written(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.arena.len() >= self.arena_capacity
    }

    /// Apply one record to the chunk table.
    ///
    /// Bytes written before an error stay in the buffer.
    pub(crate) fn load(&mut self, record: &Record) -> Result<(), HexMemoryErrorKind> {
        match record.rtype {
            RecordType::ExtendedLinearAddress => self.open_chunk(&record.data),
            RecordType::Data => self.write_data(&record.data),
            RecordType::EndOfFile
            | RecordType::ExtendedSegmentAddress
            | RecordType::StartSegmentAddress
            | RecordType::StartLinearAddress => Ok(()),
        }
    }

    fn open_chunk(&mut self, address_bytes: &[u8]) -> Result<(), HexMemoryErrorKind> {
        if self.chunks.len() >= self.max_chunks {
            return Err(HexMemoryErrorKind::ChunkTableFull(self.max_chunks));
        }

        // Close the previous chunk
        if let Some(prev) = self.chunks.last_mut() {
            prev.size = self.sizing.closed_by_address(self.chunk_bytes);
            debug!(
                address = %format!("0x{:08X}", prev.address),
                size = prev.size,
                "memory chunk closed"
            );
        }
        self.chunk_bytes = 0;

        let address = address_bytes
            .iter()
            .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));

        self.chunks.push(MemoryChunk {
            address,
            offset: self.arena.len(),
            size: 0,
        });
        debug!(
            index = self.chunks.len() - 1,
            address = %format!("0x{address:08X}"),
            offset = self.arena.len(),
            "memory chunk opened"
        );
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), HexMemoryErrorKind> {
        if self.chunks.is_empty() && !data.is_empty() {
            if self.orphan_bytes == 0 {
                warn!("data record before any extended linear address record; bytes belong to no chunk");
            }
            self.orphan_bytes += data.len();
        }

        for &byte in data {
            if self.is_full() {
                return Err(HexMemoryErrorKind::ArenaFull(self.arena_capacity));
            }
            self.arena.push(byte);
            self.chunk_bytes += 1;
        }
        Ok(())
    }

    /// Close the open chunk with its exact size and hand over the result.
    pub(crate) fn finish(mut self) -> HexMemory {
        if let Some(last) = self.chunks.last_mut() {
            last.size = self.chunk_bytes;
        }
        HexMemory::from_parts(self.chunks, self.arena)
    }
}
