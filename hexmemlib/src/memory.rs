//! The `memory` module provides [`HexMemory`], the result of decoding an Intel HEX file:
//! a table of [`MemoryChunk`]s in the order their extended linear address records were
//! seen, backed by a single byte buffer owned by the table.
//!
//! A chunk does not hold its bytes. It refers to them by offset and size into the
//! buffer, so the whole result can be moved, cloned or sent across threads freely.

use crate::error::HexMemoryError;
use crate::reader::HexReader;
use std::path::Path;

/// A contiguous run of decoded data bytes anchored to a 32-bit base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryChunk {
    /// Base address assembled from the extended linear address record
    pub address: u32,
    /// Offset of the chunk's first byte in the [`HexMemory`] buffer
    pub offset: usize,
    /// Number of bytes belonging to the chunk
    pub size: usize,
}

impl MemoryChunk {
    /// Last address covered by the chunk, `None` for an empty chunk.
    #[must_use]
    pub fn end_address(&self) -> Option<u64> {
        (self.size > 0).then(|| u64::from(self.address) + self.size as u64 - 1)
    }

    /// Whether the absolute address falls inside the chunk.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool {
        self.end_address()
            .is_some_and(|end| (u64::from(self.address)..=end).contains(&address))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexMemory {
    chunks: Vec<MemoryChunk>,
    buffer: Vec<u8>,
}

impl<'a> IntoIterator for &'a HexMemory {
    type Item = (&'a MemoryChunk, &'a [u8]);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;
    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl HexMemory {
    pub(crate) const fn from_parts(chunks: Vec<MemoryChunk>, buffer: Vec<u8>) -> Self {
        Self { chunks, buffer }
    }

    /// Decodes the provided hex file with the default reader limits.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, read, or loaded.
    ///
    /// # Example
    /// ```
    /// use hexmemlib::HexMemory;
    ///
    /// let mem = HexMemory::from_hex("tests/fixtures/single_block.hex").unwrap();
    /// assert_eq!(mem.chunk_count(), 1);
    /// ```
    pub fn from_hex<P: AsRef<Path>>(filepath: P) -> Result<Self, HexMemoryError> {
        HexReader::new().read_hex(filepath)
    }

    /// Chunks in arrival order.
    #[must_use]
    pub fn chunks(&self) -> &[MemoryChunk] {
        &self.chunks
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Every byte written while decoding, including bytes that belong to no chunk.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Sum of all chunk sizes.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.size).sum()
    }

    /// Bytes of the provided chunk. Out-of-range chunks yield the in-range part only.
    ///
    /// # Example
    /// ```
    /// use hexmemlib::HexMemory;
    ///
    /// let mem = HexMemory::from_hex("tests/fixtures/single_block.hex").unwrap();
    /// let chunk = mem.chunks()[0];
    ///
    /// assert_eq!(mem.chunk_data(&chunk), &[0x01, 0x02, 0x03, 0x04]);
    /// ```
    #[must_use]
    pub fn chunk_data(&self, chunk: &MemoryChunk) -> &[u8] {
        let start = chunk.offset.min(self.buffer.len());
        let end = chunk.offset.saturating_add(chunk.size).min(self.buffer.len());
        &self.buffer[start..end]
    }

    /// Get an iterator over (chunk, bytes) pairs in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&MemoryChunk, &[u8])> + '_ {
        self.chunks
            .iter()
            .map(|chunk| (chunk, self.chunk_data(chunk)))
    }

    /// Get byte at an absolute address. The first chunk containing the address wins.
    ///
    /// # Example
    /// ```
    /// use hexmemlib::HexMemory;
    ///
    /// let mem = HexMemory::from_hex("tests/fixtures/single_block.hex").unwrap();
    ///
    /// assert_eq!(mem.get_byte(0x0800_0002), Some(0x03));
    /// assert_eq!(mem.get_byte(0x0800_0004), None);
    /// ```
    #[must_use]
    pub fn get_byte(&self, address: u64) -> Option<u8> {
        self.chunks
            .iter()
            .find(|chunk| chunk.contains(address))
            .and_then(|chunk| {
                let index = usize::try_from(address - u64::from(chunk.address)).ok()?;
                self.chunk_data(chunk).get(index).copied()
            })
    }

    /// Get the smallest address covered by any chunk.
    #[must_use]
    pub fn get_min_addr(&self) -> Option<u64> {
        self.chunks
            .iter()
            .filter(|chunk| chunk.size > 0)
            .map(|chunk| u64::from(chunk.address))
            .min()
    }

    /// Get the highest address covered by any chunk.
    #[must_use]
    pub fn get_max_addr(&self) -> Option<u64> {
        self.chunks.iter().filter_map(MemoryChunk::end_address).max()
    }
}
