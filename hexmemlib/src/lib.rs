//! # `hexmemlib`
//!
//! `hexmemlib` is a Rust library for decoding Intel HEX files into a table of memory chunks,
//! ready to be handed to a flasher or used to rebuild a memory image.
//!
//! The library provides:
//! - Record decoder for single Intel HEX lines (via [`Record`] struct).
//! - Reader turning a whole file into address-tagged byte ranges (via [`HexReader`] struct).
//! - Result table owning every decoded byte (via [`HexMemory`] struct).
//! - Error handling with [`HexMemoryError`] and the four-way [`HexReaderStatus`].
//!
//! Every extended linear address record opens a new [`MemoryChunk`]; data records append
//! to the chunk that is currently open.
//!
//! ## Example
//!
//! ```
//! use hexmemlib::HexReader;
//!
//! let mem = HexReader::new().read_hex("tests/fixtures/two_regions.hex").unwrap();
//! for (chunk, bytes) in &mem {
//!     println!("0x{:08X}: {} bytes", chunk.address, bytes.len());
//! }
//! ```

mod assembler;
mod error;
mod memory;
mod reader;
mod record;

// Public APIs
pub use assembler::{ChunkSizing, DEFAULT_ARENA_CAPACITY, DEFAULT_MAX_CHUNKS};
pub use error::{HexMemoryError, HexMemoryErrorKind, HexReaderStatus};
pub use memory::{HexMemory, MemoryChunk};
pub use reader::{HexReader, Records, get_hex_memory};
pub use record::{DEFAULT_MAX_RECORD_BYTES, Record, RecordType};
