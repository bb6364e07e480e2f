//! Data models exchanged with the Chunker backend.
//!
//! - `UploadableFile`: a picked file plus its markdown classification
//! - `UploadReceipt`, `StoredFile`: upload acknowledgement and listing entries
//! - `Chunk`, `ChunkMetadata`: output of the chunking pipeline

pub mod chunk;
pub mod upload;

pub use chunk::{Chunk, ChunkMetadata, ChunkRequest};
pub use upload::{StoredFile, UploadReceipt, UploadableFile};
