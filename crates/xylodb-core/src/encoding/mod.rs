//! Storage encoding utilities.
//!
//! - [`varint`] - variable-byte record wire format
//! - [`keys`] - collection and document index key layout
//! - [`escape`] - reversible archive-name encoding

pub mod escape;
pub mod keys;
pub mod varint;


pub use varint::{RecordReader, RecordWriter};
