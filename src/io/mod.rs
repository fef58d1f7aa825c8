//! Stream adapter for the decoder.
//!
//! Reads fixed-width integers in the stream's byte order and implements the
//! jump pattern used for out-of-line values.

mod reader;

pub use reader::OrderedReader;
