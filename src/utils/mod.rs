//! Generic utility primitives with zero domain knowledge.
//!
//! - `io` - File I/O with consistent error handling
//! - `text` - Line ending and path segment helpers
//! - `validation` - Input validation helpers

pub mod io;
pub mod text;
pub mod validation;
