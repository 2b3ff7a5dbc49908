// Public modules
pub mod archive;
pub mod config;
pub mod entry;
pub mod error;
pub mod gate;
pub mod renamer;
pub mod replace;
pub mod sink;
pub mod source;

// Re-export common types for convenience
pub use config::ReplacementOptions;
pub use error::{Error, ErrorCode, Result};
pub use renamer::{RenameReport, Renamer};
