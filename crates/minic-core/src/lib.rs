//! Core types for the minic language.
//!
//! This crate provides the foundational types used throughout the minic
//! compiler and runtime:
//! - The machine word and word size
//! - The expression type encoding (base kind plus pointer indirection)
//! - The VM instruction set
//! - Source files with line mapping

pub mod op;
pub mod source;
pub mod types;
pub mod word;

// Re-export commonly used types at crate root
pub use op::Op;
pub use source::SourceFile;
pub use types::Type;
pub use word::{WORD_BYTES, Word};
