//! Front half of the minic pipeline.
//!
//! This crate turns a source file into a [`Program`]: instruction words
//! plus an initial data image. There is no syntax tree - the parser
//! emits VM words as it goes, which is what keeps the accepted dialect
//! small enough to compile its own compiler:
//! - [`lexer`] - the scanner, one `advance` at a time
//! - [`symbol`] - interned identifier records with scope save/restore
//! - [`pool`] - the append-only code and data arenas
//! - [`compile`] - expression, statement, and top-level emitters

pub mod compile;
pub mod error;
pub mod lexer;
pub mod pool;
pub mod symbol;
pub mod token;

// Re-export the compilation surface at crate root
pub use compile::{Compiler, Program};
pub use error::{CompileError, ErrorKind};
pub use lexer::Lexer;
pub use pool::{CodePool, DataPool};
pub use symbol::{Binding, Class, Symbol, SymbolId, SymbolTable};
pub use token::Token;
