// src/lexer/mod.rs
pub mod context;
pub mod cpu;
pub mod protocol;
pub mod tables;

pub use context::{Lexer, SourceLexer, Token};
pub use cpu::tokenize;
pub use protocol::{LexFn, LexRun, Step, drive};
pub use tables::LexTable;
