// src/lib.rs
//! Runtime side of generated incremental parsers: the parse-table encoding,
//! the lexer protocol generated lex functions follow, the external scanner
//! adapter, and a compact string for scanner state.

pub mod external;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod sample;
pub mod string;
pub mod symbol;

pub use external::{ExternalScanner, ExternalScannerDef, ScannerSession, ScannerSnapshot};
pub use language::{Language, LanguageDef, LexMode};
pub use lexer::{LexFn, Lexer, SourceLexer, Token, tokenize};
pub use parser::{ActionList, ParseAction, ParseTable, ParseTableBuilder};
pub use string::CompactString;
pub use symbol::{FieldId, SYM_END, SYM_ERROR, SYM_ERROR_REPEAT, StateId, Symbol, SymbolMetadata};
