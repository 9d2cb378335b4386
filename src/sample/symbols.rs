// src/sample/symbols.rs

use crate::symbol::{FieldId, Symbol};

/// Symbols of the sample grammar. Terminals first (externals last among
/// them), then nonterminals, then the alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SampleSymbol {
    End = 0,
    Number = 1,
    Plus = 2,
    Comment = 3,

    // external tokens
    HeredocStart = 4,
    HeredocBody = 5,

    SourceFile = 6,
    Expression = 7,

    // alias of `number` inside a lone-number expression
    Literal = 8,
}

impl SampleSymbol {
    pub const ALL: [Self; 9] = [
        Self::End,
        Self::Number,
        Self::Plus,
        Self::Comment,
        Self::HeredocStart,
        Self::HeredocBody,
        Self::SourceFile,
        Self::Expression,
        Self::Literal,
    ];

    #[inline]
    pub const fn id(self) -> Symbol {
        self as Symbol
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::End => "end",
            Self::Number => "number",
            Self::Plus => "+",
            Self::Comment => "comment",
            Self::HeredocStart => "heredoc_start",
            Self::HeredocBody => "heredoc_body",
            Self::SourceFile => "source_file",
            Self::Expression => "expression",
            Self::Literal => "literal",
        }
    }
}

impl TryFrom<Symbol> for SampleSymbol {
    type Error = Symbol;

    fn try_from(v: Symbol) -> Result<Self, Symbol> {
        Self::ALL.get(v as usize).copied().ok_or(v)
    }
}

pub const TOKEN_COUNT: u32 = 6;
pub const EXTERNAL_TOKEN_COUNT: u32 = 2;
pub const SYMBOL_COUNT: u32 = 8;
pub const ALIAS_COUNT: u32 = 1;

// fields, alphabetical
pub const FIELD_BODY: FieldId = 1;
pub const FIELD_LEFT: FieldId = 2;
pub const FIELD_OPERATOR: FieldId = 3;
pub const FIELD_RIGHT: FieldId = 4;
pub const FIELD_NAMES: [Option<&str>; 5] = [
    None,
    Some("body"),
    Some("left"),
    Some("operator"),
    Some("right"),
];

// productions
pub const PROD_PLAIN: u16 = 0;
pub const PROD_BINARY: u16 = 1;
pub const PROD_HEREDOC: u16 = 2;
pub const PROD_LITERAL: u16 = 3;
pub const PRODUCTION_ID_COUNT: u32 = 4;
