// src/sample/mod.rs
//! A small bundled grammar: sums of numbers, `#` line comments as extras,
//! and heredoc expressions recognised by [`HeredocScanner`].
//!
//! ```text
//! source_file := expression
//! expression  := number                       (number aliased as `literal`)
//!              | expression '+' number        (left, operator, right)
//!              | heredoc_start heredoc_body   (body)
//! ```

pub mod lex;
pub mod symbols;

use anyhow::Result;

pub use symbols::SampleSymbol;
use symbols::*;

use crate::{
    external::{ExternalScannerDef, HeredocScanner},
    language::{LANGUAGE_VERSION, Language, LanguageDef, LexMode},
    parser::{
        AliasGroup,
        AliasMap,
        AliasSequences,
        FieldMap,
        FieldMapEntry,
        FieldMapSlice,
        ParseAction,
        ParseTable,
        ParseTableBuilder,
    },
    symbol::{StateId, SymbolMetadata},
};

pub const STATE_COUNT: u32 = 9;
pub const LARGE_STATE_COUNT: u32 = 2;
pub const MAX_ALIAS_SEQUENCE_LENGTH: u16 = 3;

/// Parse states that expect an expression start (external lex state 1) and
/// a heredoc body (external lex state 2).
const EXPECT_HEREDOC_START: StateId = 1;
const EXPECT_HEREDOC_BODY: StateId = 7;

pub fn build_parse_table() -> Result<ParseTable> {
    use ParseAction as A;
    use SampleSymbol as Sym;

    let extra = [A::shift_extra()];
    let mut b = ParseTableBuilder::new(STATE_COUNT, SYMBOL_COUNT, TOKEN_COUNT);

    // 0: error state
    for s in [Sym::End, Sym::Number, Sym::Plus, Sym::HeredocStart] {
        b.actions(0, s.id(), &[A::Recover]);
    }
    b.actions(0, Sym::Comment.id(), &extra);

    // 1: start
    b.actions(1, Sym::Number.id(), &[A::shift(2)])
        .actions(1, Sym::HeredocStart.id(), &[A::shift(7)])
        .actions(1, Sym::Comment.id(), &extra)
        .goto(1, Sym::SourceFile.id(), 3)
        .goto(1, Sym::Expression.id(), 4);

    // 2: expression -> number .
    let literal = [A::reduce(Sym::Expression.id(), 1, 0, PROD_LITERAL)];
    b.actions(2, Sym::End.id(), &literal)
        .actions(2, Sym::Plus.id(), &literal)
        .actions(2, Sym::Comment.id(), &extra);

    // 3: accept
    b.actions(3, Sym::End.id(), &[A::Accept])
        .actions(3, Sym::Comment.id(), &extra);

    // 4: source_file -> expression . | expression . '+' number
    b.actions(
        4,
        Sym::End.id(),
        &[A::reduce(Sym::SourceFile.id(), 1, 0, PROD_PLAIN)],
    )
    .actions(4, Sym::Plus.id(), &[A::shift(5)])
    .actions(4, Sym::Comment.id(), &extra);

    // 5: expression -> expression '+' . number
    b.actions(5, Sym::Number.id(), &[A::shift(6)])
        .actions(5, Sym::Comment.id(), &extra);

    // 6: expression -> expression '+' number .
    let binary = [A::reduce(Sym::Expression.id(), 3, 0, PROD_BINARY)];
    b.actions(6, Sym::End.id(), &binary)
        .actions(6, Sym::Plus.id(), &binary)
        .actions(6, Sym::Comment.id(), &extra);

    // 7: expression -> heredoc_start . heredoc_body
    b.actions(7, Sym::HeredocBody.id(), &[A::shift(8)]);

    // 8: expression -> heredoc_start heredoc_body .
    let heredoc = [A::reduce(Sym::Expression.id(), 2, 0, PROD_HEREDOC)];
    b.actions(8, Sym::End.id(), &heredoc)
        .actions(8, Sym::Plus.id(), &heredoc)
        .actions(8, Sym::Comment.id(), &extra);

    b.build(LARGE_STATE_COUNT)
}

fn field_map() -> FieldMap {
    let entry = |field_id, child_index| FieldMapEntry {
        field_id,
        child_index,
        inherited: false,
    };
    FieldMap {
        slices: vec![
            FieldMapSlice { index: 0, length: 0 },
            FieldMapSlice { index: 0, length: 3 },
            FieldMapSlice { index: 3, length: 1 },
            FieldMapSlice { index: 4, length: 0 },
        ],
        entries: vec![
            entry(FIELD_LEFT, 0),
            entry(FIELD_OPERATOR, 1),
            entry(FIELD_RIGHT, 2),
            entry(FIELD_BODY, 1),
        ],
    }
}

fn alias_sequences() -> AliasSequences {
    let n = MAX_ALIAS_SEQUENCE_LENGTH as usize;
    let mut symbols = vec![0; PRODUCTION_ID_COUNT as usize * n];
    symbols[PROD_LITERAL as usize * n] = SampleSymbol::Literal.id();
    AliasSequences {
        max_length: MAX_ALIAS_SEQUENCE_LENGTH,
        symbols,
    }
}

fn symbol_metadata(s: SampleSymbol) -> SymbolMetadata {
    match s {
        SampleSymbol::End => SymbolMetadata {
            visible: false,
            named: true,
            supertype: false,
        },
        SampleSymbol::Plus => SymbolMetadata::anonymous(),
        _ => SymbolMetadata::named(),
    }
}

fn lex_modes() -> Vec<LexMode> {
    (0..STATE_COUNT as StateId)
        .map(|state| LexMode {
            lex_state: lex::START.id(),
            external_lex_state: match state {
                EXPECT_HEREDOC_START => 1,
                EXPECT_HEREDOC_BODY => 2,
                _ => 0,
            },
        })
        .collect()
}

fn external_scanner() -> ExternalScannerDef {
    ExternalScannerDef {
        // rows: none, heredoc_start, heredoc_body
        states: vec![false, false, true, false, false, true],
        symbol_map: vec![
            SampleSymbol::HeredocStart.id(),
            SampleSymbol::HeredocBody.id(),
        ],
        create: Some(HeredocScanner::boxed),
    }
}

pub fn language_def() -> Result<LanguageDef> {
    Ok(LanguageDef {
        version: LANGUAGE_VERSION,
        symbol_count: SYMBOL_COUNT,
        alias_count: ALIAS_COUNT,
        token_count: TOKEN_COUNT,
        external_token_count: EXTERNAL_TOKEN_COUNT,
        state_count: STATE_COUNT,
        large_state_count: LARGE_STATE_COUNT,
        production_id_count: PRODUCTION_ID_COUNT,
        field_count: (FIELD_NAMES.len() - 1) as u32,
        max_alias_sequence_length: MAX_ALIAS_SEQUENCE_LENGTH,
        parse_table: build_parse_table()?,
        symbol_names: SampleSymbol::ALL.iter().map(|s| s.name().to_string()).collect(),
        field_names: FIELD_NAMES.iter().map(|n| n.map(str::to_string)).collect(),
        field_map: field_map(),
        symbol_metadata: SampleSymbol::ALL.iter().map(|&s| symbol_metadata(s)).collect(),
        public_symbol_map: SampleSymbol::ALL.iter().map(|s| s.id()).collect(),
        alias_map: AliasMap {
            groups: vec![AliasGroup {
                symbol: SampleSymbol::Number.id(),
                aliases: vec![SampleSymbol::Number.id(), SampleSymbol::Literal.id()],
            }],
        },
        alias_sequences: alias_sequences(),
        lex_modes: lex_modes(),
        lex_fn: lex::lex,
        keyword_lex_fn: None,
        keyword_capture_token: 0,
        external_scanner: external_scanner(),
        primary_state_ids: (0..STATE_COUNT as StateId).collect(),
    })
}

pub fn language() -> Result<Language> {
    Language::new(language_def()?)
}
