// src/language.rs
//! A compiled grammar: parse table, symbol and field names, lex modes and
//! the optional external scanner, checked against each other once at
//! construction.

use anyhow::{Context, Result, ensure};
use hashbrown::HashMap;

use crate::{
    external::{ExternalScannerDef, ScannerSession},
    lexer::LexFn,
    parser::{
        ActionList,
        AliasMap,
        AliasSequences,
        FieldMap,
        FieldMapEntry,
        ParseTable,
        alias,
    },
    symbol::{FieldId, SYM_ERROR, StateId, Symbol, SymbolMetadata},
};

pub const LANGUAGE_VERSION: u32 = 14;
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

/// Which lex function state and external lex state to use in a parse state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexMode {
    pub lex_state: StateId,
    /// Row of the external validity matrix; 0 disables the scanner.
    pub external_lex_state: u16,
}

/// Everything a generator emits for one grammar. Turned into a
/// [`Language`] by [`Language::new`].
#[derive(Debug, Clone)]
pub struct LanguageDef {
    pub version: u32,
    pub symbol_count: u32,
    pub alias_count: u32,
    pub token_count: u32,
    pub external_token_count: u32,
    pub state_count: u32,
    pub large_state_count: u32,
    pub production_id_count: u32,
    pub field_count: u32,
    pub max_alias_sequence_length: u16,
    pub parse_table: ParseTable,
    /// `symbol_count + alias_count` names.
    pub symbol_names: Vec<String>,
    /// `field_count + 1` names; slot 0 is unused.
    pub field_names: Vec<Option<String>>,
    pub field_map: FieldMap,
    pub symbol_metadata: Vec<SymbolMetadata>,
    pub public_symbol_map: Vec<Symbol>,
    pub alias_map: AliasMap,
    pub alias_sequences: AliasSequences,
    pub lex_modes: Vec<LexMode>,
    pub lex_fn: LexFn,
    pub keyword_lex_fn: Option<LexFn>,
    /// Token re-lexed with `keyword_lex_fn`; 0 when the grammar has none.
    pub keyword_capture_token: Symbol,
    pub external_scanner: ExternalScannerDef,
    /// Empty, or one canonical state per state.
    pub primary_state_ids: Vec<StateId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct NameSlot {
    named: Option<Symbol>,
    anonymous: Option<Symbol>,
}

#[derive(Debug, Clone)]
pub struct Language {
    def: LanguageDef,
    symbols_by_name: HashMap<String, NameSlot>,
    fields_by_name: HashMap<String, FieldId>,
}

impl Language {
    pub fn new(def: LanguageDef) -> Result<Self> {
        validate(&def)?;

        let total = (def.symbol_count + def.alias_count) as usize;
        let mut symbols_by_name: HashMap<String, NameSlot> = HashMap::with_capacity(total);
        for (i, name) in def.symbol_names.iter().enumerate() {
            let meta = def.symbol_metadata[i];
            if !meta.visible && !meta.supertype {
                continue;
            }
            let slot = symbols_by_name.entry(name.clone()).or_default();
            let target = if meta.named {
                &mut slot.named
            } else {
                &mut slot.anonymous
            };
            // first id wins; later duplicates share its public symbol
            target.get_or_insert(i as Symbol);
        }

        let mut fields_by_name = HashMap::with_capacity(def.field_count as usize);
        for (id, name) in def.field_names.iter().enumerate().skip(1) {
            if let Some(name) = name {
                fields_by_name.insert(name.clone(), id as FieldId);
            }
        }

        log::debug!(
            "language: {} symbols ({} aliases), {} states, {} fields",
            def.symbol_count,
            def.alias_count,
            def.state_count,
            def.field_count
        );
        Ok(Self {
            def,
            symbols_by_name,
            fields_by_name,
        })
    }

    /// Re-runs the cross-table checks `new` performed.
    pub fn validate(&self) -> Result<()> {
        validate(&self.def)
    }

    pub fn def(&self) -> &LanguageDef {
        &self.def
    }

    pub fn version(&self) -> u32 {
        self.def.version
    }

    pub fn symbol_count(&self) -> u32 {
        self.def.symbol_count
    }

    pub fn state_count(&self) -> u32 {
        self.def.state_count
    }

    pub fn field_count(&self) -> u32 {
        self.def.field_count
    }

    pub fn parse_table(&self) -> &ParseTable {
        &self.def.parse_table
    }

    // ---------- names ----------

    pub fn symbol_name(&self, symbol: Symbol) -> Option<&str> {
        if symbol == SYM_ERROR {
            return Some("ERROR");
        }
        self.def.symbol_names.get(symbol as usize).map(String::as_str)
    }

    /// The error symbol is visible and named; unknown ids are hidden.
    pub fn symbol_metadata(&self, symbol: Symbol) -> SymbolMetadata {
        if symbol == SYM_ERROR {
            return SymbolMetadata::named();
        }
        self.def
            .symbol_metadata
            .get(symbol as usize)
            .copied()
            .unwrap_or(SymbolMetadata::HIDDEN)
    }

    /// Canonical id among symbols that share a name.
    pub fn public_symbol(&self, symbol: Symbol) -> Symbol {
        if symbol == SYM_ERROR {
            return symbol;
        }
        self.def
            .public_symbol_map
            .get(symbol as usize)
            .copied()
            .unwrap_or(symbol)
    }

    /// Visible symbol (or alias) called `name`, as its public id.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        if name == "ERROR" {
            return named.then_some(SYM_ERROR);
        }
        let slot = self.symbols_by_name.get(name)?;
        let symbol = if named { slot.named } else { slot.anonymous }?;
        Some(self.public_symbol(symbol))
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.def
            .field_names
            .get(field as usize)
            .and_then(|n| n.as_deref())
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.fields_by_name.get(name).copied()
    }

    // ---------- parse table ----------

    pub fn lookup(&self, state: StateId, symbol: Symbol) -> ActionList<'_> {
        self.def.parse_table.lookup(state, symbol)
    }

    pub fn next_state(&self, state: StateId, symbol: Symbol) -> StateId {
        self.def.parse_table.next_state(state, symbol)
    }

    pub fn has_actions(&self, state: StateId, symbol: Symbol) -> bool {
        self.def.parse_table.has_actions(state, symbol)
    }

    pub fn has_reduce_action(&self, state: StateId, symbol: Symbol) -> bool {
        self.def.parse_table.has_reduce_action(state, symbol)
    }

    pub fn fields_for(&self, production_id: u16) -> &[FieldMapEntry] {
        self.def.field_map.fields_for(production_id)
    }

    pub fn alias_for(&self, production_id: u16, child_index: u16) -> Option<Symbol> {
        self.def.alias_sequences.alias_for(production_id, child_index)
    }

    /// Names `symbol` can appear under; just itself when it is never aliased.
    pub fn aliases_for_symbol(&self, symbol: Symbol) -> Vec<Symbol> {
        match self.def.alias_map.aliases_for_symbol(symbol) {
            [] => vec![symbol],
            aliases => aliases.to_vec(),
        }
    }

    // ---------- lexing ----------

    /// Lex mode of a parse state. Out-of-range states get the default mode.
    pub fn lex_mode(&self, state: StateId) -> LexMode {
        self.def
            .lex_modes
            .get(state as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn lex_fn(&self) -> LexFn {
        self.def.lex_fn
    }

    pub fn keyword_lex_fn(&self) -> Option<LexFn> {
        self.def.keyword_lex_fn
    }

    pub fn keyword_capture_token(&self) -> Option<Symbol> {
        (self.def.keyword_capture_token != 0).then_some(self.def.keyword_capture_token)
    }

    pub fn enabled_external_tokens(&self, external_lex_state: u16) -> &[bool] {
        self.def.external_scanner.enabled_tokens(external_lex_state)
    }

    /// Grammar symbol for an external token id.
    pub fn external_symbol(&self, token: Symbol) -> Option<Symbol> {
        self.def.external_scanner.symbol_for(token)
    }

    pub fn primary_state(&self, state: StateId) -> StateId {
        self.def
            .primary_state_ids
            .get(state as usize)
            .copied()
            .unwrap_or(state)
    }

    /// A fresh scanner for one parse, if the grammar has one.
    pub fn external_scanner(&self) -> Option<ScannerSession> {
        self.def.external_scanner.create.map(ScannerSession::create)
    }
}

fn validate(def: &LanguageDef) -> Result<()> {
    ensure!(
        (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&def.version),
        "incompatible language version {} (supported {}..={})",
        def.version,
        MIN_COMPATIBLE_LANGUAGE_VERSION,
        LANGUAGE_VERSION
    );

    let t = &def.parse_table;
    for (what, have, want) in [
        ("symbol_count", t.symbol_count(), def.symbol_count),
        ("token_count", t.token_count(), def.token_count),
        ("state_count", t.state_count(), def.state_count),
        ("large_state_count", t.large_state_count(), def.large_state_count),
    ] {
        ensure!(have == want, "parse table {what} is {have}, language says {want}");
    }
    ensure!(
        def.external_token_count <= def.token_count,
        "{} external tokens but only {} tokens",
        def.external_token_count,
        def.token_count
    );

    let total = def.symbol_count + def.alias_count;
    ensure!(
        (total as usize) < SYM_ERROR as usize - 1,
        "{total} symbols collide with the error symbols"
    );
    for (what, len) in [
        ("symbol_names", def.symbol_names.len()),
        ("symbol_metadata", def.symbol_metadata.len()),
        ("public_symbol_map", def.public_symbol_map.len()),
    ] {
        ensure!(len == total as usize, "{what} has {len} entries, expected {total}");
    }
    for (i, &p) in def.public_symbol_map.iter().enumerate() {
        ensure!((p as u32) < total, "public symbol of {i} is unknown symbol {p}");
    }

    ensure!(
        def.field_names.len() == def.field_count as usize + 1,
        "field_names has {} entries, expected {}",
        def.field_names.len(),
        def.field_count + 1
    );
    ensure!(def.field_names[0].is_none(), "field id 0 must be unnamed");
    def.field_map
        .validate(def.production_id_count, def.field_count)
        .context("field map")?;

    ensure!(
        def.alias_sequences.max_length == def.max_alias_sequence_length,
        "alias sequences are {} wide, language says {}",
        def.alias_sequences.max_length,
        def.max_alias_sequence_length
    );
    alias::validate(
        &def.alias_sequences,
        &def.alias_map,
        def.production_id_count,
        total,
    )
    .context("aliases")?;

    ensure!(
        def.lex_modes.len() == def.state_count as usize,
        "{} lex modes for {} states",
        def.lex_modes.len(),
        def.state_count
    );
    let ext = &def.external_scanner;
    ext.validate(def.external_token_count)
        .context("external scanner")?;
    let external_states = ext.states.len().checked_div(ext.token_count()).unwrap_or(0);
    for (state, mode) in def.lex_modes.iter().enumerate() {
        ensure!(
            mode.external_lex_state == 0 || (mode.external_lex_state as usize) < external_states,
            "state {state} uses external lex state {} of {external_states}",
            mode.external_lex_state
        );
    }
    for &s in &ext.symbol_map {
        ensure!(
            (s as u32) < def.token_count,
            "external token maps to non-terminal {s}"
        );
    }

    ensure!(
        (def.keyword_capture_token as u32) < def.token_count,
        "keyword capture token {} is not a terminal",
        def.keyword_capture_token
    );
    ensure!(
        def.keyword_capture_token == 0 || def.keyword_lex_fn.is_some(),
        "keyword capture token without a keyword lex function"
    );

    ensure!(
        def.primary_state_ids.is_empty() || def.primary_state_ids.len() == def.state_count as usize,
        "{} primary state ids for {} states",
        def.primary_state_ids.len(),
        def.state_count
    );
    for &p in &def.primary_state_ids {
        ensure!((p as u32) < def.state_count, "primary state {p} out of range");
    }
    Ok(())
}
