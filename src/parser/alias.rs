// src/parser/alias.rs
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::symbol::Symbol;

/// Per-production rename targets, `max_length` slots per production.
/// A slot holding 0 is not aliased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSequences {
    pub max_length: u16,
    pub symbols: Vec<Symbol>,
}

impl AliasSequences {
    pub fn alias_for(&self, production_id: u16, slot: u16) -> Option<Symbol> {
        if slot >= self.max_length {
            return None;
        }
        let i = production_id as usize * self.max_length as usize + slot as usize;
        self.symbols.get(i).copied().filter(|&s| s != 0)
    }

    /// Slots of a production, 0 meaning "keep the original symbol".
    pub fn sequence(&self, production_id: u16) -> &[Symbol] {
        let n = self.max_length as usize;
        let start = production_id as usize * n;
        self.symbols.get(start..start + n).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub symbol: Symbol,
    /// Every symbol `symbol` can appear as, itself included.
    pub aliases: Vec<Symbol>,
}

/// For symbols that are aliased somewhere, the names they may carry.
/// Kept sorted by `symbol`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMap {
    pub groups: Vec<AliasGroup>,
}

impl AliasMap {
    pub fn aliases_for_symbol(&self, symbol: Symbol) -> &[Symbol] {
        match self.groups.binary_search_by_key(&symbol, |g| g.symbol) {
            Ok(i) => self.groups[i].aliases.as_slice(),
            Err(_) => &[],
        }
    }
}

pub(crate) fn validate(
    sequences: &AliasSequences,
    map: &AliasMap,
    production_id_count: u32,
    total_symbols: u32,
) -> Result<()> {
    ensure!(
        sequences.symbols.len()
            == production_id_count as usize * sequences.max_length as usize,
        "alias sequences have {} slots, expected {} x {}",
        sequences.symbols.len(),
        production_id_count,
        sequences.max_length
    );
    for &s in &sequences.symbols {
        ensure!((s as u32) < total_symbols, "alias to unknown symbol {s}");
    }
    ensure!(
        map.groups.windows(2).all(|w| w[0].symbol < w[1].symbol),
        "alias map groups must be sorted by symbol"
    );
    for g in &map.groups {
        for &s in std::iter::once(&g.symbol).chain(&g.aliases) {
            ensure!((s as u32) < total_symbols, "alias map names unknown symbol {s}");
        }
    }
    Ok(())
}
