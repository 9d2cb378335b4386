// src/parser/tables.rs
//! Parse table encoding.
//!
//! Every (state, symbol) pair maps to one `u16` cell. For terminals the cell
//! is an index into the action-list headers (index 0 is the empty list, i.e.
//! "no action / error"); for nonterminals it is the goto state (0 = none).
//!
//! States below `large_state_count` own a full dense row. The remaining
//! "small" states usually have a handful of non-empty cells, so they are
//! stored as groups `value, symbol_count, symbols...` behind a per-state
//! offset:
//!
//! ```text
//!   sparse.map[state - large_state_count] -> offset
//!   sparse.data[offset]                   = group_count
//!   then group_count × { value, n, symbol_1 .. symbol_n }
//! ```

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail, ensure};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::action::ParseAction;
use crate::symbol::{SYM_ERROR, SYM_ERROR_REPEAT, StateId, Symbol};

/// States and symbols are addressed by `u16` ids.
const MAX_IDS: u32 = u16::MAX as u32 + 1;

/// Where one action list lives in the flat action sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionListHeader {
    pub offset: u32,
    pub count: u16,
    /// The same list may be shared by several (state, symbol) keys.
    pub reusable: bool,
}

impl ActionListHeader {
    pub const EMPTY: Self = Self {
        offset: 0,
        count: 0,
        reusable: false,
    };
}

/// Result of a lookup: the actions in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionList<'a> {
    pub actions: &'a [ParseAction],
    pub reusable: bool,
}

impl ActionList<'static> {
    pub const EMPTY: Self = Self {
        actions: &[],
        reusable: false,
    };
}

impl<'a> ActionList<'a> {
    /// No action registered: the engine has to recover.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.actions.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, ParseAction> {
        self.actions.iter()
    }

    pub fn last(&self) -> Option<&'a ParseAction> {
        self.actions.last()
    }
}

impl<'a> IntoIterator for ActionList<'a> {
    type Item = &'a ParseAction;
    type IntoIter = std::slice::Iter<'a, ParseAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

/// Headers plus the flat ordered sequence they point into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    pub headers: Vec<ActionListHeader>,
    pub actions: Vec<ParseAction>,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            headers: vec![ActionListHeader::EMPTY],
            actions: Vec::new(),
        }
    }
}

impl ActionTable {
    pub fn list(&self, index: u16) -> ActionList<'_> {
        let Some(h) = self.headers.get(index as usize) else {
            log::warn!("action list index {index} out of range");
            return ActionList::EMPTY;
        };
        let start = h.offset as usize;
        match self.actions.get(start..start + h.count as usize) {
            Some(actions) => ActionList {
                actions,
                reusable: h.reusable,
            },
            None => ActionList::EMPTY,
        }
    }

    fn push_list(&mut self, actions: &[ParseAction], reusable: bool) -> Result<u16> {
        let index = u16::try_from(self.headers.len())
            .map_err(|_| anyhow!("more than {} distinct action lists", u16::MAX))?;
        let offset = u32::try_from(self.actions.len())
            .map_err(|_| anyhow!("action array exceeds {} entries", u32::MAX))?;
        let count = u16::try_from(actions.len())
            .map_err(|_| anyhow!("action list of {} entries is too long", actions.len()))?;
        self.headers.push(ActionListHeader {
            offset,
            count,
            reusable,
        });
        self.actions.extend_from_slice(actions);
        Ok(index)
    }
}

/// A way of storing the cells of some states.
pub trait CellTable {
    /// The raw cell, 0 when nothing is stored.
    fn cell(&self, state: StateId, symbol: Symbol) -> u16;
}

/// Full rows for the large states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenseTable {
    pub symbol_count: u32,
    /// `large_state_count * symbol_count`, row-major
    pub cells: Vec<u16>,
}

impl CellTable for DenseTable {
    #[inline]
    fn cell(&self, state: StateId, symbol: Symbol) -> u16 {
        if symbol as u32 >= self.symbol_count {
            return 0;
        }
        let i = state as usize * self.symbol_count as usize + symbol as usize;
        self.cells.get(i).copied().unwrap_or(0)
    }
}

/// Grouped rows for the small states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseTable {
    /// First state stored here.
    pub first_state: u32,
    pub map: Vec<u32>,
    pub data: Vec<u16>,
}

impl SparseTable {
    /// `(value, symbols)` groups of one state.
    pub fn groups(&self, state: StateId) -> SparseGroups<'_> {
        let rest = (state as u32)
            .checked_sub(self.first_state)
            .and_then(|i| self.map.get(i as usize))
            .and_then(|&offset| self.data.get(offset as usize..))
            .unwrap_or(&[]);
        match rest.split_first() {
            Some((&count, rest)) => SparseGroups {
                remaining: count,
                data: rest,
            },
            None => SparseGroups {
                remaining: 0,
                data: &[],
            },
        }
    }
}

impl CellTable for SparseTable {
    fn cell(&self, state: StateId, symbol: Symbol) -> u16 {
        self.groups(state)
            .find(|(_, symbols)| symbols.contains(&symbol))
            .map_or(0, |(value, _)| value)
    }
}

pub struct SparseGroups<'a> {
    remaining: u16,
    data: &'a [u16],
}

impl<'a> Iterator for SparseGroups<'a> {
    type Item = (u16, &'a [u16]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let (&value, rest) = self.data.split_first()?;
        let (&n, rest) = rest.split_first()?;
        let n = (n as usize).min(rest.len());
        let (symbols, rest) = rest.split_at(n);
        self.data = rest;
        Some((value, symbols))
    }
}

/// The complete action/goto table of a grammar. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTable {
    pub(crate) symbol_count: u32,
    pub(crate) token_count: u32,
    pub(crate) state_count: u32,
    pub(crate) large_state_count: u32,
    pub(crate) dense: DenseTable,
    pub(crate) sparse: SparseTable,
    pub(crate) actions: ActionTable,
}

impl ParseTable {
    /// Assembles a table from already-encoded parts and checks that every
    /// count agrees with every array.
    pub fn from_parts(
        token_count: u32,
        state_count: u32,
        large_state_count: u32,
        dense: DenseTable,
        sparse: SparseTable,
        actions: ActionTable,
    ) -> Result<Self> {
        let table = Self {
            symbol_count: dense.symbol_count,
            token_count,
            state_count,
            large_state_count,
            dense,
            sparse,
            actions,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn symbol_count(&self) -> u32 {
        self.symbol_count
    }

    pub fn token_count(&self) -> u32 {
        self.token_count
    }

    pub fn state_count(&self) -> u32 {
        self.state_count
    }

    pub fn large_state_count(&self) -> u32 {
        self.large_state_count
    }

    pub fn dense(&self) -> &DenseTable {
        &self.dense
    }

    pub fn sparse(&self) -> &SparseTable {
        &self.sparse
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Backing strategy for a state, chosen by index range.
    #[inline]
    fn backing(&self, state: StateId) -> &dyn CellTable {
        if (state as u32) < self.large_state_count {
            &self.dense
        } else {
            &self.sparse
        }
    }

    #[inline]
    pub fn cell(&self, state: StateId, symbol: Symbol) -> u16 {
        if state as u32 >= self.state_count {
            return 0;
        }
        self.backing(state).cell(state, symbol)
    }

    /// Actions for a terminal lookahead, in table order. Missing keys,
    /// nonterminals and the error symbol all give the empty list.
    pub fn lookup(&self, state: StateId, symbol: Symbol) -> ActionList<'_> {
        let is_terminal = (symbol as u32) < self.token_count;
        if !is_terminal || symbol == SYM_ERROR || symbol == SYM_ERROR_REPEAT {
            return ActionList::EMPTY;
        }
        self.actions.list(self.cell(state, symbol))
    }

    /// State after consuming `symbol` in `state` (0 when there is none).
    ///
    /// Terminals follow the last action of their list when it is a shift
    /// (extra shifts stay put); nonterminals read the goto cell.
    pub fn next_state(&self, state: StateId, symbol: Symbol) -> StateId {
        if symbol == SYM_ERROR || symbol == SYM_ERROR_REPEAT {
            return 0;
        }
        if (symbol as u32) < self.token_count {
            match self.lookup(state, symbol).last() {
                Some(ParseAction::Shift { state: to, extra, .. }) => {
                    if *extra {
                        state
                    } else {
                        *to
                    }
                }
                _ => 0,
            }
        } else {
            self.cell(state, symbol)
        }
    }

    pub fn has_actions(&self, state: StateId, symbol: Symbol) -> bool {
        !self.lookup(state, symbol).is_error()
    }

    pub fn has_reduce_action(&self, state: StateId, symbol: Symbol) -> bool {
        self.lookup(state, symbol)
            .iter()
            .next()
            .is_some_and(ParseAction::is_reduce)
    }

    pub fn validate(&self) -> Result<()> {
        let symbols = self.symbol_count as usize;
        ensure!(
            self.state_count <= MAX_IDS && self.symbol_count <= MAX_IDS,
            "{} states / {} symbols do not fit 16-bit ids",
            self.state_count,
            self.symbol_count
        );
        ensure!(
            self.token_count <= self.symbol_count,
            "token_count {} > symbol_count {}",
            self.token_count,
            self.symbol_count
        );
        ensure!(
            self.large_state_count <= self.state_count,
            "large_state_count {} > state_count {}",
            self.large_state_count,
            self.state_count
        );
        ensure!(
            self.dense.cells.len() == self.large_state_count as usize * symbols,
            "dense table has {} cells, expected {} x {}",
            self.dense.cells.len(),
            self.large_state_count,
            symbols
        );
        ensure!(
            self.sparse.first_state == self.large_state_count,
            "sparse table starts at state {}, expected {}",
            self.sparse.first_state,
            self.large_state_count
        );
        ensure!(
            self.sparse.map.len() == (self.state_count - self.large_state_count) as usize,
            "sparse map has {} states, expected {}",
            self.sparse.map.len(),
            self.state_count - self.large_state_count
        );
        ensure!(
            self.actions.headers.first() == Some(&ActionListHeader::EMPTY),
            "action list 0 must be the empty list"
        );

        for (i, h) in self.actions.headers.iter().enumerate() {
            if h.offset as usize + h.count as usize > self.actions.actions.len() {
                bail!("action list {i} runs past the action array");
            }
        }
        for (i, a) in self.actions.actions.iter().enumerate() {
            match *a {
                ParseAction::Shift { state, extra, .. } => {
                    if !extra && state as u32 >= self.state_count {
                        bail!("action {i} shifts to missing state {state}");
                    }
                }
                ParseAction::Reduce { symbol, .. } => {
                    if symbol as usize >= symbols {
                        bail!("action {i} reduces to unknown symbol {symbol}");
                    }
                }
                ParseAction::Accept | ParseAction::Recover => {}
            }
        }

        for state in 0..self.state_count {
            let state = state as StateId;
            if state as u32 >= self.large_state_count {
                let offset = self.sparse.map[(state as u32 - self.large_state_count) as usize];
                ensure!(
                    (offset as usize) < self.sparse.data.len(),
                    "sparse offset {offset} of state {state} out of range"
                );
                let declared = self.sparse.data[offset as usize] as usize;
                let mut groups = 0usize;
                for (value, symbols) in self.sparse.groups(state) {
                    groups += 1;
                    for &symbol in symbols {
                        self.check_cell(state, symbol, value)?;
                    }
                }
                ensure!(
                    groups == declared,
                    "state {state}: sparse row is truncated ({groups} of {declared} groups)"
                );
            } else {
                for symbol in 0..self.symbol_count {
                    let symbol = symbol as Symbol;
                    self.check_cell(state, symbol, self.dense.cell(state, symbol))?;
                }
            }
        }
        Ok(())
    }

    fn check_cell(&self, state: StateId, symbol: Symbol, value: u16) -> Result<()> {
        if symbol as u32 >= self.symbol_count {
            bail!("state {state}: cell for unknown symbol {symbol}");
        }
        if (symbol as u32) < self.token_count {
            if value as usize >= self.actions.headers.len() {
                bail!("state {state}, symbol {symbol}: action list {value} does not exist");
            }
        } else if value as u32 >= self.state_count {
            bail!("state {state}, symbol {symbol}: goto to missing state {value}");
        }
        Ok(())
    }
}

/// Collects per-key action lists and gotos, then encodes them.
///
/// Identical lists are stored once. Keys never given a list keep cell 0.
pub struct ParseTableBuilder {
    symbol_count: u32,
    token_count: u32,
    state_count: u32,
    rows: Vec<BTreeMap<Symbol, u16>>,
    actions: ActionTable,
    interned: HashMap<(Vec<ParseAction>, bool), u16>,
    /// First list that could not be encoded; reported by `build`.
    overflow: Option<anyhow::Error>,
}

impl ParseTableBuilder {
    pub fn new(state_count: u32, symbol_count: u32, token_count: u32) -> Self {
        Self {
            symbol_count,
            token_count,
            state_count,
            rows: vec![BTreeMap::new(); state_count as usize],
            actions: ActionTable::default(),
            interned: HashMap::new(),
            overflow: None,
        }
    }

    /// Registers the action list of a terminal key (replacing any previous
    /// one). Order is kept as given.
    pub fn actions(
        &mut self,
        state: StateId,
        symbol: Symbol,
        actions: &[ParseAction],
    ) -> &mut Self {
        self.actions_with(state, symbol, actions, true)
    }

    pub fn actions_with(
        &mut self,
        state: StateId,
        symbol: Symbol,
        actions: &[ParseAction],
        reusable: bool,
    ) -> &mut Self {
        debug_assert!((symbol as u32) < self.token_count, "actions need a terminal");
        let index = if actions.is_empty() {
            0
        } else {
            let key = (actions.to_vec(), reusable);
            match self.interned.get(&key) {
                Some(&index) => index,
                None => match self.actions.push_list(actions, reusable) {
                    Ok(index) => {
                        self.interned.insert(key, index);
                        index
                    }
                    Err(e) => {
                        log::warn!("state {state}, symbol {symbol}: {e}");
                        if self.overflow.is_none() {
                            self.overflow = Some(e.context(format!("state {state}, symbol {symbol}")));
                        }
                        return self;
                    }
                },
            }
        };
        self.set_cell(state, symbol, index);
        self
    }

    /// Registers the goto of a nonterminal.
    pub fn goto(&mut self, state: StateId, symbol: Symbol, to: StateId) -> &mut Self {
        debug_assert!((symbol as u32) >= self.token_count, "goto needs a nonterminal");
        self.set_cell(state, symbol, to);
        self
    }

    fn set_cell(&mut self, state: StateId, symbol: Symbol, value: u16) {
        let row = &mut self.rows[state as usize];
        if value == 0 {
            row.remove(&symbol);
        } else {
            row.insert(symbol, value);
        }
    }

    /// Encodes states below `large_state_count` densely, the rest sparsely.
    /// Fails when more distinct lists were registered than a `u16` cell can
    /// address.
    pub fn build(self, large_state_count: u32) -> Result<ParseTable> {
        if let Some(e) = self.overflow {
            return Err(e);
        }
        ensure!(
            large_state_count <= self.state_count,
            "large_state_count {large_state_count} > state_count {}",
            self.state_count
        );
        let symbols = self.symbol_count as usize;

        let mut cells = vec![0u16; large_state_count as usize * symbols];
        for (state, row) in self.rows.iter().take(large_state_count as usize).enumerate() {
            for (&symbol, &value) in row {
                ensure!(
                    (symbol as usize) < symbols,
                    "state {state}: symbol {symbol} out of range"
                );
                cells[state * symbols + symbol as usize] = value;
            }
        }

        let mut map = Vec::with_capacity((self.state_count - large_state_count) as usize);
        let mut data = Vec::new();
        for row in self.rows.iter().skip(large_state_count as usize) {
            let mut groups: BTreeMap<u16, Vec<Symbol>> = BTreeMap::new();
            for (&symbol, &value) in row {
                groups.entry(value).or_default().push(symbol);
            }
            map.push(u32::try_from(data.len()).map_err(|_| anyhow!("sparse table too large"))?);
            data.push(u16::try_from(groups.len()).map_err(|_| anyhow!("sparse row too wide"))?);
            for (value, symbols) in groups {
                data.push(value);
                data.push(u16::try_from(symbols.len()).map_err(|_| anyhow!("sparse group too wide"))?);
                data.extend(symbols);
            }
        }

        log::debug!(
            "built parse table: {} states ({} dense), {} action lists, {} sparse words",
            self.state_count,
            large_state_count,
            self.actions.headers.len(),
            data.len()
        );

        ParseTable::from_parts(
            self.token_count,
            self.state_count,
            large_state_count,
            DenseTable {
                symbol_count: self.symbol_count,
                cells,
            },
            SparseTable {
                first_state: large_state_count,
                map,
                data,
            },
            self.actions,
        )
    }
}
