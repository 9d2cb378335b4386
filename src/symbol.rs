// src/symbol.rs
use serde::{Deserialize, Serialize};

/// Grammar symbol id (terminals first, then nonterminals, then aliases).
pub type Symbol = u16;
/// Parse automaton state id.
pub type StateId = u16;
/// Field name id; 0 means "no field".
pub type FieldId = u16;

/// End of input.
pub const SYM_END: Symbol = 0;
/// The error symbol (all bits set).
pub const SYM_ERROR: Symbol = Symbol::MAX;
/// Error repetition symbol used by engines while recovering.
pub const SYM_ERROR_REPEAT: Symbol = Symbol::MAX - 1;

/// Out-of-band facts about a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolMetadata {
    /// Shows up as a node in the produced tree.
    pub visible: bool,
    /// Has a semantic name (as opposed to anonymous punctuation).
    pub named: bool,
    /// Abstract grouping symbol.
    pub supertype: bool,
}

impl SymbolMetadata {
    pub const HIDDEN: Self = Self {
        visible: false,
        named: false,
        supertype: false,
    };

    pub const fn named() -> Self {
        Self {
            visible: true,
            named: true,
            supertype: false,
        }
    }

    pub const fn anonymous() -> Self {
        Self {
            visible: true,
            named: false,
            supertype: false,
        }
    }

    pub const fn supertype() -> Self {
        Self {
            visible: false,
            named: true,
            supertype: true,
        }
    }
}
