// src/parser/action.rs
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::symbol::{StateId, Symbol};

/// One entry of an action list. Each kind carries only its own fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParseAction {
    Shift {
        state: StateId,
        /// Not part of the grammar proper (comments, other trivia). The
        /// engine stays in the current state.
        extra: bool,
        /// Closes a repetition loop rather than starting a production.
        repetition: bool,
    },
    Reduce {
        symbol: Symbol,
        child_count: u8,
        dynamic_precedence: i16,
        /// Index into field maps and alias sequences.
        production_id: u16,
    },
    Accept,
    Recover,
}

impl ParseAction {
    pub const fn shift(state: StateId) -> Self {
        Self::Shift {
            state,
            extra: false,
            repetition: false,
        }
    }

    pub const fn shift_repeat(state: StateId) -> Self {
        Self::Shift {
            state,
            extra: false,
            repetition: true,
        }
    }

    pub const fn shift_extra() -> Self {
        Self::Shift {
            state: 0,
            extra: true,
            repetition: false,
        }
    }

    pub const fn reduce(
        symbol: Symbol,
        child_count: u8,
        dynamic_precedence: i16,
        production_id: u16,
    ) -> Self {
        Self::Reduce {
            symbol,
            child_count,
            dynamic_precedence,
            production_id,
        }
    }

    #[inline]
    pub fn is_shift(&self) -> bool {
        matches!(self, Self::Shift { .. })
    }

    #[inline]
    pub fn is_reduce(&self) -> bool {
        matches!(self, Self::Reduce { .. })
    }

    /// Fixed 8-byte little-endian form used by the binary table format:
    ///   byte 0: kind (0 shift, 1 reduce, 2 accept, 3 recover)
    ///   shift:  [1] flags (extra | repetition << 1), [2..4] state
    ///   reduce: [1] child_count, [2..4] symbol, [4..6] dyn prec, [6..8] production
    pub fn to_bytes(self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        match self {
            Self::Shift {
                state,
                extra,
                repetition,
            } => {
                out[0] = 0;
                out[1] = extra as u8 | (repetition as u8) << 1;
                out[2..4].copy_from_slice(&state.to_le_bytes());
            }
            Self::Reduce {
                symbol,
                child_count,
                dynamic_precedence,
                production_id,
            } => {
                out[0] = 1;
                out[1] = child_count;
                out[2..4].copy_from_slice(&symbol.to_le_bytes());
                out[4..6].copy_from_slice(&dynamic_precedence.to_le_bytes());
                out[6..8].copy_from_slice(&production_id.to_le_bytes());
            }
            Self::Accept => out[0] = 2,
            Self::Recover => out[0] = 3,
        }
        out
    }

    pub fn from_bytes(b: [u8; ENCODED_LEN]) -> Result<Self> {
        let u16_at = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        Ok(match b[0] {
            0 => {
                if b[1] & !0b11 != 0 {
                    bail!("shift action has unknown flag bits {:#04x}", b[1]);
                }
                Self::Shift {
                    state: u16_at(2),
                    extra: b[1] & 1 != 0,
                    repetition: b[1] & 2 != 0,
                }
            }
            1 => Self::Reduce {
                child_count: b[1],
                symbol: u16_at(2),
                dynamic_precedence: i16::from_le_bytes([b[4], b[5]]),
                production_id: u16_at(6),
            },
            2 => Self::Accept,
            3 => Self::Recover,
            t => bail!("unknown parse action kind {t}"),
        })
    }
}

pub const ENCODED_LEN: usize = 8;
