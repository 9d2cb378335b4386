// src/lexer/tables/io.rs
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::{LexStateRow, LexTable, Next, RangeEdge};
use crate::symbol::{StateId, Symbol};

// -------------------- JSON (de)serialization --------------------

/// Sentinel for "no transition" in the on-disk rows.
const NO_EDGE: u32 = u32::MAX;

// (skip << 16) | state, or NO_EDGE
fn pack(next: Option<Next>) -> u32 {
    match next {
        Some(n) => (n.skip as u32) << 16 | n.state as u32,
        None => NO_EDGE,
    }
}

fn unpack(v: u32) -> Option<Next> {
    (v != NO_EDGE).then(|| Next {
        state: (v & 0xffff) as StateId,
        skip: v >> 16 & 1 != 0,
    })
}

#[derive(Serialize, Deserialize)]
struct RangeDisk {
    lo: char,
    hi: char,
    next: u32,
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct StateDisk {
    accept: Option<Symbol>,
    #[serde_as(as = "[_; 128]")]
    ascii: [u32; 128],
    ranges: Vec<RangeDisk>,
    on_eof: u32,
}

#[derive(Serialize, Deserialize)]
struct LexTableDisk {
    states: Vec<StateDisk>,
}

impl From<&LexTable> for LexTableDisk {
    fn from(t: &LexTable) -> Self {
        Self {
            states: t
                .states
                .iter()
                .map(|row| StateDisk {
                    accept: row.accept,
                    ascii: row.ascii.map(pack),
                    ranges: row
                        .ranges
                        .iter()
                        .map(|e| RangeDisk {
                            lo: e.lo,
                            hi: e.hi,
                            next: pack(Some(e.next)),
                        })
                        .collect(),
                    on_eof: pack(row.on_eof),
                })
                .collect(),
        }
    }
}

impl LexTableDisk {
    fn into_table(self) -> LexTable {
        LexTable {
            states: self
                .states
                .into_iter()
                .map(|s| LexStateRow {
                    accept: s.accept,
                    ascii: s.ascii.map(unpack),
                    ranges: s
                        .ranges
                        .into_iter()
                        .filter_map(|r| {
                            unpack(r.next).map(|next| RangeEdge {
                                lo: r.lo,
                                hi: r.hi,
                                next,
                            })
                        })
                        .collect(),
                    on_eof: unpack(s.on_eof),
                })
                .collect(),
        }
    }
}

pub fn save_lex_table_json(path: &std::path::Path, t: &LexTable) -> Result<()> {
    let f = std::fs::File::create(path)
        .with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &LexTableDisk::from(t))?;
    w.flush()?;
    log::debug!(
        "saved lex table ({} states) to {}",
        t.states.len(),
        path.display()
    );
    Ok(())
}

/// Parses and validates a lex table.
pub fn load_lex_table_json_bytes(data: &[u8]) -> Result<LexTable> {
    let table = serde_json::from_slice::<LexTableDisk>(data)
        .map(|d| d.into_table())
        .context("failed to parse lex table JSON")?;
    table.validate()?;
    log::debug!("loaded lex table with {} states", table.states.len());
    Ok(table)
}
