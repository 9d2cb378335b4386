// src/parser/io.rs
// Persistence for parse tables.
//
// Compact binary layout (all little-endian):
//   magic: 8 bytes = "SRPTBL01"
//   u32:   symbol_count, token_count, state_count, large_state_count
//   u32:   n_headers, n_actions, n_sparse_words
//   u16:   dense[large_state_count * symbol_count]
//   u32:   sparse_map[state_count - large_state_count]
//   u16:   sparse_data[n_sparse_words]
//   8 B:   headers[n_headers]   (u32 offset, u16 count, u8 reusable, u8 pad)
//   8 B:   actions[n_actions]   (see ParseAction::to_bytes)

use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};

use super::{
    action::{ENCODED_LEN, ParseAction},
    tables::{ActionListHeader, ActionTable, DenseTable, ParseTable, SparseTable},
};

const BIN_MAGIC: &[u8; 8] = b"SRPTBL01";

// -------------------- JSON (de)serialization --------------------

#[derive(Serialize, Deserialize)]
struct ParseTableDisk {
    symbol_count: u32,
    token_count: u32,
    state_count: u32,
    large_state_count: u32,
    dense: Vec<u16>,
    sparse_map: Vec<u32>,
    sparse_data: Vec<u16>,
    headers: Vec<ActionListHeader>,
    actions: Vec<ParseAction>,
}

impl From<&ParseTable> for ParseTableDisk {
    fn from(t: &ParseTable) -> Self {
        Self {
            symbol_count: t.symbol_count,
            token_count: t.token_count,
            state_count: t.state_count,
            large_state_count: t.large_state_count,
            dense: t.dense.cells.clone(),
            sparse_map: t.sparse.map.clone(),
            sparse_data: t.sparse.data.clone(),
            headers: t.actions.headers.clone(),
            actions: t.actions.actions.clone(),
        }
    }
}

impl ParseTableDisk {
    fn into_table(self) -> Result<ParseTable> {
        ParseTable::from_parts(
            self.token_count,
            self.state_count,
            self.large_state_count,
            DenseTable {
                symbol_count: self.symbol_count,
                cells: self.dense,
            },
            SparseTable {
                first_state: self.large_state_count,
                map: self.sparse_map,
                data: self.sparse_data,
            },
            ActionTable {
                headers: self.headers,
                actions: self.actions,
            },
        )
    }
}

pub fn save_parse_table_json(path: &Path, t: &ParseTable) -> Result<()> {
    // Stream to disk to avoid giant intermediate strings.
    let f = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &ParseTableDisk::from(t))?;
    w.flush()?;
    log::debug!("saved parse table JSON to {}", path.display());
    Ok(())
}

pub fn load_parse_table_json_bytes(data: &[u8]) -> Result<ParseTable> {
    let disk = serde_json::from_slice::<ParseTableDisk>(data)
        .context("failed to parse parse-table JSON")?;
    disk.into_table()
}

// -------------------- Compact binary --------------------

pub fn parse_table_to_bin(t: &ParseTable) -> Vec<u8> {
    let n_sparse_map = t.sparse.map.len();
    let total = 8
        + 4 * 7
        + t.dense.cells.len() * 2
        + n_sparse_map * 4
        + t.sparse.data.len() * 2
        + t.actions.headers.len() * 8
        + t.actions.actions.len() * ENCODED_LEN;
    let mut out = Vec::with_capacity(total);

    out.extend_from_slice(BIN_MAGIC);
    for v in [
        t.symbol_count,
        t.token_count,
        t.state_count,
        t.large_state_count,
        t.actions.headers.len() as u32,
        t.actions.actions.len() as u32,
        t.sparse.data.len() as u32,
    ] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for &c in &t.dense.cells {
        out.extend_from_slice(&c.to_le_bytes());
    }
    for &o in &t.sparse.map {
        out.extend_from_slice(&o.to_le_bytes());
    }
    for &w in &t.sparse.data {
        out.extend_from_slice(&w.to_le_bytes());
    }
    for h in &t.actions.headers {
        out.extend_from_slice(&h.offset.to_le_bytes());
        out.extend_from_slice(&h.count.to_le_bytes());
        out.push(h.reusable as u8);
        out.push(0);
    }
    for a in &t.actions.actions {
        out.extend_from_slice(&a.to_bytes());
    }
    debug_assert_eq!(out.len(), total);
    out
}

pub fn save_parse_table_bin(path: &Path, t: &ParseTable) -> Result<()> {
    let instant = Instant::now();
    let bytes = parse_table_to_bin(t);
    let f = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    w.write_all(&bytes)?;
    w.flush()?;
    log::debug!(
        "saved parse table ({} bytes) to {} in {} ms",
        bytes.len(),
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

#[inline]
fn take<'a>(buf: &mut &'a [u8], n: usize, what: &str) -> Result<&'a [u8]> {
    if buf.len() < n {
        bail!("truncated {what}");
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

#[inline]
fn take_u32(buf: &mut &[u8]) -> Result<u32> {
    let b = take(buf, 4, "u32")?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[inline]
fn take_u16(buf: &mut &[u8]) -> Result<u16> {
    let b = take(buf, 2, "u16")?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub fn load_parse_table_bin_bytes(mut data: &[u8]) -> Result<ParseTable> {
    let magic = take(&mut data, 8, "magic")?;
    if magic != BIN_MAGIC {
        bail!("bad magic in parse table .bin");
    }

    let symbol_count = take_u32(&mut data)?;
    let token_count = take_u32(&mut data)?;
    let state_count = take_u32(&mut data)?;
    let large_state_count = take_u32(&mut data)?;
    let n_headers = take_u32(&mut data)? as usize;
    let n_actions = take_u32(&mut data)? as usize;
    let n_sparse = take_u32(&mut data)? as usize;
    ensure!(
        large_state_count <= state_count,
        "large_state_count {large_state_count} > state_count {state_count}"
    );

    let n_small = (state_count - large_state_count) as usize;
    let n_dense = (large_state_count as usize)
        .checked_mul(symbol_count as usize)
        .context("dense size overflow")?;
    // Bound every count by what is actually left before allocating.
    let needed = [
        (n_dense, 2),
        (n_small, 4),
        (n_sparse, 2),
        (n_headers, 8),
        (n_actions, ENCODED_LEN),
    ]
    .iter()
    .try_fold(0usize, |acc, &(n, width)| acc.checked_add(n.checked_mul(width)?))
    .context("parse table .bin header declares an impossible size")?;
    ensure!(
        data.len() >= needed,
        "parse table .bin is truncated: {} bytes left, {} needed",
        data.len(),
        needed
    );

    let mut cells = Vec::with_capacity(n_dense);
    for _ in 0..n_dense {
        cells.push(take_u16(&mut data)?);
    }
    let mut map = Vec::with_capacity(n_small);
    for _ in large_state_count..state_count {
        map.push(take_u32(&mut data)?);
    }
    let mut sparse_data = Vec::with_capacity(n_sparse);
    for _ in 0..n_sparse {
        sparse_data.push(take_u16(&mut data)?);
    }
    let mut headers = Vec::with_capacity(n_headers);
    for _ in 0..n_headers {
        let offset = take_u32(&mut data)?;
        let count = take_u16(&mut data)?;
        let flags = take(&mut data, 2, "header flags")?;
        headers.push(ActionListHeader {
            offset,
            count,
            reusable: flags[0] != 0,
        });
    }
    let mut actions = Vec::with_capacity(n_actions);
    for i in 0..n_actions {
        let raw = take(&mut data, ENCODED_LEN, "action")?;
        let mut b = [0u8; ENCODED_LEN];
        b.copy_from_slice(raw);
        actions.push(ParseAction::from_bytes(b).with_context(|| format!("action {i}"))?);
    }
    if !data.is_empty() {
        log::warn!("{} trailing bytes after parse table", data.len());
    }

    let table = ParseTable::from_parts(
        token_count,
        state_count,
        large_state_count,
        DenseTable {
            symbol_count,
            cells,
        },
        SparseTable {
            first_state: large_state_count,
            map,
            data: sparse_data,
        },
        ActionTable { headers, actions },
    )?;
    log::debug!(
        "loaded parse table: {} states, {} symbols, {} actions",
        state_count,
        symbol_count,
        n_actions
    );
    Ok(table)
}
