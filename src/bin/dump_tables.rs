// src/bin/dump_tables.rs
//! Print every non-empty cell of a parse table written by `gen_tables`.
//! Usage: cargo run --bin dump_tables -- <parse_table.json|parse_table.bin>

use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use sitter_runtime::{
    ParseTable,
    StateId,
    Symbol,
    parser::{load_parse_table_bin_bytes, load_parse_table_json_bytes},
};

fn load(path: &Path) -> Result<ParseTable> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    if path.extension().is_some_and(|e| e == "json") {
        load_parse_table_json_bytes(&data)
    } else {
        load_parse_table_bin_bytes(&data)
    }
}

fn main() -> Result<()> {
    let path = env::args().nth(1).context("pass a table path")?;
    let table = load(Path::new(&path))?;

    println!(
        "[dump] {} states ({} dense), {} symbols ({} terminals)",
        table.state_count(),
        table.large_state_count(),
        table.symbol_count(),
        table.token_count()
    );
    for state in 0..table.state_count() as StateId {
        for symbol in 0..table.symbol_count() as Symbol {
            if table.cell(state, symbol) == 0 {
                continue;
            }
            if (symbol as u32) < table.token_count() {
                let list = table.lookup(state, symbol);
                let actions: Vec<String> = list.iter().map(|a| format!("{a:?}")).collect();
                println!(
                    "  {state:>4} {symbol:>4}  [{}]{}",
                    actions.join(", "),
                    if list.reusable { "" } else { " (not reusable)" }
                );
            } else {
                println!(
                    "  {state:>4} {symbol:>4}  goto {}",
                    table.next_state(state, symbol)
                );
            }
        }
    }
    Ok(())
}
